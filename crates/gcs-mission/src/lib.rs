pub mod mission;
pub mod scheduler;

pub use mission::{available_missions, CompiledFrame, LoadError, Mission, MissionEntry};
pub use scheduler::Scheduler;

/// Track id that supplies the authoritative per-frame delay. Same reserved
/// identifier the inbound protocol uses for the controller.
pub const SYNC_TRACK_ID: &str = "MCU";
