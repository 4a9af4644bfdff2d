pub mod action;
pub mod dispatcher;

pub use action::{ParseError, VehicleAction};
pub use dispatcher::{Dispatcher, VehicleActor, CONTROLLER_ID};
