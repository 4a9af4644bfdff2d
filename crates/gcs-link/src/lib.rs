pub mod handshake;
pub mod reader;
pub mod serial;

pub use handshake::{Handshake, VerifiedPorts};
pub use reader::spawn_reader;
pub use serial::SerialLink;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LinkError {
    #[error("transport i/o: {0}")]
    Io(#[from] std::io::Error),
    /// The peer closed the line (EOF). Terminal for the owning loop.
    #[error("transport closed")]
    Closed,
}
