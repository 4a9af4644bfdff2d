pub mod request;
pub mod wire;

use thiserror::Error;

/// Failures while decoding either wire form. `MalformedSyntax` means the line
/// is not parseable at all; `MissingField` means the frame parsed but a
/// required field is absent (or not usable as a string).
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed line: {0}")]
    MalformedSyntax(String),
    #[error("missing field `{0}`")]
    MissingField(&'static str),
}
