//! Error types for the event listener protocol.

use std::io;

/// Errors raised while reading or decoding listener traffic.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// A token did not have the `key:value` shape.
    #[error("malformed token '{0}': expected key:value")]
    MalformedToken(String),

    /// A required token was absent from a header or payload line.
    #[error("missing required field '{0}'")]
    MissingField(&'static str),

    /// The `len` header was not a non-negative integer.
    #[error("invalid payload length '{0}'")]
    InvalidLength(String),

    /// The stream ended in the middle of a notification.
    #[error("unexpected EOF while reading {0}")]
    UnexpectedEof(&'static str),

    /// The payload bytes were not valid UTF-8.
    #[error("payload is not valid UTF-8")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    /// An acknowledgement was written with no notification outstanding.
    #[error("no notification is awaiting acknowledgement")]
    NothingToAcknowledge,

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}
