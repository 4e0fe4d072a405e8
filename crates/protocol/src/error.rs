//! Protocol error types

use thiserror::Error;

/// Protocol-level errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    /// A control transfer returned fewer bytes than the request needs
    #[error("Short response: needed {needed} bytes, got {actual}")]
    ShortResponse { needed: usize, actual: usize },

    /// Malformed `vid:pid` device identifier
    #[error("Invalid device format (expected vid:pid): {0}")]
    InvalidDeviceId(String),

    /// A vendor or product id that does not fit in 16 bits of hex
    #[error("Could not parse {name}: {value}")]
    InvalidHexId { name: &'static str, value: String },
}

/// Type alias for protocol results
pub type Result<T> = std::result::Result<T, ProtocolError>;
