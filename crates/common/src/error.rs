//! Common error types
//!
//! Every failure that ends a run maps to exactly one variant. Per-candidate
//! problems during a device scan are logged and skipped, never surfaced here.

use protocol::{ProtocolError, UsbId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Native device list could not be retrieved
    #[error("Could not get USB devices: {0}")]
    Enumeration(#[source] rusb::Error),

    #[error("Could not find device matching {0}")]
    NoMatch(String),

    /// More than one device matched; each entry is `[vid:pid] serial`
    #[error("Several devices found: {}", .0.join(", "))]
    AmbiguousMatch(Vec<String>),

    #[error("Could not open device {id}: {source}")]
    DeviceOpen {
        id: UsbId,
        #[source]
        source: rusb::Error,
    },

    #[error("Could not get AOA protocol version: {0}")]
    ProtocolQuery(String),

    #[error("Device does not support AOA 2: {0}")]
    UnsupportedProtocol(u16),

    #[error("Could not set audio mode: {0}")]
    AudioMode(#[source] rusb::Error),

    #[error("Could not start accessory: {0}")]
    AccessoryStart(#[source] rusb::Error),

    #[error("Connection to PulseAudio server failed: {0}")]
    AudioServerConnection(String),

    #[error("Could not iterate on main loop: {0}")]
    EventLoop(String),

    #[error("Could not find matching PulseAudio input source for serial {0}")]
    SourceNotFound(String),

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
