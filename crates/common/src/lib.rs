//! Common utilities for usbaudio
//!
//! Shared error taxonomy and logging setup used by the USB discovery,
//! accessory negotiation and audio-source correlation layers.

pub mod error;
pub mod logging;

pub use error::{Error, Result};
pub use logging::setup_logging;
