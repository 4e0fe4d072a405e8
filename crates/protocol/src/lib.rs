//! Protocol library for usbaudio
//!
//! Wire-level definitions for the Android Open Accessory 2.0 audio handshake
//! and the types used to select a device. Nothing here touches USB directly;
//! the constants and setup packets are consumed by the `usbaudio` crate.
//!
//! # Example
//!
//! ```
//! use protocol::{AoaVersion, AudioMode, ControlSetup, AOA_SET_AUDIO_MODE};
//!
//! let setup = ControlSetup::set_audio_mode(AudioMode::S16LsbStereo44100Hz);
//! assert_eq!(setup.request, AOA_SET_AUDIO_MODE);
//! assert_eq!(setup.value, 1);
//!
//! let version = AoaVersion::from_le_bytes(&[2, 0]).unwrap();
//! assert!(version.supports_audio());
//! ```

pub mod aoa;
pub mod error;
pub mod lookup;

pub use aoa::{
    AOA_AUDIO_MIN_VERSION, AOA_GET_PROTOCOL, AOA_SET_AUDIO_MODE, AOA_START_ACCESSORY,
    AUDIO_ACCESSORY_PIDS, AoaVersion, AudioMode, ControlSetup, DEFAULT_TIMEOUT,
    REQUEST_TYPE_VENDOR_IN, REQUEST_TYPE_VENDOR_OUT, is_audio_accessory_pid,
};
pub use error::{ProtocolError, Result};
pub use lookup::{ADB_INTERFACE, InterfaceSignature, LookupCriterion, UsbId};
