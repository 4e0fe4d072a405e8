//! Android Open Accessory 2.0 wire definitions
//!
//! Request codes, audio mode values and the timeout are fixed by the AOA2
//! protocol: <https://source.android.com/devices/accessories/aoa2>

use byteorder::{ByteOrder, LittleEndian};
use std::fmt;
use std::time::Duration;

use crate::error::{ProtocolError, Result};

/// Query the accessory protocol version supported by the device
pub const AOA_GET_PROTOCOL: u8 = 51;
/// Switch the device into accessory mode
pub const AOA_START_ACCESSORY: u8 = 53;
/// Request audio forwarding in accessory mode
pub const AOA_SET_AUDIO_MODE: u8 = 58;

/// Timeout applied to every AOA control transfer
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(1000);

/// Device-to-host | vendor | device recipient
pub const REQUEST_TYPE_VENDOR_IN: u8 = 0xC0;
/// Host-to-device | vendor | device recipient
pub const REQUEST_TYPE_VENDOR_OUT: u8 = 0x40;

/// First AOA protocol version that supports audio
pub const AOA_AUDIO_MIN_VERSION: u16 = 2;

/// Google product ids for accessory modes with audio enabled
pub const AUDIO_ACCESSORY_PIDS: std::ops::RangeInclusive<u16> = 0x2D02..=0x2D05;

/// Audio mode values accepted by `SET_AUDIO_MODE`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum AudioMode {
    /// No audio forwarding
    NoAudio = 0,
    /// 16-bit little-endian PCM, 2 channels, 44100 Hz
    S16LsbStereo44100Hz = 1,
}

impl AudioMode {
    /// Wire value sent in the setup packet's `wValue`
    pub fn value(self) -> u16 {
        self as u16
    }
}

/// Setup fields of one control transfer
///
/// The data stage is passed separately as a slice, so the buffer and its
/// length cannot disagree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlSetup {
    pub request_type: u8,
    pub request: u8,
    pub value: u16,
    pub index: u16,
    pub timeout: Duration,
}

impl ControlSetup {
    /// `GET_PROTOCOL`: expects a 2-byte data stage
    pub fn get_protocol() -> Self {
        Self {
            request_type: REQUEST_TYPE_VENDOR_IN,
            request: AOA_GET_PROTOCOL,
            value: 0,
            index: 0,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// `SET_AUDIO_MODE` with the given mode; no data stage
    pub fn set_audio_mode(mode: AudioMode) -> Self {
        Self {
            request_type: REQUEST_TYPE_VENDOR_OUT,
            request: AOA_SET_AUDIO_MODE,
            value: mode.value(),
            index: 0,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// `START_ACCESSORY`; no value, index or data stage
    pub fn start_accessory() -> Self {
        Self {
            request_type: REQUEST_TYPE_VENDOR_OUT,
            request: AOA_START_ACCESSORY,
            value: 0,
            index: 0,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// True for device-to-host transfers (bit 7 of bmRequestType)
    pub fn is_in(&self) -> bool {
        self.request_type & 0x80 != 0
    }
}

/// AOA protocol version reported by `GET_PROTOCOL`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct AoaVersion(pub u16);

impl AoaVersion {
    /// Number of bytes in the `GET_PROTOCOL` response
    pub const WIRE_LEN: usize = 2;

    /// Decode the little-endian version from a `GET_PROTOCOL` response
    pub fn from_le_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < Self::WIRE_LEN {
            return Err(ProtocolError::ShortResponse {
                needed: Self::WIRE_LEN,
                actual: data.len(),
            });
        }
        Ok(Self(LittleEndian::read_u16(data)))
    }

    /// AOA 2.0 and later support audio forwarding
    pub fn supports_audio(self) -> bool {
        self.0 >= AOA_AUDIO_MIN_VERSION
    }
}

impl fmt::Display for AoaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// True if the product id means the device already runs an audio accessory mode
pub fn is_audio_accessory_pid(product_id: u16) -> bool {
    AUDIO_ACCESSORY_PIDS.contains(&product_id)
}
