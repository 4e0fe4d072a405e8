//! Device lookup criteria
//!
//! A lookup selects devices by ADB interface, by serial number, or by
//! vendor/product id. Exactly one mode is active per lookup.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{ProtocolError, Result};

/// Interface (class, subclass, protocol) triple
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InterfaceSignature {
    pub class: u8,
    pub subclass: u8,
    pub protocol: u8,
}

impl InterfaceSignature {
    pub const fn new(class: u8, subclass: u8, protocol: u8) -> Self {
        Self {
            class,
            subclass,
            protocol,
        }
    }
}

/// Interface exposed by devices with ADB enabled
///
/// Used only to classify devices; no ADB session is opened.
pub const ADB_INTERFACE: InterfaceSignature = InterfaceSignature::new(0xFF, 0x42, 0x01);

/// Vendor/product id pair, written `vid:pid` in hex
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UsbId {
    pub vendor_id: u16,
    pub product_id: u16,
}

impl UsbId {
    pub fn new(vendor_id: u16, product_id: u16) -> Self {
        Self {
            vendor_id,
            product_id,
        }
    }
}

fn parse_hex_id(name: &'static str, value: &str) -> Result<u16> {
    let invalid = || ProtocolError::InvalidHexId {
        name,
        value: value.to_string(),
    };

    if value.is_empty() || value.len() > 4 || !value.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(invalid());
    }
    u16::from_str_radix(value, 16).map_err(|_| invalid())
}

impl FromStr for UsbId {
    type Err = ProtocolError;

    /// Parse `vid:pid` where each side has 1 to 4 hex digits
    fn from_str(s: &str) -> Result<Self> {
        let (vid, pid) = s
            .split_once(':')
            .ok_or_else(|| ProtocolError::InvalidDeviceId(s.to_string()))?;

        if vid.is_empty() || vid.len() > 4 || pid.is_empty() || pid.len() > 4 {
            return Err(ProtocolError::InvalidDeviceId(s.to_string()));
        }

        Ok(Self {
            vendor_id: parse_hex_id("vid", vid)?,
            product_id: parse_hex_id("pid", pid)?,
        })
    }
}

impl TryFrom<String> for UsbId {
    type Error = ProtocolError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<UsbId> for String {
    fn from(id: UsbId) -> Self {
        id.to_string()
    }
}

impl fmt::Display for UsbId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04x}:{:04x}", self.vendor_id, self.product_id)
    }
}

/// How to select the Android device
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupCriterion {
    /// Devices exposing an ADB interface
    AdbInterface,
    /// Devices whose serial number equals the value (case-sensitive)
    Serial(String),
    /// Devices with the given vendor and product id
    VidPid(UsbId),
}

impl LookupCriterion {
    /// Build the criterion from the two optional identification inputs
    ///
    /// Returns `None` when both are given, since they are mutually exclusive.
    pub fn from_parts(serial: Option<String>, device: Option<UsbId>) -> Option<Self> {
        match (serial, device) {
            (Some(_), Some(_)) => None,
            (Some(serial), None) => Some(Self::Serial(serial)),
            (None, Some(id)) => Some(Self::VidPid(id)),
            (None, None) => Some(Self::AdbInterface),
        }
    }
}

impl fmt::Display for LookupCriterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AdbInterface => write!(f, "adb interface"),
            Self::Serial(serial) => write!(f, "serial {}", serial),
            Self::VidPid(id) => write!(f, "device {}", id),
        }
    }
}
