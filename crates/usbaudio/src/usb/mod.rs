//! USB subsystem
//!
//! Device discovery and the native USB seams.
//!
//! This module handles:
//! - Enumerating the native device list and matching each candidate
//! - Reading serial numbers through transient device handles
//! - Owning the per-device references handed back to the caller
//! - Issuing control transfers on an opened handle
//!
//! All calls are synchronous and block for at most the native timeout.
//! The `UsbBus`/`UsbCandidate`/`ControlTransport` traits are implemented for
//! `rusb` types here and for in-memory doubles in `crate::test_utils`.

pub mod device;
pub mod enumerator;
pub mod matcher;
pub mod transfers;

use protocol::{InterfaceSignature, UsbId};
use thiserror::Error;

pub use device::UsbDeviceRecord;
pub use enumerator::find_devices;
pub use matcher::{MatchOutcome, evaluate, has_adb_interface, matches};
pub use transfers::ControlTransport;

/// Device descriptor fields needed for matching
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceSummary {
    pub vendor_id: u16,
    pub product_id: u16,
    /// String descriptor index of the serial number, if the device has one
    pub serial_index: Option<u8>,
    pub num_configurations: u8,
}

impl DeviceSummary {
    pub fn usb_id(&self) -> UsbId {
        UsbId::new(self.vendor_id, self.product_id)
    }
}

/// Why a serial number could not be read
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SerialError {
    #[error("cannot open device ({0})")]
    Open(rusb::Error),

    #[error("no serial number available")]
    NoSerialIndex,

    #[error("cannot read serial ({0})")]
    Read(rusb::Error),
}

/// One entry of the native device list
///
/// Cloning a candidate takes another reference on the underlying device;
/// dropping it releases that reference.
pub trait UsbCandidate {
    /// Opened handle used for control transfers
    type Handle: ControlTransport;

    /// Read the cached device descriptor
    fn summary(&self) -> Result<DeviceSummary, rusb::Error>;

    /// Interface signatures of every interface and alternate setting in one configuration
    fn interface_signatures(&self, config_index: u8)
    -> Result<Vec<InterfaceSignature>, rusb::Error>;

    /// Open the device transiently and read its serial number string
    fn read_serial(&self, summary: &DeviceSummary) -> Result<String, SerialError>;

    /// Open the device for control transfers
    fn open(&self) -> Result<Self::Handle, rusb::Error>;
}

/// Source of the native device list
pub trait UsbBus {
    type Device: UsbCandidate;

    /// Snapshot the connected devices
    ///
    /// The native list is released before returning; each returned device
    /// holds its own reference.
    fn devices(&self) -> Result<Vec<Self::Device>, rusb::Error>;
}
