//! USB device records
//!
//! This module provides the owned record returned by discovery and the
//! `rusb` implementations of the candidate and bus traits.

use protocol::{InterfaceSignature, UsbId};
use rusb::{Context, Device, DeviceHandle, UsbContext};
use std::fmt;
use tracing::trace;

use super::{DeviceSummary, SerialError, UsbBus, UsbCandidate};

/// One matched physical device
///
/// Holds one reference on the native device from creation until `close`.
/// `close` consumes the record, so it cannot be used afterwards.
pub struct UsbDeviceRecord<D> {
    pub vendor_id: u16,
    pub product_id: u16,
    pub serial: String,
    device: D,
}

impl<D> UsbDeviceRecord<D> {
    pub fn new(vendor_id: u16, product_id: u16, serial: String, device: D) -> Self {
        Self {
            vendor_id,
            product_id,
            serial,
            device,
        }
    }

    pub fn usb_id(&self) -> UsbId {
        UsbId::new(self.vendor_id, self.product_id)
    }

    /// Underlying native device
    pub fn device(&self) -> &D {
        &self.device
    }

    /// Release the device reference
    pub fn close(self) {
        trace!("Releasing device {}", self);
        drop(self.device);
    }
}

impl<D> fmt::Display for UsbDeviceRecord<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.usb_id(), self.serial)
    }
}

impl<D> fmt::Debug for UsbDeviceRecord<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UsbDeviceRecord")
            .field("vendor_id", &format_args!("{:#06x}", self.vendor_id))
            .field("product_id", &format_args!("{:#06x}", self.product_id))
            .field("serial", &self.serial)
            .finish_non_exhaustive()
    }
}

impl<T: UsbContext> UsbCandidate for Device<T> {
    type Handle = DeviceHandle<T>;

    fn summary(&self) -> Result<DeviceSummary, rusb::Error> {
        let descriptor = self.device_descriptor()?;

        Ok(DeviceSummary {
            vendor_id: descriptor.vendor_id(),
            product_id: descriptor.product_id(),
            serial_index: descriptor.serial_number_string_index(),
            num_configurations: descriptor.num_configurations(),
        })
    }

    fn interface_signatures(
        &self,
        config_index: u8,
    ) -> Result<Vec<InterfaceSignature>, rusb::Error> {
        let config = self.config_descriptor(config_index)?;

        let signatures = config
            .interfaces()
            .flat_map(|interface| interface.descriptors())
            .map(|alt| {
                InterfaceSignature::new(alt.class_code(), alt.sub_class_code(), alt.protocol_code())
            })
            .collect();

        Ok(signatures)
    }

    fn read_serial(&self, summary: &DeviceSummary) -> Result<String, SerialError> {
        let handle = Device::open(self).map_err(SerialError::Open)?;
        let index = summary.serial_index.ok_or(SerialError::NoSerialIndex)?;

        handle
            .read_string_descriptor_ascii(index)
            .map_err(SerialError::Read)
    }

    fn open(&self) -> Result<Self::Handle, rusb::Error> {
        Device::open(self)
    }
}

impl UsbBus for Context {
    type Device = Device<Context>;

    fn devices(&self) -> Result<Vec<Self::Device>, rusb::Error> {
        let list = UsbContext::devices(self)?;
        Ok(list.iter().collect())
    }
}
