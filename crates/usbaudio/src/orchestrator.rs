//! Discovery and negotiation sequencing
//!
//! Enumerate, require exactly one match, then negotiate accessory audio.
//! Audio-source correlation and the player handoff follow in `main`.

use common::{Error, Result};
use protocol::{AoaVersion, LookupCriterion, is_audio_accessory_pid};
use tracing::{error, info};

use crate::aoa::forward_audio;
use crate::usb::{UsbBus, UsbDeviceRecord, find_devices};

/// Default number of devices collected by one scan
pub const MAX_DEVICES: usize = 32;

/// Find the single device matching `criterion`
///
/// On `AmbiguousMatch` every record is released before returning.
pub fn select_device<B: UsbBus>(
    bus: &B,
    criterion: &LookupCriterion,
    capacity: usize,
) -> Result<UsbDeviceRecord<B::Device>> {
    let mut devices = find_devices(bus, criterion, capacity)?;

    if devices.len() > 1 {
        error!("Several devices found:");
        let listing = devices
            .into_iter()
            .map(|device| {
                let line = device.to_string();
                error!("   {}", line);
                device.close();
                line
            })
            .collect();
        return Err(Error::AmbiguousMatch(listing));
    }

    devices
        .pop()
        .ok_or_else(|| Error::NoMatch(criterion.to_string()))
}

/// Select the device and switch it to audio accessory mode
///
/// The record is released if negotiation fails.
pub fn enable_accessory_audio<B: UsbBus>(
    bus: &B,
    criterion: &LookupCriterion,
    capacity: usize,
) -> Result<(UsbDeviceRecord<B::Device>, AoaVersion)> {
    let device = select_device(bus, criterion, capacity)?;
    info!("Device: {}", device);

    match forward_audio(&device) {
        Ok(version) => Ok((device, version)),
        Err(e) => {
            device.close();
            Err(e)
        }
    }
}

/// True unless the device already enumerated as an audio accessory
///
/// A device that was not yet in accessory mode re-enumerates after
/// `START_ACCESSORY`, and its input source appears only afterwards.
pub fn needs_settle_delay<D>(device: &UsbDeviceRecord<D>) -> bool {
    !is_audio_accessory_pid(device.product_id)
}
