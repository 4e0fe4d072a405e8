//! Device enumeration
//!
//! Walks the native device list once, in native order, and keeps up to
//! `capacity` devices that satisfy the lookup.

use common::{Error, Result};
use protocol::LookupCriterion;
use tracing::{debug, error, warn};

use super::matcher::{MatchOutcome, evaluate};
use super::{UsbBus, UsbCandidate, UsbDeviceRecord};

/// Find the devices matching `criterion`
///
/// Returns at most `capacity` records; an empty result is not an error.
/// Each record owns its own device reference.
pub fn find_devices<B: UsbBus>(
    bus: &B,
    criterion: &LookupCriterion,
    capacity: usize,
) -> Result<Vec<UsbDeviceRecord<B::Device>>> {
    let candidates = bus.devices().map_err(Error::Enumeration)?;
    debug!("Scanning {} USB devices for {}", candidates.len(), criterion);

    let mut found = Vec::new();

    for device in candidates {
        if found.len() >= capacity {
            break;
        }

        let summary = match device.summary() {
            Ok(summary) => summary,
            Err(e) => {
                warn!("Could not read device descriptor: {}", e);
                continue;
            }
        };

        let serial = match evaluate(criterion, &device, &summary) {
            MatchOutcome::Rejected => continue,
            MatchOutcome::Accepted { serial: Some(serial) } => serial,
            MatchOutcome::Accepted { serial: None } => match device.read_serial(&summary) {
                Ok(serial) => serial,
                Err(e) => {
                    error!("Could not read device serial of {}: {}", summary.usb_id(), e);
                    continue;
                }
            },
        };

        debug!("Matched device [{}] {}", summary.usb_id(), serial);
        found.push(UsbDeviceRecord::new(
            summary.vendor_id,
            summary.product_id,
            serial,
            device,
        ));
    }

    Ok(found)
}
