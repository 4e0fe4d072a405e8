//! Device matching
//!
//! Decides whether one candidate satisfies a `LookupCriterion`. Problems
//! with a single candidate (unreadable configuration, unreadable serial)
//! make it a non-match; they never abort the scan.

use protocol::{ADB_INTERFACE, LookupCriterion};
use tracing::{debug, error};

use super::{DeviceSummary, UsbCandidate};

/// Result of matching one candidate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchOutcome {
    Rejected,
    /// Accepted, with the serial if matching already had to read it
    Accepted { serial: Option<String> },
}

impl MatchOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted { .. })
    }
}

/// Check whether the device satisfies the criterion
pub fn matches<D: UsbCandidate>(
    criterion: &LookupCriterion,
    device: &D,
    summary: &DeviceSummary,
) -> bool {
    evaluate(criterion, device, summary).is_accepted()
}

/// Match the device, keeping any serial read along the way
pub fn evaluate<D: UsbCandidate>(
    criterion: &LookupCriterion,
    device: &D,
    summary: &DeviceSummary,
) -> MatchOutcome {
    match criterion {
        LookupCriterion::AdbInterface => {
            if has_adb_interface(device, summary) {
                MatchOutcome::Accepted { serial: None }
            } else {
                MatchOutcome::Rejected
            }
        }
        LookupCriterion::Serial(wanted) => match device.read_serial(summary) {
            Ok(serial) if serial == *wanted => MatchOutcome::Accepted {
                serial: Some(serial),
            },
            Ok(_) => MatchOutcome::Rejected,
            Err(e) => {
                debug!("USB: device {}: {}", summary.usb_id(), e);
                MatchOutcome::Rejected
            }
        },
        LookupCriterion::VidPid(id) => {
            if summary.vendor_id == id.vendor_id && summary.product_id == id.product_id {
                MatchOutcome::Accepted { serial: None }
            } else {
                MatchOutcome::Rejected
            }
        }
    }
}

/// Scan every configuration, interface and alternate setting for the ADB signature
pub fn has_adb_interface<D: UsbCandidate>(device: &D, summary: &DeviceSummary) -> bool {
    for config_index in 0..summary.num_configurations {
        let signatures = match device.interface_signatures(config_index) {
            Ok(signatures) => signatures,
            Err(e) => {
                error!(
                    "Could not retrieve config descriptor {} of {}: {}",
                    config_index,
                    summary.usb_id(),
                    e
                );
                continue;
            }
        };

        if signatures.contains(&ADB_INTERFACE) {
            return true;
        }
    }

    false
}
