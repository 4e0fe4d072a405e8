//! Android Open Accessory audio negotiation
//!
//! Runs the AOA2 handshake on one opened device:
//!
//! 1. `GET_PROTOCOL` and check the version is at least 2
//! 2. `SET_AUDIO_MODE` with 16-bit stereo 44100 Hz
//! 3. `START_ACCESSORY`
//!
//! Steps are strictly sequential with no retries; the first failure aborts
//! the sequence. There is no way to turn forwarding off again: the device
//! has to be unplugged.

use common::{Error, Result};
use protocol::{AoaVersion, AudioMode, ControlSetup};
use tracing::{debug, error, info};

use crate::usb::{ControlTransport, UsbCandidate, UsbDeviceRecord};

/// Run the handshake on an opened transport
///
/// Returns the AOA version reported by the device.
pub fn negotiate<H: ControlTransport>(transport: &mut H) -> Result<AoaVersion> {
    let version = get_protocol(transport)?;
    debug!("Device AOA version: {}", version);

    if !version.supports_audio() {
        error!("Device does not support AOA 2: {}", version);
        return Err(Error::UnsupportedProtocol(version.0));
    }

    set_audio_mode(transport, AudioMode::S16LsbStereo44100Hz)?;
    start_accessory(transport)?;

    Ok(version)
}

/// Open the recorded device and switch it to audio accessory mode
///
/// The handle is closed on every path.
pub fn forward_audio<D: UsbCandidate>(record: &UsbDeviceRecord<D>) -> Result<AoaVersion> {
    let mut handle = record.device().open().map_err(|e| {
        error!("Could not open device {}: {}", record.usb_id(), e);
        Error::DeviceOpen {
            id: record.usb_id(),
            source: e,
        }
    })?;

    let version = negotiate(&mut handle)?;
    info!("Audio forwarding enabled on {}", record);
    Ok(version)
}

fn get_protocol<H: ControlTransport>(transport: &mut H) -> Result<AoaVersion> {
    let mut data = [0u8; AoaVersion::WIRE_LEN];

    let len = transport
        .control_in(&ControlSetup::get_protocol(), &mut data)
        .map_err(|e| {
            error!("GET_PROTOCOL failed: {}", e);
            Error::ProtocolQuery(e.to_string())
        })?;

    AoaVersion::from_le_bytes(&data[..len]).map_err(|e| {
        error!("GET_PROTOCOL returned {} bytes", len);
        Error::ProtocolQuery(e.to_string())
    })
}

fn set_audio_mode<H: ControlTransport>(transport: &mut H, mode: AudioMode) -> Result<()> {
    transport
        .control_out(&ControlSetup::set_audio_mode(mode), &[])
        .map_err(|e| {
            error!("SET_AUDIO_MODE failed: {}", e);
            Error::AudioMode(e)
        })?;
    Ok(())
}

fn start_accessory<H: ControlTransport>(transport: &mut H) -> Result<()> {
    transport
        .control_out(&ControlSetup::start_accessory(), &[])
        .map_err(|e| {
            error!("START_ACCESSORY failed: {}", e);
            Error::AccessoryStart(e)
        })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::FakeDevice;
    use protocol::{AOA_GET_PROTOCOL, AOA_SET_AUDIO_MODE, AOA_START_ACCESSORY};

    #[test]
    fn test_successful_handshake_order() {
        let device = FakeDevice::new(0x18D1, 0x4EE7).with_aoa_version(2);
        let mut transport = device.open().unwrap();

        let version = negotiate(&mut transport).unwrap();
        assert_eq!(version, AoaVersion(2));
        assert_eq!(
            device.requests(),
            [AOA_GET_PROTOCOL, AOA_SET_AUDIO_MODE, AOA_START_ACCESSORY]
        );
    }

    #[test]
    fn test_audio_mode_value_sent() {
        let device = FakeDevice::new(0x18D1, 0x4EE7).with_aoa_version(2);
        let mut transport = device.open().unwrap();

        negotiate(&mut transport).unwrap();
        let transfers = device.transfers();
        assert_eq!(transfers[1].value, 1);
        assert_eq!(transfers[2].value, 0);
    }

    #[test]
    fn test_version_one_rejected() {
        let device = FakeDevice::new(0x18D1, 0x4EE7).with_aoa_version(1);
        let mut transport = device.open().unwrap();

        let result = negotiate(&mut transport);
        assert!(matches!(result, Err(Error::UnsupportedProtocol(1))));
        assert_eq!(device.requests(), [AOA_GET_PROTOCOL]);
    }

    #[test]
    fn test_short_version_response() {
        let device = FakeDevice::new(0x18D1, 0x4EE7).with_version_response(&[2]);
        let mut transport = device.open().unwrap();

        assert!(matches!(
            negotiate(&mut transport),
            Err(Error::ProtocolQuery(_))
        ));
        assert_eq!(device.requests(), [AOA_GET_PROTOCOL]);
    }

    #[test]
    fn test_audio_mode_failure_stops_sequence() {
        let device = FakeDevice::new(0x18D1, 0x4EE7)
            .with_aoa_version(2)
            .failing_request(AOA_SET_AUDIO_MODE, rusb::Error::Timeout);
        let mut transport = device.open().unwrap();

        assert!(matches!(
            negotiate(&mut transport),
            Err(Error::AudioMode(rusb::Error::Timeout))
        ));
        assert_eq!(device.requests(), [AOA_GET_PROTOCOL, AOA_SET_AUDIO_MODE]);
    }

    #[test]
    fn test_forward_audio_open_failure() {
        let device = FakeDevice::new(0x18D1, 0x4EE7).unopenable();
        let record = UsbDeviceRecord::new(0x18D1, 0x4EE7, "AAA".into(), device.clone());

        assert!(matches!(
            forward_audio(&record),
            Err(Error::DeviceOpen {
                source: rusb::Error::Access,
                ..
            })
        ));
        assert!(device.requests().is_empty());
        record.close();
    }
}
