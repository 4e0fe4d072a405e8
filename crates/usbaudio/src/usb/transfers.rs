//! USB control transfer execution
//!
//! Thin seam over synchronous control transfers so the accessory handshake
//! can run against `rusb` handles or a recording double.

use protocol::ControlSetup;
use rusb::{DeviceHandle, UsbContext};
use tracing::trace;

/// Synchronous control transfers on endpoint 0
pub trait ControlTransport {
    /// Device-to-host transfer; returns the number of bytes received
    fn control_in(&mut self, setup: &ControlSetup, buf: &mut [u8]) -> Result<usize, rusb::Error>;

    /// Host-to-device transfer; an empty `data` means no data stage
    fn control_out(&mut self, setup: &ControlSetup, data: &[u8]) -> Result<usize, rusb::Error>;
}

impl<T: UsbContext> ControlTransport for DeviceHandle<T> {
    fn control_in(&mut self, setup: &ControlSetup, buf: &mut [u8]) -> Result<usize, rusb::Error> {
        trace!(
            "Control IN: request_type={:#x}, request={}, value={:#x}, index={:#x}, len={}",
            setup.request_type,
            setup.request,
            setup.value,
            setup.index,
            buf.len()
        );

        self.read_control(
            setup.request_type,
            setup.request,
            setup.value,
            setup.index,
            buf,
            setup.timeout,
        )
    }

    fn control_out(&mut self, setup: &ControlSetup, data: &[u8]) -> Result<usize, rusb::Error> {
        trace!(
            "Control OUT: request_type={:#x}, request={}, value={:#x}, index={:#x}, len={}",
            setup.request_type,
            setup.request,
            setup.value,
            setup.index,
            data.len()
        );

        self.write_control(
            setup.request_type,
            setup.request,
            setup.value,
            setup.index,
            data,
            setup.timeout,
        )
    }
}
