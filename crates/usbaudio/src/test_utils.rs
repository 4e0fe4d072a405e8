//! Test utilities for usbaudio
//!
//! In-memory stand-ins for the USB bus, devices, control transport and the
//! PulseAudio session, so discovery, negotiation and correlation can be
//! exercised without hardware or a running sound server.
//!
//! # Example
//!
//! ```
//! use protocol::{ADB_INTERFACE, LookupCriterion};
//! use usbaudio::test_utils::{FakeBus, FakeDevice};
//! use usbaudio::usb::find_devices;
//!
//! let phone = FakeDevice::new(0x18D1, 0x4EE7)
//!     .with_configuration(vec![ADB_INTERFACE])
//!     .with_serial("0123ABC");
//! let bus = FakeBus::new(vec![phone]);
//!
//! let found = find_devices(&bus, &LookupCriterion::AdbInterface, 32).unwrap();
//! assert_eq!(found[0].serial, "0123ABC");
//! ```

use common::{Error, Result};
use protocol::{ControlSetup, InterfaceSignature};
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use crate::pulse::{Connection, SourceDescriptor, SourceEvent, SourceSession};
use crate::usb::{ControlTransport, DeviceSummary, SerialError, UsbBus, UsbCandidate};

/// String descriptor index reported for devices with a serial
const FAKE_SERIAL_INDEX: u8 = 3;

/// Fake native device list
#[derive(Debug, Clone, Default)]
pub struct FakeBus {
    devices: Vec<FakeDevice>,
    failure: Option<rusb::Error>,
}

impl FakeBus {
    pub fn new(devices: Vec<FakeDevice>) -> Self {
        Self {
            devices,
            failure: None,
        }
    }

    /// Bus whose device list cannot be retrieved
    pub fn failing(error: rusb::Error) -> Self {
        Self {
            devices: Vec::new(),
            failure: Some(error),
        }
    }
}

impl UsbBus for FakeBus {
    type Device = FakeDevice;

    fn devices(&self) -> std::result::Result<Vec<FakeDevice>, rusb::Error> {
        match self.failure {
            Some(error) => Err(error),
            None => Ok(self.devices.clone()),
        }
    }
}

/// Fake USB device
///
/// Clones share the transfer log and reference counter, so a test can keep
/// one copy to observe what the code under test did with another.
#[derive(Debug, Clone)]
pub struct FakeDevice {
    vendor_id: u16,
    product_id: u16,
    serial: Option<String>,
    serial_readable: bool,
    openable: bool,
    /// `None` entries fail to load
    configurations: Vec<Option<Vec<InterfaceSignature>>>,
    version_response: Vec<u8>,
    failing_request: Option<(u8, rusb::Error)>,
    transfers: Rc<RefCell<Vec<ControlSetup>>>,
    serial_reads: Rc<Cell<usize>>,
    references: Rc<()>,
}

impl FakeDevice {
    /// Openable device with no serial, no configurations and AOA version 2
    pub fn new(vendor_id: u16, product_id: u16) -> Self {
        Self {
            vendor_id,
            product_id,
            serial: None,
            serial_readable: true,
            openable: true,
            configurations: Vec::new(),
            version_response: vec![2, 0],
            failing_request: None,
            transfers: Rc::new(RefCell::new(Vec::new())),
            serial_reads: Rc::new(Cell::new(0)),
            references: Rc::new(()),
        }
    }

    pub fn with_serial(mut self, serial: &str) -> Self {
        self.serial = Some(serial.to_string());
        self
    }

    /// Serial index present but the string descriptor read fails
    pub fn with_unreadable_serial(mut self, serial: &str) -> Self {
        self.serial = Some(serial.to_string());
        self.serial_readable = false;
        self
    }

    /// Append a configuration whose interfaces have the given signatures
    pub fn with_configuration(mut self, signatures: Vec<InterfaceSignature>) -> Self {
        self.configurations.push(Some(signatures));
        self
    }

    /// Append a configuration whose descriptor cannot be read
    pub fn with_broken_configuration(mut self) -> Self {
        self.configurations.push(None);
        self
    }

    pub fn unopenable(mut self) -> Self {
        self.openable = false;
        self
    }

    pub fn with_aoa_version(mut self, version: u16) -> Self {
        self.version_response = version.to_le_bytes().to_vec();
        self
    }

    /// Raw `GET_PROTOCOL` response bytes
    pub fn with_version_response(mut self, data: &[u8]) -> Self {
        self.version_response = data.to_vec();
        self
    }

    /// Make every transfer with this request code fail
    pub fn failing_request(mut self, request: u8, error: rusb::Error) -> Self {
        self.failing_request = Some((request, error));
        self
    }

    /// Setup packets issued on any handle opened from this device
    pub fn transfers(&self) -> Vec<ControlSetup> {
        self.transfers.borrow().clone()
    }

    /// Request codes issued, in order
    pub fn requests(&self) -> Vec<u8> {
        self.transfers.borrow().iter().map(|s| s.request).collect()
    }

    /// Number of serial reads attempted
    pub fn serial_reads(&self) -> usize {
        self.serial_reads.get()
    }

    /// Number of live copies of this device, the stand-in for the native refcount
    pub fn live_references(&self) -> usize {
        Rc::strong_count(&self.references)
    }
}

impl UsbCandidate for FakeDevice {
    type Handle = RecordingTransport;

    fn summary(&self) -> std::result::Result<DeviceSummary, rusb::Error> {
        Ok(DeviceSummary {
            vendor_id: self.vendor_id,
            product_id: self.product_id,
            serial_index: self.serial.as_ref().map(|_| FAKE_SERIAL_INDEX),
            num_configurations: self.configurations.len() as u8,
        })
    }

    fn interface_signatures(
        &self,
        config_index: u8,
    ) -> std::result::Result<Vec<InterfaceSignature>, rusb::Error> {
        match self.configurations.get(usize::from(config_index)) {
            Some(Some(signatures)) => Ok(signatures.clone()),
            Some(None) => Err(rusb::Error::Io),
            None => Err(rusb::Error::NotFound),
        }
    }

    fn read_serial(&self, _summary: &DeviceSummary) -> std::result::Result<String, SerialError> {
        self.serial_reads.set(self.serial_reads.get() + 1);

        if !self.openable {
            return Err(SerialError::Open(rusb::Error::Access));
        }
        let serial = self.serial.as_ref().ok_or(SerialError::NoSerialIndex)?;
        if !self.serial_readable {
            return Err(SerialError::Read(rusb::Error::Pipe));
        }
        Ok(serial.clone())
    }

    fn open(&self) -> std::result::Result<RecordingTransport, rusb::Error> {
        if !self.openable {
            return Err(rusb::Error::Access);
        }

        Ok(RecordingTransport {
            version_response: self.version_response.clone(),
            failing_request: self.failing_request,
            transfers: Rc::clone(&self.transfers),
        })
    }
}

/// Control transport that records every setup packet
#[derive(Debug)]
pub struct RecordingTransport {
    version_response: Vec<u8>,
    failing_request: Option<(u8, rusb::Error)>,
    transfers: Rc<RefCell<Vec<ControlSetup>>>,
}

impl RecordingTransport {
    fn record(&self, setup: &ControlSetup) -> std::result::Result<(), rusb::Error> {
        self.transfers.borrow_mut().push(*setup);

        match self.failing_request {
            Some((request, error)) if request == setup.request => Err(error),
            _ => Ok(()),
        }
    }
}

impl ControlTransport for RecordingTransport {
    fn control_in(
        &mut self,
        setup: &ControlSetup,
        buf: &mut [u8],
    ) -> std::result::Result<usize, rusb::Error> {
        self.record(setup)?;

        let len = buf.len().min(self.version_response.len());
        buf[..len].copy_from_slice(&self.version_response[..len]);
        Ok(len)
    }

    fn control_out(
        &mut self,
        setup: &ControlSetup,
        data: &[u8],
    ) -> std::result::Result<usize, rusb::Error> {
        self.record(setup)?;
        Ok(data.len())
    }
}

/// Scripted audio server session
///
/// Each pump first consumes one scripted connection state; once the script
/// is exhausted, pumps deliver up to `batch` sources and then the end of
/// the listing.
pub struct ScriptedSession {
    connection_script: VecDeque<Connection>,
    connection: Connection,
    sources: VecDeque<SourceDescriptor>,
    batch: usize,
    sink: Option<Box<dyn FnMut(SourceEvent)>>,
    end_delivered: bool,
    cancelled: bool,
    fail_on_pump: Option<usize>,
    pumps: usize,
}

impl ScriptedSession {
    /// Session that becomes ready after one pump and reports `sources` one per pump
    pub fn new(sources: Vec<SourceDescriptor>) -> Self {
        Self {
            connection_script: VecDeque::from([Connection::Pending, Connection::Ready]),
            connection: Connection::Pending,
            sources: sources.into(),
            batch: 1,
            sink: None,
            end_delivered: false,
            cancelled: false,
            fail_on_pump: None,
            pumps: 0,
        }
    }

    /// Replace the connection states observed after successive pumps
    pub fn with_connection_script(mut self, states: Vec<Connection>) -> Self {
        self.connection_script = states.into();
        self
    }

    /// Deliver up to `batch` sources per pump
    pub fn with_batch(mut self, batch: usize) -> Self {
        self.batch = batch.max(1);
        self
    }

    /// Make the n-th pump (1-based) fail
    pub fn failing_on_pump(mut self, pump: usize) -> Self {
        self.fail_on_pump = Some(pump);
        self
    }

    pub fn was_cancelled(&self) -> bool {
        self.cancelled
    }

    pub fn pumps(&self) -> usize {
        self.pumps
    }

    pub fn listing_requested(&self) -> bool {
        self.sink.is_some()
    }

    fn deliver(&mut self) {
        if self.cancelled || self.end_delivered {
            return;
        }
        let Some(sink) = self.sink.as_mut() else {
            return;
        };

        for _ in 0..self.batch {
            match self.sources.pop_front() {
                Some(source) => sink(SourceEvent::Source(source)),
                None => {
                    sink(SourceEvent::End);
                    self.end_delivered = true;
                    return;
                }
            }
        }
    }
}

impl SourceSession for ScriptedSession {
    fn pump(&mut self) -> Result<()> {
        self.pumps += 1;
        if self.fail_on_pump == Some(self.pumps) {
            return Err(Error::EventLoop("scripted failure".to_string()));
        }

        if let Some(state) = self.connection_script.pop_front() {
            self.connection = state;
            return Ok(());
        }

        self.deliver();
        Ok(())
    }

    fn connection(&self) -> Connection {
        self.connection
    }

    fn list_sources(&mut self, sink: Box<dyn FnMut(SourceEvent)>) {
        self.sink = Some(sink);
    }

    fn cancel_listing(&mut self) {
        self.cancelled = true;
    }
}

/// Source descriptor with the given index and device serial
pub fn source(index: u32, serial: Option<&str>) -> SourceDescriptor {
    SourceDescriptor {
        index,
        serial: serial.map(str::to_string),
        vendor_id: Some("18d1".to_string()),
        product_id: Some("2d05".to_string()),
    }
}
