//! PulseAudio client session
//!
//! `SourceSession` is the seam the correlator drives; `PulseSession`
//! implements it over a standard PulseAudio main loop.

use common::{Error, Result};
use libpulse_binding as pulse;
use libpulse_binding::callbacks::ListResult;
use libpulse_binding::context::introspect::SourceInfo;
use libpulse_binding::context::{Context, FlagSet, State};
use libpulse_binding::mainloop::standard::{IterateResult, Mainloop};
use libpulse_binding::operation::Operation;
use libpulse_binding::proplist::properties;
use tracing::{debug, warn};

/// Connection progress as seen between pumps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connection {
    Pending,
    Ready,
    /// Failed or terminated
    Failed,
}

/// One input source reported by the server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDescriptor {
    pub index: u32,
    pub serial: Option<String>,
    pub vendor_id: Option<String>,
    pub product_id: Option<String>,
}

/// Listing callback payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceEvent {
    Source(SourceDescriptor),
    /// No more sources will be reported
    End,
}

/// Event-loop driven audio server session
///
/// Callbacks registered through `list_sources` only run inside `pump`.
pub trait SourceSession {
    /// Run one blocking iteration of the event loop
    fn pump(&mut self) -> Result<()>;

    /// Connection state after the last pump
    fn connection(&self) -> Connection;

    /// Start listing all input sources, delivering events to `sink`
    fn list_sources(&mut self, sink: Box<dyn FnMut(SourceEvent)>);

    /// Best-effort cancellation of the listing in flight
    fn cancel_listing(&mut self);
}

/// PulseAudio session on a standard main loop
///
/// Teardown order is fixed by field order and `Drop`: disconnect, then the
/// pending operation and context, then the main loop.
pub struct PulseSession {
    listing: Option<Operation<dyn FnMut(ListResult<&SourceInfo>)>>,
    context: Context,
    mainloop: Mainloop,
}

impl PulseSession {
    /// Create the main loop and context and start connecting
    ///
    /// The connection completes while pumping; see `correlator::wait_ready`.
    pub fn connect(app_name: &str) -> Result<Self> {
        let mainloop = Mainloop::new().ok_or_else(|| {
            Error::AudioServerConnection("Could not create PulseAudio main loop".to_string())
        })?;

        let mut context = Context::new(&mainloop, app_name).ok_or_else(|| {
            Error::AudioServerConnection("Could not create PulseAudio context".to_string())
        })?;

        context
            .connect(None, FlagSet::NOFLAGS, None)
            .map_err(|e| {
                Error::AudioServerConnection(format!("Could not connect to PulseAudio server: {}", e))
            })?;

        debug!("Connecting to PulseAudio server as {}", app_name);
        Ok(Self {
            listing: None,
            context,
            mainloop,
        })
    }
}

impl SourceSession for PulseSession {
    fn pump(&mut self) -> Result<()> {
        match self.mainloop.iterate(true) {
            IterateResult::Success(dispatched) if dispatched > 0 => Ok(()),
            IterateResult::Success(_) => Err(Error::EventLoop("no events dispatched".to_string())),
            IterateResult::Quit(retval) => {
                Err(Error::EventLoop(format!("main loop quit ({})", retval.0)))
            }
            IterateResult::Err(e) => Err(Error::EventLoop(format!("{}", e))),
        }
    }

    fn connection(&self) -> Connection {
        match self.context.get_state() {
            State::Ready => Connection::Ready,
            State::Failed | State::Terminated => Connection::Failed,
            State::Unconnected | State::Connecting | State::Authorizing | State::SettingName => {
                Connection::Pending
            }
        }
    }

    fn list_sources(&mut self, mut sink: Box<dyn FnMut(SourceEvent)>) {
        let operation = self.context.introspect().get_source_info_list(
            move |result: ListResult<&SourceInfo>| match result {
                ListResult::Item(info) => sink(SourceEvent::Source(SourceDescriptor {
                    index: info.index,
                    serial: info.proplist.get_str(properties::DEVICE_SERIAL),
                    vendor_id: info.proplist.get_str(properties::DEVICE_VENDOR_ID),
                    product_id: info.proplist.get_str(properties::DEVICE_PRODUCT_ID),
                })),
                ListResult::End => sink(SourceEvent::End),
                ListResult::Error => {
                    warn!("PulseAudio source listing ended with an error");
                    sink(SourceEvent::End)
                }
            },
        );

        self.listing = Some(operation);
    }

    fn cancel_listing(&mut self) {
        if let Some(operation) = self.listing.as_mut()
            && operation.get_state() == pulse::operation::State::Running
        {
            operation.cancel();
        }
    }
}

impl Drop for PulseSession {
    fn drop(&mut self) {
        // Disconnect before the context and main loop are released
        self.context.disconnect();
    }
}
