//! Serial-to-source correlation driver

use common::{Error, Result};
use std::cell::RefCell;
use std::rc::Rc;
use tracing::{debug, error};

use super::query::{AudioSourceQuery, SourceLookup};
use super::session::{Connection, PulseSession, SourceSession};

/// Client name announced to the PulseAudio server
pub const APP_NAME: &str = "usbaudio";

/// Pump until the session is connected
pub fn wait_ready<S: SourceSession>(session: &mut S) -> Result<()> {
    loop {
        session.pump().inspect_err(|e| error!("{}", e))?;

        match session.connection() {
            Connection::Ready => return Ok(()),
            Connection::Failed => {
                error!("Connection to PulseAudio server terminated");
                return Err(Error::AudioServerConnection(
                    "connection terminated".to_string(),
                ));
            }
            Connection::Pending => {}
        }
    }
}

/// Find the index of the source whose device serial ends with `_<serial>`
///
/// Returns `SourceNotFound` once the listing completes without a match.
pub fn find_source_index<S: SourceSession>(session: &mut S, serial: &str) -> Result<u32> {
    wait_ready(session)?;

    let query = Rc::new(RefCell::new(AudioSourceQuery::new(serial)));
    let sink = Rc::clone(&query);
    session.list_sources(Box::new(move |event| sink.borrow_mut().observe(event)));

    loop {
        session.pump().inspect_err(|e| error!("{}", e))?;

        let state = query.borrow().state();
        match state {
            SourceLookup::Pending => {}
            SourceLookup::Found(index) => {
                // No further callbacks are needed
                session.cancel_listing();
                return Ok(index);
            }
            SourceLookup::NotFound => {
                debug!("Source listing complete, no source for {}", serial);
                return Err(Error::SourceNotFound(serial.to_string()));
            }
        }
    }
}

/// Connect to the PulseAudio server and resolve the source for `serial`
///
/// The session is torn down before returning, on success and failure alike.
pub fn lookup_source_index(serial: &str) -> Result<u32> {
    let mut session = PulseSession::connect(APP_NAME)?;
    find_source_index(&mut session, serial)
}
