//! Audio-source correlation
//!
//! Maps a USB serial number to the index of the PulseAudio input source the
//! device exposes once it forwards audio.
//!
//! The session owns a standard (non-threaded) PulseAudio main loop. Callbacks
//! only run inside `SourceSession::pump`, so the lookup state is plain
//! `Rc<RefCell<_>>` and is only read between pumps.

pub mod correlator;
pub mod query;
pub mod session;

pub use correlator::{find_source_index, lookup_source_index, wait_ready};
pub use query::{AudioSourceQuery, SourceLookup, matches_serial_suffix};
pub use session::{Connection, PulseSession, SourceDescriptor, SourceEvent, SourceSession};
