//! Source lookup state

use tracing::{debug, info};

use super::session::{SourceDescriptor, SourceEvent};

/// Result of one source lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceLookup {
    Pending,
    Found(u32),
    NotFound,
}

/// Correlation state for one source listing
///
/// Moves from `Pending` to `Found` or `NotFound` and never back. A later
/// matching source overwrites an earlier `Found` until the listing is
/// cancelled.
#[derive(Debug)]
pub struct AudioSourceQuery {
    serial: String,
    state: SourceLookup,
}

impl AudioSourceQuery {
    pub fn new(serial: &str) -> Self {
        Self {
            serial: serial.to_string(),
            state: SourceLookup::Pending,
        }
    }

    pub fn state(&self) -> SourceLookup {
        self.state
    }

    /// Feed one listing event
    pub fn observe(&mut self, event: SourceEvent) {
        if self.state == SourceLookup::NotFound {
            return;
        }

        match event {
            SourceEvent::Source(source) => self.observe_source(&source),
            SourceEvent::End => {
                if self.state == SourceLookup::Pending {
                    self.state = SourceLookup::NotFound;
                }
            }
        }
    }

    fn observe_source(&mut self, source: &SourceDescriptor) {
        let Some(serial) = source.serial.as_deref() else {
            return;
        };
        debug!("{} ? {}", self.serial, serial);

        if matches_serial_suffix(serial, &self.serial) {
            self.state = SourceLookup::Found(source.index);
            info!(
                "Matching PulseAudio input source found: {} ({}:{}) {}",
                source.index,
                source.vendor_id.as_deref().unwrap_or("?"),
                source.product_id.as_deref().unwrap_or("?"),
                serial
            );
        }
    }
}

/// True if `reported` ends with `_` followed by exactly `requested`
///
/// PulseAudio names the device serial `manufacturer_model_serial`, so the USB
/// serial only appears as the tail after an underscore.
pub fn matches_serial_suffix(reported: &str, requested: &str) -> bool {
    reported
        .strip_suffix(requested)
        .is_some_and(|prefix| prefix.ends_with('_'))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(index: u32, serial: Option<&str>) -> SourceEvent {
        SourceEvent::Source(SourceDescriptor {
            index,
            serial: serial.map(str::to_string),
            vendor_id: None,
            product_id: None,
        })
    }

    #[test]
    fn test_suffix_match() {
        assert!(matches_serial_suffix("Vendor_Model_ABC123", "ABC123"));
        assert!(!matches_serial_suffix("Vendor_Model_XABC123", "ABC123"));
        assert!(!matches_serial_suffix("ABC123", "ABC123"));
        assert!(!matches_serial_suffix("Vendor_Model_abc123", "ABC123"));
        assert!(!matches_serial_suffix("Vendor_Model_ABC123_", "ABC123"));
    }

    #[test]
    fn test_found_then_end_keeps_found() {
        let mut query = AudioSourceQuery::new("ABC123");
        query.observe(source(4, Some("Google_Pixel_ABC123")));
        query.observe(SourceEvent::End);
        assert_eq!(query.state(), SourceLookup::Found(4));
    }

    #[test]
    fn test_end_without_match() {
        let mut query = AudioSourceQuery::new("ABC123");
        query.observe(source(1, Some("Intel_HDA_0000")));
        query.observe(source(2, None));
        assert_eq!(query.state(), SourceLookup::Pending);
        query.observe(SourceEvent::End);
        assert_eq!(query.state(), SourceLookup::NotFound);
    }

    #[test]
    fn test_last_match_wins() {
        let mut query = AudioSourceQuery::new("ABC123");
        query.observe(source(3, Some("Google_Pixel_ABC123")));
        query.observe(source(7, Some("Google_Pixel_2_ABC123")));
        assert_eq!(query.state(), SourceLookup::Found(7));
    }

    #[test]
    fn test_not_found_is_terminal() {
        let mut query = AudioSourceQuery::new("ABC123");
        query.observe(SourceEvent::End);
        query.observe(source(3, Some("Google_Pixel_ABC123")));
        assert_eq!(query.state(), SourceLookup::NotFound);
    }
}
