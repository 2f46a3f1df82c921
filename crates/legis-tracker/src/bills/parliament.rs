use tracing::{info, warn};

/// Parliament number encoded in a session code: the integer before the first `-`.
pub fn parliament_of(session: &str) -> Option<u32> {
    session.split('-').next()?.trim().parse().ok()
}

/// Highest parliament number present in a batch of session codes.
pub fn detect_parliament<'a, I>(sessions: I) -> Option<u32>
where
    I: IntoIterator<Item = &'a str>,
{
    sessions.into_iter().filter_map(parliament_of).max()
}

/// Tracks the current parliament. The value only ever moves forward, so a
/// partial batch of older sessions cannot roll it back.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParliamentTracker {
    current: Option<u32>,
}

impl ParliamentTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<u32> {
        self.current
    }

    /// Feeds one batch maximum into the tracker and returns the tracked value.
    pub fn observe(&mut self, detected: Option<u32>) -> Option<u32> {
        match (self.current, detected) {
            (None, Some(value)) => {
                info!(parliament = value, "current parliament detected");
                self.current = Some(value);
            }
            (Some(current), Some(value)) if value > current => {
                info!(from = current, to = value, "new parliament detected");
                self.current = Some(value);
            }
            (Some(current), Some(value)) if value < current => {
                warn!(
                    tracked = current,
                    observed = value,
                    "feed batch only held older sessions; keeping tracked parliament"
                );
            }
            _ => {}
        }
        self.current
    }
}
