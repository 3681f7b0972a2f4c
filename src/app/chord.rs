use std::time::{Duration, Instant};

/// A key held for a short time so the next key can complete a two-key command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chord {
    pub key: char,
    pub deadline: Instant,
}

impl Chord {
    pub fn new(key: char, now: Instant, timeout: Duration) -> Self {
        Chord {
            key,
            deadline: now + timeout,
        }
    }

    /// Still pending at `now`?
    pub fn is_live(&self, now: Instant) -> bool {
        now < self.deadline
    }
}
