//! Process-wide presence ("typing") state.

use std::sync::atomic::{AtomicBool, Ordering};

/// Presence shown to the remote party
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    /// The bot is working on a request
    Active,
    /// The bot is idle
    Inactive,
}

/// Shared presence flag.
///
/// Concurrent handlers overwrite each other; last writer wins.
#[derive(Debug, Default)]
pub struct PresenceState {
    active: AtomicBool,
}

impl PresenceState {
    /// Create an inactive state
    #[must_use]
    pub const fn new() -> Self {
        Self {
            active: AtomicBool::new(false),
        }
    }

    /// Record a presence change
    pub fn set(&self, presence: Presence) {
        self.active
            .store(presence == Presence::Active, Ordering::Relaxed);
    }

    /// Current presence
    #[must_use]
    pub fn current(&self) -> Presence {
        if self.active.load(Ordering::Relaxed) {
            Presence::Active
        } else {
            Presence::Inactive
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presence_toggles() {
        let state = PresenceState::new();
        assert_eq!(state.current(), Presence::Inactive);

        state.set(Presence::Active);
        assert_eq!(state.current(), Presence::Active);

        state.set(Presence::Inactive);
        assert_eq!(state.current(), Presence::Inactive);
    }
}
