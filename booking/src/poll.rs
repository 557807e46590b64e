//! Poll Loop state.
//!
//! The loop is a chain of delayed `PollTick` actions. Each chain carries a
//! generation; starting, stopping or redirecting the loop bumps the
//! generation, so a tick from an older chain ends that chain instead of
//! running alongside the new one.

use std::time::Duration;

/// Poll Loop bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollLoop {
    interval: Duration,
    enabled: bool,
    generation: u64,
}

impl PollLoop {
    /// A stopped loop that will tick every `interval` once started
    #[must_use]
    pub const fn new(interval: Duration) -> Self {
        Self {
            interval,
            enabled: false,
            generation: 0,
        }
    }

    /// Tick period
    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Whether the loop is running
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Generation of the live chain
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Start the loop. Returns the generation of the new chain, or `None` if
    /// a chain is already running.
    pub fn start(&mut self) -> Option<u64> {
        if self.enabled {
            return None;
        }
        self.enabled = true;
        self.generation += 1;
        Some(self.generation)
    }

    /// Stop the loop; the pending tick of the old chain will be ignored
    pub fn stop(&mut self) {
        self.enabled = false;
        self.generation += 1;
    }

    /// Replace the running chain with a new one (active show changed).
    /// Returns the new generation, or `None` if the loop is stopped.
    pub fn redirect(&mut self) -> Option<u64> {
        if !self.enabled {
            return None;
        }
        self.generation += 1;
        Some(self.generation)
    }

    /// Whether a tick from chain `generation` should fire
    #[must_use]
    pub const fn is_live(&self, generation: u64) -> bool {
        self.enabled && self.generation == generation
    }
}

impl Default for PollLoop {
    fn default() -> Self {
        Self::new(Duration::from_secs(5))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_is_not_stacked() {
        let mut poll = PollLoop::default();

        assert_eq!(poll.start(), Some(1));
        assert_eq!(poll.start(), None);
        assert!(poll.is_live(1));
    }

    #[test]
    fn test_redirect_retires_old_chain() {
        let mut poll = PollLoop::default();
        let old = poll.start().unwrap_or_default();

        let new = poll.redirect().unwrap_or_default();

        assert!(!poll.is_live(old));
        assert!(poll.is_live(new));
    }

    #[test]
    fn test_stop_ends_chain_and_redirect_is_noop() {
        let mut poll = PollLoop::default();
        let generation = poll.start().unwrap_or_default();

        poll.stop();

        assert!(!poll.is_live(generation));
        assert_eq!(poll.redirect(), None);
        assert_eq!(poll.start(), Some(generation + 2));
    }
}
