//! # Showtime Testing
//!
//! Testing utilities for the Showtime seat-booking client.
//!
//! This crate provides:
//! - Deterministic clocks ([`FixedClock`], [`ManualClock`])
//! - [`ReducerTest`], a Given-When-Then harness for reducers
//! - [`InMemorySeatInventory`], an in-process imitation of the seat-inventory
//!   service with call recording and fault injection
//! - proptest strategies for seat identifiers
//!
//! ## Example
//!
//! ```ignore
//! use showtime_testing::{InMemorySeatInventory, ManualClock};
//!
//! #[tokio::test]
//! async fn test_hold_then_book() {
//!     let clock = ManualClock::default();
//!     let inventory = InMemorySeatInventory::demo(clock.clone());
//!     let session = BookingSession::new(&config, inventory.shared(), clock.shared());
//!
//!     session.toggle("A1".parse()?).await?;
//!     session.hold_selected().await?;
//!     assert_eq!(inventory.held_by("demo_user_123"), 1);
//! }
//! ```

use chrono::{DateTime, Utc};
use showtime_core::environment::Clock;

pub mod inventory_mock;
pub mod reducer_test;

/// Mock implementations of Environment traits
pub mod mocks {
    use super::{Clock, DateTime, Utc};
    use std::sync::{Arc, Mutex};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use showtime_testing::mocks::FixedClock;
    /// use showtime_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// let time1 = clock.now();
    /// let time2 = clock.now();
    /// assert_eq!(time1, time2); // Always the same!
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    #[must_use]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(epoch())
    }

    #[allow(clippy::expect_used)]
    fn epoch() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
            .expect("hardcoded timestamp should always parse")
            .with_timezone(&Utc)
    }

    /// Clock that only moves when told to
    ///
    /// Clones share the same time, so the in-memory inventory and the
    /// session environment can observe one advancing clock. Used to push
    /// holds past their expiry.
    #[derive(Debug, Clone)]
    pub struct ManualClock {
        time: Arc<Mutex<DateTime<Utc>>>,
    }

    impl ManualClock {
        /// Create a clock starting at `time`
        #[must_use]
        pub fn new(time: DateTime<Utc>) -> Self {
            Self {
                time: Arc::new(Mutex::new(time)),
            }
        }

        /// Move time forward
        ///
        /// # Panics
        ///
        /// Panics if the clock's lock was poisoned by a panicking test.
        #[allow(clippy::unwrap_used)] // Test infrastructure
        pub fn advance(&self, by: chrono::Duration) {
            let mut time = self.time.lock().unwrap();
            *time += by;
        }

        /// This clock as a shareable trait object
        #[must_use]
        pub fn shared(&self) -> Arc<dyn Clock> {
            Arc::new(self.clone())
        }
    }

    impl Default for ManualClock {
        /// Starts at 2025-01-01 00:00:00 UTC
        fn default() -> Self {
            Self::new(epoch())
        }
    }

    impl Clock for ManualClock {
        #[allow(clippy::unwrap_used)] // Test infrastructure
        fn now(&self) -> DateTime<Utc> {
            *self.time.lock().unwrap()
        }
    }
}

/// Test helpers and utilities
pub mod helpers {
    /// Install a `tracing` subscriber that writes through the test harness
    ///
    /// Safe to call from every test; only the first call installs anything.
    /// Honours `RUST_LOG`, defaulting to `debug` for the booking engine.
    pub fn init_test_tracing() {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "warn,showtime_booking=debug".into());
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    }
}

/// Property-based testing utilities
///
/// Strategies for seat identifiers shaped like the service's seat maps:
/// rows `A` to `J`, numbers 1 to 20.
pub mod properties {
    use proptest::prelude::*;
    use showtime_client::SeatKey;

    /// Any single seat
    pub fn seat_key() -> impl Strategy<Value = SeatKey> {
        (0u8..10, 1u32..=20).prop_map(|(row, number)| {
            SeatKey::new(char::from(b'A' + row).to_string(), number)
        })
    }

    /// A sequence of seat toggles, possibly repeating seats
    pub fn toggle_sequence(max_len: usize) -> impl Strategy<Value = Vec<SeatKey>> {
        prop::collection::vec(seat_key(), 0..=max_len)
    }
}

// Re-export commonly used items
pub use inventory_mock::{InMemorySeatInventory, InventoryCall};
pub use mocks::{FixedClock, ManualClock, test_clock};
pub use reducer_test::{ReducerTest, assertions};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock() {
        let clock = test_clock();
        let time1 = clock.now();
        let time2 = clock.now();
        assert_eq!(time1, time2);
    }

    #[test]
    fn test_manual_clock_clones_share_time() {
        let clock = ManualClock::default();
        let observer = clock.clone();
        let start = observer.now();

        clock.advance(chrono::Duration::minutes(11));

        assert_eq!(observer.now() - start, chrono::Duration::minutes(11));
    }
}
