//! Dependencies injected into the session reducer.

use showtime_client::{Credentials, SeatInventory};
use showtime_core::environment::Clock;
use std::sync::Arc;

/// Everything the session reducer needs from the outside world.
#[derive(Clone)]
pub struct SessionEnvironment {
    /// Seat-inventory service
    pub inventory: Arc<dyn SeatInventory>,
    /// Time source for notices
    pub clock: Arc<dyn Clock>,
    /// Identity used by the auth bootstrap
    pub credentials: Credentials,
}

impl SessionEnvironment {
    /// Bundle the session's dependencies
    #[must_use]
    pub fn new(
        inventory: Arc<dyn SeatInventory>,
        clock: Arc<dyn Clock>,
        credentials: Credentials,
    ) -> Self {
        Self {
            inventory,
            clock,
            credentials,
        }
    }
}

impl std::fmt::Debug for SessionEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionEnvironment")
            .field("credentials", &self.credentials)
            .finish_non_exhaustive()
    }
}
