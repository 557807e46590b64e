//! Auth Bootstrapper.
//!
//! Runs before every mutating call. Logs in with the configured identity; if
//! the service does not know it, registers it and logs in once more.

use crate::error::BookingError;
use showtime_client::{Credentials, InventoryError, SeatInventory};

/// What the session knows about its login.
///
/// There is no failed state: a failed bootstrap leaves the phase at
/// `Unknown` and the next attempt starts the chain from scratch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AuthPhase {
    /// No successful bootstrap yet, or the session was dropped
    #[default]
    Unknown,
    /// The last bootstrap succeeded
    Authenticated,
}

/// Make sure the service holds a login session for `credentials`.
///
/// 1. log in
/// 2. on 401 only: register (a rejection is logged, not fatal), log in again
///
/// # Errors
///
/// `BookingError::Auth` if the first login fails with anything other than
/// 401, or if the retried login fails.
#[tracing::instrument(skip_all, fields(username = %credentials.username))]
pub async fn ensure_authenticated(
    inventory: &dyn SeatInventory,
    credentials: &Credentials,
) -> Result<(), BookingError> {
    match inventory.login(credentials).await {
        Ok(()) => {
            tracing::debug!("Login accepted");
            return Ok(());
        },
        Err(InventoryError::Unauthorized) => {
            tracing::info!("Identity unknown to the service, registering");
        },
        Err(error) => return Err(BookingError::Auth(error.to_string())),
    }

    if let Err(error) = inventory.register(credentials).await {
        tracing::debug!(%error, "Registration rejected, retrying login anyway");
    }

    inventory
        .login(credentials)
        .await
        .map_err(|error| BookingError::Auth(error.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code
mod tests {
    use super::*;
    use showtime_testing::{InMemorySeatInventory, InventoryCall, ManualClock};

    fn demo_identity() -> Credentials {
        Credentials::new("demo_user_123", "demo_pass_123")
    }

    #[tokio::test]
    async fn test_known_identity_logs_in_once() {
        let inventory = InMemorySeatInventory::demo(ManualClock::default());

        ensure_authenticated(&inventory, &demo_identity()).await.unwrap();

        assert_eq!(
            inventory.calls(),
            vec![InventoryCall::Login("demo_user_123".into())]
        );
    }

    #[tokio::test]
    async fn test_unknown_identity_registers_then_retries() {
        let inventory = InMemorySeatInventory::new(ManualClock::default());

        ensure_authenticated(&inventory, &demo_identity()).await.unwrap();

        assert_eq!(
            inventory.calls(),
            vec![
                InventoryCall::Login("demo_user_123".into()),
                InventoryCall::Register("demo_user_123".into()),
                InventoryCall::Login("demo_user_123".into()),
            ]
        );
        assert_eq!(inventory.session_user().as_deref(), Some("demo_user_123"));
    }

    #[tokio::test]
    async fn test_second_login_failure_is_auth_error() {
        let inventory = InMemorySeatInventory::demo(ManualClock::default());
        inventory.reject_logins(true);

        let result = ensure_authenticated(&inventory, &demo_identity()).await;

        assert!(matches!(result, Err(BookingError::Auth(_))));
        assert_eq!(inventory.count_calls(|c| matches!(c, InventoryCall::Login(_))), 2);
        assert_eq!(inventory.count_calls(|c| matches!(c, InventoryCall::Register(_))), 1);
    }
}
