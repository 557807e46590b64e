//! `BookingSession`: request/response façade over the session store.
//!
//! Each request method sends one action with a fresh [`CorrelationId`] and
//! waits for the terminal action carrying the same id. Failures come back as
//! [`BookingError`]; the notice log records them as well.

use crate::config::Config;
use crate::error::BookingError;
use crate::selection::SelectionEntry;
use crate::session::{
    SessionAction, SessionEnvironment, SessionReducer, SessionState, SessionStore,
};
use crate::types::{CorrelationId, Notice, SeatCommand, SeatGrid};
use crate::workflow::WorkflowPhase;
use chrono::{DateTime, NaiveDate, Utc};
use showtime_client::{
    BookReceipt, BookingRecord, HoldReceipt, HttpSeatInventory, Money, SeatInventory, SeatKey,
    Show, ShowId, Ticket,
};
use showtime_core::environment::{Clock, SystemClock};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

/// One user's booking session.
///
/// Cheap to clone; clones drive the same session.
#[derive(Clone)]
pub struct BookingSession {
    store: SessionStore,
    timeout: Duration,
}

impl BookingSession {
    /// Session over any inventory implementation
    #[must_use]
    pub fn new(config: &Config, inventory: Arc<dyn SeatInventory>, clock: Arc<dyn Clock>) -> Self {
        let environment = SessionEnvironment::new(inventory, clock, config.credentials());
        let store = SessionStore::new(
            SessionState::new(config.poll_interval()),
            SessionReducer::new(),
            environment,
        );
        Self {
            store,
            timeout: config.workflow_timeout(),
        }
    }

    /// Session over the HTTP service named in `config`
    ///
    /// # Errors
    ///
    /// `Network` if the base URL is invalid or the HTTP client cannot be built.
    pub fn connect(config: &Config) -> Result<Self, BookingError> {
        let inventory = HttpSeatInventory::new(&config.api.base_url, config.request_timeout())?;
        tracing::info!(base_url = %inventory.base_url(), "Connected to seat inventory");
        Ok(Self::new(config, Arc::new(inventory), Arc::new(SystemClock)))
    }

    /// Send a request and wait for its terminal action
    async fn request(
        &self,
        build: impl FnOnce(CorrelationId) -> SessionAction,
    ) -> Result<SessionAction, BookingError> {
        let correlation_id = CorrelationId::new();
        let outcome = self
            .store
            .send_and_wait_for(
                build(correlation_id),
                move |action| action.finishes(correlation_id),
                self.timeout,
            )
            .await?;

        match outcome.failure() {
            Some(error) => Err(error.clone()),
            None => Ok(outcome),
        }
    }

    fn unexpected(outcome: &SessionAction) -> BookingError {
        BookingError::Service(format!("Unexpected outcome: {outcome:?}"))
    }

    // ========== Catalog Store ==========

    /// List shows, optionally only those starting on `date`
    ///
    /// # Errors
    ///
    /// `Network` if the listing cannot be fetched.
    pub async fn load_catalog(&self, date: Option<NaiveDate>) -> Result<Vec<Show>, BookingError> {
        match self
            .request(|correlation_id| SessionAction::LoadCatalog {
                correlation_id,
                date,
            })
            .await?
        {
            SessionAction::CatalogLoaded { shows, .. } => Ok(shows),
            other => Err(Self::unexpected(&other)),
        }
    }

    /// Make `show_id` active and wait for its first seat map.
    ///
    /// Returns `None` if the first fetch failed; the Poll Loop will retry.
    ///
    /// # Errors
    ///
    /// `NotFound` if the show is not in the last listing.
    pub async fn select_show(&self, show_id: ShowId) -> Result<Option<SeatGrid>, BookingError> {
        match self
            .request(|correlation_id| SessionAction::SelectShow {
                correlation_id,
                show_id,
            })
            .await
        {
            Ok(_) | Err(BookingError::Network(_)) => Ok(self.grid().await),
            Err(error) => Err(error),
        }
    }

    /// Fetch the active show's seats now
    ///
    /// # Errors
    ///
    /// `Validation` without an active show, `Network` if the fetch fails.
    pub async fn refresh(&self) -> Result<Option<SeatGrid>, BookingError> {
        self.request(|correlation_id| SessionAction::RefreshSeats {
            correlation_id: Some(correlation_id),
        })
        .await?;
        Ok(self.grid().await)
    }

    // ========== Selection Model ==========

    /// Apply one seat input
    ///
    /// # Errors
    ///
    /// `Session` if the store is shutting down.
    pub async fn seat_input(&self, seat: SeatKey, command: SeatCommand) -> Result<(), BookingError> {
        self.store
            .send(SessionAction::SeatInput { seat, command })
            .await?;
        Ok(())
    }

    /// Toggle a seat; returns whether it is selected afterwards
    ///
    /// # Errors
    ///
    /// `Session` if the store is shutting down.
    pub async fn toggle(&self, seat: SeatKey) -> Result<bool, BookingError> {
        self.seat_input(seat.clone(), SeatCommand::Toggle).await?;
        Ok(self.store.state(|state| state.selection.contains(&seat)).await)
    }

    /// Empty the selection
    ///
    /// # Errors
    ///
    /// `Session` if the store is shutting down.
    pub async fn clear_selection(&self) -> Result<(), BookingError> {
        self.store.send(SessionAction::ClearSelection).await?;
        Ok(())
    }

    // ========== Reservation Workflow ==========

    /// Hold every selected seat in one batch
    ///
    /// # Errors
    ///
    /// `Validation` (no show, empty selection, request in flight), `Auth`,
    /// `Service` (a seat is taken) or `Network`.
    pub async fn hold_selected(&self) -> Result<HoldReceipt, BookingError> {
        match self
            .request(|correlation_id| SessionAction::HoldSelected { correlation_id })
            .await?
        {
            SessionAction::HoldSucceeded { receipt, .. } => Ok(receipt),
            other => Err(Self::unexpected(&other)),
        }
    }

    /// Book every live hold of the active show
    ///
    /// # Errors
    ///
    /// `NothingToBook` if the fresh snapshot has no live hold, otherwise as
    /// [`hold_selected`](Self::hold_selected).
    pub async fn book_held(&self) -> Result<BookReceipt, BookingError> {
        match self
            .request(|correlation_id| SessionAction::BookHeld { correlation_id })
            .await?
        {
            SessionAction::BookSucceeded { receipt, .. } => Ok(receipt),
            other => Err(Self::unexpected(&other)),
        }
    }

    /// Give back the selected seats that are held
    ///
    /// # Errors
    ///
    /// `Validation` if no selected seat is held, otherwise as
    /// [`hold_selected`](Self::hold_selected).
    pub async fn release_selected(&self) -> Result<Vec<SeatKey>, BookingError> {
        match self
            .request(|correlation_id| SessionAction::ReleaseHeld { correlation_id })
            .await?
        {
            SessionAction::ReleaseSucceeded { seats, .. } => Ok(seats),
            other => Err(Self::unexpected(&other)),
        }
    }

    // ========== Account ==========

    /// Bookings of the session's account
    ///
    /// # Errors
    ///
    /// `Auth` or `Network`.
    pub async fn my_bookings(&self) -> Result<Vec<BookingRecord>, BookingError> {
        match self
            .request(|correlation_id| SessionAction::LoadBookings { correlation_id })
            .await?
        {
            SessionAction::BookingsLoaded { bookings, .. } => Ok(bookings),
            other => Err(Self::unexpected(&other)),
        }
    }

    /// Ticket for one booking
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown booking, `Network` on transport failure.
    pub async fn ticket(&self, booking_id: i64) -> Result<Ticket, BookingError> {
        match self
            .request(|correlation_id| SessionAction::LoadTicket {
                correlation_id,
                booking_id,
            })
            .await?
        {
            SessionAction::TicketLoaded { ticket, .. } => Ok(ticket),
            other => Err(Self::unexpected(&other)),
        }
    }

    /// End the service's login session
    ///
    /// # Errors
    ///
    /// `Network` on transport failure.
    pub async fn logout(&self) -> Result<(), BookingError> {
        self.request(|correlation_id| SessionAction::Logout { correlation_id })
            .await?;
        Ok(())
    }

    // ========== Poll Loop ==========

    /// Start refreshing the active show every poll interval
    ///
    /// # Errors
    ///
    /// `Session` if the store is shutting down.
    pub async fn start_polling(&self) -> Result<(), BookingError> {
        self.store.send(SessionAction::StartPolling).await?;
        Ok(())
    }

    /// Stop the Poll Loop
    ///
    /// # Errors
    ///
    /// `Session` if the store is shutting down.
    pub async fn stop_polling(&self) -> Result<(), BookingError> {
        self.store.send(SessionAction::StopPolling).await?;
        Ok(())
    }

    // ========== Views ==========

    /// Read session state
    pub async fn state<T>(&self, f: impl FnOnce(&SessionState) -> T) -> T {
        self.store.state(f).await
    }

    /// Seat map of the active show
    pub async fn grid(&self) -> Option<SeatGrid> {
        self.store.state(|state| state.grid.clone()).await
    }

    /// Last-listed shows
    pub async fn shows(&self) -> Vec<Show> {
        self.store.state(|state| state.catalog.shows().to_vec()).await
    }

    /// The active show
    pub async fn active_show(&self) -> Option<Show> {
        self.store.state(|state| state.catalog.active().cloned()).await
    }

    /// Selected seats in selection order
    pub async fn selection(&self) -> Vec<SelectionEntry> {
        self.store
            .state(|state| state.selection.entries().to_vec())
            .await
    }

    /// Price of the selection at the active show's price
    pub async fn selection_total(&self) -> Money {
        self.store.state(SessionState::selection_total).await
    }

    /// Reservation Workflow phase
    pub async fn phase(&self) -> WorkflowPhase {
        self.store.state(|state| state.workflow.phase()).await
    }

    /// Expiry reported for the last successful hold
    pub async fn held_until(&self) -> Option<DateTime<Utc>> {
        self.store.state(|state| state.workflow.held_until()).await
    }

    /// The newest `limit` notices, newest first
    pub async fn notices(&self, limit: usize) -> Vec<Notice> {
        self.store
            .state(|state| state.notices.iter().take(limit).cloned().collect())
            .await
    }

    /// Every action produced by the session's effects, after it was applied
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SessionAction> {
        self.store.subscribe_actions()
    }

    /// Stop polling and wait for in-flight calls to finish
    ///
    /// # Errors
    ///
    /// `Session` if calls are still running after the workflow timeout.
    pub async fn shutdown(&self) -> Result<(), BookingError> {
        if let Err(error) = self.store.send(SessionAction::StopPolling).await {
            // Already shutting down; the poll chain is retired with the store
            tracing::debug!(%error, "Poll loop not stopped");
        }
        self.store.shutdown(self.timeout).await?;
        Ok(())
    }
}

impl std::fmt::Debug for BookingSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BookingSession")
            .field("timeout", &self.timeout)
            .field("pending_effects", &self.store.pending_effects())
            .finish_non_exhaustive()
    }
}
