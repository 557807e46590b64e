//! Reservation Workflow state.
//!
//! ```text
//! IDLE ─hold─▶ AUTHENTICATING ─▶ HOLDING ─▶ HELD
//! HELD/IDLE ─book─▶ RESOLVING_HOLDS ─▶ AUTHENTICATING ─▶ BOOKING ─▶ BOOKED
//! HELD/IDLE ─release─▶ AUTHENTICATING ─▶ RELEASING ─▶ IDLE
//! any in-flight phase ─failure─▶ IDLE
//! ```
//!
//! Only one attempt may be in flight; a request that arrives meanwhile is
//! rejected without touching the running attempt.

use crate::error::BookingError;
use crate::types::CorrelationId;
use chrono::{DateTime, Utc};
use showtime_client::{SeatKey, ShowId};

/// Where the current (or last) reservation attempt stands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WorkflowPhase {
    /// Nothing in flight
    #[default]
    Idle,
    /// Running the login/register chain
    Authenticating,
    /// Hold batch sent
    Holding,
    /// Hold batch succeeded
    Held,
    /// Re-reading the snapshot to find the live holds to book
    ResolvingHolds,
    /// Book batch sent
    Booking,
    /// Book batch succeeded
    Booked,
    /// Release batch sent
    Releasing,
}

impl WorkflowPhase {
    /// Whether an attempt is running
    #[must_use]
    pub const fn is_busy(self) -> bool {
        !matches!(self, Self::Idle | Self::Held | Self::Booked)
    }
}

/// The mutating call to make once authentication succeeds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingStep {
    /// Hold these seats
    Hold {
        /// Show
        show_id: ShowId,
        /// Seats, in selection order
        seats: Vec<SeatKey>,
    },
    /// Book these live holds
    Book {
        /// Show
        show_id: ShowId,
        /// Seats the fresh snapshot reports HELD
        seats: Vec<SeatKey>,
    },
    /// Release these holds
    Release {
        /// Show
        show_id: ShowId,
        /// Seats to give back
        seats: Vec<SeatKey>,
    },
}

impl PendingStep {
    /// Phase while this step's batch call is in flight
    #[must_use]
    pub const fn phase(&self) -> WorkflowPhase {
        match self {
            Self::Hold { .. } => WorkflowPhase::Holding,
            Self::Book { .. } => WorkflowPhase::Booking,
            Self::Release { .. } => WorkflowPhase::Releasing,
        }
    }

    /// Show the batch targets
    #[must_use]
    pub const fn show_id(&self) -> ShowId {
        match self {
            Self::Hold { show_id, .. }
            | Self::Book { show_id, .. }
            | Self::Release { show_id, .. } => *show_id,
        }
    }

    /// Verb for log lines
    #[must_use]
    pub const fn verb(&self) -> &'static str {
        match self {
            Self::Hold { .. } => "hold",
            Self::Book { .. } => "book",
            Self::Release { .. } => "release",
        }
    }
}

/// The reservation attempt, at most one at a time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Workflow {
    phase: WorkflowPhase,
    in_flight: Option<CorrelationId>,
    held_until: Option<DateTime<Utc>>,
    last_error: Option<BookingError>,
}

impl Workflow {
    /// Current phase
    #[must_use]
    pub const fn phase(&self) -> WorkflowPhase {
        self.phase
    }

    /// Request currently being served
    #[must_use]
    pub const fn in_flight(&self) -> Option<CorrelationId> {
        self.in_flight
    }

    /// Expiry the service reported for the last successful hold
    #[must_use]
    pub const fn held_until(&self) -> Option<DateTime<Utc>> {
        self.held_until
    }

    /// Failure of the last attempt, cleared when a new one starts
    #[must_use]
    pub const fn last_error(&self) -> Option<&BookingError> {
        self.last_error.as_ref()
    }

    /// Start a new attempt in `phase`.
    ///
    /// # Errors
    ///
    /// `Validation` if another attempt is still running.
    pub fn begin(
        &mut self,
        correlation_id: CorrelationId,
        phase: WorkflowPhase,
    ) -> Result<(), BookingError> {
        if self.phase.is_busy() {
            return Err(BookingError::Validation(
                "Another reservation request is still in progress".to_string(),
            ));
        }
        self.phase = phase;
        self.in_flight = Some(correlation_id);
        self.last_error = None;
        Ok(())
    }

    /// Whether `correlation_id` is the running attempt
    #[must_use]
    pub fn is_current(&self, correlation_id: CorrelationId) -> bool {
        self.in_flight == Some(correlation_id)
    }

    /// Move the running attempt to the next phase
    pub fn advance(&mut self, phase: WorkflowPhase) {
        self.phase = phase;
    }

    /// The hold succeeded
    pub fn held(&mut self, until: Option<DateTime<Utc>>) {
        self.phase = WorkflowPhase::Held;
        self.in_flight = None;
        self.held_until = until;
    }

    /// The booking succeeded
    pub fn booked(&mut self) {
        self.phase = WorkflowPhase::Booked;
        self.in_flight = None;
        self.held_until = None;
    }

    /// The release succeeded
    pub fn released(&mut self) {
        self.phase = WorkflowPhase::Idle;
        self.in_flight = None;
        self.held_until = None;
    }

    /// The attempt failed; back to IDLE so the user can retry
    pub fn failed(&mut self, error: BookingError) {
        self.phase = WorkflowPhase::Idle;
        self.in_flight = None;
        self.last_error = Some(error);
    }
}
