//! Actions for the booking session.

use crate::error::BookingError;
use crate::types::{CorrelationId, SeatCommand};
use crate::workflow::PendingStep;
use chrono::NaiveDate;
use showtime_client::{
    BookReceipt, BookingRecord, HoldReceipt, SeatKey, Show, ShowId, Snapshot, Ticket,
};

/// Everything that can happen to a session.
///
/// User requests carry a [`CorrelationId`]; the action that finishes a
/// request (see [`SessionAction::is_terminal`]) echoes it.
#[derive(Debug, Clone)]
pub enum SessionAction {
    // ----- Catalog Store -----
    /// List shows, optionally for one date
    LoadCatalog {
        /// Request id
        correlation_id: CorrelationId,
        /// Only shows starting on this date
        date: Option<NaiveDate>,
    },
    /// The listing arrived
    CatalogLoaded {
        /// Request id
        correlation_id: CorrelationId,
        /// Shows in service order
        shows: Vec<Show>,
    },
    /// The listing failed
    CatalogFailed {
        /// Request id
        correlation_id: CorrelationId,
        /// Why
        error: BookingError,
    },
    /// Make a listed show active
    SelectShow {
        /// Request id
        correlation_id: CorrelationId,
        /// Show to activate
        show_id: ShowId,
    },

    // ----- Seat Snapshot Fetcher / Reconciler -----
    /// Fetch the active show's seats now
    RefreshSeats {
        /// Request id, if a caller waits for the result
        correlation_id: Option<CorrelationId>,
    },
    /// A snapshot arrived
    SnapshotLoaded {
        /// Request id of the refresh that asked for it
        correlation_id: Option<CorrelationId>,
        /// Show it belongs to
        show_id: ShowId,
        /// Sequence stamped when the fetch was issued
        sequence: u64,
        /// Raw snapshot
        snapshot: Snapshot,
    },
    /// A snapshot fetch failed; the grid is left as it was
    SnapshotFailed {
        /// Request id of the refresh that asked for it
        correlation_id: Option<CorrelationId>,
        /// Show it was for
        show_id: ShowId,
        /// Sequence stamped when the fetch was issued
        sequence: u64,
        /// Why
        error: BookingError,
    },

    // ----- Poll Loop -----
    /// Start periodic refreshes
    StartPolling,
    /// Stop periodic refreshes
    StopPolling,
    /// One period elapsed for chain `generation`
    PollTick {
        /// Chain that scheduled this tick
        generation: u64,
    },

    // ----- Selection Model -----
    /// Seat input from the rendering layer
    SeatInput {
        /// Seat
        seat: SeatKey,
        /// What to do with it
        command: SeatCommand,
    },
    /// Empty the selection
    ClearSelection,

    // ----- Reservation Workflow -----
    /// Hold every selected seat
    HoldSelected {
        /// Request id
        correlation_id: CorrelationId,
    },
    /// Book the live holds of the active show
    BookHeld {
        /// Request id
        correlation_id: CorrelationId,
    },
    /// Release selected seats that are held
    ReleaseHeld {
        /// Request id
        correlation_id: CorrelationId,
    },
    /// The fresh snapshot read before booking arrived
    HeldSeatsResolved {
        /// Request id
        correlation_id: CorrelationId,
        /// Show
        show_id: ShowId,
        /// Sequence stamped when the fetch was issued
        sequence: u64,
        /// The snapshot, or why it could not be read
        result: Result<Snapshot, BookingError>,
    },
    /// The auth bootstrap succeeded; `step` runs next
    Authenticated {
        /// Request id
        correlation_id: CorrelationId,
        /// Batch call to make
        step: PendingStep,
    },
    /// Hold batch accepted
    HoldSucceeded {
        /// Request id
        correlation_id: CorrelationId,
        /// Seats held
        seats: Vec<SeatKey>,
        /// Service receipt
        receipt: HoldReceipt,
    },
    /// Hold attempt failed
    HoldFailed {
        /// Request id
        correlation_id: CorrelationId,
        /// Why
        error: BookingError,
    },
    /// Book batch accepted
    BookSucceeded {
        /// Request id
        correlation_id: CorrelationId,
        /// Show
        show_id: ShowId,
        /// Seats booked
        seats: Vec<SeatKey>,
        /// Service receipt
        receipt: BookReceipt,
    },
    /// Booking attempt failed
    BookFailed {
        /// Request id
        correlation_id: CorrelationId,
        /// Why
        error: BookingError,
    },
    /// Release batch accepted
    ReleaseSucceeded {
        /// Request id
        correlation_id: CorrelationId,
        /// Seats released
        seats: Vec<SeatKey>,
    },
    /// Release attempt failed
    ReleaseFailed {
        /// Request id
        correlation_id: CorrelationId,
        /// Why
        error: BookingError,
    },

    // ----- Account -----
    /// List bookings of the session's account
    LoadBookings {
        /// Request id
        correlation_id: CorrelationId,
    },
    /// Bookings arrived
    BookingsLoaded {
        /// Request id
        correlation_id: CorrelationId,
        /// Bookings
        bookings: Vec<BookingRecord>,
    },
    /// Ticket for one booking
    LoadTicket {
        /// Request id
        correlation_id: CorrelationId,
        /// Booking id
        booking_id: i64,
    },
    /// Ticket arrived
    TicketLoaded {
        /// Request id
        correlation_id: CorrelationId,
        /// Ticket
        ticket: Ticket,
    },
    /// End the login session
    Logout {
        /// Request id
        correlation_id: CorrelationId,
    },
    /// Login session ended
    LoggedOut {
        /// Request id
        correlation_id: CorrelationId,
    },
    /// An account request (bookings, ticket, logout) failed
    AccountRequestFailed {
        /// Request id
        correlation_id: CorrelationId,
        /// Why
        error: BookingError,
    },

    /// A request was refused before any network call
    RequestRejected {
        /// Request id
        correlation_id: CorrelationId,
        /// Why
        error: BookingError,
    },
}

impl SessionAction {
    /// Request id carried by this action, if any
    #[must_use]
    pub const fn correlation_id(&self) -> Option<CorrelationId> {
        match self {
            Self::LoadCatalog { correlation_id, .. }
            | Self::CatalogLoaded { correlation_id, .. }
            | Self::CatalogFailed { correlation_id, .. }
            | Self::SelectShow { correlation_id, .. }
            | Self::HoldSelected { correlation_id }
            | Self::BookHeld { correlation_id }
            | Self::ReleaseHeld { correlation_id }
            | Self::HeldSeatsResolved { correlation_id, .. }
            | Self::Authenticated { correlation_id, .. }
            | Self::HoldSucceeded { correlation_id, .. }
            | Self::HoldFailed { correlation_id, .. }
            | Self::BookSucceeded { correlation_id, .. }
            | Self::BookFailed { correlation_id, .. }
            | Self::ReleaseSucceeded { correlation_id, .. }
            | Self::ReleaseFailed { correlation_id, .. }
            | Self::LoadBookings { correlation_id }
            | Self::BookingsLoaded { correlation_id, .. }
            | Self::LoadTicket { correlation_id, .. }
            | Self::TicketLoaded { correlation_id, .. }
            | Self::Logout { correlation_id }
            | Self::LoggedOut { correlation_id }
            | Self::AccountRequestFailed { correlation_id, .. }
            | Self::RequestRejected { correlation_id, .. } => Some(*correlation_id),
            Self::RefreshSeats { correlation_id }
            | Self::SnapshotLoaded { correlation_id, .. }
            | Self::SnapshotFailed { correlation_id, .. } => *correlation_id,
            Self::StartPolling
            | Self::StopPolling
            | Self::PollTick { .. }
            | Self::SeatInput { .. }
            | Self::ClearSelection => None,
        }
    }

    /// Whether this action finishes the request it belongs to
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::CatalogLoaded { .. }
                | Self::CatalogFailed { .. }
                | Self::SnapshotLoaded { .. }
                | Self::SnapshotFailed { .. }
                | Self::HoldSucceeded { .. }
                | Self::HoldFailed { .. }
                | Self::BookSucceeded { .. }
                | Self::BookFailed { .. }
                | Self::ReleaseSucceeded { .. }
                | Self::ReleaseFailed { .. }
                | Self::BookingsLoaded { .. }
                | Self::TicketLoaded { .. }
                | Self::LoggedOut { .. }
                | Self::AccountRequestFailed { .. }
                | Self::RequestRejected { .. }
        )
    }

    /// Whether this action finishes request `correlation_id`
    #[must_use]
    pub fn finishes(&self, correlation_id: CorrelationId) -> bool {
        self.is_terminal() && self.correlation_id() == Some(correlation_id)
    }

    /// The error carried by a failed terminal action
    #[must_use]
    pub const fn failure(&self) -> Option<&BookingError> {
        match self {
            Self::CatalogFailed { error, .. }
            | Self::SnapshotFailed { error, .. }
            | Self::HoldFailed { error, .. }
            | Self::BookFailed { error, .. }
            | Self::ReleaseFailed { error, .. }
            | Self::AccountRequestFailed { error, .. }
            | Self::RequestRejected { error, .. } => Some(error),
            _ => None,
        }
    }
}
