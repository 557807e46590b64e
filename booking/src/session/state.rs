//! Session state: one owned value holding everything a session knows.

use crate::auth::AuthPhase;
use crate::catalog::Catalog;
use crate::poll::PollLoop;
use crate::reconciler::FetchSequencer;
use crate::selection::Selection;
use crate::types::{NoticeLog, SeatGrid};
use crate::workflow::Workflow;
use showtime_client::{BookingRecord, Money, Ticket};
use std::time::Duration;

/// State of one booking session.
///
/// Nothing here is global; two sessions (or two tests) never share state.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    /// Catalog Store
    pub catalog: Catalog,
    /// Selection Model
    pub selection: Selection,
    /// Seat map of the active show; `None` until its first snapshot lands
    pub grid: Option<SeatGrid>,
    /// Snapshot request sequencing
    pub fetches: FetchSequencer,
    /// Poll Loop
    pub poll: PollLoop,
    /// Auth Bootstrapper outcome
    pub auth: AuthPhase,
    /// Reservation Workflow
    pub workflow: Workflow,
    /// User-visible activity log
    pub notices: NoticeLog,
    /// Bookings from the last successful listing
    pub bookings: Vec<BookingRecord>,
    /// Ticket from the last successful lookup
    pub last_ticket: Option<Ticket>,
}

impl SessionState {
    /// Fresh session whose Poll Loop ticks every `poll_interval`
    #[must_use]
    pub fn new(poll_interval: Duration) -> Self {
        Self {
            poll: PollLoop::new(poll_interval),
            ..Self::default()
        }
    }

    /// Price of the current selection at the active show's price
    #[must_use]
    pub fn selection_total(&self) -> Money {
        self.selection.total(self.catalog.price())
    }
}
