//! Session-level types: render-ready seat views, the notice log and request ids.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use showtime_client::{SeatKey, SeatStatus, ShowId, Stats};
use std::collections::VecDeque;
use uuid::Uuid;

/// Identifier tying a user request to the actions that answer it.
///
/// Every terminal action echoes the id of the request that started it, so
/// callers waiting on the action broadcast never pick up someone else's result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CorrelationId(Uuid);

impl CorrelationId {
    /// Generate a new correlation ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get the inner UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for CorrelationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What the user did to a seat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SeatCommand {
    /// Flip membership in the selection
    Toggle,
    /// Add to the selection if not already there
    Select,
    /// Remove from the selection if present
    Deselect,
}

/// One seat, ready to render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatView {
    /// Seat identity
    pub key: SeatKey,
    /// Status as the service reported it
    pub reported: SeatStatus,
    /// Status used for selection and booking (a lapsed hold is AVAILABLE)
    pub effective: SeatStatus,
    /// The service still reports a hold whose window has lapsed
    pub expired_hold: bool,
    /// Part of the local selection
    pub selected: bool,
}

/// A row label with its seats in service order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatRow {
    /// Row label
    pub label: String,
    /// Seats in the order the service sent them
    pub seats: Vec<SeatView>,
}

/// The render-ready seat map of the active show.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatGrid {
    /// Show this grid belongs to
    pub show_id: ShowId,
    /// Sequence number of the fetch that produced it
    pub sequence: u64,
    /// Rows in ascending label order
    pub rows: Vec<SeatRow>,
    /// Aggregate counts, passed through from the service
    pub stats: Stats,
}

impl SeatGrid {
    /// Find a seat by identity
    #[must_use]
    pub fn seat(&self, key: &SeatKey) -> Option<&SeatView> {
        self.rows
            .iter()
            .find(|row| row.label == key.row)?
            .seats
            .iter()
            .find(|seat| &seat.key == key)
    }

    /// Iterate every seat, row by row
    pub fn seats(&self) -> impl Iterator<Item = &SeatView> {
        self.rows.iter().flat_map(|row| row.seats.iter())
    }

    /// Set the selected flag of one seat; no-op if the seat is not in the grid
    pub fn set_selected(&mut self, key: &SeatKey, selected: bool) {
        if let Some(seat) = self
            .rows
            .iter_mut()
            .filter(|row| row.label == key.row)
            .flat_map(|row| row.seats.iter_mut())
            .find(|seat| &seat.key == key)
        {
            seat.selected = selected;
        }
    }

    /// Clear every selected flag
    pub fn clear_selected(&mut self) {
        for seat in self.rows.iter_mut().flat_map(|row| row.seats.iter_mut()) {
            seat.selected = false;
        }
    }

    /// Seats under a live hold
    #[must_use]
    pub fn live_holds(&self) -> Vec<SeatKey> {
        self.seats()
            .filter(|seat| seat.effective == SeatStatus::Held)
            .map(|seat| seat.key.clone())
            .collect()
    }
}

/// Severity of a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoticeLevel {
    /// Progress
    Info,
    /// A workflow step completed
    Success,
    /// Something the user should know but that did not fail a request
    Warning,
    /// A surfaced failure
    Error,
}

/// One entry in the user-visible activity log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    /// When it was recorded
    pub at: DateTime<Utc>,
    /// Severity
    pub level: NoticeLevel,
    /// Message for the user
    pub message: String,
}

/// Bounded activity log, newest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoticeLog {
    entries: VecDeque<Notice>,
}

impl NoticeLog {
    /// Entries kept before the oldest is dropped
    pub const CAPACITY: usize = 50;

    /// Record a notice
    pub fn push(&mut self, at: DateTime<Utc>, level: NoticeLevel, message: impl Into<String>) {
        self.entries.push_front(Notice {
            at,
            level,
            message: message.into(),
        });
        self.entries.truncate(Self::CAPACITY);
    }

    /// Newest entry
    #[must_use]
    pub fn latest(&self) -> Option<&Notice> {
        self.entries.front()
    }

    /// Entries, newest first
    pub fn iter(&self) -> impl Iterator<Item = &Notice> {
        self.entries.iter()
    }

    /// Number of entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been logged
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
