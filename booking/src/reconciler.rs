//! Reconciler: turns raw snapshots into the render-ready grid while keeping
//! the user's selection intact.
//!
//! Snapshots replace the grid wholesale. Two fetches may overlap (a poll tick
//! and a post-action refresh), so every fetch is stamped with a sequence
//! number when it is issued and a response is applied only if nothing newer
//! has been applied already.

use crate::selection::Selection;
use crate::types::{SeatGrid, SeatRow, SeatView};
use showtime_client::{SeatKey, SeatStatus, ShowId, Snapshot};
use std::collections::BTreeMap;

/// Issues fetch sequence numbers and remembers the newest one applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchSequencer {
    issued: u64,
    applied: u64,
}

impl FetchSequencer {
    /// Stamp a new fetch
    pub fn issue(&mut self) -> u64 {
        self.issued += 1;
        self.issued
    }

    /// Record `sequence` as applied if it is newer than anything applied so
    /// far. Returns `false` for a stale response.
    pub fn accept(&mut self, sequence: u64) -> bool {
        if sequence > self.applied {
            self.applied = sequence;
            true
        } else {
            false
        }
    }

    /// Treat every fetch issued so far as stale (the active show changed)
    pub fn fence(&mut self) {
        self.applied = self.issued;
    }

    /// Newest sequence applied
    #[must_use]
    pub const fn applied(&self) -> u64 {
        self.applied
    }

    /// Newest sequence issued
    #[must_use]
    pub const fn issued(&self) -> u64 {
        self.issued
    }
}

/// Outcome of reconciling one snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciled {
    /// The new grid
    pub grid: SeatGrid,
    /// Selected seats dropped because the snapshot reports them BOOKED
    pub dropped: Vec<SeatKey>,
}

/// Build the grid for `snapshot` and prune BOOKED seats from `selection`.
///
/// Rows are ordered by label; seats keep the service's order within a row.
/// Stats are passed through untouched.
pub fn reconcile(
    show_id: ShowId,
    sequence: u64,
    snapshot: Snapshot,
    selection: &mut Selection,
) -> Reconciled {
    let mut rows: BTreeMap<String, Vec<SeatView>> = BTreeMap::new();
    let mut dropped = Vec::new();

    if snapshot.stats.total() as usize != snapshot.seats.len() {
        tracing::debug!(
            show_id = %show_id,
            stats_total = snapshot.stats.total(),
            seats = snapshot.seats.len(),
            "Snapshot stats do not cover every seat"
        );
    }

    for seat in snapshot.seats {
        let key = seat.key();
        let effective = seat.effective_status();
        let mut selected = selection.contains(&key);

        if selected && effective == SeatStatus::Booked {
            selection.remove(&key);
            dropped.push(key.clone());
            selected = false;
        }

        rows.entry(seat.row).or_default().push(SeatView {
            key,
            reported: seat.status,
            effective,
            expired_hold: seat.is_held_expired,
            selected,
        });
    }

    let rows = rows
        .into_iter()
        .map(|(label, seats)| SeatRow { label, seats })
        .collect();

    Reconciled {
        grid: SeatGrid {
            show_id,
            sequence,
            rows,
            stats: snapshot.stats,
        },
        dropped,
    }
}
