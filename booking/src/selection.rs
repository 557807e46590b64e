//! Selection Model: the seats the user has picked, in the order they were picked.

use showtime_client::{Money, SeatKey, SeatStatus};

/// One selected seat.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SelectionEntry {
    /// Row label followed by number (`A1`); unique within a selection
    pub seat_id: String,
    /// Row label
    pub row: String,
    /// Seat number
    pub number: u32,
}

impl SelectionEntry {
    /// Entry for `key`
    #[must_use]
    pub fn new(key: &SeatKey) -> Self {
        Self {
            seat_id: key.seat_id(),
            row: key.row.clone(),
            number: key.number,
        }
    }

    /// The seat this entry refers to
    #[must_use]
    pub fn key(&self) -> SeatKey {
        SeatKey::new(self.row.clone(), self.number)
    }
}

/// Local selection intent, independent of server state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    entries: Vec<SelectionEntry>,
}

impl Selection {
    /// Flip membership of `key`.
    ///
    /// `effective` is the seat's status in the current grid; a BOOKED seat is
    /// never selectable, so toggling one changes nothing. Returns whether the
    /// seat is selected afterwards.
    pub fn toggle(&mut self, key: &SeatKey, effective: SeatStatus) -> bool {
        if self.contains(key) {
            self.remove(key);
            false
        } else {
            self.insert(key, effective)
        }
    }

    /// Add `key` unless it is BOOKED. Returns whether the seat is selected afterwards.
    pub fn insert(&mut self, key: &SeatKey, effective: SeatStatus) -> bool {
        if effective == SeatStatus::Booked {
            // A booked seat already in the selection is pruned by the reconciler
            return self.contains(key);
        }
        if !self.contains(key) {
            self.entries.push(SelectionEntry::new(key));
        }
        true
    }

    /// Remove `key`. Returns whether it was present.
    pub fn remove(&mut self, key: &SeatKey) -> bool {
        let seat_id = key.seat_id();
        let before = self.entries.len();
        self.entries.retain(|entry| entry.seat_id != seat_id);
        self.entries.len() != before
    }

    /// Empty the selection unconditionally
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Whether `key` is selected
    #[must_use]
    pub fn contains(&self, key: &SeatKey) -> bool {
        let seat_id = key.seat_id();
        self.entries.iter().any(|entry| entry.seat_id == seat_id)
    }

    /// Selected seats, in selection order
    #[must_use]
    pub fn keys(&self) -> Vec<SeatKey> {
        self.entries.iter().map(SelectionEntry::key).collect()
    }

    /// Entries, in selection order
    #[must_use]
    pub fn entries(&self) -> &[SelectionEntry] {
        &self.entries
    }

    /// Number of selected seats
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is selected
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Price of the whole selection
    #[must_use]
    pub fn total(&self, price: Money) -> Money {
        price.times(self.entries.len())
    }
}
