//! Catalog Store: the last-listed shows and the active one.

use crate::error::BookingError;
use showtime_client::{Money, Show, ShowId};

/// Shows from the most recent listing plus the active show.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    shows: Vec<Show>,
    active: Option<Show>,
}

impl Catalog {
    /// Replace the listing wholesale.
    ///
    /// The active show stays active even if the new listing no longer
    /// contains it; its seat map remains valid until the user switches.
    /// When the listing does contain it, the listed record wins.
    pub fn replace(&mut self, shows: Vec<Show>) {
        if let Some(active) = self.active.as_mut() {
            if let Some(listed) = shows.iter().find(|show| show.id == active.id) {
                active.clone_from(listed);
            }
        }
        self.shows = shows;
    }

    /// Shows in service order
    #[must_use]
    pub fn shows(&self) -> &[Show] {
        &self.shows
    }

    /// Look up a listed show
    #[must_use]
    pub fn get(&self, id: ShowId) -> Option<&Show> {
        self.shows.iter().find(|show| show.id == id)
    }

    /// Make `id` the active show.
    ///
    /// # Errors
    ///
    /// `NotFound` if `id` is not among the last-listed shows.
    pub fn set_active(&mut self, id: ShowId) -> Result<&Show, BookingError> {
        let show = self
            .get(id)
            .cloned()
            .ok_or_else(|| BookingError::NotFound(format!("Show {id} is not in the catalog")))?;
        let active: &Show = self.active.insert(show);
        Ok(active)
    }

    /// Identifier of the active show
    #[must_use]
    pub fn active_id(&self) -> Option<ShowId> {
        self.active.as_ref().map(|show| show.id)
    }

    /// The active show, listed or not
    #[must_use]
    pub const fn active(&self) -> Option<&Show> {
        self.active.as_ref()
    }

    /// Per-seat price of the active show
    #[must_use]
    pub fn price(&self) -> Money {
        self.active().map_or(Money::ZERO, |show| show.price)
    }
}
