//! Single entry point for seat input, keyed by `(seat, command)`.
//!
//! Rendering layers forward every seat interaction here instead of wiring
//! a callback per seat.

use crate::selection::Selection;
use crate::types::{SeatCommand, SeatGrid};
use showtime_client::{SeatKey, SeatStatus};

/// What a seat input did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeatInputOutcome {
    /// The seat is now selected
    Selected,
    /// The seat is no longer selected
    Deselected,
    /// Nothing changed: the seat is booked
    Booked,
    /// Nothing changed: no grid is loaded or the seat is not in it
    UnknownSeat,
    /// Nothing changed: the seat was already in the requested state
    Unchanged,
}

/// Apply one seat input to the selection and the grid's selected flags.
pub fn dispatch(
    selection: &mut Selection,
    grid: Option<&mut SeatGrid>,
    seat: &SeatKey,
    command: SeatCommand,
) -> SeatInputOutcome {
    let Some(grid) = grid else {
        return SeatInputOutcome::UnknownSeat;
    };
    let Some(effective) = grid.seat(seat).map(|view| view.effective) else {
        return SeatInputOutcome::UnknownSeat;
    };

    let was_selected = selection.contains(seat);
    let now_selected = match command {
        SeatCommand::Toggle => selection.toggle(seat, effective),
        SeatCommand::Select => selection.insert(seat, effective),
        SeatCommand::Deselect => {
            selection.remove(seat);
            false
        },
    };
    grid.set_selected(seat, now_selected);

    match (was_selected, now_selected) {
        (false, true) => SeatInputOutcome::Selected,
        (true, false) => SeatInputOutcome::Deselected,
        _ if effective == SeatStatus::Booked => SeatInputOutcome::Booked,
        _ => SeatInputOutcome::Unchanged,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconciler::reconcile;
    use showtime_client::{Seat, ShowId, Snapshot, Stats};

    fn grid() -> SeatGrid {
        let seats = vec![
            Seat::new("A", 1, SeatStatus::Available),
            Seat::new("A", 2, SeatStatus::Booked),
            Seat::new("A", 3, SeatStatus::Held).expired(),
        ];
        let stats = Stats {
            available: 2,
            held: 0,
            booked: 1,
        };
        reconcile(
            ShowId::new(1),
            1,
            Snapshot { stats, seats },
            &mut Selection::default(),
        )
        .grid
    }

    #[test]
    fn test_toggle_updates_selection_and_grid() {
        let mut selection = Selection::default();
        let mut grid = grid();
        let a1 = SeatKey::new("A", 1);

        let outcome = dispatch(&mut selection, Some(&mut grid), &a1, SeatCommand::Toggle);

        assert_eq!(outcome, SeatInputOutcome::Selected);
        assert!(selection.contains(&a1));
        assert!(grid.seat(&a1).is_some_and(|s| s.selected));
    }

    #[test]
    fn test_booked_seat_input_is_ignored() {
        let mut selection = Selection::default();
        let mut grid = grid();

        let outcome = dispatch(
            &mut selection,
            Some(&mut grid),
            &SeatKey::new("A", 2),
            SeatCommand::Select,
        );

        assert_eq!(outcome, SeatInputOutcome::Booked);
        assert!(selection.is_empty());
    }

    #[test]
    fn test_lapsed_hold_is_selectable() {
        let mut selection = Selection::default();
        let mut grid = grid();

        let outcome = dispatch(
            &mut selection,
            Some(&mut grid),
            &SeatKey::new("A", 3),
            SeatCommand::Toggle,
        );

        assert_eq!(outcome, SeatInputOutcome::Selected);
    }

    #[test]
    fn test_unknown_seat_and_missing_grid() {
        let mut selection = Selection::default();
        let mut grid = grid();

        assert_eq!(
            dispatch(&mut selection, Some(&mut grid), &SeatKey::new("Q", 1), SeatCommand::Toggle),
            SeatInputOutcome::UnknownSeat
        );
        assert_eq!(
            dispatch(&mut selection, None, &SeatKey::new("A", 1), SeatCommand::Toggle),
            SeatInputOutcome::UnknownSeat
        );
        assert!(selection.is_empty());
    }

    #[test]
    fn test_select_twice_is_unchanged() {
        let mut selection = Selection::default();
        let mut grid = grid();
        let a1 = SeatKey::new("A", 1);

        dispatch(&mut selection, Some(&mut grid), &a1, SeatCommand::Select);
        let outcome = dispatch(&mut selection, Some(&mut grid), &a1, SeatCommand::Select);

        assert_eq!(outcome, SeatInputOutcome::Unchanged);
        assert_eq!(selection.len(), 1);
    }
}
