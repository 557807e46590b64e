//! Integration tests for the hold-then-book workflow
//!
//! Each test drives a real `BookingSession` against the in-memory seat
//! inventory, sharing one `ManualClock` so hold expiry is deterministic.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code can use unwrap/expect/panic

use showtime_booking::{BookingError, BookingSession, Config, SeatGrid, WorkflowPhase};
use showtime_client::{Money, SeatKey, SeatStatus, ShowId};
use showtime_testing::helpers::init_test_tracing;
use showtime_testing::{InMemorySeatInventory, InventoryCall, ManualClock};
use std::time::Duration;

// ============================================================================
// Test Fixtures
// ============================================================================

fn config() -> Config {
    let mut config = Config::default();
    config.session.workflow_timeout_secs = 5;
    config
}

fn open(inventory: &InMemorySeatInventory, clock: &ManualClock, config: &Config) -> BookingSession {
    init_test_tracing();
    BookingSession::new(config, inventory.shared(), clock.shared())
}

fn seat(raw: &str) -> SeatKey {
    raw.parse().unwrap()
}

async fn at_show(session: &BookingSession, id: i64) -> SeatGrid {
    session.load_catalog(None).await.unwrap();
    session
        .select_show(ShowId::new(id))
        .await
        .unwrap()
        .expect("first snapshot should load")
}

async fn fresh_grid(session: &BookingSession) -> SeatGrid {
    session.refresh().await.unwrap().expect("grid after refresh")
}

fn status(grid: &SeatGrid, raw: &str) -> SeatStatus {
    grid.seat(&seat(raw)).expect("seat on the map").effective
}

fn assert_stats_cover_grid(grid: &SeatGrid) {
    let seats = grid.seats().count();
    assert_eq!(grid.stats.total() as usize, seats, "available + held + booked = total");

    let held = grid.seats().filter(|s| s.effective == SeatStatus::Held).count();
    assert_eq!(grid.stats.held as usize, held);
}

// ============================================================================
// Scenario A: hold then book
// ============================================================================

#[tokio::test]
async fn test_hold_then_book_two_seats() {
    let clock = ManualClock::default();
    let inventory = InMemorySeatInventory::demo(clock.clone());
    let session = open(&inventory, &clock, &config());
    at_show(&session, 1).await;

    assert!(session.toggle(seat("A1")).await.unwrap());
    assert!(session.toggle(seat("A2")).await.unwrap());
    assert_eq!(session.selection_total().await, Money::from_cents(20_000));

    let hold = session.hold_selected().await.unwrap();
    assert!(hold.expires_at.is_some());
    assert_eq!(session.phase().await, WorkflowPhase::Held);
    assert_eq!(session.held_until().await, hold.expires_at);

    let grid = fresh_grid(&session).await;
    assert_eq!(status(&grid, "A1"), SeatStatus::Held);
    assert_eq!(status(&grid, "A2"), SeatStatus::Held);
    assert_stats_cover_grid(&grid);

    let receipt = session.book_held().await.unwrap();
    assert_eq!(receipt.total_paid, Money::from_cents(20_000));
    assert_eq!(session.phase().await, WorkflowPhase::Booked);
    assert!(session.selection().await.is_empty());

    let grid = fresh_grid(&session).await;
    assert_eq!(status(&grid, "A1"), SeatStatus::Booked);
    assert_eq!(status(&grid, "A2"), SeatStatus::Booked);
    assert_eq!(grid.stats.booked, 2);
    assert_stats_cover_grid(&grid);
}

#[tokio::test]
async fn test_booked_seats_show_up_in_account() {
    let clock = ManualClock::default();
    let inventory = InMemorySeatInventory::demo(clock.clone());
    let session = open(&inventory, &clock, &config());
    at_show(&session, 1).await;
    session.toggle(seat("C5")).await.unwrap();
    session.hold_selected().await.unwrap();
    session.book_held().await.unwrap();

    let bookings = session.my_bookings().await.unwrap();
    assert_eq!(bookings.len(), 1);
    assert_eq!((bookings[0].row.as_str(), bookings[0].number), ("C", 5));

    let ticket = session.ticket(bookings[0].id).await.unwrap();
    assert_eq!(ticket.seat, "C5");
    assert_eq!(ticket.booked_by.as_deref(), Some("demo_user_123"));
}

#[tokio::test]
async fn test_repeated_hold_of_same_seats_is_safe() {
    let clock = ManualClock::default();
    let inventory = InMemorySeatInventory::demo(clock.clone());
    let session = open(&inventory, &clock, &config());
    at_show(&session, 1).await;
    session.toggle(seat("B1")).await.unwrap();
    session.toggle(seat("B2")).await.unwrap();

    session.hold_selected().await.unwrap();
    session.hold_selected().await.unwrap();

    assert_eq!(inventory.held_by("demo_user_123"), 2);
    assert_eq!(session.selection().await.len(), 2);
}

// ============================================================================
// Scenario B: a seat taken elsewhere fails the whole batch
// ============================================================================

#[tokio::test]
async fn test_hold_fails_whole_batch_when_a_seat_is_taken() {
    let clock = ManualClock::default();
    let inventory = InMemorySeatInventory::demo(clock.clone());
    let session = open(&inventory, &clock, &config());
    let show = ShowId::new(1);
    at_show(&session, 1).await;

    // An earlier successful hold
    session.toggle(seat("A5")).await.unwrap();
    session.hold_selected().await.unwrap();
    fresh_grid(&session).await;

    // Someone else books A3 after our seat map was drawn
    inventory.book_as("rival", show, &[seat("A3")]).unwrap();
    session.toggle(seat("A1")).await.unwrap();
    session.toggle(seat("A3")).await.unwrap();
    let before = session.selection().await;

    let error = session.hold_selected().await.unwrap_err();

    assert!(matches!(error, BookingError::Service(ref message) if message.contains("A3")));
    assert_eq!(session.selection().await, before);
    assert_eq!(session.phase().await, WorkflowPhase::Idle);
    assert_eq!(inventory.seat(show, &seat("A1")).unwrap().0, SeatStatus::Available);
    assert_eq!(inventory.seat(show, &seat("A5")).unwrap().0, SeatStatus::Held);
}

// ============================================================================
// Scenario C: auth bootstrap
// ============================================================================

#[tokio::test]
async fn test_unknown_identity_is_registered_before_hold() {
    let clock = ManualClock::default();
    let inventory = InMemorySeatInventory::demo(clock.clone());
    let mut config = config();
    config.identity.username = "first_time_visitor".to_string();
    config.identity.password = "s3cret".to_string();
    let session = open(&inventory, &clock, &config);
    at_show(&session, 1).await;
    session.toggle(seat("D4")).await.unwrap();
    inventory.clear_calls();

    session.hold_selected().await.unwrap();

    let calls = inventory.calls();
    assert!(matches!(
        calls.as_slice(),
        [
            InventoryCall::Login(_),
            InventoryCall::Register(_),
            InventoryCall::Login(_),
            InventoryCall::HoldBatch { .. },
            ..
        ]
    ));
    assert_eq!(inventory.held_by("first_time_visitor"), 1);
}

#[tokio::test]
async fn test_failed_bootstrap_never_reaches_batch_calls() {
    let clock = ManualClock::default();
    let inventory = InMemorySeatInventory::demo(clock.clone());
    let session = open(&inventory, &clock, &config());
    at_show(&session, 1).await;
    session.toggle(seat("D4")).await.unwrap();
    inventory.reject_logins(true);

    let hold = session.hold_selected().await.unwrap_err();
    let book = session.book_held().await.unwrap_err();

    assert!(matches!(hold, BookingError::Auth(_)));
    // No live hold exists, so booking stops before authenticating
    assert_eq!(book, BookingError::NothingToBook);
    assert_eq!(inventory.count_calls(InventoryCall::is_seat_mutation), 0);
    assert_eq!(
        inventory.count_calls(|call| matches!(call, InventoryCall::Login(_))),
        2
    );
}

#[tokio::test]
async fn test_failed_bootstrap_blocks_booking_live_holds() {
    let clock = ManualClock::default();
    let inventory = InMemorySeatInventory::demo(clock.clone());
    let session = open(&inventory, &clock, &config());
    at_show(&session, 1).await;
    session.toggle(seat("E1")).await.unwrap();
    session.hold_selected().await.unwrap();
    inventory.reject_logins(true);

    let error = session.book_held().await.unwrap_err();

    assert!(matches!(error, BookingError::Auth(_)));
    assert!(
        !inventory
            .calls()
            .iter()
            .any(|call| matches!(call, InventoryCall::BookBatch { .. }))
    );
    assert_eq!(inventory.seat(ShowId::new(1), &seat("E1")).unwrap().0, SeatStatus::Held);
}

// ============================================================================
// Validation and expiry
// ============================================================================

#[tokio::test]
async fn test_book_without_hold_is_rejected() {
    let clock = ManualClock::default();
    let inventory = InMemorySeatInventory::demo(clock.clone());
    let session = open(&inventory, &clock, &config());
    at_show(&session, 1).await;
    session.toggle(seat("A1")).await.unwrap();

    let error = session.book_held().await.unwrap_err();

    assert_eq!(error, BookingError::NothingToBook);
    assert_eq!(error.to_string(), "You must hold seats before booking");
    assert_eq!(session.selection().await.len(), 1);
}

#[tokio::test]
async fn test_requests_without_show_or_selection_are_rejected() {
    let clock = ManualClock::default();
    let inventory = InMemorySeatInventory::demo(clock.clone());
    let session = open(&inventory, &clock, &config());

    assert!(matches!(
        session.hold_selected().await,
        Err(BookingError::Validation(_))
    ));

    at_show(&session, 1).await;
    assert!(matches!(
        session.hold_selected().await,
        Err(BookingError::Validation(_))
    ));
    assert!(matches!(
        session.select_show(ShowId::new(42)).await,
        Err(BookingError::NotFound(_))
    ));
    assert!(inventory.calls().iter().all(|call| !call.is_seat_mutation()));
}

#[tokio::test]
async fn test_expired_hold_cannot_be_booked() {
    let clock = ManualClock::default();
    let inventory = InMemorySeatInventory::demo(clock.clone());
    let session = open(&inventory, &clock, &config());
    at_show(&session, 1).await;
    session.toggle(seat("A1")).await.unwrap();
    session.hold_selected().await.unwrap();

    clock.advance(chrono::Duration::minutes(11));
    let grid = fresh_grid(&session).await;
    let a1 = grid.seat(&seat("A1")).unwrap();
    assert_eq!(a1.effective, SeatStatus::Available);
    assert_eq!(a1.reported, SeatStatus::Held);
    assert!(a1.expired_hold);
    assert_stats_cover_grid(&grid);

    assert_eq!(session.book_held().await.unwrap_err(), BookingError::NothingToBook);
}

#[tokio::test]
async fn test_lapsed_hold_of_someone_else_is_selectable() {
    let clock = ManualClock::default();
    let inventory = InMemorySeatInventory::demo(clock.clone());
    let session = open(&inventory, &clock, &config());
    let show = ShowId::new(1);
    inventory.hold_as("rival", show, &[seat("B7")]).unwrap();
    at_show(&session, 1).await;
    assert!(session.toggle(seat("B7")).await.unwrap());
    assert!(matches!(
        session.hold_selected().await,
        Err(BookingError::Service(_))
    ));

    clock.advance(chrono::Duration::minutes(11));
    let grid = fresh_grid(&session).await;
    assert!(grid.seat(&seat("B7")).unwrap().expired_hold);
    assert!(grid.seat(&seat("B7")).unwrap().selected);

    session.hold_selected().await.unwrap();
    assert_eq!(inventory.seat(show, &seat("B7")).unwrap().1.as_deref(), Some("demo_user_123"));
}

// ============================================================================
// Release and mutual exclusion
// ============================================================================

#[tokio::test]
async fn test_release_returns_seats_and_keeps_selection() {
    let clock = ManualClock::default();
    let inventory = InMemorySeatInventory::demo(clock.clone());
    let session = open(&inventory, &clock, &config());
    at_show(&session, 1).await;
    session.toggle(seat("A1")).await.unwrap();
    session.toggle(seat("A2")).await.unwrap();
    session.hold_selected().await.unwrap();
    fresh_grid(&session).await;

    let released = session.release_selected().await.unwrap();

    assert_eq!(released, vec![seat("A1"), seat("A2")]);
    assert_eq!(inventory.held_by("demo_user_123"), 0);
    assert_eq!(session.phase().await, WorkflowPhase::Idle);
    assert_eq!(session.selection().await.len(), 2);
}

#[tokio::test]
async fn test_second_request_is_rejected_while_booking() {
    let clock = ManualClock::default();
    let inventory = InMemorySeatInventory::demo(clock.clone());
    let session = open(&inventory, &clock, &config());
    let show = ShowId::new(1);
    at_show(&session, 1).await;
    session.toggle(seat("A1")).await.unwrap();
    session.hold_selected().await.unwrap();
    session.toggle(seat("A2")).await.unwrap();

    inventory.delay_fetches(show, Duration::from_millis(300));
    let background = session.clone();
    let booking = tokio::spawn(async move { background.book_held().await });
    tokio::time::sleep(Duration::from_millis(50)).await;

    let second = session.hold_selected().await;
    assert!(matches!(second, Err(BookingError::Validation(ref m)) if m.contains("in progress")));

    let receipt = booking.await.unwrap().unwrap();
    assert_eq!(receipt.total_paid, Money::from_cents(10_000));
    assert_eq!(inventory.seat(show, &seat("A2")).unwrap().0, SeatStatus::Available);
}

#[tokio::test]
async fn test_switching_show_while_booking_books_nothing() {
    let clock = ManualClock::default();
    let inventory = InMemorySeatInventory::demo(clock.clone());
    let session = open(&inventory, &clock, &config());
    let show = ShowId::new(1);
    at_show(&session, 1).await;
    session.toggle(seat("A1")).await.unwrap();
    session.hold_selected().await.unwrap();
    fresh_grid(&session).await;

    inventory.delay_fetches(show, Duration::from_millis(300));
    let background = session.clone();
    let booking = tokio::spawn(async move { background.book_held().await });
    tokio::time::sleep(Duration::from_millis(50)).await;
    session.select_show(ShowId::new(2)).await.unwrap();

    let result = booking.await.unwrap();
    assert!(matches!(result, Err(BookingError::Validation(_))));
    assert_eq!(inventory.seat(show, &seat("A1")).unwrap().0, SeatStatus::Held);
    assert_eq!(session.active_show().await.unwrap().id, ShowId::new(2));
    assert_eq!(session.phase().await, WorkflowPhase::Idle);
}

#[tokio::test]
async fn test_failures_are_logged_for_the_user() {
    let clock = ManualClock::default();
    let inventory = InMemorySeatInventory::demo(clock.clone());
    let session = open(&inventory, &clock, &config());
    at_show(&session, 1).await;

    let _ = session.book_held().await;

    let notices = session.notices(5).await;
    assert!(
        notices
            .iter()
            .any(|notice| notice.message.contains("You must hold seats before booking"))
    );
}
