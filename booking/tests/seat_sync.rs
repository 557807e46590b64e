//! Integration tests for seat-map synchronization: out-of-order snapshot
//! responses, show switches, failed fetches and the poll loop.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code can use unwrap/expect/panic

use showtime_booking::{
    BookingError, BookingSession, Config, CorrelationId, SessionAction, SessionEnvironment,
    SessionReducer, SessionState, SessionStore,
};
use showtime_client::{Credentials, SeatKey, SeatStatus, ShowId};
use showtime_testing::helpers::init_test_tracing;
use showtime_testing::{InMemorySeatInventory, InventoryCall, ManualClock};
use std::time::Duration;

// ============================================================================
// Test Fixtures
// ============================================================================

const POLL_INTERVAL: Duration = Duration::from_millis(50);
const WAIT: Duration = Duration::from_secs(5);

fn open(inventory: &InMemorySeatInventory, clock: &ManualClock) -> BookingSession {
    init_test_tracing();
    let mut config = Config::default();
    config.session.workflow_timeout_secs = 5;
    BookingSession::new(&config, inventory.shared(), clock.shared())
}

fn seat(raw: &str) -> SeatKey {
    raw.parse().unwrap()
}

fn fetches_of(inventory: &InMemorySeatInventory, show_id: ShowId) -> usize {
    inventory.count_calls(|call| *call == InventoryCall::FetchSnapshot(show_id))
}

/// A bare store with a fast poll interval, already showing `show_id`
async fn polling_store(inventory: &InMemorySeatInventory, clock: &ManualClock, show_id: ShowId) -> SessionStore {
    init_test_tracing();
    let store = SessionStore::new(
        SessionState::new(POLL_INTERVAL),
        SessionReducer::new(),
        SessionEnvironment::new(
            inventory.shared(),
            clock.shared(),
            Credentials::new("demo_user_123", "demo_pass_123"),
        ),
    );

    let correlation_id = CorrelationId::new();
    store
        .send_and_wait_for(
            SessionAction::LoadCatalog {
                correlation_id,
                date: None,
            },
            move |action| action.finishes(correlation_id),
            WAIT,
        )
        .await
        .unwrap();

    let correlation_id = CorrelationId::new();
    store
        .send_and_wait_for(
            SessionAction::SelectShow {
                correlation_id,
                show_id,
            },
            move |action| action.finishes(correlation_id),
            WAIT,
        )
        .await
        .unwrap();
    store
}

// ============================================================================
// Scenario D: late responses never overwrite newer ones
// ============================================================================

#[tokio::test]
async fn test_slow_snapshot_does_not_overwrite_newer_one() {
    let clock = ManualClock::default();
    let inventory = InMemorySeatInventory::demo(clock.clone());
    let session = open(&inventory, &clock);
    let show = ShowId::new(1);
    session.load_catalog(None).await.unwrap();
    session.select_show(show).await.unwrap();

    // Issued first, reads A1 as available, answers last
    inventory.delay_fetches(show, Duration::from_millis(300));
    let background = session.clone();
    let slow = tokio::spawn(async move { background.refresh().await });
    tokio::time::sleep(Duration::from_millis(50)).await;

    inventory.book_as("rival", show, &[seat("A1")]).unwrap();
    inventory.delay_fetches(show, Duration::ZERO);
    let fast = session.refresh().await.unwrap().unwrap();
    assert_eq!(fast.seat(&seat("A1")).unwrap().effective, SeatStatus::Booked);

    slow.await.unwrap().unwrap();
    let grid = session.grid().await.unwrap();
    assert_eq!(grid.seat(&seat("A1")).unwrap().effective, SeatStatus::Booked);
    assert_eq!(grid.sequence, fast.sequence);
}

#[tokio::test]
async fn test_rival_booking_prunes_selected_seat() {
    let clock = ManualClock::default();
    let inventory = InMemorySeatInventory::demo(clock.clone());
    let session = open(&inventory, &clock);
    let show = ShowId::new(1);
    session.load_catalog(None).await.unwrap();
    session.select_show(show).await.unwrap();
    session.toggle(seat("A1")).await.unwrap();
    session.toggle(seat("A2")).await.unwrap();

    inventory.book_as("rival", show, &[seat("A2")]).unwrap();
    let grid = session.refresh().await.unwrap().unwrap();

    let selected: Vec<String> = session
        .selection()
        .await
        .into_iter()
        .map(|entry| entry.seat_id)
        .collect();
    assert_eq!(selected, vec!["A1".to_string()]);
    assert!(grid.seat(&seat("A1")).unwrap().selected);
    assert!(!grid.seat(&seat("A2")).unwrap().selected);
    assert!(
        session
            .notices(3)
            .await
            .iter()
            .any(|notice| notice.message.contains("A2"))
    );
}

// ============================================================================
// Show switching and failures
// ============================================================================

#[tokio::test]
async fn test_show_switch_clears_selection_and_loads_new_map() {
    let clock = ManualClock::default();
    let inventory = InMemorySeatInventory::demo(clock.clone());
    let session = open(&inventory, &clock);
    session.load_catalog(None).await.unwrap();
    session.select_show(ShowId::new(1)).await.unwrap();
    session.toggle(seat("A1")).await.unwrap();

    let grid = session.select_show(ShowId::new(3)).await.unwrap().unwrap();

    assert!(session.selection().await.is_empty());
    assert_eq!(grid.show_id, ShowId::new(3));
    let labels: Vec<&str> = grid.rows.iter().map(|row| row.label.as_str()).collect();
    assert_eq!(labels, vec!["A", "B", "C"]);
    assert_eq!(session.active_show().await.unwrap().movie, "Inception");
}

#[tokio::test]
async fn test_failed_fetch_keeps_last_seat_map() {
    let clock = ManualClock::default();
    let inventory = InMemorySeatInventory::demo(clock.clone());
    let session = open(&inventory, &clock);
    session.load_catalog(None).await.unwrap();
    let before = session.select_show(ShowId::new(1)).await.unwrap().unwrap();
    session.toggle(seat("B2")).await.unwrap();

    inventory.fail_fetches(true);
    let result = session.refresh().await;

    assert!(matches!(result, Err(BookingError::Network(_))));
    let after = session.grid().await.unwrap();
    assert_eq!(after.sequence, before.sequence);
    assert_eq!(session.selection().await.len(), 1);
}

#[tokio::test]
async fn test_date_filter_limits_listing() {
    let clock = ManualClock::default();
    let inventory = InMemorySeatInventory::demo(clock.clone());
    let session = open(&inventory, &clock);

    let everything = session.load_catalog(None).await.unwrap();
    let first_day = everything[0].start_time.date_naive();
    let filtered = session.load_catalog(Some(first_day)).await.unwrap();

    assert!(!filtered.is_empty());
    assert!(filtered.iter().all(|show| show.start_time.date_naive() == first_day));
    assert_eq!(
        inventory.calls().last(),
        Some(&InventoryCall::ListShows {
            date: Some(first_day)
        })
    );
}

#[tokio::test]
async fn test_listing_without_active_show_keeps_price() {
    let clock = ManualClock::default();
    let inventory = InMemorySeatInventory::demo(clock.clone());
    let session = open(&inventory, &clock);
    session.load_catalog(None).await.unwrap();
    session.select_show(ShowId::new(1)).await.unwrap();
    session.toggle(seat("A1")).await.unwrap();
    let before = session.selection_total().await;

    let far_day = chrono::NaiveDate::from_ymd_opt(2030, 1, 1).unwrap();
    let listed = session.load_catalog(Some(far_day)).await.unwrap();

    assert!(listed.is_empty());
    assert_eq!(session.selection_total().await, before);
    assert_eq!(before, showtime_client::Money::from_cents(10_000));
    assert_eq!(session.active_show().await.unwrap().id, ShowId::new(1));
    assert_eq!(session.selection().await.len(), 1);
}

#[tokio::test]
async fn test_second_shutdown_is_harmless() {
    let clock = ManualClock::default();
    let inventory = InMemorySeatInventory::demo(clock.clone());
    let session = open(&inventory, &clock);
    session.load_catalog(None).await.unwrap();

    session.shutdown().await.unwrap();
    session.shutdown().await.unwrap();

    assert!(matches!(
        session.load_catalog(None).await,
        Err(BookingError::Session(_))
    ));
}

// ============================================================================
// Poll loop
// ============================================================================

#[tokio::test]
async fn test_poll_loop_refreshes_at_interval() {
    let clock = ManualClock::default();
    let inventory = InMemorySeatInventory::demo(clock.clone());
    let show = ShowId::new(1);
    let store = polling_store(&inventory, &clock, show).await;
    let before = fetches_of(&inventory, show);

    store.send(SessionAction::StartPolling).await.unwrap();
    tokio::time::sleep(Duration::from_millis(230)).await;
    store.send(SessionAction::StopPolling).await.unwrap();

    // One immediate fetch plus about one per interval
    let polled = fetches_of(&inventory, show) - before;
    assert!((3..=7).contains(&polled), "polled {polled} times");
}

#[tokio::test]
async fn test_repeated_start_keeps_single_chain() {
    let clock = ManualClock::default();
    let inventory = InMemorySeatInventory::demo(clock.clone());
    let show = ShowId::new(1);
    let store = polling_store(&inventory, &clock, show).await;
    let before = fetches_of(&inventory, show);

    for _ in 0..3 {
        store.send(SessionAction::StartPolling).await.unwrap();
    }
    tokio::time::sleep(Duration::from_millis(230)).await;
    store.send(SessionAction::StopPolling).await.unwrap();

    let polled = fetches_of(&inventory, show) - before;
    assert!(polled <= 7, "stacked chains polled {polled} times");
}

#[tokio::test]
async fn test_show_switch_redirects_polling() {
    let clock = ManualClock::default();
    let inventory = InMemorySeatInventory::demo(clock.clone());
    let (first, second) = (ShowId::new(1), ShowId::new(2));
    let store = polling_store(&inventory, &clock, first).await;
    store.send(SessionAction::StartPolling).await.unwrap();
    tokio::time::sleep(Duration::from_millis(120)).await;

    let correlation_id = CorrelationId::new();
    store
        .send_and_wait_for(
            SessionAction::SelectShow {
                correlation_id,
                show_id: second,
            },
            move |action| action.finishes(correlation_id),
            WAIT,
        )
        .await
        .unwrap();
    let first_after_switch = fetches_of(&inventory, first);
    let second_after_switch = fetches_of(&inventory, second);

    tokio::time::sleep(Duration::from_millis(230)).await;
    store.send(SessionAction::StopPolling).await.unwrap();

    assert_eq!(fetches_of(&inventory, first), first_after_switch);
    let polled = fetches_of(&inventory, second) - second_after_switch;
    assert!((2..=7).contains(&polled), "polled {polled} times after switch");
    assert_eq!(
        store.state(|state| state.grid.as_ref().map(|grid| grid.show_id)).await,
        Some(second)
    );
}

#[tokio::test]
async fn test_stopped_poll_loop_stays_quiet() {
    let clock = ManualClock::default();
    let inventory = InMemorySeatInventory::demo(clock.clone());
    let show = ShowId::new(1);
    let store = polling_store(&inventory, &clock, show).await;

    store.send(SessionAction::StartPolling).await.unwrap();
    tokio::time::sleep(Duration::from_millis(120)).await;
    store.send(SessionAction::StopPolling).await.unwrap();
    // Let the fetch already in flight land
    tokio::time::sleep(Duration::from_millis(20)).await;
    let stopped_at = fetches_of(&inventory, show);

    tokio::time::sleep(Duration::from_millis(200)).await;

    assert_eq!(fetches_of(&inventory, show), stopped_at);
    assert!(!store.state(|state| state.poll.is_enabled()).await);
}
