//! In-memory seat-inventory service
//!
//! Provides a fast, deterministic stand-in for the HTTP service:
//! - the same hold/book/release rules (ten-minute holds, all-or-nothing batches)
//! - a login session that mutating calls require
//! - a log of every call, for asserting what the engine asked for
//! - fault injection (failing fetches, rejected logins, slow fetches)

#![allow(clippy::unwrap_used)] // Test infrastructure uses unwrap for simplicity
#![allow(clippy::missing_panics_doc)] // Lock poisoning only follows a panicking test

use chrono::{DateTime, Duration as ChronoDuration, NaiveDate, Utc};
use showtime_client::{
    BookReceipt, BookingRecord, Credentials, HoldReceipt, InventoryError, InventoryFuture, Money,
    Seat, SeatInventory, SeatKey, SeatStatus, Show, ShowId, Snapshot, Stats, Ticket,
};
use showtime_core::environment::Clock;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// How long a hold lasts
const HOLD_MINUTES: i64 = 10;

/// One recorded call against the inventory
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InventoryCall {
    /// `list_shows`
    ListShows {
        /// Date filter
        date: Option<NaiveDate>,
    },
    /// `fetch_snapshot`
    FetchSnapshot(ShowId),
    /// `login` with this username
    Login(String),
    /// `register` with this username
    Register(String),
    /// `logout`
    Logout,
    /// `hold_batch`
    HoldBatch {
        /// Show
        show_id: ShowId,
        /// Seats, in request order
        seats: Vec<SeatKey>,
    },
    /// `book_batch`
    BookBatch {
        /// Show
        show_id: ShowId,
        /// Seats, in request order
        seats: Vec<SeatKey>,
    },
    /// `release_batch`
    ReleaseBatch {
        /// Show
        show_id: ShowId,
        /// Seats, in request order
        seats: Vec<SeatKey>,
    },
    /// `my_bookings`
    MyBookings,
    /// `ticket`
    Ticket(i64),
}

impl InventoryCall {
    /// Whether the call changes seat state
    #[must_use]
    pub const fn is_seat_mutation(&self) -> bool {
        matches!(
            self,
            Self::HoldBatch { .. } | Self::BookBatch { .. } | Self::ReleaseBatch { .. }
        )
    }
}

#[derive(Clone, Debug)]
struct SeatRecord {
    id: i64,
    key: SeatKey,
    status: SeatStatus,
    held_by: Option<String>,
    hold_expires_at: Option<DateTime<Utc>>,
}

impl SeatRecord {
    fn hold_lapsed(&self, now: DateTime<Utc>) -> bool {
        self.status == SeatStatus::Held && self.hold_expires_at.is_some_and(|at| at < now)
    }

    fn held_by(&self, user: &str) -> bool {
        self.status == SeatStatus::Held && self.held_by.as_deref() == Some(user)
    }
}

#[derive(Debug)]
struct ShowRecord {
    show: Show,
    seats: Vec<SeatRecord>,
}

#[derive(Debug, Default)]
struct Inner {
    shows: Vec<ShowRecord>,
    users: HashMap<String, String>,
    session: Option<String>,
    calls: Vec<InventoryCall>,
    next_seat_id: i64,
    next_show_id: i64,
    fail_fetches: bool,
    reject_logins: bool,
    fetch_delays: HashMap<ShowId, Duration>,
}

impl Inner {
    fn show(&self, show_id: ShowId) -> Option<&ShowRecord> {
        self.shows.iter().find(|record| record.show.id == show_id)
    }

    fn show_mut(&mut self, show_id: ShowId) -> Option<&mut ShowRecord> {
        self.shows.iter_mut().find(|record| record.show.id == show_id)
    }

    fn require_session(&self) -> Result<String, InventoryError> {
        self.session.clone().ok_or(InventoryError::Unauthorized)
    }

    fn snapshot(&self, show_id: ShowId, now: DateTime<Utc>) -> Snapshot {
        let Some(record) = self.show(show_id) else {
            return Snapshot::default();
        };

        let mut stats = Stats::default();
        let mut seats: Vec<Seat> = record
            .seats
            .iter()
            .map(|seat| {
                let lapsed = seat.hold_lapsed(now);
                match (seat.status, lapsed) {
                    (SeatStatus::Booked, _) => stats.booked += 1,
                    (SeatStatus::Held, false) => stats.held += 1,
                    (SeatStatus::Available, _) | (SeatStatus::Held, true) => stats.available += 1,
                }
                Seat {
                    row: seat.key.row.clone(),
                    number: seat.key.number,
                    status: seat.status,
                    is_held_expired: lapsed,
                }
            })
            .collect();
        seats.sort_by(|a, b| (&a.row, a.number).cmp(&(&b.row, b.number)));

        Snapshot { stats, seats }
    }

    fn hold(
        &mut self,
        user: &str,
        show_id: ShowId,
        seats: &[SeatKey],
        now: DateTime<Utc>,
    ) -> Result<HoldReceipt, InventoryError> {
        let record = self
            .show_mut(show_id)
            .ok_or_else(|| rejected(format!("Show {show_id} not found")))?;
        if seats.is_empty() {
            return Err(rejected("A list of seats is required"));
        }

        // Validate everything before touching anything: all or nothing
        let mut indices = Vec::with_capacity(seats.len());
        for key in seats {
            let index = record
                .seats
                .iter()
                .position(|seat| &seat.key == key)
                .ok_or_else(|| rejected(format!("Seat {key} not found for show {show_id}")))?;
            let seat = &record.seats[index];
            let holdable = seat.status == SeatStatus::Available
                || seat.hold_lapsed(now)
                || seat.held_by(user);
            if !holdable {
                return Err(rejected(format!("Seat {key} is already taken by someone else")));
            }
            indices.push(index);
        }

        let expires_at = now + ChronoDuration::minutes(HOLD_MINUTES);
        for index in indices {
            let seat = &mut record.seats[index];
            seat.status = SeatStatus::Held;
            seat.held_by = Some(user.to_string());
            seat.hold_expires_at = Some(expires_at);
        }

        Ok(HoldReceipt {
            message: Some(format!("Successfully held {} seats", seats.len())),
            expires_at: Some(expires_at),
        })
    }

    fn book(
        &mut self,
        user: &str,
        show_id: ShowId,
        seats: &[SeatKey],
        now: DateTime<Utc>,
    ) -> Result<BookReceipt, InventoryError> {
        let record = self
            .show_mut(show_id)
            .ok_or_else(|| rejected(format!("Show {show_id} not found")))?;
        if seats.is_empty() {
            return Err(rejected("A list of seats is required"));
        }

        let mut indices = Vec::with_capacity(seats.len());
        for key in seats {
            let index = record
                .seats
                .iter()
                .position(|seat| &seat.key == key)
                .ok_or_else(|| rejected(format!("Seat {key} not found for show {show_id}")))?;
            let seat = &record.seats[index];
            if !seat.held_by(user) {
                return Err(rejected(format!("Seat {key} is not held by you")));
            }
            if seat.hold_lapsed(now) {
                return Err(rejected(format!("Hold for seat {key} has expired")));
            }
            indices.push(index);
        }

        for &index in &indices {
            let seat = &mut record.seats[index];
            seat.status = SeatStatus::Booked;
            seat.hold_expires_at = None;
        }

        Ok(BookReceipt {
            message: Some(format!("Successfully booked {} seats", indices.len())),
            total_paid: record.show.price.times(indices.len()),
        })
    }

    fn release(&mut self, user: &str, show_id: ShowId, seats: &[SeatKey]) {
        let Some(record) = self.show_mut(show_id) else {
            return;
        };
        for seat in &mut record.seats {
            if seats.contains(&seat.key) && seat.held_by(user) {
                seat.status = SeatStatus::Available;
                seat.held_by = None;
                seat.hold_expires_at = None;
            }
        }
    }
}

fn rejected(message: impl Into<String>) -> InventoryError {
    InventoryError::Rejected {
        status: 400,
        message: message.into(),
    }
}

/// In-memory seat-inventory service for fast, deterministic tests
///
/// Clones share state, so a test can keep one handle for seeding and
/// assertions while the session under test owns another.
///
/// # Example
///
/// ```
/// use showtime_testing::{InMemorySeatInventory, ManualClock};
/// use showtime_client::{Credentials, SeatInventory, SeatKey};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let inventory = InMemorySeatInventory::demo(ManualClock::default());
/// let show = inventory.show_ids()[0];
///
/// inventory.login(&Credentials::new("demo_user_123", "demo_pass_123")).await?;
/// inventory.hold_batch(show, &[SeatKey::new("A", 1)]).await?;
///
/// assert_eq!(inventory.held_by("demo_user_123"), 1);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct InMemorySeatInventory {
    inner: Arc<Mutex<Inner>>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for InMemorySeatInventory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemorySeatInventory")
            .field("shows", &self.inner.lock().unwrap().shows.len())
            .finish_non_exhaustive()
    }
}

impl InMemorySeatInventory {
    /// Create an empty inventory with no shows and no accounts
    #[must_use]
    pub fn new(clock: impl Clock + 'static) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                next_seat_id: 1,
                next_show_id: 1,
                ..Inner::default()
            })),
            clock: Arc::new(clock),
        }
    }

    /// Create an inventory seeded like the demo theatre
    ///
    /// Two screens (Screen 1: rows A-E, Screen 2: rows A-C, ten seats per
    /// row), four shows at 100.00 per seat, and the demo account
    /// `demo_user_123` / `demo_pass_123`.
    #[must_use]
    pub fn demo(clock: impl Clock + 'static) -> Self {
        let inventory = Self::new(clock);
        let main = ["A", "B", "C", "D", "E"];
        let indie = ["A", "B", "C"];
        let price = Money::from_cents(10_000);

        inventory.add_show("Top Gun: Maverick", "Screen 1 (Main Hall)", 1, &main, 10, price);
        inventory.add_show("Avatar: The Way of Water", "Screen 1 (Main Hall)", 2, &main, 10, price);
        inventory.add_show("Inception", "Screen 2 (Indie Hall)", 3, &indie, 10, price);
        inventory.add_show("Avatar: The Way of Water", "Screen 2 (Indie Hall)", 6, &indie, 10, price);
        inventory.add_user("demo_user_123", "demo_pass_123");
        inventory
    }

    /// This inventory as a shareable trait object
    #[must_use]
    pub fn shared(&self) -> Arc<dyn SeatInventory> {
        Arc::new(self.clone())
    }

    /// Add a show starting `starts_in_hours` from now with a full grid of
    /// AVAILABLE seats
    pub fn add_show(
        &self,
        movie: &str,
        screen: &str,
        starts_in_hours: i64,
        rows: &[&str],
        seats_per_row: u32,
        price: Money,
    ) -> ShowId {
        let now = self.clock.now();
        let mut inner = self.inner.lock().unwrap();

        let id = ShowId::new(inner.next_show_id);
        inner.next_show_id += 1;

        let mut seats = Vec::new();
        for row in rows {
            for number in 1..=seats_per_row {
                seats.push(SeatRecord {
                    id: inner.next_seat_id,
                    key: SeatKey::new(*row, number),
                    status: SeatStatus::Available,
                    held_by: None,
                    hold_expires_at: None,
                });
                inner.next_seat_id += 1;
            }
        }

        let start_time = now + ChronoDuration::hours(starts_in_hours);
        inner.shows.push(ShowRecord {
            show: Show {
                id,
                movie: movie.to_string(),
                screen: screen.to_string(),
                start_time,
                end_time: Some(start_time + ChronoDuration::hours(3)),
                price,
                poster_url: None,
            },
            seats,
        });
        id
    }

    /// Register an account directly
    pub fn add_user(&self, username: &str, password: &str) {
        self.inner
            .lock()
            .unwrap()
            .users
            .insert(username.to_string(), password.to_string());
    }

    /// Identifiers of all shows, in insertion order
    #[must_use]
    pub fn show_ids(&self) -> Vec<ShowId> {
        self.inner
            .lock()
            .unwrap()
            .shows
            .iter()
            .map(|record| record.show.id)
            .collect()
    }

    /// Hold seats on behalf of another account, bypassing the login session
    ///
    /// # Errors
    ///
    /// Same rules as [`SeatInventory::hold_batch`].
    pub fn hold_as(
        &self,
        user: &str,
        show_id: ShowId,
        seats: &[SeatKey],
    ) -> Result<HoldReceipt, InventoryError> {
        let now = self.clock.now();
        self.inner.lock().unwrap().hold(user, show_id, seats, now)
    }

    /// Hold then book seats on behalf of another account
    ///
    /// # Errors
    ///
    /// Same rules as [`SeatInventory::book_batch`].
    pub fn book_as(
        &self,
        user: &str,
        show_id: ShowId,
        seats: &[SeatKey],
    ) -> Result<BookReceipt, InventoryError> {
        let now = self.clock.now();
        let mut inner = self.inner.lock().unwrap();
        inner.hold(user, show_id, seats, now)?;
        inner.book(user, show_id, seats, now)
    }

    /// Make every `fetch_snapshot` fail at the transport level
    pub fn fail_fetches(&self, fail: bool) {
        self.inner.lock().unwrap().fail_fetches = fail;
    }

    /// Answer every login with 401, even for known accounts
    pub fn reject_logins(&self, reject: bool) {
        self.inner.lock().unwrap().reject_logins = reject;
    }

    /// Delay snapshot responses for one show
    ///
    /// The snapshot is read when the call arrives and delivered after the
    /// delay, like a slow response carrying old data.
    pub fn delay_fetches(&self, show_id: ShowId, delay: Duration) {
        self.inner
            .lock()
            .unwrap()
            .fetch_delays
            .insert(show_id, delay);
    }

    /// Every call made so far, in order
    #[must_use]
    pub fn calls(&self) -> Vec<InventoryCall> {
        self.inner.lock().unwrap().calls.clone()
    }

    /// Forget recorded calls
    pub fn clear_calls(&self) {
        self.inner.lock().unwrap().calls.clear();
    }

    /// Number of recorded calls matching `predicate`
    #[must_use]
    pub fn count_calls(&self, predicate: impl Fn(&InventoryCall) -> bool) -> usize {
        self.inner
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter(|call| predicate(call))
            .count()
    }

    /// Current status and holder of one seat
    #[must_use]
    pub fn seat(&self, show_id: ShowId, key: &SeatKey) -> Option<(SeatStatus, Option<String>)> {
        let inner = self.inner.lock().unwrap();
        inner
            .show(show_id)?
            .seats
            .iter()
            .find(|seat| &seat.key == key)
            .map(|seat| (seat.status, seat.held_by.clone()))
    }

    /// Number of seats, across all shows, under a hold owned by `user`
    #[must_use]
    pub fn held_by(&self, user: &str) -> usize {
        self.inner
            .lock()
            .unwrap()
            .shows
            .iter()
            .flat_map(|record| &record.seats)
            .filter(|seat| seat.held_by(user))
            .count()
    }

    /// Account currently logged in
    #[must_use]
    pub fn session_user(&self) -> Option<String> {
        self.inner.lock().unwrap().session.clone()
    }

    fn record(&self, call: InventoryCall) {
        tracing::trace!(?call, "In-memory inventory call");
        self.inner.lock().unwrap().calls.push(call);
    }
}

impl SeatInventory for InMemorySeatInventory {
    fn list_shows(&self, date: Option<NaiveDate>) -> InventoryFuture<'_, Vec<Show>> {
        Box::pin(async move {
            self.record(InventoryCall::ListShows { date });
            let now = self.clock.now();
            let inner = self.inner.lock().unwrap();
            let mut shows: Vec<Show> = inner
                .shows
                .iter()
                .map(|record| record.show.clone())
                .filter(|show| show.end_time.is_none_or(|end| end > now))
                .filter(|show| date.is_none_or(|d| show.start_time.date_naive() == d))
                .collect();
            shows.sort_by_key(|show| show.start_time);
            Ok(shows)
        })
    }

    fn fetch_snapshot(&self, show_id: ShowId) -> InventoryFuture<'_, Snapshot> {
        Box::pin(async move {
            self.record(InventoryCall::FetchSnapshot(show_id));
            let now = self.clock.now();
            let (snapshot, delay) = {
                let inner = self.inner.lock().unwrap();
                if inner.fail_fetches {
                    return Err(InventoryError::RequestFailed(
                        "connection refused".to_string(),
                    ));
                }
                (
                    inner.snapshot(show_id, now),
                    inner.fetch_delays.get(&show_id).copied(),
                )
            };
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            Ok(snapshot)
        })
    }

    fn login<'a>(&'a self, credentials: &'a Credentials) -> InventoryFuture<'a, ()> {
        Box::pin(async move {
            self.record(InventoryCall::Login(credentials.username.clone()));
            let mut inner = self.inner.lock().unwrap();
            let known = inner.users.get(&credentials.username) == Some(&credentials.password);
            if inner.reject_logins || !known {
                return Err(InventoryError::Unauthorized);
            }
            inner.session = Some(credentials.username.clone());
            Ok(())
        })
    }

    fn register<'a>(&'a self, credentials: &'a Credentials) -> InventoryFuture<'a, ()> {
        Box::pin(async move {
            self.record(InventoryCall::Register(credentials.username.clone()));
            let mut inner = self.inner.lock().unwrap();
            if inner.users.contains_key(&credentials.username) {
                return Err(InventoryError::Rejected {
                    status: 409,
                    message: "Username already exists".to_string(),
                });
            }
            inner
                .users
                .insert(credentials.username.clone(), credentials.password.clone());
            Ok(())
        })
    }

    fn logout(&self) -> InventoryFuture<'_, ()> {
        Box::pin(async move {
            self.record(InventoryCall::Logout);
            self.inner.lock().unwrap().session = None;
            Ok(())
        })
    }

    fn hold_batch<'a>(
        &'a self,
        show_id: ShowId,
        seats: &'a [SeatKey],
    ) -> InventoryFuture<'a, HoldReceipt> {
        Box::pin(async move {
            self.record(InventoryCall::HoldBatch {
                show_id,
                seats: seats.to_vec(),
            });
            let now = self.clock.now();
            let mut inner = self.inner.lock().unwrap();
            let user = inner.require_session()?;
            inner.hold(&user, show_id, seats, now)
        })
    }

    fn book_batch<'a>(
        &'a self,
        show_id: ShowId,
        seats: &'a [SeatKey],
    ) -> InventoryFuture<'a, BookReceipt> {
        Box::pin(async move {
            self.record(InventoryCall::BookBatch {
                show_id,
                seats: seats.to_vec(),
            });
            let now = self.clock.now();
            let mut inner = self.inner.lock().unwrap();
            let user = inner.require_session()?;
            inner.book(&user, show_id, seats, now)
        })
    }

    fn release_batch<'a>(
        &'a self,
        show_id: ShowId,
        seats: &'a [SeatKey],
    ) -> InventoryFuture<'a, ()> {
        Box::pin(async move {
            self.record(InventoryCall::ReleaseBatch {
                show_id,
                seats: seats.to_vec(),
            });
            let mut inner = self.inner.lock().unwrap();
            let user = inner.require_session()?;
            inner.release(&user, show_id, seats);
            Ok(())
        })
    }

    fn my_bookings(&self) -> InventoryFuture<'_, Vec<BookingRecord>> {
        Box::pin(async move {
            self.record(InventoryCall::MyBookings);
            let inner = self.inner.lock().unwrap();
            let user = inner.require_session()?;
            Ok(inner
                .shows
                .iter()
                .flat_map(|record| {
                    record
                        .seats
                        .iter()
                        .filter(|seat| {
                            seat.status == SeatStatus::Booked
                                && seat.held_by.as_deref() == Some(user.as_str())
                        })
                        .map(|seat| BookingRecord {
                            id: seat.id,
                            movie: record.show.movie.clone(),
                            start_time: Some(record.show.start_time),
                            row: seat.key.row.clone(),
                            number: seat.key.number,
                            price: record.show.price,
                        })
                })
                .collect())
        })
    }

    fn ticket(&self, booking_id: i64) -> InventoryFuture<'_, Ticket> {
        Box::pin(async move {
            self.record(InventoryCall::Ticket(booking_id));
            let inner = self.inner.lock().unwrap();
            inner
                .shows
                .iter()
                .find_map(|record| {
                    record
                        .seats
                        .iter()
                        .find(|seat| seat.id == booking_id && seat.status == SeatStatus::Booked)
                        .map(|seat| Ticket {
                            ticket_id: seat.id,
                            movie: record.show.movie.clone(),
                            screen: record.show.screen.clone(),
                            time: record.show.start_time,
                            seat: seat.key.seat_id(),
                            price: record.show.price,
                            booked_by: seat.held_by.clone(),
                            message: "Thank you for booking with us! Please show this ticket at the entrance."
                                .to_string(),
                        })
                })
                .ok_or_else(|| InventoryError::NotFound("Ticket not found".to_string()))
        })
    }
}
