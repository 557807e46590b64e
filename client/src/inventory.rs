//! The seat-inventory service as a trait
//!
//! The booking engine only ever talks to [`SeatInventory`], so it runs the
//! same against the HTTP service and against an in-memory imitation.

use crate::error::InventoryError;
use crate::types::{
    BookReceipt, BookingRecord, Credentials, HoldReceipt, SeatKey, Show, ShowId, Snapshot, Ticket,
};
use chrono::NaiveDate;
use std::future::Future;
use std::pin::Pin;

/// Boxed future returned by every [`SeatInventory`] operation
pub type InventoryFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, InventoryError>> + Send + 'a>>;

/// Operations offered by the seat-inventory service
///
/// Methods return boxed futures so the trait stays object-safe and can be
/// held as `Arc<dyn SeatInventory>` in the session environment.
///
/// Login state lives in the implementation (a cookie jar for HTTP), which is
/// why mutating calls take no credentials.
pub trait SeatInventory: Send + Sync {
    /// List shows, optionally restricted to a calendar date
    fn list_shows(&self, date: Option<NaiveDate>) -> InventoryFuture<'_, Vec<Show>>;

    /// Read every seat of a show together with aggregate counts
    fn fetch_snapshot(&self, show_id: ShowId) -> InventoryFuture<'_, Snapshot>;

    /// Log in; succeeds with no payload, fails with `Unauthorized` on bad credentials
    fn login<'a>(&'a self, credentials: &'a Credentials) -> InventoryFuture<'a, ()>;

    /// Create an account; `Rejected` with status 409 if the name is taken
    fn register<'a>(&'a self, credentials: &'a Credentials) -> InventoryFuture<'a, ()>;

    /// End the current login session
    fn logout(&self) -> InventoryFuture<'_, ()>;

    /// Hold every listed seat for the current user, all or nothing
    fn hold_batch<'a>(&'a self, show_id: ShowId, seats: &'a [SeatKey])
    -> InventoryFuture<'a, HoldReceipt>;

    /// Convert the current user's live holds into bookings, all or nothing
    fn book_batch<'a>(&'a self, show_id: ShowId, seats: &'a [SeatKey])
    -> InventoryFuture<'a, BookReceipt>;

    /// Give back holds owned by the current user
    fn release_batch<'a>(&'a self, show_id: ShowId, seats: &'a [SeatKey])
    -> InventoryFuture<'a, ()>;

    /// Bookings owned by the current user
    fn my_bookings(&self) -> InventoryFuture<'_, Vec<BookingRecord>>;

    /// Ticket for one booked seat
    fn ticket(&self, booking_id: i64) -> InventoryFuture<'_, Ticket>;
}
