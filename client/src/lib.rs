//! # Showtime Seat-Inventory Client
//!
//! Rust client for the seat-inventory service: show catalog, seat snapshots,
//! login/registration and the batch hold/book/release calls.
//!
//! ## Example
//!
//! ```no_run
//! use showtime_client::{HttpSeatInventory, SeatInventory};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let inventory = HttpSeatInventory::new(
//!         "http://127.0.0.1:8000/api/seats",
//!         Duration::from_secs(10),
//!     )?;
//!
//!     let shows = inventory.list_shows(None).await?;
//!     if let Some(show) = shows.first() {
//!         let snapshot = inventory.fetch_snapshot(show.id).await?;
//!         println!("{} seats available", snapshot.stats.available);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - Typed wire model (`Show`, `Seat`, `Stats`, `Snapshot`, `Money`)
//! - Object-safe [`SeatInventory`] trait so the engine can run against the
//!   real service or an in-memory imitation
//! - Cookie-backed login session

pub mod client;
pub mod error;
pub mod inventory;
pub mod types;

// Re-export main types for convenience
pub use client::HttpSeatInventory;
pub use error::InventoryError;
pub use inventory::{InventoryFuture, SeatInventory};
pub use types::{
    BookReceipt, BookingRecord, Credentials, HoldReceipt, Money, MoneyParseError, Seat, SeatKey,
    SeatStatus, Show, ShowId, Snapshot, Stats, Ticket,
};
