//! Core types for the seat-inventory service

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// ============================================================================
// Identifiers
// ============================================================================

/// Opaque identifier of a show (a screening of a movie)
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShowId(i64);

impl ShowId {
    /// Create a `ShowId` from the service's raw identifier
    #[must_use]
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    /// Get the raw identifier
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for ShowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ShowId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

/// Identity of a seat within a show: `(row, number)`
///
/// Also the wire shape of one entry in a batch request body.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SeatKey {
    /// Row label (`"A"`, `"B"`, ...)
    pub row: String,
    /// Seat number within the row
    pub number: u32,
}

impl SeatKey {
    /// Creates a new `SeatKey`
    #[must_use]
    pub fn new(row: impl Into<String>, number: u32) -> Self {
        Self {
            row: row.into(),
            number,
        }
    }

    /// The display identifier: row label followed by number (`A1`)
    #[must_use]
    pub fn seat_id(&self) -> String {
        format!("{}{}", self.row, self.number)
    }
}

impl fmt::Display for SeatKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.row, self.number)
    }
}

impl FromStr for SeatKey {
    type Err = String;

    /// Parses `A1`, `b12`: a non-empty alphabetic row followed by a number.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let split = s
            .find(|c: char| c.is_ascii_digit())
            .ok_or_else(|| format!("Seat '{s}' has no seat number"))?;
        let (row, number) = s.split_at(split);
        if row.is_empty() || !row.chars().all(char::is_alphabetic) {
            return Err(format!("Seat '{s}' has no row label"));
        }
        let number = number
            .parse()
            .map_err(|_| format!("Seat '{s}' has an invalid seat number"))?;
        Ok(Self::new(row.to_uppercase(), number))
    }
}

// ============================================================================
// Money
// ============================================================================

/// Error parsing a decimal amount
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Invalid amount '{0}'")]
pub struct MoneyParseError(String);

/// A non-negative amount of money, stored in cents
///
/// The service sends prices and totals as decimal strings (`"100.00"`);
/// numbers are accepted too.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "MoneyRepr", into = "String")]
pub struct Money(u64);

impl Money {
    /// Zero
    pub const ZERO: Self = Self(0);

    /// Creates a `Money` value from cents
    #[must_use]
    pub const fn from_cents(cents: u64) -> Self {
        Self(cents)
    }

    /// Returns the amount in cents
    #[must_use]
    pub const fn cents(&self) -> u64 {
        self.0
    }

    /// Multiplies by a seat count, saturating on overflow
    #[must_use]
    pub const fn times(self, count: usize) -> Self {
        Self(self.0.saturating_mul(count as u64))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

impl FromStr for Money {
    type Err = MoneyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || MoneyParseError(s.to_string());
        let trimmed = s.trim();
        let (whole, fraction) = trimmed.split_once('.').unwrap_or((trimmed, ""));

        if (whole.is_empty() && fraction.is_empty())
            || fraction.len() > 2
            || !whole.chars().all(|c| c.is_ascii_digit())
            || !fraction.chars().all(|c| c.is_ascii_digit())
        {
            return Err(invalid());
        }

        let whole: u64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| invalid())?
        };
        let fraction: u64 = match fraction.len() {
            0 => 0,
            1 => fraction.parse::<u64>().map_err(|_| invalid())? * 10,
            _ => fraction.parse().map_err(|_| invalid())?,
        };

        whole
            .checked_mul(100)
            .and_then(|cents| cents.checked_add(fraction))
            .map(Self)
            .ok_or_else(invalid)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum MoneyRepr {
    Text(String),
    Number(f64),
}

impl TryFrom<MoneyRepr> for Money {
    type Error = MoneyParseError;

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // range checked above
    fn try_from(repr: MoneyRepr) -> Result<Self, Self::Error> {
        match repr {
            MoneyRepr::Text(text) => text.parse(),
            MoneyRepr::Number(value) if value.is_finite() && value >= 0.0 => {
                Ok(Self((value * 100.0).round() as u64))
            },
            MoneyRepr::Number(value) => Err(MoneyParseError(value.to_string())),
        }
    }
}

impl From<Money> for String {
    fn from(money: Money) -> Self {
        money.to_string()
    }
}

// ============================================================================
// Catalog
// ============================================================================

/// A screening of a movie on a screen at a given time
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Show {
    /// Show identifier
    pub id: ShowId,
    /// Movie title
    pub movie: String,
    /// Screen name
    pub screen: String,
    /// When the show starts
    pub start_time: DateTime<Utc>,
    /// When the show ends
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    /// Price per seat
    pub price: Money,
    /// Poster location, absolute or relative to the service origin
    #[serde(default)]
    pub poster_url: Option<String>,
}

// ============================================================================
// Seats
// ============================================================================

/// Seat status as reported by the service
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SeatStatus {
    /// Free to hold
    Available,
    /// Provisionally reserved
    Held,
    /// Sold; immutable to the client
    Booked,
}

impl fmt::Display for SeatStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Available => write!(f, "AVAILABLE"),
            Self::Held => write!(f, "HELD"),
            Self::Booked => write!(f, "BOOKED"),
        }
    }
}

/// One seat in a snapshot
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seat {
    /// Row label
    pub row: String,
    /// Seat number within the row
    pub number: u32,
    /// Reported status
    pub status: SeatStatus,
    /// The service still reports a hold whose time window has lapsed
    #[serde(default, deserialize_with = "null_as_false")]
    pub is_held_expired: bool,
}

impl Seat {
    /// Creates a seat with a plain status
    #[must_use]
    pub fn new(row: impl Into<String>, number: u32, status: SeatStatus) -> Self {
        Self {
            row: row.into(),
            number,
            status,
            is_held_expired: false,
        }
    }

    /// Marks the seat as a lapsed hold
    #[must_use]
    pub const fn expired(mut self) -> Self {
        self.is_held_expired = true;
        self
    }

    /// The seat's identity
    #[must_use]
    pub fn key(&self) -> SeatKey {
        SeatKey::new(self.row.clone(), self.number)
    }

    /// Status used for selection and booking eligibility: a lapsed hold
    /// counts as available.
    #[must_use]
    pub const fn effective_status(&self) -> SeatStatus {
        if self.is_held_expired {
            SeatStatus::Available
        } else {
            self.status
        }
    }
}

fn null_as_false<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<bool>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Aggregate seat counts, computed by the service
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    /// Seats free to hold (including lapsed holds)
    pub available: u32,
    /// Seats under a live hold
    pub held: u32,
    /// Seats sold
    pub booked: u32,
}

impl Stats {
    /// Total number of seats in the show, saturating on absurd counts
    #[must_use]
    pub const fn total(&self) -> u32 {
        self.available
            .saturating_add(self.held)
            .saturating_add(self.booked)
    }
}

/// A full point-in-time read of every seat in a show
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Aggregate counts
    #[serde(default)]
    pub stats: Stats,
    /// Every seat, in service order
    #[serde(default)]
    pub seats: Vec<Seat>,
}

// ============================================================================
// Accounts and receipts
// ============================================================================

/// Username/password pair used for login and registration
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct Credentials {
    /// Account name
    pub username: String,
    /// Account password
    pub password: String,
}

impl Credentials {
    /// Creates a new credential pair
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Successful batch hold
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HoldReceipt {
    /// Human-readable confirmation
    #[serde(default)]
    pub message: Option<String>,
    /// When the new holds lapse
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

/// Successful batch booking
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookReceipt {
    /// Human-readable confirmation
    #[serde(default)]
    pub message: Option<String>,
    /// Amount charged for the whole batch
    pub total_paid: Money,
}

/// One booked seat belonging to the logged-in account
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingRecord {
    /// Booking (seat) identifier, usable for ticket lookup
    pub id: i64,
    /// Movie title
    pub movie: String,
    /// Show start time
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    /// Row label
    pub row: String,
    /// Seat number
    pub number: u32,
    /// Price paid
    pub price: Money,
}

/// Printable ticket for a booked seat
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    /// Ticket identifier
    pub ticket_id: i64,
    /// Movie title
    pub movie: String,
    /// Screen name
    pub screen: String,
    /// Show start time
    pub time: DateTime<Utc>,
    /// Seat identifier (`A1`)
    pub seat: String,
    /// Price paid
    pub price: Money,
    /// Account that booked the seat
    #[serde(default)]
    pub booked_by: Option<String>,
    /// Message for the holder
    #[serde(default)]
    pub message: String,
}
