//! # Showtime Booking
//!
//! Seat-state synchronization and reservation engine for a movie-showtime
//! booking client.
//!
//! The engine keeps a periodically refreshed view of a show's seats,
//! reconciles it with the seats the user has picked, and drives the
//! hold-then-book workflow against the seat-inventory service:
//!
//! ```text
//! Poll Loop ─▶ Seat Snapshot Fetcher ─▶ Reconciler ─▶ SeatGrid
//! seat input ─▶ Selection Model ─▶ Reservation Workflow ─▶ Auth Bootstrapper ─▶ service
//! ```
//!
//! All of it runs as one [`session::SessionReducer`] inside a
//! `showtime_runtime::Store`; [`BookingSession`] wraps the store with
//! request/response methods.
//!
//! ## Example
//!
//! ```ignore
//! let session = BookingSession::connect(&Config::from_env())?;
//! let shows = session.load_catalog(None).await?;
//! session.select_show(shows[0].id).await?;
//! session.start_polling().await?;
//!
//! session.toggle("A1".parse()?).await?;
//! session.toggle("A2".parse()?).await?;
//! session.hold_selected().await?;
//! let receipt = session.book_held().await?;
//! println!("Paid {}", receipt.total_paid);
//! ```

pub mod app;
pub mod auth;
pub mod catalog;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod poll;
pub mod poster;
pub mod reconciler;
pub mod selection;
pub mod session;
pub mod types;
pub mod workflow;

pub use app::BookingSession;
pub use auth::{AuthPhase, ensure_authenticated};
pub use catalog::Catalog;
pub use config::Config;
pub use dispatch::{SeatInputOutcome, dispatch};
pub use error::BookingError;
pub use poll::PollLoop;
pub use poster::{Poster, PosterResolver};
pub use reconciler::{FetchSequencer, Reconciled, reconcile};
pub use selection::{Selection, SelectionEntry};
pub use session::{SessionAction, SessionEnvironment, SessionReducer, SessionState, SessionStore};
pub use types::{
    CorrelationId, Notice, NoticeLevel, NoticeLog, SeatCommand, SeatGrid, SeatRow, SeatView,
};
pub use workflow::{PendingStep, Workflow, WorkflowPhase};
