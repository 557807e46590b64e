//! The booking session: one state value, one reducer, one store.
//!
//! # Architecture
//!
//! ```text
//! user input ─▶ SessionAction ─▶ SessionReducer ─▶ SessionState
//!                                      │
//!                                      ▼
//!                  Effect::Future (service call) / Effect::Delay (poll tick)
//!                                      │
//!                                      ▼
//!                  result action ─▶ SessionReducer ─▶ broadcast to observers
//! ```
//!
//! Poll ticks, post-action refreshes and workflow calls all run as effects of
//! the same store, so the reducer is the only place state changes and every
//! snapshot passes through the same staleness check.

pub mod actions;
pub mod environment;
pub mod reducer;
pub mod state;

pub use actions::SessionAction;
pub use environment::SessionEnvironment;
pub use reducer::SessionReducer;
pub use state::SessionState;

/// Store running a booking session
pub type SessionStore =
    showtime_runtime::Store<SessionState, SessionAction, SessionEnvironment, SessionReducer>;
