//! The session reducer.
//!
//! Pure state transitions plus effect descriptions; every network call is an
//! `Effect::Future` that reports back with an action carrying the request's
//! correlation id.

use super::actions::SessionAction;
use super::environment::SessionEnvironment;
use super::state::SessionState;
use crate::auth::{AuthPhase, ensure_authenticated};
use crate::dispatch::{SeatInputOutcome, dispatch};
use crate::error::BookingError;
use crate::reconciler::{Reconciled, reconcile};
use crate::types::{CorrelationId, NoticeLevel};
use crate::workflow::{PendingStep, WorkflowPhase};
use showtime_client::{Seat, SeatKey, SeatStatus, ShowId, Snapshot};
use showtime_core::{SmallVec, effect::Effect, reducer::Reducer, smallvec};
use std::sync::Arc;

type Effects = SmallVec<[Effect<SessionAction>; 4]>;

/// Reducer for one booking session.
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionReducer;

impl SessionReducer {
    /// Create the reducer
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn notify(
        state: &mut SessionState,
        env: &SessionEnvironment,
        level: NoticeLevel,
        message: impl Into<String>,
    ) {
        state.notices.push(env.clock.now(), level, message);
    }

    /// Refuse a request before any network call
    fn reject(
        state: &mut SessionState,
        env: &SessionEnvironment,
        correlation_id: CorrelationId,
        error: BookingError,
    ) -> Effects {
        tracing::debug!(%correlation_id, %error, "Request rejected");
        Self::notify(state, env, NoticeLevel::Error, error.to_string());
        smallvec![Effect::send(SessionAction::RequestRejected {
            correlation_id,
            error,
        })]
    }

    fn no_show() -> BookingError {
        BookingError::Validation("Select a show first".to_string())
    }

    fn show_changed() -> BookingError {
        BookingError::Validation("The active show changed".to_string())
    }

    fn seat_list(seats: &[SeatKey]) -> String {
        seats.iter().map(SeatKey::seat_id).collect::<Vec<_>>().join(", ")
    }

    // ========== Seat Snapshot Fetcher ==========

    fn fetch(
        env: &SessionEnvironment,
        show_id: ShowId,
        sequence: u64,
        correlation_id: Option<CorrelationId>,
    ) -> Effect<SessionAction> {
        let inventory = Arc::clone(&env.inventory);
        Effect::Future(Box::pin(async move {
            let result = inventory.fetch_snapshot(show_id).await;
            Some(match result {
                Ok(snapshot) => SessionAction::SnapshotLoaded {
                    correlation_id,
                    show_id,
                    sequence,
                    snapshot,
                },
                Err(error) => SessionAction::SnapshotFailed {
                    correlation_id,
                    show_id,
                    sequence,
                    error: error.into(),
                },
            })
        }))
    }

    /// Stamp and issue a fetch for the active show, if there is one
    fn refresh_active(
        state: &mut SessionState,
        env: &SessionEnvironment,
        correlation_id: Option<CorrelationId>,
    ) -> Option<Effect<SessionAction>> {
        let show_id = state.catalog.active_id()?;
        let sequence = state.fetches.issue();
        tracing::trace!(%show_id, sequence, "Snapshot fetch issued");
        Some(Self::fetch(env, show_id, sequence, correlation_id))
    }

    fn refresh_effects(state: &mut SessionState, env: &SessionEnvironment) -> Effects {
        Self::refresh_active(state, env, None).into_iter().collect()
    }

    // ========== Reconciler ==========

    fn apply_snapshot(
        state: &mut SessionState,
        env: &SessionEnvironment,
        show_id: ShowId,
        sequence: u64,
        snapshot: Snapshot,
    ) {
        if state.catalog.active_id() != Some(show_id) {
            Self::discard(show_id, sequence, "show is no longer active");
            return;
        }
        if !state.fetches.accept(sequence) {
            Self::discard(show_id, sequence, "a newer snapshot is already applied");
            return;
        }

        let Reconciled { grid, dropped } =
            reconcile(show_id, sequence, snapshot, &mut state.selection);
        tracing::debug!(
            %show_id,
            sequence,
            available = grid.stats.available,
            held = grid.stats.held,
            booked = grid.stats.booked,
            "Snapshot applied"
        );
        state.grid = Some(grid);

        for seat in dropped {
            Self::notify(
                state,
                env,
                NoticeLevel::Warning,
                format!("Seat {seat} was booked by someone else and removed from your selection"),
            );
        }
    }

    fn discard(show_id: ShowId, sequence: u64, reason: &str) {
        tracing::warn!(%show_id, sequence, reason, "Discarding snapshot");
        metrics::counter!("showtime.snapshots.discarded").increment(1);
    }

    // ========== Poll Loop ==========

    fn schedule_tick(state: &SessionState, generation: u64) -> Effect<SessionAction> {
        Effect::Delay {
            duration: state.poll.interval(),
            action: Box::new(SessionAction::PollTick { generation }),
        }
    }

    // ========== Reservation Workflow ==========

    fn authenticate(
        env: &SessionEnvironment,
        correlation_id: CorrelationId,
        step: PendingStep,
    ) -> Effect<SessionAction> {
        let inventory = Arc::clone(&env.inventory);
        let credentials = env.credentials.clone();
        Effect::Future(Box::pin(async move {
            let result = ensure_authenticated(inventory.as_ref(), &credentials).await;
            Some(match result {
                Ok(()) => SessionAction::Authenticated {
                    correlation_id,
                    step,
                },
                Err(error) => Self::step_failed(correlation_id, &step, error),
            })
        }))
    }

    fn step_failed(
        correlation_id: CorrelationId,
        step: &PendingStep,
        error: BookingError,
    ) -> SessionAction {
        match step {
            PendingStep::Hold { .. } => SessionAction::HoldFailed {
                correlation_id,
                error,
            },
            PendingStep::Book { .. } => SessionAction::BookFailed {
                correlation_id,
                error,
            },
            PendingStep::Release { .. } => SessionAction::ReleaseFailed {
                correlation_id,
                error,
            },
        }
    }

    /// The batch call of an authenticated attempt
    fn run_step(
        env: &SessionEnvironment,
        correlation_id: CorrelationId,
        step: PendingStep,
    ) -> Effect<SessionAction> {
        let inventory = Arc::clone(&env.inventory);
        Effect::Future(Box::pin(async move {
            Some(match step {
                PendingStep::Hold { show_id, seats } => {
                    let result = inventory.hold_batch(show_id, &seats).await;
                    match result {
                        Ok(receipt) => SessionAction::HoldSucceeded {
                            correlation_id,
                            seats,
                            receipt,
                        },
                        Err(error) => SessionAction::HoldFailed {
                            correlation_id,
                            error: BookingError::from_batch(error),
                        },
                    }
                },
                PendingStep::Book { show_id, seats } => {
                    let result = inventory.book_batch(show_id, &seats).await;
                    match result {
                        Ok(receipt) => SessionAction::BookSucceeded {
                            correlation_id,
                            show_id,
                            seats,
                            receipt,
                        },
                        Err(error) => SessionAction::BookFailed {
                            correlation_id,
                            error: BookingError::from_batch(error),
                        },
                    }
                },
                PendingStep::Release { show_id, seats } => {
                    let result = inventory.release_batch(show_id, &seats).await;
                    match result {
                        Ok(()) => SessionAction::ReleaseSucceeded {
                            correlation_id,
                            seats,
                        },
                        Err(error) => SessionAction::ReleaseFailed {
                            correlation_id,
                            error: BookingError::from_batch(error),
                        },
                    }
                },
            })
        }))
    }

    /// Surface a workflow failure and return the attempt to IDLE
    fn fail(
        state: &mut SessionState,
        env: &SessionEnvironment,
        correlation_id: CorrelationId,
        error: BookingError,
        what: &str,
    ) {
        tracing::error!(%correlation_id, %error, "{what}");
        if matches!(error, BookingError::Auth(_)) {
            state.auth = AuthPhase::Unknown;
        }
        Self::notify(state, env, NoticeLevel::Error, format!("{what}: {error}"));
        if state.workflow.is_current(correlation_id) {
            state.workflow.failed(error);
        }
    }

    /// Seats to book: every live hold in a fresh snapshot.
    ///
    /// The snapshot does not say who holds a seat, so every live hold is
    /// assumed to belong to this session.
    fn live_holds(snapshot: &Snapshot) -> Vec<SeatKey> {
        snapshot
            .seats
            .iter()
            .filter(|seat| seat.effective_status() == SeatStatus::Held)
            .map(Seat::key)
            .collect()
    }
}

impl Reducer for SessionReducer {
    type State = SessionState;
    type Action = SessionAction;
    type Environment = SessionEnvironment;

    #[allow(clippy::too_many_lines)] // One arm per action
    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            // ========== Catalog Store ==========
            SessionAction::LoadCatalog {
                correlation_id,
                date,
            } => {
                let inventory = Arc::clone(&env.inventory);
                smallvec![Effect::Future(Box::pin(async move {
                    let result = inventory.list_shows(date).await;
                    Some(match result {
                        Ok(shows) => SessionAction::CatalogLoaded {
                            correlation_id,
                            shows,
                        },
                        Err(error) => SessionAction::CatalogFailed {
                            correlation_id,
                            error: error.into(),
                        },
                    })
                }))]
            },

            SessionAction::CatalogLoaded { shows, .. } => {
                tracing::info!(count = shows.len(), "Catalog loaded");
                let message = format!("Loaded {} show(s)", shows.len());
                state.catalog.replace(shows);
                Self::notify(state, env, NoticeLevel::Info, message);
                SmallVec::new()
            },

            SessionAction::CatalogFailed { error, .. } => {
                tracing::error!(%error, "Catalog listing failed");
                Self::notify(
                    state,
                    env,
                    NoticeLevel::Error,
                    format!("Could not load shows: {error}"),
                );
                SmallVec::new()
            },

            SessionAction::SelectShow {
                correlation_id,
                show_id,
            } => {
                let (movie, screen) = match state.catalog.set_active(show_id) {
                    Ok(show) => (show.movie.clone(), show.screen.clone()),
                    Err(error) => return Self::reject(state, env, correlation_id, error),
                };

                let cleared = state.selection.len();
                state.selection.clear();
                state.grid = None;
                state.fetches.fence();
                tracing::info!(%show_id, cleared, "Active show changed");
                Self::notify(
                    state,
                    env,
                    NoticeLevel::Info,
                    format!("Now showing {movie} ({screen})"),
                );

                let mut effects: Effects = SmallVec::new();
                effects.extend(Self::refresh_active(state, env, Some(correlation_id)));
                if let Some(generation) = state.poll.redirect() {
                    tracing::debug!(generation, "Poll loop redirected");
                    effects.push(Self::schedule_tick(state, generation));
                }
                effects
            },

            // ========== Seat Snapshot Fetcher / Reconciler ==========
            SessionAction::RefreshSeats { correlation_id } => {
                match Self::refresh_active(state, env, correlation_id) {
                    Some(fetch) => smallvec![fetch],
                    None => match correlation_id {
                        Some(correlation_id) => {
                            Self::reject(state, env, correlation_id, Self::no_show())
                        },
                        None => SmallVec::new(),
                    },
                }
            },

            SessionAction::SnapshotLoaded {
                show_id,
                sequence,
                snapshot,
                ..
            } => {
                Self::apply_snapshot(state, env, show_id, sequence, snapshot);
                SmallVec::new()
            },

            SessionAction::SnapshotFailed {
                show_id,
                sequence,
                error,
                ..
            } => {
                tracing::warn!(%show_id, sequence, %error, "Snapshot fetch failed, keeping last seat map");
                SmallVec::new()
            },

            // ========== Poll Loop ==========
            SessionAction::StartPolling => {
                let Some(generation) = state.poll.start() else {
                    tracing::debug!("Poll loop already running");
                    return SmallVec::new();
                };
                tracing::info!(
                    generation,
                    interval_ms = state.poll.interval().as_millis(),
                    "Poll loop started"
                );
                let mut effects: Effects = smallvec![Self::schedule_tick(state, generation)];
                effects.extend(Self::refresh_active(state, env, None));
                effects
            },

            SessionAction::StopPolling => {
                state.poll.stop();
                tracing::info!("Poll loop stopped");
                SmallVec::new()
            },

            SessionAction::PollTick { generation } => {
                if !state.poll.is_live(generation) {
                    tracing::trace!(generation, "Retired poll chain ended");
                    return SmallVec::new();
                }
                let mut effects: Effects = smallvec![Self::schedule_tick(state, generation)];
                effects.extend(Self::refresh_active(state, env, None));
                effects
            },

            // ========== Selection Model ==========
            SessionAction::SeatInput { seat, command } => {
                let outcome = dispatch(&mut state.selection, state.grid.as_mut(), &seat, command);
                tracing::debug!(%seat, ?command, ?outcome, "Seat input");
                if outcome == SeatInputOutcome::UnknownSeat {
                    Self::notify(
                        state,
                        env,
                        NoticeLevel::Warning,
                        format!("Seat {seat} is not on the seat map"),
                    );
                }
                SmallVec::new()
            },

            SessionAction::ClearSelection => {
                state.selection.clear();
                if let Some(grid) = state.grid.as_mut() {
                    grid.clear_selected();
                }
                SmallVec::new()
            },

            // ========== Reservation Workflow ==========
            SessionAction::HoldSelected { correlation_id } => {
                let Some(show_id) = state.catalog.active_id() else {
                    return Self::reject(state, env, correlation_id, Self::no_show());
                };
                if state.selection.is_empty() {
                    return Self::reject(
                        state,
                        env,
                        correlation_id,
                        BookingError::Validation("Select at least one seat to hold".to_string()),
                    );
                }
                if let Err(error) =
                    state.workflow.begin(correlation_id, WorkflowPhase::Authenticating)
                {
                    return Self::reject(state, env, correlation_id, error);
                }

                let seats = state.selection.keys();
                tracing::info!(%correlation_id, %show_id, seats = seats.len(), "Holding seats");
                Self::notify(
                    state,
                    env,
                    NoticeLevel::Info,
                    format!("Holding {}...", Self::seat_list(&seats)),
                );
                smallvec![Self::authenticate(
                    env,
                    correlation_id,
                    PendingStep::Hold { show_id, seats }
                )]
            },

            SessionAction::BookHeld { correlation_id } => {
                let Some(show_id) = state.catalog.active_id() else {
                    return Self::reject(state, env, correlation_id, Self::no_show());
                };
                if let Err(error) =
                    state.workflow.begin(correlation_id, WorkflowPhase::ResolvingHolds)
                {
                    return Self::reject(state, env, correlation_id, error);
                }

                tracing::info!(%correlation_id, %show_id, "Resolving held seats before booking");
                let sequence = state.fetches.issue();
                let inventory = Arc::clone(&env.inventory);
                smallvec![Effect::Future(Box::pin(async move {
                    let result = inventory
                        .fetch_snapshot(show_id)
                        .await
                        .map_err(BookingError::from);
                    Some(SessionAction::HeldSeatsResolved {
                        correlation_id,
                        show_id,
                        sequence,
                        result,
                    })
                }))]
            },

            SessionAction::ReleaseHeld { correlation_id } => {
                let Some(show_id) = state.catalog.active_id() else {
                    return Self::reject(state, env, correlation_id, Self::no_show());
                };
                let seats: Vec<SeatKey> = state
                    .selection
                    .keys()
                    .into_iter()
                    .filter(|key| {
                        state
                            .grid
                            .as_ref()
                            .and_then(|grid| grid.seat(key))
                            .is_some_and(|seat| seat.effective == SeatStatus::Held)
                    })
                    .collect();
                if seats.is_empty() {
                    return Self::reject(
                        state,
                        env,
                        correlation_id,
                        BookingError::Validation("None of the selected seats are held".to_string()),
                    );
                }
                if let Err(error) =
                    state.workflow.begin(correlation_id, WorkflowPhase::Authenticating)
                {
                    return Self::reject(state, env, correlation_id, error);
                }

                tracing::info!(%correlation_id, %show_id, seats = seats.len(), "Releasing holds");
                smallvec![Self::authenticate(
                    env,
                    correlation_id,
                    PendingStep::Release { show_id, seats }
                )]
            },

            SessionAction::HeldSeatsResolved {
                correlation_id,
                show_id,
                sequence,
                result,
            } => {
                if !state.workflow.is_current(correlation_id) {
                    return SmallVec::new();
                }
                let snapshot = match result {
                    Ok(snapshot) => snapshot,
                    Err(error) => {
                        return smallvec![Effect::send(SessionAction::BookFailed {
                            correlation_id,
                            error,
                        })];
                    },
                };
                if state.catalog.active_id() != Some(show_id) {
                    tracing::info!(%correlation_id, %show_id, "Show switched while resolving holds");
                    return smallvec![Effect::send(SessionAction::BookFailed {
                        correlation_id,
                        error: Self::show_changed(),
                    })];
                }

                let seats = Self::live_holds(&snapshot);
                Self::apply_snapshot(state, env, show_id, sequence, snapshot);
                if seats.is_empty() {
                    return smallvec![Effect::send(SessionAction::BookFailed {
                        correlation_id,
                        error: BookingError::NothingToBook,
                    })];
                }

                state.workflow.advance(WorkflowPhase::Authenticating);
                tracing::debug!(%correlation_id, seats = seats.len(), "Live holds resolved");
                smallvec![Self::authenticate(
                    env,
                    correlation_id,
                    PendingStep::Book { show_id, seats }
                )]
            },

            SessionAction::Authenticated {
                correlation_id,
                step,
            } => {
                if !state.workflow.is_current(correlation_id) {
                    tracing::debug!(%correlation_id, "Ignoring auth result of a finished attempt");
                    return SmallVec::new();
                }
                state.auth = AuthPhase::Authenticated;
                if state.catalog.active_id() != Some(step.show_id()) {
                    tracing::info!(%correlation_id, step = step.verb(), "Show switched before the batch call");
                    let failed = Self::step_failed(correlation_id, &step, Self::show_changed());
                    return smallvec![Effect::send(failed)];
                }
                state.workflow.advance(step.phase());
                tracing::debug!(%correlation_id, step = step.verb(), "Authenticated, sending batch");
                smallvec![Self::run_step(env, correlation_id, step)]
            },

            SessionAction::HoldSucceeded {
                correlation_id,
                seats,
                receipt,
            } => {
                if state.workflow.is_current(correlation_id) {
                    state.workflow.held(receipt.expires_at);
                }
                tracing::info!(%correlation_id, seats = seats.len(), "Seats held");
                let list = Self::seat_list(&seats);
                let message = match receipt.expires_at {
                    Some(until) => format!("Held {list} until {}", until.format("%H:%M:%S UTC")),
                    None => format!("Held {list}"),
                };
                Self::notify(state, env, NoticeLevel::Success, message);
                Self::refresh_effects(state, env)
            },

            SessionAction::HoldFailed {
                correlation_id,
                error,
            } => {
                Self::fail(state, env, correlation_id, error, "Hold failed");
                SmallVec::new()
            },

            SessionAction::BookSucceeded {
                correlation_id,
                show_id,
                seats,
                receipt,
            } => {
                if state.workflow.is_current(correlation_id) {
                    state.workflow.booked();
                }
                if state.catalog.active_id() == Some(show_id) {
                    state.selection.clear();
                    if let Some(grid) = state.grid.as_mut() {
                        grid.clear_selected();
                    }
                }
                tracing::info!(%correlation_id, seats = seats.len(), total_paid = %receipt.total_paid, "Seats booked");
                Self::notify(
                    state,
                    env,
                    NoticeLevel::Success,
                    format!(
                        "Booked {}. Total paid: {}",
                        Self::seat_list(&seats),
                        receipt.total_paid
                    ),
                );
                Self::refresh_effects(state, env)
            },

            SessionAction::BookFailed {
                correlation_id,
                error,
            } => {
                Self::fail(state, env, correlation_id, error, "Booking failed");
                Self::refresh_effects(state, env)
            },

            SessionAction::ReleaseSucceeded {
                correlation_id,
                seats,
            } => {
                if state.workflow.is_current(correlation_id) {
                    state.workflow.released();
                }
                tracing::info!(%correlation_id, seats = seats.len(), "Holds released");
                Self::notify(
                    state,
                    env,
                    NoticeLevel::Success,
                    format!("Released {}", Self::seat_list(&seats)),
                );
                Self::refresh_effects(state, env)
            },

            SessionAction::ReleaseFailed {
                correlation_id,
                error,
            } => {
                Self::fail(state, env, correlation_id, error, "Release failed");
                SmallVec::new()
            },

            // ========== Account ==========
            SessionAction::LoadBookings { correlation_id } => {
                let inventory = Arc::clone(&env.inventory);
                let credentials = env.credentials.clone();
                smallvec![Effect::Future(Box::pin(async move {
                    let result = match ensure_authenticated(inventory.as_ref(), &credentials).await {
                        Ok(()) => inventory.my_bookings().await.map_err(BookingError::from),
                        Err(error) => Err(error),
                    };
                    Some(match result {
                        Ok(bookings) => SessionAction::BookingsLoaded {
                            correlation_id,
                            bookings,
                        },
                        Err(error) => SessionAction::AccountRequestFailed {
                            correlation_id,
                            error,
                        },
                    })
                }))]
            },

            SessionAction::BookingsLoaded { bookings, .. } => {
                state.auth = AuthPhase::Authenticated;
                tracing::info!(count = bookings.len(), "Bookings loaded");
                let message = format!("You have {} booking(s)", bookings.len());
                state.bookings = bookings;
                Self::notify(state, env, NoticeLevel::Info, message);
                SmallVec::new()
            },

            SessionAction::LoadTicket {
                correlation_id,
                booking_id,
            } => {
                let inventory = Arc::clone(&env.inventory);
                smallvec![Effect::Future(Box::pin(async move {
                    let result = inventory.ticket(booking_id).await;
                    Some(match result {
                        Ok(ticket) => SessionAction::TicketLoaded {
                            correlation_id,
                            ticket,
                        },
                        Err(error) => SessionAction::AccountRequestFailed {
                            correlation_id,
                            error: error.into(),
                        },
                    })
                }))]
            },

            SessionAction::TicketLoaded { ticket, .. } => {
                tracing::info!(ticket_id = %ticket.ticket_id, "Ticket loaded");
                let message = format!("Ticket {} for {}", ticket.ticket_id, ticket.movie);
                state.last_ticket = Some(ticket);
                Self::notify(state, env, NoticeLevel::Info, message);
                SmallVec::new()
            },

            SessionAction::Logout { correlation_id } => {
                let inventory = Arc::clone(&env.inventory);
                smallvec![Effect::Future(Box::pin(async move {
                    let result = inventory.logout().await;
                    Some(match result {
                        Ok(()) => SessionAction::LoggedOut { correlation_id },
                        Err(error) => SessionAction::AccountRequestFailed {
                            correlation_id,
                            error: error.into(),
                        },
                    })
                }))]
            },

            SessionAction::LoggedOut { .. } => {
                state.auth = AuthPhase::Unknown;
                tracing::info!("Logged out");
                Self::notify(state, env, NoticeLevel::Info, "Logged out");
                SmallVec::new()
            },

            SessionAction::AccountRequestFailed { error, .. } => {
                tracing::error!(%error, "Account request failed");
                if matches!(error, BookingError::Auth(_)) {
                    state.auth = AuthPhase::Unknown;
                }
                Self::notify(state, env, NoticeLevel::Error, error.to_string());
                SmallVec::new()
            },

            // The notice was recorded when the request was refused
            SessionAction::RequestRejected { .. } => SmallVec::new(),
        }
    }
}
