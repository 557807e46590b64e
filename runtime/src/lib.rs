//! # Showtime Runtime
//!
//! Runtime implementation for the Showtime session architecture.
//!
//! This crate provides the [`Store`]: it owns the session state, runs the
//! reducer for every action and executes the effects the reducer returns.
//!
//! ## Core Components
//!
//! - **Store**: manages state and executes effects
//! - **Effect Executor**: executes effect descriptions and feeds actions back to the reducer
//! - **Action Broadcast**: lets callers wait for the outcome of a request
//!
//! ## Example
//!
//! ```ignore
//! use showtime_runtime::Store;
//!
//! let store = Store::new(SessionState::default(), SessionReducer::new(), environment);
//!
//! // Fire and forget
//! store.send(SessionAction::RefreshSeats { correlation_id: None }).await?;
//!
//! // Read state
//! let selected = store.state(|s| s.selection.len()).await;
//! ```

use futures::future::{BoxFuture, join_all};
use showtime_core::{effect::Effect, reducer::Reducer};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;

/// Error types for the Store runtime
pub mod error {
    use thiserror::Error;

    /// Errors that can occur during Store operations
    #[derive(Error, Debug, Clone, PartialEq, Eq)]
    pub enum StoreError {
        /// Store is shutting down and not accepting new actions
        ///
        /// This error is returned when `send()` is called after shutdown initiated.
        #[error("Store is shutting down")]
        ShutdownInProgress,

        /// Shutdown timed out waiting for effects to complete
        #[error("Shutdown timed out with {0} effects still running")]
        ShutdownTimeout(usize),

        /// Timeout waiting for terminal action
        ///
        /// Returned by `send_and_wait_for` when the timeout expires before
        /// a matching action is received.
        #[error("Timeout waiting for action")]
        Timeout,

        /// Action broadcast channel closed
        #[error("Action broadcast channel closed")]
        ChannelClosed,
    }
}

pub use error::StoreError;

/// Decrements the pending-effect counter when an effect task finishes,
/// including when it panics.
struct PendingGuard(Arc<AtomicUsize>);

impl Drop for PendingGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Store module - the runtime coordinator
pub mod store {
    use super::{
        Arc, AtomicBool, AtomicUsize, BoxFuture, Duration, Effect, Ordering, PendingGuard,
        Reducer, RwLock, StoreError, join_all,
    };
    use tokio::sync::broadcast;

    /// The Store - runtime coordinator for a reducer
    ///
    /// The Store manages:
    /// 1. State (behind `RwLock` for concurrent access)
    /// 2. Reducer (session logic)
    /// 3. Environment (injected dependencies)
    /// 4. Effect execution (with feedback loop)
    ///
    /// Reducer calls are serialised by the state write lock, so two actions
    /// never observe each other half-applied.
    ///
    /// # Type Parameters
    ///
    /// - `S`: State type
    /// - `A`: Action type
    /// - `E`: Environment type
    /// - `R`: Reducer implementation
    pub struct Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E>,
    {
        state: Arc<RwLock<S>>,
        reducer: Arc<R>,
        environment: Arc<E>,
        shutdown: Arc<AtomicBool>,
        pending_effects: Arc<AtomicUsize>,
        /// Every action produced by an effect is broadcast here after it has
        /// been reduced.
        action_broadcast: broadcast::Sender<A>,
    }

    impl<S, A, E, R> Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E> + Send + Sync + 'static,
        A: Send + Clone + 'static,
        S: Send + Sync + 'static,
        E: Send + Sync + 'static,
    {
        /// Create a new store with initial state, reducer, and environment
        ///
        /// The action broadcast holds 64 actions; a poll loop plus one
        /// in-flight workflow stays well below that.
        #[must_use]
        pub fn new(initial_state: S, reducer: R, environment: E) -> Self {
            Self::with_broadcast_capacity(initial_state, reducer, environment, 64)
        }

        /// Create a new store with a custom action broadcast capacity
        #[must_use]
        pub fn with_broadcast_capacity(
            initial_state: S,
            reducer: R,
            environment: E,
            capacity: usize,
        ) -> Self {
            let (action_broadcast, _) = broadcast::channel(capacity.max(1));

            Self {
                state: Arc::new(RwLock::new(initial_state)),
                reducer: Arc::new(reducer),
                environment: Arc::new(environment),
                shutdown: Arc::new(AtomicBool::new(false)),
                pending_effects: Arc::new(AtomicUsize::new(0)),
                action_broadcast,
            }
        }

        /// Send an action to the store
        ///
        /// Runs the reducer under the state write lock, then starts every
        /// returned effect on the Tokio runtime. Effects run in the background;
        /// this method does not wait for them.
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownInProgress`] if the store is shutting down.
        #[tracing::instrument(skip(self, action), name = "store_send")]
        pub async fn send(&self, action: A) -> Result<(), StoreError> {
            if self.shutdown.load(Ordering::Acquire) {
                tracing::warn!("Rejected action: store is shutting down");
                metrics::counter!("store.shutdown.rejected_actions").increment(1);
                return Err(StoreError::ShutdownInProgress);
            }

            metrics::counter!("store.actions.total").increment(1);

            let effects = {
                let mut state = self.state.write().await;
                let effects = self.reducer.reduce(&mut *state, action, &self.environment);
                tracing::trace!("Reducer completed, returned {} effects", effects.len());
                effects
            };

            for effect in effects {
                if effect.is_none() {
                    continue;
                }
                self.pending_effects.fetch_add(1, Ordering::SeqCst);
                let guard = PendingGuard(Arc::clone(&self.pending_effects));
                let run = self.clone().run_effect(effect);
                tokio::spawn(async move {
                    let _guard = guard;
                    run.await;
                });
            }

            Ok(())
        }

        /// Send an action and wait for a matching result action
        ///
        /// Subscribes to the action broadcast before sending, so a result
        /// produced immediately cannot be missed.
        ///
        /// # Errors
        ///
        /// - [`StoreError::Timeout`]: Timeout expired before matching action received
        /// - [`StoreError::ChannelClosed`]: Action broadcast channel closed
        /// - [`StoreError::ShutdownInProgress`]: Store is shutting down
        pub async fn send_and_wait_for<F>(
            &self,
            action: A,
            predicate: F,
            timeout: Duration,
        ) -> Result<A, StoreError>
        where
            F: Fn(&A) -> bool,
        {
            // Subscribe BEFORE sending to avoid race condition
            let mut rx = self.action_broadcast.subscribe();

            self.send(action).await?;

            tokio::time::timeout(timeout, async {
                loop {
                    match rx.recv().await {
                        Ok(action) if predicate(&action) => return Ok(action),
                        Ok(_) => {},
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            // Terminal action may have been dropped; timeout catches it
                            tracing::warn!(skipped, "Action observer lagged");
                        },
                        Err(broadcast::error::RecvError::Closed) => {
                            return Err(StoreError::ChannelClosed);
                        },
                    }
                }
            })
            .await
            .map_err(|_| StoreError::Timeout)?
        }

        /// Subscribe to all actions produced by effects
        #[must_use]
        pub fn subscribe_actions(&self) -> broadcast::Receiver<A> {
            self.action_broadcast.subscribe()
        }

        /// Read current state via a closure
        ///
        /// ```ignore
        /// let selected = store.state(|s| s.selection.len()).await;
        /// ```
        pub async fn state<F, T>(&self, f: F) -> T
        where
            F: FnOnce(&S) -> T,
        {
            let state = self.state.read().await;
            f(&*state)
        }

        /// Number of effects currently executing
        #[must_use]
        pub fn pending_effects(&self) -> usize {
            self.pending_effects.load(Ordering::SeqCst)
        }

        /// Stop accepting actions and wait for running effects to finish
        ///
        /// Effects that are sleeping (poll ticks) keep the counter up, so a
        /// session with polling enabled should stop polling first.
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownTimeout`] if effects are still running
        /// when `timeout` elapses.
        pub async fn shutdown(&self, timeout: Duration) -> Result<(), StoreError> {
            self.shutdown.store(true, Ordering::Release);
            tracing::info!("Store shutdown initiated");

            let deadline = tokio::time::Instant::now() + timeout;
            loop {
                let pending = self.pending_effects();
                if pending == 0 {
                    tracing::info!("Store shutdown complete");
                    return Ok(());
                }
                if tokio::time::Instant::now() >= deadline {
                    tracing::warn!(pending, "Store shutdown timed out");
                    return Err(StoreError::ShutdownTimeout(pending));
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        }

        /// Feed an effect-produced action back into the reducer, then tell
        /// observers about it.
        async fn feed_back(&self, action: A) {
            match self.send(action.clone()).await {
                Ok(()) => {
                    let _ = self.action_broadcast.send(action);
                },
                Err(error) => {
                    tracing::debug!(%error, "Dropped effect action");
                },
            }
        }

        /// Execute one effect to completion.
        ///
        /// - `None`: No-op
        /// - `Future`: awaits the computation, feeds the action back if `Some`
        /// - `Delay`: sleeps, then feeds the action back
        /// - `Parallel`: runs all effects concurrently
        /// - `Sequential`: runs effects in order, each finishing before the next
        fn run_effect(self, effect: Effect<A>) -> BoxFuture<'static, ()> {
            Box::pin(async move {
                match effect {
                    Effect::None => {},
                    Effect::Future(fut) => {
                        metrics::counter!("store.effects.executed", "type" => "future")
                            .increment(1);
                        if let Some(action) = fut.await {
                            self.feed_back(action).await;
                        }
                    },
                    Effect::Delay { duration, action } => {
                        metrics::counter!("store.effects.executed", "type" => "delay")
                            .increment(1);
                        tokio::time::sleep(duration).await;
                        self.feed_back(*action).await;
                    },
                    Effect::Parallel(effects) => {
                        metrics::counter!("store.effects.executed", "type" => "parallel")
                            .increment(1);
                        join_all(effects.into_iter().map(|e| self.clone().run_effect(e))).await;
                    },
                    Effect::Sequential(effects) => {
                        metrics::counter!("store.effects.executed", "type" => "sequential")
                            .increment(1);
                        for effect in effects {
                            self.clone().run_effect(effect).await;
                        }
                    },
                }
            })
        }
    }

    impl<S, A, E, R> Clone for Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E>,
    {
        fn clone(&self) -> Self {
            Self {
                state: Arc::clone(&self.state),
                reducer: Arc::clone(&self.reducer),
                environment: Arc::clone(&self.environment),
                shutdown: Arc::clone(&self.shutdown),
                pending_effects: Arc::clone(&self.pending_effects),
                action_broadcast: self.action_broadcast.clone(),
            }
        }
    }
}

// Re-export for convenience
pub use store::Store;

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code
mod tests {
    use super::*;
    use showtime_core::{SmallVec, smallvec};

    #[derive(Debug, Clone, PartialEq)]
    enum TallyAction {
        Add(u32),
        AddLater(u32),
        Added(u32),
        Chain,
    }

    #[derive(Debug, Default)]
    struct TallyState {
        total: u32,
        log: Vec<u32>,
    }

    struct TallyReducer;

    impl Reducer for TallyReducer {
        type State = TallyState;
        type Action = TallyAction;
        type Environment = ();

        fn reduce(
            &self,
            state: &mut TallyState,
            action: TallyAction,
            _env: &(),
        ) -> SmallVec<[Effect<TallyAction>; 4]> {
            match action {
                TallyAction::Add(n) => {
                    state.total += n;
                    smallvec![Effect::None]
                },
                TallyAction::AddLater(n) => smallvec![Effect::Future(Box::pin(async move {
                    Some(TallyAction::Added(n))
                }))],
                TallyAction::Added(n) => {
                    state.total += n;
                    state.log.push(n);
                    smallvec![Effect::None]
                },
                TallyAction::Chain => smallvec![Effect::chain(vec![
                    Effect::Delay {
                        duration: Duration::from_millis(20),
                        action: Box::new(TallyAction::Added(1)),
                    },
                    Effect::send(TallyAction::Added(2)),
                ])],
            }
        }
    }

    fn tally_store() -> Store<TallyState, TallyAction, (), TallyReducer> {
        Store::new(TallyState::default(), TallyReducer, ())
    }

    #[tokio::test]
    async fn test_send_applies_reducer() {
        let store = tally_store();
        store.send(TallyAction::Add(3)).await.unwrap();
        store.send(TallyAction::Add(4)).await.unwrap();
        assert_eq!(store.state(|s| s.total).await, 7);
    }

    #[tokio::test]
    async fn test_send_and_wait_sees_reduced_state() {
        let store = tally_store();
        let result = store
            .send_and_wait_for(
                TallyAction::AddLater(5),
                |a| matches!(a, TallyAction::Added(_)),
                Duration::from_secs(1),
            )
            .await
            .unwrap();

        assert_eq!(result, TallyAction::Added(5));
        // Broadcast happens after the reducer ran
        assert_eq!(store.state(|s| s.total).await, 5);
    }

    #[tokio::test]
    async fn test_sequential_effects_keep_order() {
        let store = tally_store();
        let mut rx = store.subscribe_actions();
        store.send(TallyAction::Chain).await.unwrap();

        assert_eq!(rx.recv().await.unwrap(), TallyAction::Added(1));
        assert_eq!(rx.recv().await.unwrap(), TallyAction::Added(2));
        assert_eq!(store.state(|s| s.log.clone()).await, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_wait_times_out_without_result() {
        let store = tally_store();
        let result = store
            .send_and_wait_for(
                TallyAction::Add(1),
                |a| matches!(a, TallyAction::Added(_)),
                Duration::from_millis(30),
            )
            .await;
        assert_eq!(result, Err(StoreError::Timeout));
    }

    #[tokio::test]
    async fn test_shutdown_rejects_new_actions() {
        let store = tally_store();
        store.send(TallyAction::AddLater(1)).await.unwrap();
        store.shutdown(Duration::from_secs(1)).await.unwrap();

        assert_eq!(
            store.send(TallyAction::Add(1)).await,
            Err(StoreError::ShutdownInProgress)
        );
        assert_eq!(store.pending_effects(), 0);
    }
}
