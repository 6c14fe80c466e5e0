//! Polling scheduler.
//!
//! Runs a refresh action on a fixed interval with at most one refresh in
//! flight. A tick that lands while a refresh is still running is skipped,
//! not queued.
//!
//! Every call to [`PollingScheduler::enable`] starts a new timer generation.
//! Timer callbacks carry the generation they were started with and do
//! nothing once it is stale, so a disabled (or re-enabled) scheduler never
//! runs a leftover tick.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::lock;

type RefreshFuture = Pin<Box<dyn Future<Output = Result<()>> + Send + 'static>>;
type RefreshAction = Arc<dyn Fn() -> RefreshFuture + Send + Sync>;

/// Scheduler settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Time between ticks.
    pub interval: Duration,
    /// Start polling as soon as the scheduler is built.
    pub enabled: bool,
    /// Refresh once right away whenever polling is enabled.
    pub immediate: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30),
            enabled: true,
            immediate: true,
        }
    }
}

/// Result of one refresh request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The action ran and succeeded.
    Completed,
    /// The action ran and failed; see [`PollingScheduler::last_error`].
    Failed,
    /// Another refresh was in flight, nothing ran.
    Skipped,
}

#[derive(Default)]
struct State {
    enabled: bool,
    refreshing: bool,
    generation: u64,
    last_error: Option<Error>,
    timer: Option<JoinHandle<()>>,
}

struct Inner {
    action: RefreshAction,
    interval: Duration,
    immediate: bool,
    state: Mutex<State>,
}

/// Clears the busy flag even when the refresh future is dropped midway.
struct BusyGuard<'a>(&'a Inner);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        lock(&self.0.state).refreshing = false;
    }
}

impl Inner {
    async fn run_refresh(&self) -> RefreshOutcome {
        {
            let mut state = lock(&self.state);
            if state.refreshing {
                debug!("refresh already in flight, skipping");
                return RefreshOutcome::Skipped;
            }
            state.refreshing = true;
            state.last_error = None;
        }

        let guard = BusyGuard(self);
        let result = (self.action)().await;
        drop(guard);

        match result {
            Ok(()) => RefreshOutcome::Completed,
            Err(e) => {
                warn!("refresh failed: {e}");
                lock(&self.state).last_error = Some(e);
                RefreshOutcome::Failed
            }
        }
    }

    fn is_current(&self, generation: u64) -> bool {
        let state = lock(&self.state);
        state.enabled && state.generation == generation
    }

    fn enable(self: &Arc<Self>) {
        let mut state = lock(&self.state);
        if state.enabled {
            return;
        }
        state.enabled = true;
        state.generation += 1;
        let generation = state.generation;
        state.timer = Some(tokio::spawn(run_timer(
            Arc::downgrade(self),
            generation,
            self.interval,
            self.immediate,
        )));
        debug!(generation, "polling enabled");
    }

    fn disable(&self) {
        let mut state = lock(&self.state);
        if !state.enabled {
            return;
        }
        state.enabled = false;
        state.generation += 1;
        if let Some(timer) = state.timer.take() {
            timer.abort();
        }
        debug!("polling disabled");
    }
}

async fn run_timer(inner: Weak<Inner>, generation: u64, period: Duration, immediate: bool) {
    if immediate {
        spawn_tick(&inner, generation);
    }

    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    loop {
        ticker.tick().await;
        if !spawn_tick(&inner, generation) {
            break;
        }
    }
}

/// Start one tick in the background. Returns false once the scheduler is
/// gone or the generation is stale.
fn spawn_tick(inner: &Weak<Inner>, generation: u64) -> bool {
    let Some(inner) = inner.upgrade() else {
        return false;
    };
    if !inner.is_current(generation) {
        return false;
    }
    tokio::spawn(async move {
        if inner.is_current(generation) {
            inner.run_refresh().await;
        }
    });
    true
}

/// Drives a refresh action on a fixed interval.
///
/// Dropping the scheduler stops its timer.
pub struct PollingScheduler {
    inner: Arc<Inner>,
}

impl PollingScheduler {
    /// Create a scheduler. Starts polling right away when
    /// `config.enabled` is set.
    ///
    /// # Panics
    ///
    /// Panics if polling starts outside a tokio runtime.
    pub fn new<F, Fut>(action: F, config: SchedulerConfig) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        let action: RefreshAction = Arc::new(move || Box::pin(action()) as RefreshFuture);
        let inner = Arc::new(Inner {
            action,
            interval: config.interval,
            immediate: config.immediate,
            state: Mutex::new(State::default()),
        });
        if config.enabled {
            inner.enable();
        }
        Self { inner }
    }

    /// Start polling. No-op when already active.
    pub fn enable(&self) {
        self.inner.enable();
    }

    /// Stop polling and cancel the pending tick. A refresh already running
    /// is allowed to finish.
    pub fn disable(&self) {
        self.inner.disable();
    }

    /// Flip between enabled and disabled.
    pub fn toggle(&self) {
        if self.is_active() {
            self.disable();
        } else {
            self.enable();
        }
    }

    /// Refresh now, unless a refresh is already in flight. Works whether or
    /// not polling is enabled.
    pub async fn refresh(&self) -> RefreshOutcome {
        self.inner.run_refresh().await
    }

    /// Whether a refresh is running.
    #[must_use]
    pub fn is_refreshing(&self) -> bool {
        lock(&self.inner.state).refreshing
    }

    /// Whether polling is enabled.
    #[must_use]
    pub fn is_active(&self) -> bool {
        lock(&self.inner.state).enabled
    }

    /// Error from the most recent refresh, cleared when the next starts.
    #[must_use]
    pub fn last_error(&self) -> Option<Error> {
        lock(&self.inner.state).last_error.clone()
    }

    /// Weak handle for callers that must not keep the scheduler alive.
    #[must_use]
    pub fn handle(&self) -> SchedulerHandle {
        SchedulerHandle {
            inner: Arc::downgrade(&self.inner),
        }
    }
}

impl Drop for PollingScheduler {
    fn drop(&mut self) {
        self.inner.disable();
    }
}

/// Non-owning handle to a [`PollingScheduler`]. Every method is a no-op
/// once the scheduler has been dropped.
#[derive(Clone)]
pub struct SchedulerHandle {
    inner: Weak<Inner>,
}

impl SchedulerHandle {
    /// See [`PollingScheduler::refresh`]. Returns `None` when the scheduler
    /// is gone.
    pub async fn refresh(&self) -> Option<RefreshOutcome> {
        let inner = self.inner.upgrade()?;
        Some(inner.run_refresh().await)
    }

    /// See [`PollingScheduler::enable`].
    pub fn enable(&self) {
        if let Some(inner) = self.inner.upgrade() {
            inner.enable();
        }
    }

    /// See [`PollingScheduler::disable`].
    pub fn disable(&self) {
        if let Some(inner) = self.inner.upgrade() {
            inner.disable();
        }
    }
}

impl std::fmt::Debug for SchedulerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchedulerHandle")
            .field("alive", &(self.inner.strong_count() > 0))
            .finish()
    }
}
