//! Periodic auto-assign loop on tokio.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

use crate::core::DispatchEngine;
use crate::infra::store::AssignmentStore;
use crate::util::clock::today;

type DateSource = Arc<dyn Fn() -> NaiveDate + Send + Sync>;

/// Runs [`DispatchEngine::auto_assign`] for the current date on a fixed
/// interval until shut down.
pub struct AutoAssignLoop<S> {
    engine: DispatchEngine<S>,
    interval: Duration,
    date_source: DateSource,
}

impl<S: AssignmentStore + 'static> AutoAssignLoop<S> {
    /// Loop at the engine's configured interval, assigning today's jobs.
    pub fn new(engine: DispatchEngine<S>) -> Self {
        let interval = Duration::from_secs(engine.config().auto_assign_interval_secs);
        Self {
            engine,
            interval,
            date_source: Arc::new(today),
        }
    }

    /// Override the tick interval.
    #[must_use]
    pub const fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Override which date each run assigns.
    #[must_use]
    pub fn with_date_source<F>(mut self, source: F) -> Self
    where
        F: Fn() -> NaiveDate + Send + Sync + 'static,
    {
        self.date_source = Arc::new(source);
        self
    }

    /// Tick until `shutdown` flips to `true` or its sender is dropped.
    /// The first run happens immediately. Returns the number of runs.
    ///
    /// A failed run is logged and the loop carries on; re-running is safe.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) -> u64 {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut runs = 0;

        loop {
            if *shutdown.borrow() {
                break;
            }
            tokio::select! {
                _ = ticker.tick() => {}
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                    continue;
                }
            }

            let date = (self.date_source)();
            runs += 1;
            match self.engine.auto_assign(date).await {
                Ok(outcome) => tracing::debug!(
                    %date,
                    run = runs,
                    assigned = outcome.assigned.len(),
                    "scheduled auto-assign run"
                ),
                Err(e) => tracing::warn!(
                    %date,
                    run = runs,
                    error = %e,
                    retryable = e.is_retryable(),
                    "scheduled auto-assign failed"
                ),
            }
        }

        tracing::info!(runs, "auto-assign loop stopped");
        runs
    }

    /// Spawn [`Self::run`] on the current tokio runtime.
    pub fn spawn(self, shutdown: watch::Receiver<bool>) -> tokio::task::JoinHandle<u64> {
        tokio::spawn(self.run(shutdown))
    }
}
