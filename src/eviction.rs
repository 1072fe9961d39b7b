//! Idle eviction and min-idle replenishment

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Weak};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

#[cfg(feature = "serde")]
use serde::Serialize;

use crate::errors::PoolResult;
use crate::factory::call_with_timeout;
use crate::metrics::MetricsTracker;
use crate::pool::{ObjectPool, PoolInner, PooledEntry};

/// Lifecycle of the background eviction task
///
/// `NotRunning -> Checking -> Sleeping -> Checking -> ...`, ending in
/// `Stopping -> NotRunning` on [`ObjectPool::stop`], or in `CheckedOnce`
/// when the interval is switched off while the task runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub enum EvictionState {
    #[default]
    NotRunning,
    Checking,
    Sleeping,
    CheckedOnce,
    Stopping,
}

impl fmt::Display for EvictionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            EvictionState::NotRunning => "Not Running",
            EvictionState::Checking => "Checking...",
            EvictionState::Sleeping => "Sleeping",
            EvictionState::CheckedOnce => "Checked once",
            EvictionState::Stopping => "Stopping...",
        };
        f.write_str(label)
    }
}

/// Outcome of one eviction run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EvictionReport {
    /// Idle objects inspected
    pub checked: usize,
    /// Idle objects dropped for age or failed validation
    pub evicted: usize,
    /// Objects created to reach `min_idle`
    pub created: usize,
}

#[derive(Debug, Default)]
pub(crate) struct EvictionStatus {
    pub state: EvictionState,
    /// "OK" or the error of the last run
    pub message: String,
}

#[derive(Default)]
struct Shutdown {
    stopped: Mutex<bool>,
    signal: Condvar,
}

impl Shutdown {
    fn stop(&self) {
        *self.stopped.lock() = true;
        self.signal.notify_all();
    }

    fn is_stopped(&self) -> bool {
        *self.stopped.lock()
    }

    /// Sleep for `interval`; true if stopped meanwhile
    ///
    /// An interval past the clock's range sleeps until stopped.
    fn sleep(&self, interval: Duration) -> bool {
        let deadline = Instant::now().checked_add(interval);
        let mut stopped = self.stopped.lock();
        while !*stopped {
            match deadline {
                Some(deadline) => {
                    if self.signal.wait_until(&mut stopped, deadline).timed_out() {
                        break;
                    }
                }
                None => self.signal.wait(&mut stopped),
            }
        }
        *stopped
    }
}

/// What the task does once a cycle is published
#[derive(Debug, PartialEq, Eq)]
enum NextCycle {
    Sleep(Duration),
    Once,
    Stop,
}

pub(crate) struct EvictionTask {
    handle: JoinHandle<()>,
    shutdown: Arc<Shutdown>,
}

impl<T: Send + 'static> PoolInner<T> {
    fn set_eviction_state(&self, state: EvictionState) {
        self.state.lock().eviction.state = state;
    }

    /// Record the outcome of a cycle, leaving `Stopping` in place once stopped
    fn finish_cycle(&self, message: String, shutdown: &Shutdown) -> NextCycle {
        let mut state = self.state.lock();
        state.eviction.message = message;
        if shutdown.is_stopped() {
            return NextCycle::Stop;
        }
        match state.config.eviction_interval() {
            Some(interval) => {
                state.eviction.state = EvictionState::Sleeping;
                NextCycle::Sleep(interval)
            }
            None => {
                state.eviction.state = EvictionState::CheckedOnce;
                NextCycle::Once
            }
        }
    }

    /// One sweep of the idle queue followed by replenishment
    pub(crate) fn evict_idle(&self) -> PoolResult<EvictionReport> {
        let mut report = EvictionReport::default();
        self.sweep_idle(&mut report);
        self.replenish(&mut report)?;
        Ok(report)
    }

    /// Check a batch from the head of the idle queue, re-queueing survivors at the tail
    fn sweep_idle(&self, report: &mut EvictionReport) {
        let (batch, config) = {
            let state = self.state.lock();
            let len = state.idle.len();
            let batch = match state.config.idle_check_batch_size {
                0 => len,
                n => n.min(len),
            };
            (batch, state.config.clone())
        };
        tracing::debug!(idle = batch, min_idle = config.min_idle, "checking idle objects");

        let mut survivors = Vec::with_capacity(batch);
        for _ in 0..batch {
            let entry = {
                let mut state = self.state.lock();
                let Some(entry) = state.idle.pop_front() else {
                    tracing::debug!("no more idle objects available");
                    break;
                };
                state.in_flight += 1;
                entry
            };
            report.checked += 1;

            let age = entry.since.elapsed();
            let kept = if config.within_max_idle_time(age) {
                self.validate_entry(entry, config.validation_deadline())
            } else {
                tracing::debug!(id = %entry.id, ?age, "idle object expired");
                None
            };

            match kept {
                Some(entry) => survivors.push(entry),
                None => {
                    self.state.lock().in_flight -= 1;
                    report.evicted += 1;
                    MetricsTracker::incr(&self.metrics.evicted);
                }
            }
        }

        if survivors.is_empty() {
            return;
        }

        let mut overflow = Vec::new();
        {
            let mut state = self.state.lock();
            state.in_flight -= survivors.len();
            for entry in survivors {
                if let Err(value) = state.push_idle(entry) {
                    overflow.push(value);
                }
            }
        }
        self.available.notify_all();
        MetricsTracker::add(&self.metrics.discarded, overflow.len());
    }

    fn validate_entry(&self, entry: PooledEntry<T>, timeout: Option<Duration>) -> Option<PooledEntry<T>> {
        let PooledEntry { id, since, value } = entry;
        let factory = Arc::clone(&self.factory);

        let checked = call_with_timeout(timeout, move || {
            let valid = panic::catch_unwind(AssertUnwindSafe(|| factory.is_valid(&value)))
                .unwrap_or(false);
            (valid, value)
        });

        match checked {
            Some((true, value)) => Some(PooledEntry { id, since, value }),
            Some((false, _)) => {
                tracing::debug!(%id, "idle object failed validation");
                None
            }
            None => {
                tracing::debug!(%id, ?timeout, "timed out validating idle object");
                None
            }
        }
    }

    /// Create idle objects until `min_idle` is met, within `max_active` and `max_idle`
    fn replenish(&self, report: &mut EvictionReport) -> PoolResult<()> {
        let needed = {
            let state = self.state.lock();
            let idle = state.idle.len() + state.in_flight;
            tracing::debug!(min_idle = state.config.min_idle, idle, "checking minimum idle objects");
            state.config.min_idle.saturating_sub(idle)
        };
        if needed > 0 {
            tracing::debug!(needed, "creating additional idle objects");
        }

        for _ in 0..needed {
            let timeout = {
                let mut state = self.state.lock();
                let idle = state.idle.len() + state.in_flight;
                let config = &state.config;
                if idle >= config.min_idle
                    || config.idle_full(idle)
                    || state.held() >= config.max_active
                {
                    break;
                }
                let timeout = config.creation_deadline();
                state.in_flight += 1;
                timeout
            };

            let created = self.create_resource(timeout);

            let mut state = self.state.lock();
            state.in_flight -= 1;
            let (id, value) = created?;
            let pushed = state.push_idle(PooledEntry {
                id,
                since: Instant::now(),
                value,
            });
            drop(state);

            match pushed {
                Ok(()) => {
                    report.created += 1;
                    self.available.notify_one();
                }
                Err(value) => {
                    MetricsTracker::incr(&self.metrics.discarded);
                    drop(value);
                }
            }
        }
        Ok(())
    }
}

fn run_eviction<T: Send + 'static>(pool: Weak<PoolInner<T>>, shutdown: Arc<Shutdown>) {
    loop {
        if shutdown.is_stopped() {
            break;
        }
        let Some(inner) = pool.upgrade() else {
            break;
        };

        inner.set_eviction_state(EvictionState::Checking);
        tracing::debug!(">> starting idle objects check");

        let message = match inner.evict_idle() {
            Ok(report) => {
                tracing::debug!(
                    checked = report.checked,
                    evicted = report.evicted,
                    created = report.created,
                    "idle objects check finished"
                );
                "OK".to_string()
            }
            Err(e) => {
                tracing::warn!(error = %e, "idle objects check failed");
                format!("Error - {e}")
            }
        };

        let next = inner.finish_cycle(message, &shutdown);
        drop(inner);

        match next {
            NextCycle::Sleep(interval) => {
                tracing::debug!(?interval, ">> sleeping");
                if shutdown.sleep(interval) {
                    break;
                }
            }
            NextCycle::Once => {
                tracing::debug!(">> idle check interval is off, checked once");
                break;
            }
            NextCycle::Stop => break,
        }
    }
}

impl<T: Send + 'static> ObjectPool<T> {
    /// Start the eviction task if `idle_check_interval` is set and it is not running
    pub fn start(&self) {
        let mut task = self.inner.task.lock();
        if task.as_ref().is_some_and(|t| !t.handle.is_finished()) {
            return;
        }
        if let Some(finished) = task.take() {
            let _ = finished.handle.join();
        }

        {
            let mut state = self.inner.state.lock();
            if state.config.eviction_interval().is_none() {
                return;
            }
            state.eviction.state = EvictionState::Checking;
        }

        let shutdown = Arc::new(Shutdown::default());
        let pool = Arc::downgrade(&self.inner);
        let signal = Arc::clone(&shutdown);
        let spawned = thread::Builder::new()
            .name("objectpool-eviction".to_string())
            .spawn(move || run_eviction(pool, signal));

        match spawned {
            Ok(handle) => {
                tracing::debug!("eviction task started");
                *task = Some(EvictionTask { handle, shutdown });
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to spawn eviction task");
                let mut state = self.inner.state.lock();
                state.eviction.state = EvictionState::NotRunning;
                state.eviction.message = format!("Error - {e}");
            }
        }
    }

    /// Stop the eviction task, letting a check in progress finish
    pub fn stop(&self) {
        let mut task = self.inner.task.lock();
        let Some(running) = task.take() else {
            return;
        };

        tracing::debug!(">> stopping idle objects check task");
        {
            let mut state = self.inner.state.lock();
            state.eviction.state = EvictionState::Stopping;
            running.shutdown.stop();
        }
        if running.handle.join().is_err() {
            tracing::warn!("eviction task panicked");
        }
        self.inner.set_eviction_state(EvictionState::NotRunning);
    }

    pub fn restart(&self) {
        self.stop();
        self.start();
    }

    /// Run one eviction cycle on the calling thread
    ///
    /// # Examples
    ///
    /// ```
    /// use common_objectpool::{BoxError, ObjectPool, PoolConfiguration};
    ///
    /// let pool = ObjectPool::from_fn(
    ///     || Ok::<_, BoxError>(0u32),
    ///     PoolConfiguration::new().with_min_idle(2),
    /// )
    /// .unwrap();
    ///
    /// let report = pool.evict_idle().unwrap();
    /// assert_eq!(report.created, 2);
    /// assert_eq!(pool.idle_count(), 2);
    /// ```
    pub fn evict_idle(&self) -> PoolResult<EvictionReport> {
        self.inner.evict_idle()
    }

    pub fn eviction_state(&self) -> EvictionState {
        self.inner.state.lock().eviction.state
    }
}
