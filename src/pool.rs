//! Core object pool implementation

use crate::config::PoolConfiguration;
use crate::errors::{BoxError, PoolError, PoolResult};
use crate::eviction::{EvictionStatus, EvictionTask};
use crate::factory::{FnFactory, ResourceFactory, call_with_timeout};
use crate::health::{HealthStatus, PoolStatus};
use crate::metrics::{MetricsTracker, PoolMetrics};

use parking_lot::{Condvar, Mutex};
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Identity of a pooled resource, stable across borrow/return cycles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId(u64);

impl ResourceId {
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// An idle resource together with the time it became idle
pub(crate) struct PooledEntry<T> {
    pub id: ResourceId,
    pub since: Instant,
    pub value: T,
}

/// Everything guarded by the pool lock
pub(crate) struct PoolState<T> {
    /// Checked-out resources and the time they were handed out
    pub active: HashMap<ResourceId, Instant>,
    /// FIFO by return order
    pub idle: VecDeque<PooledEntry<T>>,
    pub config: PoolConfiguration,
    /// Creations on the borrow path that have not finished yet
    pub pending: usize,
    /// Idle-bound resources outside the queue: under validation or being created
    pub in_flight: usize,
    pub eviction: EvictionStatus,
}

impl<T> PoolState<T> {
    fn new(config: PoolConfiguration) -> Self {
        Self {
            active: HashMap::new(),
            idle: VecDeque::new(),
            config,
            pending: 0,
            in_flight: 0,
            eviction: EvictionStatus::default(),
        }
    }

    /// Resources the pool is accountable for, finished or not
    pub fn held(&self) -> usize {
        self.active.len() + self.idle.len() + self.pending + self.in_flight
    }

    fn has_room(&self) -> bool {
        self.active.len() + self.pending < self.config.max_active
    }

    /// Append to the idle tail, handing the value back when the queue is full
    pub fn push_idle(&mut self, entry: PooledEntry<T>) -> Result<(), T> {
        if self.config.idle_full(self.idle.len()) {
            return Err(entry.value);
        }
        self.idle.push_back(entry);
        Ok(())
    }
}

#[derive(Clone, Copy)]
enum Wait {
    Never,
    Until(Instant, Duration),
    Forever,
}

impl Wait {
    /// Wait for `timeout` from now; forever without one or past the clock's range
    fn bounded_by(timeout: Option<Duration>) -> Self {
        match timeout {
            Some(timeout) => match Instant::now().checked_add(timeout) {
                Some(deadline) => Wait::Until(deadline, timeout),
                None => Wait::Forever,
            },
            None => Wait::Forever,
        }
    }
}

pub(crate) struct PoolInner<T> {
    pub state: Mutex<PoolState<T>>,
    /// Signalled whenever an idle resource or a free slot appears
    pub available: Condvar,
    pub factory: Arc<dyn ResourceFactory<T>>,
    pub metrics: MetricsTracker,
    pub task: Mutex<Option<EvictionTask>>,
    next_id: AtomicU64,
}

impl<T: Send + 'static> PoolInner<T> {
    /// Build one resource through the factory, outside the pool lock
    pub fn create_resource(&self, timeout: Option<Duration>) -> PoolResult<(ResourceId, T)> {
        let factory = Arc::clone(&self.factory);
        let created = call_with_timeout(timeout, move || {
            panic::catch_unwind(AssertUnwindSafe(|| factory.create()))
                .unwrap_or_else(|_| Err(BoxError::from("resource factory panicked")))
        });

        match created {
            Some(Ok(value)) => {
                let id = ResourceId(self.next_id.fetch_add(1, Ordering::Relaxed));
                MetricsTracker::incr(&self.metrics.created);
                tracing::debug!(%id, "created object");
                Ok((id, value))
            }
            Some(Err(e)) => {
                MetricsTracker::incr(&self.metrics.creation_failures);
                tracing::debug!(error = %e, "object creation failed");
                Err(PoolError::creation(e))
            }
            None => {
                let timeout = timeout.unwrap_or_default();
                MetricsTracker::incr(&self.metrics.acquisition_timeouts);
                tracing::debug!(?timeout, "object creation timed out");
                Err(PoolError::AcquisitionTimeout(timeout))
            }
        }
    }

    fn acquire(self: &Arc<Self>, wait: Wait) -> PoolResult<PooledObject<T>> {
        let mut state = self.state.lock();
        loop {
            if let Some(entry) = state.idle.pop_front() {
                state.active.insert(entry.id, Instant::now());
                drop(state);
                MetricsTracker::incr(&self.metrics.borrowed);
                tracing::debug!(id = %entry.id, "borrowed idle object");
                return Ok(PooledObject::new(entry.value, entry.id, Arc::clone(self)));
            }

            if state.has_room() {
                state.pending += 1;
                let timeout = state.config.creation_deadline();
                drop(state);
                return self.create_for_borrow(timeout);
            }

            match wait {
                Wait::Never => {
                    let max_active = state.config.max_active;
                    tracing::debug!(max_active, "max number of active objects reached");
                    return Err(PoolError::PoolExhausted { max_active });
                }
                Wait::Forever => self.available.wait(&mut state),
                Wait::Until(deadline, timeout) => {
                    let timed_out = self.available.wait_until(&mut state, deadline).timed_out();
                    if timed_out && state.idle.is_empty() && !state.has_room() {
                        drop(state);
                        MetricsTracker::incr(&self.metrics.acquisition_timeouts);
                        tracing::debug!(?timeout, "request timeout reached");
                        return Err(PoolError::AcquisitionTimeout(timeout));
                    }
                }
            }
        }
    }

    fn create_for_borrow(self: &Arc<Self>, timeout: Option<Duration>) -> PoolResult<PooledObject<T>> {
        let created = self.create_resource(timeout);

        let mut state = self.state.lock();
        state.pending -= 1;
        match created {
            Ok((id, value)) => {
                state.active.insert(id, Instant::now());
                drop(state);
                MetricsTracker::incr(&self.metrics.borrowed);
                tracing::debug!(%id, "borrowed new object");
                Ok(PooledObject::new(value, id, Arc::clone(self)))
            }
            Err(e) => {
                drop(state);
                self.available.notify_one();
                Err(e)
            }
        }
    }

    /// Take a resource back from a borrower
    fn release(&self, id: ResourceId, value: T) {
        let mut state = self.state.lock();
        if state.active.remove(&id).is_none() {
            drop(state);
            tracing::debug!(%id, "object not returned, it is no longer active");
            return;
        }

        let rejected = state.push_idle(PooledEntry {
            id,
            since: Instant::now(),
            value,
        });
        let max_idle = state.config.max_idle;
        drop(state);
        self.available.notify_one();

        match rejected {
            Ok(()) => {
                MetricsTracker::incr(&self.metrics.returned);
                tracing::debug!(%id, "returned object");
            }
            Err(value) => {
                MetricsTracker::incr(&self.metrics.discarded);
                tracing::debug!(%id, max_idle, "object discarded, max idle reached");
                drop(value);
            }
        }
    }

    /// Remove a resource from the active set without queueing it
    fn forget(&self, id: ResourceId) -> bool {
        let removed = self.state.lock().active.remove(&id).is_some();
        if removed {
            self.available.notify_one();
        }
        removed
    }
}

/// A pooled object that automatically returns to the pool when dropped
pub struct PooledObject<T: Send + 'static> {
    value: Option<T>,
    id: ResourceId,
    pool: Arc<PoolInner<T>>,
}

impl<T: Send + 'static> PooledObject<T> {
    fn new(value: T, id: ResourceId, pool: Arc<PoolInner<T>>) -> Self {
        Self {
            value: Some(value),
            id,
            pool,
        }
    }

    pub fn id(&self) -> ResourceId {
        self.id
    }

    /// Drop the object instead of returning it to the pool
    pub fn invalidate(mut self) {
        if let Some(value) = self.value.take() {
            if self.pool.forget(self.id) {
                MetricsTracker::incr(&self.pool.metrics.invalidated);
                tracing::debug!(id = %self.id, "invalidated object");
            }
            drop(value);
        }
    }

    /// Take the inner value out of the pool's control for good
    ///
    /// The slot it occupied becomes free for a new object.
    pub fn detach(mut self) -> T {
        let value = self.value.take().expect("Value already taken");
        if self.pool.forget(self.id) {
            MetricsTracker::incr(&self.pool.metrics.discarded);
            tracing::debug!(id = %self.id, "detached object");
        }
        value
    }
}

impl<T: Send + 'static> Deref for PooledObject<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        self.value.as_ref().expect("Value already taken")
    }
}

impl<T: Send + 'static> DerefMut for PooledObject<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.value.as_mut().expect("Value already taken")
    }
}

impl<T: Send + fmt::Debug + 'static> fmt::Debug for PooledObject<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PooledObject")
            .field("id", &self.id)
            .field("value", &self.value)
            .finish()
    }
}

impl<T: Send + 'static> Drop for PooledObject<T> {
    fn drop(&mut self) {
        if let Some(value) = self.value.take() {
            self.pool.release(self.id, value);
        }
    }
}

/// Thread-safe FIFO object pool backed by a [`ResourceFactory`]
///
/// Idle objects are handed out in the order they were returned. New objects
/// are created on demand while fewer than `max_active` are checked out. An
/// optional background task evicts stale idle objects and keeps `min_idle`
/// of them in reserve.
///
/// # Examples
///
/// ```
/// use common_objectpool::{BoxError, ObjectPool, PoolConfiguration};
///
/// let pool = ObjectPool::from_fn(
///     || Ok::<_, BoxError>(String::from("session")),
///     PoolConfiguration::new().with_max_active(2),
/// )
/// .unwrap();
///
/// let a = pool.borrow().unwrap();
/// let b = pool.borrow().unwrap();
/// assert!(pool.borrow().is_err());
///
/// pool.return_object(b);
/// assert_eq!(pool.idle_count(), 1);
/// drop(a);
/// assert_eq!(pool.idle_count(), 2);
/// ```
pub struct ObjectPool<T: Send + 'static> {
    pub(crate) inner: Arc<PoolInner<T>>,
}

impl<T: Send + 'static> ObjectPool<T> {
    /// Create a pool around a factory and start eviction if configured
    pub fn new<F>(factory: F, config: PoolConfiguration) -> PoolResult<Self>
    where
        F: ResourceFactory<T> + 'static,
    {
        config.validate()?;

        tracing::debug!(
            min_idle = config.min_idle,
            max_idle = config.max_idle,
            max_active = config.max_active,
            "object pool created"
        );

        let pool = Self {
            inner: Arc::new(PoolInner {
                state: Mutex::new(PoolState::new(config)),
                available: Condvar::new(),
                factory: Arc::new(factory),
                metrics: MetricsTracker::new(),
                task: Mutex::new(None),
                next_id: AtomicU64::new(1),
            }),
        };
        pool.start();
        Ok(pool)
    }

    /// Create a pool whose objects come from a closure
    pub fn from_fn<F>(create: F, config: PoolConfiguration) -> PoolResult<Self>
    where
        F: Fn() -> Result<T, BoxError> + Send + Sync + 'static,
    {
        Self::new(FnFactory::new(create), config)
    }

    /// Borrow an object, failing at once when `max_active` objects are out
    pub fn borrow(&self) -> PoolResult<PooledObject<T>> {
        self.inner.acquire(Wait::Never)
    }

    /// Try to borrow an object without returning an error
    pub fn try_borrow(&self) -> Option<PooledObject<T>> {
        self.borrow().ok()
    }

    /// Borrow an object, waiting up to `creation_timeout` for one to free up
    ///
    /// Waits without limit when no creation timeout is configured.
    pub fn borrow_wait(&self) -> PoolResult<PooledObject<T>> {
        let timeout = self.inner.state.lock().config.creation_deadline();
        self.inner.acquire(Wait::bounded_by(timeout))
    }

    /// Borrow an object from async code, with the wait of [`borrow_wait`](Self::borrow_wait)
    pub async fn borrow_async(&self) -> PoolResult<PooledObject<T>> {
        let inner = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || {
            let timeout = inner.state.lock().config.creation_deadline();
            inner.acquire(Wait::bounded_by(timeout))
        })
        .await
        .map_err(|_| PoolError::Cancelled)?
    }

    /// Return an object to the pool; same as dropping it
    pub fn return_object(&self, object: PooledObject<T>) {
        drop(object);
    }

    /// Drop an object for good instead of returning it
    pub fn invalidate(&self, object: PooledObject<T>) {
        object.invalidate();
    }

    /// Forget every active and idle object
    ///
    /// Objects still held by borrowers are dropped when they come back.
    pub fn clear(&self) {
        let (idle, active) = {
            let mut state = self.inner.state.lock();
            let active = state.active.len();
            state.active.clear();
            (std::mem::take(&mut state.idle), active)
        };
        self.inner.available.notify_all();

        MetricsTracker::add(&self.inner.metrics.discarded, idle.len() + active);
        tracing::debug!(idle = idle.len(), active, "pool cleared");
        drop(idle);
    }

    /// Change `max_active`, refusing to go below the objects already held
    pub fn resize(&self, max_active: usize) -> PoolResult<()> {
        {
            let mut state = self.inner.state.lock();
            PoolConfiguration {
                max_active,
                ..state.config.clone()
            }
            .validate()?;

            let in_use = state.held();
            if in_use > max_active {
                tracing::debug!(max_active, in_use, "resize rejected");
                return Err(PoolError::Capacity {
                    requested: max_active,
                    in_use,
                });
            }
            state.config.max_active = max_active;
        }
        self.inner.available.notify_all();
        tracing::debug!(max_active, "pool resized");
        Ok(())
    }

    /// Change the live configuration
    ///
    /// The change is applied atomically. A `max_active` below the objects
    /// already held is rejected and leaves the configuration untouched. A
    /// lower `max_idle` discards idle objects from the tail of the queue. The
    /// eviction task is started if the new settings call for it.
    ///
    /// # Examples
    ///
    /// ```
    /// use common_objectpool::{BoxError, ObjectPool, PoolConfiguration};
    ///
    /// let pool = ObjectPool::from_fn(|| Ok::<_, BoxError>(0u8), PoolConfiguration::default()).unwrap();
    /// pool.configure(|c| c.max_idle = 2).unwrap();
    /// assert_eq!(pool.config().max_idle, 2);
    /// ```
    pub fn configure<F>(&self, update: F) -> PoolResult<()>
    where
        F: FnOnce(&mut PoolConfiguration),
    {
        let excess = {
            let mut state = self.inner.state.lock();
            let mut next = state.config.clone();
            update(&mut next);
            next.validate()?;

            let in_use = state.held();
            if next.max_active < state.config.max_active && in_use > next.max_active {
                return Err(PoolError::Capacity {
                    requested: next.max_active,
                    in_use,
                });
            }
            let keep = match next.max_idle {
                0 => state.idle.len(),
                max_idle => max_idle.min(state.idle.len()),
            };
            state.config = next;
            state.idle.split_off(keep)
        };
        self.inner.available.notify_all();

        if !excess.is_empty() {
            MetricsTracker::add(&self.inner.metrics.discarded, excess.len());
            tracing::debug!(discarded = excess.len(), "idle objects beyond max idle discarded");
        }
        drop(excess);

        self.start();
        Ok(())
    }

    /// Snapshot of the current configuration
    pub fn config(&self) -> PoolConfiguration {
        self.inner.state.lock().config.clone()
    }

    /// Counts, eviction state and configuration, read under the pool lock
    pub fn status(&self) -> PoolStatus {
        let state = self.inner.state.lock();
        PoolStatus {
            active_count: state.active.len(),
            idle_count: state.idle.len(),
            eviction_state: state.eviction.state,
            eviction_message: state.eviction.message.clone(),
            config: state.config.clone(),
        }
    }

    /// Get health status
    pub fn get_health_status(&self) -> HealthStatus {
        HealthStatus::new(&self.status())
    }

    /// Get pool metrics
    pub fn get_metrics(&self) -> PoolMetrics {
        let (active, idle, max_active) = {
            let state = self.inner.state.lock();
            (state.active.len(), state.idle.len(), state.config.max_active)
        };
        self.inner.metrics.get_metrics(active, idle, max_active)
    }

    /// Export metrics
    pub fn export_metrics(&self) -> HashMap<String, String> {
        self.get_metrics().export()
    }

    /// Export metrics in Prometheus format
    #[cfg(feature = "metrics")]
    pub fn export_metrics_prometheus(
        &self,
        pool_name: &str,
        tags: Option<&HashMap<String, String>>,
    ) -> PoolResult<String> {
        crate::metrics::MetricsExporter::export_prometheus(&self.get_metrics(), pool_name, tags)
    }

    pub fn active_count(&self) -> usize {
        self.inner.state.lock().active.len()
    }

    pub fn idle_count(&self) -> usize {
        self.inner.state.lock().idle.len()
    }
}

impl<T: Send + 'static> Drop for ObjectPool<T> {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::thread;

    fn counting_pool(config: PoolConfiguration) -> ObjectPool<usize> {
        let counter = AtomicUsize::new(0);
        ObjectPool::from_fn(move || Ok(counter.fetch_add(1, Ordering::SeqCst)), config).unwrap()
    }

    #[test]
    fn test_borrow_and_return() {
        let pool = counting_pool(PoolConfiguration::default());

        let a = pool.borrow().unwrap();
        let b = pool.borrow().unwrap();
        assert_ne!(*a, *b);
        assert_ne!(a.id(), b.id());
        assert_eq!(pool.active_count(), 2);
        assert_eq!(pool.idle_count(), 0);

        pool.return_object(a);
        pool.return_object(b);
        assert_eq!(pool.active_count(), 0);
        assert_eq!(pool.idle_count(), 2);
    }

    #[test]
    fn test_first_in_first_out() {
        let pool = counting_pool(PoolConfiguration::default());
        let a = pool.borrow().unwrap();
        let b = pool.borrow().unwrap();
        let (a_id, b_id) = (a.id(), b.id());

        pool.return_object(b);
        pool.return_object(a);

        assert_eq!(pool.borrow().unwrap().id(), b_id);
        // b went back to the tail when the guard above dropped
        let next = pool.borrow().unwrap();
        assert_eq!(next.id(), a_id);
    }

    #[test]
    fn test_exhausted_names_max_active() {
        let pool = counting_pool(PoolConfiguration::new().with_max_active(1));
        let _held = pool.borrow().unwrap();

        match pool.borrow() {
            Err(PoolError::PoolExhausted { max_active }) => assert_eq!(max_active, 1),
            other => panic!("unexpected result: {other:?}"),
        }
        assert!(pool.try_borrow().is_none());
    }

    #[test]
    fn test_creation_error_leaves_state_unchanged() {
        let pool: ObjectPool<u32> = ObjectPool::from_fn(
            || Err(BoxError::from("backend down")),
            PoolConfiguration::new().with_max_active(1),
        )
        .unwrap();

        let err = pool.borrow().unwrap_err();
        assert!(matches!(err, PoolError::Creation(_)));
        assert!(err.to_string().contains("backend down"));
        assert_eq!(pool.active_count(), 0);
        assert_eq!(pool.inner.state.lock().pending, 0);
        assert_eq!(pool.get_metrics().creation_failures, 1);
    }

    #[test]
    fn test_slow_creation_times_out() {
        let pool: ObjectPool<u32> = ObjectPool::from_fn(
            || {
                thread::sleep(Duration::from_millis(500));
                Ok(1)
            },
            PoolConfiguration::new().with_creation_timeout(Some(Duration::from_millis(20))),
        )
        .unwrap();

        assert!(matches!(pool.borrow(), Err(PoolError::AcquisitionTimeout(_))));
        assert_eq!(pool.inner.state.lock().pending, 0);
    }

    #[test]
    fn test_factory_panic_is_a_creation_error() {
        let pool: ObjectPool<u32> = ObjectPool::from_fn(
            || panic!("factory blew up"),
            PoolConfiguration::new().with_creation_timeout(None),
        )
        .unwrap();

        assert!(matches!(pool.borrow(), Err(PoolError::Creation(_))));
        assert_eq!(pool.inner.state.lock().pending, 0);
    }

    #[test]
    fn test_detach_frees_slot() {
        let pool = counting_pool(PoolConfiguration::new().with_max_active(1));
        let value = pool.borrow().unwrap().detach();
        assert_eq!(value, 0);
        assert_eq!(pool.active_count(), 0);
        assert_eq!(*pool.borrow().unwrap(), 1);
    }

    #[test]
    fn test_return_after_clear_is_ignored() {
        let pool = counting_pool(PoolConfiguration::default());
        let a = pool.borrow().unwrap();
        pool.clear();
        pool.return_object(a);
        assert_eq!(pool.idle_count(), 0);
        assert_eq!(pool.active_count(), 0);
    }

    #[test]
    fn test_configure_rejects_shrinking_below_held() {
        let pool = counting_pool(PoolConfiguration::default());
        let _a = pool.borrow().unwrap();
        let _b = pool.borrow().unwrap();

        let err = pool.configure(|c| c.max_active = 1).unwrap_err();
        assert!(matches!(err, PoolError::Capacity { requested: 1, in_use: 2 }));
        assert_eq!(pool.config().max_active, 8);

        pool.configure(|c| c.max_active = 2).unwrap();
        assert_eq!(pool.config().max_active, 2);
    }

    #[test]
    fn test_configure_rejects_invalid_options() {
        let pool = counting_pool(PoolConfiguration::default());
        let err = pool.configure(|c| c.min_idle = 20).unwrap_err();
        assert!(matches!(err, PoolError::InvalidConfiguration(_)));
        assert_eq!(pool.config().min_idle, 0);
    }

    #[test]
    fn test_concurrent_borrowers_respect_max_active() {
        let pool = Arc::new(counting_pool(PoolConfiguration::new().with_max_active(4)));
        let peak = Arc::new(AtomicUsize::new(0));

        let workers: Vec<_> = (0..8)
            .map(|_| {
                let pool = Arc::clone(&pool);
                let peak = Arc::clone(&peak);
                thread::spawn(move || {
                    for _ in 0..50 {
                        if let Ok(obj) = pool.borrow() {
                            peak.fetch_max(pool.active_count(), Ordering::SeqCst);
                            drop(obj);
                        }
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }

        assert!(peak.load(Ordering::SeqCst) <= 4);
        let metrics = pool.get_metrics();
        assert!(metrics.total_created <= 4);
        assert_eq!(metrics.active_objects, 0);
    }

    #[test]
    fn test_configure_lower_max_idle_trims_tail() {
        let pool = counting_pool(PoolConfiguration::default());
        let held: Vec<_> = (0..4).map(|_| pool.borrow().unwrap()).collect();
        let ids: Vec<_> = held.iter().map(|o| o.id()).collect();
        drop(held);
        assert_eq!(pool.idle_count(), 4);

        pool.configure(|c| c.max_idle = 2).unwrap();
        assert_eq!(pool.idle_count(), 2);
        assert_eq!(pool.get_metrics().total_discarded, 2);

        let first = pool.borrow().unwrap();
        let second = pool.borrow().unwrap();
        assert_eq!((first.id(), second.id()), (ids[0], ids[1]));
    }

    #[test]
    fn test_configure_unbounded_max_idle_keeps_queue() {
        let pool = counting_pool(PoolConfiguration::default());
        drop((0..3).map(|_| pool.borrow().unwrap()).collect::<Vec<_>>());

        pool.configure(|c| c.max_idle = 0).unwrap();
        assert_eq!(pool.idle_count(), 3);
        assert_eq!(pool.get_metrics().total_discarded, 0);
    }

    #[test]
    fn test_resize_below_min_idle_is_rejected() {
        let pool = counting_pool(PoolConfiguration::new().with_min_idle(2));
        assert!(matches!(pool.resize(1), Err(PoolError::InvalidConfiguration(_))));
        assert_eq!(pool.config().max_active, 8);
    }

    #[test]
    fn test_borrow_wait_with_unbounded_timeout() {
        let pool = Arc::new(counting_pool(
            PoolConfiguration::new()
                .with_max_active(1)
                .with_creation_timeout(Some(Duration::MAX)),
        ));
        let held = pool.borrow().unwrap();
        let held_id = held.id();

        let waiter = {
            let pool = Arc::clone(&pool);
            thread::spawn(move || pool.borrow_wait().map(|obj| obj.id()))
        };
        thread::sleep(Duration::from_millis(50));
        pool.return_object(held);

        assert_eq!(waiter.join().unwrap().unwrap(), held_id);
    }

    #[test]
    fn test_wait_past_clock_range_is_forever() {
        assert!(matches!(Wait::bounded_by(Some(Duration::MAX)), Wait::Forever));
        assert!(matches!(Wait::bounded_by(None), Wait::Forever));
        assert!(matches!(
            Wait::bounded_by(Some(Duration::from_secs(1))),
            Wait::Until(_, t) if t == Duration::from_secs(1)
        ));
    }

    #[tokio::test]
    async fn test_async_borrow() {
        let pool = counting_pool(PoolConfiguration::default());
        let obj = pool.borrow_async().await.unwrap();
        assert_eq!(*obj, 0);
        drop(obj);
        assert_eq!(pool.idle_count(), 1);
    }
}
