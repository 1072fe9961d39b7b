//! Metrics collection and export for object pools

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

#[cfg(feature = "serde")]
use serde::Serialize;

/// Metrics data for a pool
///
/// Counters are cumulative since the pool was created; `active_objects` and
/// `idle_objects` are gauges read under the pool lock.
///
/// # Examples
///
/// ```
/// use common_objectpool::{BoxError, ObjectPool, PoolConfiguration};
///
/// let pool = ObjectPool::from_fn(|| Ok::<_, BoxError>(1), PoolConfiguration::default()).unwrap();
///
/// {
///     let _obj = pool.borrow().unwrap();
///     let metrics = pool.get_metrics();
///     assert_eq!(metrics.total_created, 1);
///     assert_eq!(metrics.active_objects, 1);
/// }
/// assert_eq!(pool.get_metrics().total_returned, 1);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct PoolMetrics {
    /// Resources built by the factory
    pub total_created: u64,

    /// Successful borrows
    pub total_borrowed: u64,

    /// Resources put back into the idle queue by a return
    pub total_returned: u64,

    /// Resources dropped through `invalidate`
    pub total_invalidated: u64,

    /// Resources dropped because the idle queue was full, the pool was
    /// cleared, or their return was no longer expected
    pub total_discarded: u64,

    /// Idle resources dropped by the eviction task
    pub total_evicted: u64,

    /// Failed factory `create` calls
    pub creation_failures: u64,

    /// Borrows that gave up waiting
    pub acquisition_timeouts: u64,

    /// Current active objects
    pub active_objects: usize,

    /// Current idle objects
    pub idle_objects: usize,

    /// Configured maximum of active objects
    pub max_active: usize,

    /// Pool utilization ratio (0.0 to 1.0)
    pub utilization: f64,
}

impl PoolMetrics {
    /// Export metrics as a HashMap
    pub fn export(&self) -> HashMap<String, String> {
        let mut metrics = HashMap::new();
        metrics.insert("total_created".to_string(), self.total_created.to_string());
        metrics.insert("total_borrowed".to_string(), self.total_borrowed.to_string());
        metrics.insert("total_returned".to_string(), self.total_returned.to_string());
        metrics.insert("total_invalidated".to_string(), self.total_invalidated.to_string());
        metrics.insert("total_discarded".to_string(), self.total_discarded.to_string());
        metrics.insert("total_evicted".to_string(), self.total_evicted.to_string());
        metrics.insert("creation_failures".to_string(), self.creation_failures.to_string());
        metrics.insert("acquisition_timeouts".to_string(), self.acquisition_timeouts.to_string());
        metrics.insert("active_objects".to_string(), self.active_objects.to_string());
        metrics.insert("idle_objects".to_string(), self.idle_objects.to_string());
        metrics.insert("max_active".to_string(), self.max_active.to_string());
        metrics.insert("utilization".to_string(), format!("{:.2}", self.utilization));
        metrics
    }

    /// Resources created and not yet dropped by the pool
    pub fn live_objects(&self) -> u64 {
        self.total_created
            .saturating_sub(self.total_invalidated)
            .saturating_sub(self.total_discarded)
            .saturating_sub(self.total_evicted)
    }
}

/// Metrics exporter for Prometheus format
#[cfg(feature = "metrics")]
pub struct MetricsExporter;

#[cfg(feature = "metrics")]
impl MetricsExporter {
    /// Export metrics in Prometheus exposition format
    ///
    /// # Examples
    ///
    /// ```
    /// use common_objectpool::{BoxError, ObjectPool, PoolConfiguration};
    /// use std::collections::HashMap;
    ///
    /// let pool = ObjectPool::from_fn(|| Ok::<_, BoxError>(1), PoolConfiguration::default()).unwrap();
    ///
    /// let mut tags = HashMap::new();
    /// tags.insert("service".to_string(), "api".to_string());
    ///
    /// let output = pool.export_metrics_prometheus("my_pool", Some(&tags)).unwrap();
    /// assert!(output.contains("objectpool_objects_active"));
    /// assert!(output.contains("service=\"api\""));
    /// ```
    pub fn export_prometheus(
        metrics: &PoolMetrics,
        pool_name: &str,
        tags: Option<&HashMap<String, String>>,
    ) -> crate::PoolResult<String> {
        use prometheus::{Encoder, Gauge, IntCounter, IntGauge, Opts, Registry, TextEncoder};

        let to_err = |e: prometheus::Error| crate::PoolError::Metrics(e.to_string());

        let mut labels = HashMap::new();
        labels.insert("pool".to_string(), pool_name.to_string());
        if let Some(tags) = tags {
            labels.extend(tags.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        let registry = Registry::new_custom(None, Some(labels)).map_err(to_err)?;

        let gauges = [
            ("objectpool_objects_active", "Current active objects", metrics.active_objects),
            ("objectpool_objects_idle", "Current idle objects", metrics.idle_objects),
            ("objectpool_max_active", "Configured maximum of active objects", metrics.max_active),
        ];
        for (name, help, value) in gauges {
            let gauge = IntGauge::with_opts(Opts::new(name, help)).map_err(to_err)?;
            gauge.set(value as i64);
            registry.register(Box::new(gauge)).map_err(to_err)?;
        }

        let utilization = Gauge::with_opts(Opts::new(
            "objectpool_utilization",
            "Pool utilization ratio",
        ))
        .map_err(to_err)?;
        utilization.set(metrics.utilization);
        registry.register(Box::new(utilization)).map_err(to_err)?;

        let counters = [
            ("objectpool_objects_created_total", "Total objects created", metrics.total_created),
            ("objectpool_objects_borrowed_total", "Total objects borrowed", metrics.total_borrowed),
            ("objectpool_objects_returned_total", "Total objects returned", metrics.total_returned),
            ("objectpool_objects_invalidated_total", "Total objects invalidated", metrics.total_invalidated),
            ("objectpool_objects_discarded_total", "Total objects discarded", metrics.total_discarded),
            ("objectpool_objects_evicted_total", "Total idle objects evicted", metrics.total_evicted),
            ("objectpool_creation_failures_total", "Failed object creations", metrics.creation_failures),
            ("objectpool_acquisition_timeouts_total", "Borrows that timed out", metrics.acquisition_timeouts),
        ];
        for (name, help, value) in counters {
            let counter = IntCounter::with_opts(Opts::new(name, help)).map_err(to_err)?;
            counter.inc_by(value);
            registry.register(Box::new(counter)).map_err(to_err)?;
        }

        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&registry.gather(), &mut buffer)
            .map_err(to_err)?;
        String::from_utf8(buffer).map_err(|e| crate::PoolError::Metrics(e.to_string()))
    }
}

/// Internal metrics tracker
#[derive(Default)]
pub(crate) struct MetricsTracker {
    pub created: AtomicU64,
    pub borrowed: AtomicU64,
    pub returned: AtomicU64,
    pub invalidated: AtomicU64,
    pub discarded: AtomicU64,
    pub evicted: AtomicU64,
    pub creation_failures: AtomicU64,
    pub acquisition_timeouts: AtomicU64,
}

impl MetricsTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn incr(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add(counter: &AtomicU64, count: usize) {
        counter.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn get_metrics(&self, active: usize, idle: usize, max_active: usize) -> PoolMetrics {
        let utilization = if max_active > 0 {
            active as f64 / max_active as f64
        } else {
            0.0
        };

        PoolMetrics {
            total_created: self.created.load(Ordering::Relaxed),
            total_borrowed: self.borrowed.load(Ordering::Relaxed),
            total_returned: self.returned.load(Ordering::Relaxed),
            total_invalidated: self.invalidated.load(Ordering::Relaxed),
            total_discarded: self.discarded.load(Ordering::Relaxed),
            total_evicted: self.evicted.load(Ordering::Relaxed),
            creation_failures: self.creation_failures.load(Ordering::Relaxed),
            acquisition_timeouts: self.acquisition_timeouts.load(Ordering::Relaxed),
            active_objects: active,
            idle_objects: idle,
            max_active,
            utilization,
        }
    }
}
