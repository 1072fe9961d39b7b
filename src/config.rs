//! Pool configuration options

use std::collections::HashMap;
use std::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::errors::{PoolError, PoolResult};

/// Configuration for object pool behavior
///
/// Every field may be changed on a live pool through
/// [`ObjectPool::configure`](crate::ObjectPool::configure); the pool reads
/// the current values on every operation.
///
/// # Examples
///
/// ```
/// use common_objectpool::PoolConfiguration;
/// use std::time::Duration;
///
/// let config = PoolConfiguration::new()
///     .with_min_idle(2)
///     .with_max_active(16)
///     .with_max_idle_time(Duration::from_secs(600))
///     .with_idle_check_interval(Duration::from_secs(30));
///
/// assert_eq!(config.max_active, 16);
/// assert_eq!(config.max_idle, 8);
/// assert!(config.eviction_interval().is_some());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PoolConfiguration {
    /// Number of idle objects the eviction task keeps in reserve.
    /// Replenishment never exceeds `max_active`, so this may not exceed it.
    pub min_idle: usize,

    /// Maximum number of idle objects; returns beyond it are discarded.
    /// Zero means unbounded.
    pub max_idle: usize,

    /// Idle age after which an object is evicted. `None` never expires,
    /// zero expires every checked object.
    pub max_idle_time: Option<Duration>,

    /// Maximum number of objects checked out at once
    pub max_active: usize,

    /// Bound on a single factory `create` call and on the wait of
    /// [`ObjectPool::borrow_wait`](crate::ObjectPool::borrow_wait)
    ///
    /// A bounded call runs on its own short-lived thread. A factory that
    /// hangs keeps that thread alive until it returns, one per timed-out
    /// call. `None` runs `create` on the calling thread without a bound.
    pub creation_timeout: Option<Duration>,

    /// Bound on a single validity check; exceeding it marks the object invalid
    ///
    /// Costs one thread per check, like `creation_timeout`.
    pub validation_timeout: Option<Duration>,

    /// Idle objects inspected per eviction run, zero inspects all of them
    pub idle_check_batch_size: usize,

    /// Pause between eviction runs; `None` or zero disables the task
    pub idle_check_interval: Option<Duration>,
}

impl Default for PoolConfiguration {
    fn default() -> Self {
        Self {
            min_idle: 0,
            max_idle: 8,
            max_idle_time: Some(Duration::from_secs(30 * 60)),
            max_active: 8,
            creation_timeout: Some(Duration::from_secs(60)),
            validation_timeout: Some(Duration::from_secs(30)),
            idle_check_batch_size: 3,
            idle_check_interval: None,
        }
    }
}

impl PoolConfiguration {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_min_idle(mut self, count: usize) -> Self {
        self.min_idle = count;
        self
    }

    pub fn with_max_idle(mut self, count: usize) -> Self {
        self.max_idle = count;
        self
    }

    pub fn with_max_idle_time(mut self, age: Duration) -> Self {
        self.max_idle_time = Some(age);
        self
    }

    /// Keep idle objects regardless of age
    pub fn without_max_idle_time(mut self) -> Self {
        self.max_idle_time = None;
        self
    }

    pub fn with_max_active(mut self, count: usize) -> Self {
        self.max_active = count;
        self
    }

    pub fn with_creation_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.creation_timeout = timeout;
        self
    }

    pub fn with_validation_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.validation_timeout = timeout;
        self
    }

    pub fn with_idle_check_batch_size(mut self, count: usize) -> Self {
        self.idle_check_batch_size = count;
        self
    }

    /// Enable the periodic eviction task
    ///
    /// # Examples
    ///
    /// ```
    /// use common_objectpool::PoolConfiguration;
    /// use std::time::Duration;
    ///
    /// let config = PoolConfiguration::new()
    ///     .with_idle_check_interval(Duration::ZERO);
    ///
    /// // A zero interval is the same as no interval
    /// assert_eq!(config.eviction_interval(), None);
    /// ```
    pub fn with_idle_check_interval(mut self, interval: Duration) -> Self {
        self.idle_check_interval = Some(interval);
        self
    }

    /// Interval of the eviction task, if it should run periodically
    pub fn eviction_interval(&self) -> Option<Duration> {
        self.idle_check_interval.filter(|d| !d.is_zero())
    }

    pub(crate) fn creation_deadline(&self) -> Option<Duration> {
        self.creation_timeout.filter(|d| !d.is_zero())
    }

    pub(crate) fn validation_deadline(&self) -> Option<Duration> {
        self.validation_timeout.filter(|d| !d.is_zero())
    }

    /// Whether an idle object of the given age should still be kept
    pub(crate) fn within_max_idle_time(&self, age: Duration) -> bool {
        match self.max_idle_time {
            None => true,
            Some(max) => !max.is_zero() && age <= max,
        }
    }

    /// Whether the idle queue is full at the given length
    pub(crate) fn idle_full(&self, idle_len: usize) -> bool {
        self.max_idle > 0 && idle_len >= self.max_idle
    }

    /// Check the options for combinations the pool cannot honour
    pub fn validate(&self) -> PoolResult<()> {
        if self.max_idle > 0 && self.min_idle > self.max_idle {
            return Err(PoolError::InvalidConfiguration(format!(
                "min_idle ({}) exceeds max_idle ({})",
                self.min_idle, self.max_idle
            )));
        }
        if self.min_idle > self.max_active {
            return Err(PoolError::InvalidConfiguration(format!(
                "min_idle ({}) exceeds max_active ({})",
                self.min_idle, self.max_active
            )));
        }
        Ok(())
    }

    /// Export every option as strings, keyed by option name
    pub fn export(&self) -> HashMap<String, String> {
        fn secs(d: Option<Duration>) -> String {
            d.map(|d| format!("{:.3}", d.as_secs_f64()))
                .unwrap_or_else(|| "none".to_string())
        }

        let mut options = HashMap::new();
        options.insert("min_idle".to_string(), self.min_idle.to_string());
        options.insert("max_idle".to_string(), self.max_idle.to_string());
        options.insert("max_idle_time".to_string(), secs(self.max_idle_time));
        options.insert("max_active".to_string(), self.max_active.to_string());
        options.insert("creation_timeout".to_string(), secs(self.creation_timeout));
        options.insert("validation_timeout".to_string(), secs(self.validation_timeout));
        options.insert(
            "idle_check_batch_size".to_string(),
            self.idle_check_batch_size.to_string(),
        );
        options.insert("idle_check_interval".to_string(), secs(self.idle_check_interval));
        options
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PoolConfiguration::default();
        assert_eq!(config.min_idle, 0);
        assert_eq!(config.max_idle, 8);
        assert_eq!(config.max_idle_time, Some(Duration::from_secs(1800)));
        assert_eq!(config.max_active, 8);
        assert_eq!(config.creation_timeout, Some(Duration::from_secs(60)));
        assert_eq!(config.validation_timeout, Some(Duration::from_secs(30)));
        assert_eq!(config.idle_check_batch_size, 3);
        assert_eq!(config.eviction_interval(), None);
    }

    #[test]
    fn test_idle_age() {
        let config = PoolConfiguration::new().with_max_idle_time(Duration::from_secs(10));
        assert!(config.within_max_idle_time(Duration::from_secs(10)));
        assert!(!config.within_max_idle_time(Duration::from_secs(11)));

        let zero = PoolConfiguration::new().with_max_idle_time(Duration::ZERO);
        assert!(!zero.within_max_idle_time(Duration::ZERO));

        let forever = PoolConfiguration::new().without_max_idle_time();
        assert!(forever.within_max_idle_time(Duration::from_secs(u32::MAX as u64)));
    }

    #[test]
    fn test_idle_full_unbounded_when_zero() {
        let config = PoolConfiguration::new().with_max_idle(0);
        assert!(!config.idle_full(10_000));
        assert!(PoolConfiguration::new().with_max_idle(2).idle_full(2));
    }

    #[test]
    fn test_validate_rejects_min_above_max_idle() {
        let config = PoolConfiguration::new().with_min_idle(4).with_max_idle(2);
        assert!(matches!(
            config.validate(),
            Err(PoolError::InvalidConfiguration(_))
        ));
        assert!(PoolConfiguration::new().with_min_idle(4).with_max_idle(0).validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_min_idle_above_max_active() {
        let config = PoolConfiguration::new().with_min_idle(4).with_max_active(3);
        match config.validate() {
            Err(PoolError::InvalidConfiguration(msg)) => {
                assert_eq!(msg, "min_idle (4) exceeds max_active (3)")
            }
            other => panic!("unexpected result: {other:?}"),
        }

        let unbounded_idle = PoolConfiguration::new()
            .with_max_idle(0)
            .with_min_idle(9)
            .with_max_active(8);
        assert!(unbounded_idle.validate().is_err());
        assert!(PoolConfiguration::new().with_min_idle(8).validate().is_ok());
    }

    #[test]
    fn test_export_lists_every_option() {
        let exported = PoolConfiguration::default().export();
        assert_eq!(exported.len(), 8);
        assert_eq!(exported["max_active"], "8");
        assert_eq!(exported["idle_check_interval"], "none");
        assert_eq!(exported["max_idle_time"], "1800.000");
    }
}
