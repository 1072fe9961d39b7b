//! Status snapshots and health monitoring for object pools

use std::collections::HashMap;

#[cfg(feature = "serde")]
use serde::Serialize;

use crate::config::PoolConfiguration;
use crate::eviction::EvictionState;

/// Counts, eviction state and configuration of a pool at one instant
///
/// # Examples
///
/// ```
/// use common_objectpool::{BoxError, EvictionState, ObjectPool, PoolConfiguration};
///
/// let pool = ObjectPool::from_fn(|| Ok::<_, BoxError>(1), PoolConfiguration::default()).unwrap();
/// let _obj = pool.borrow().unwrap();
///
/// let status = pool.status();
/// assert_eq!(status.active_count, 1);
/// assert_eq!(status.eviction_state, EvictionState::NotRunning);
/// assert_eq!(status.export()["max_active"], "8");
/// ```
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct PoolStatus {
    pub active_count: usize,
    pub idle_count: usize,
    pub eviction_state: EvictionState,

    /// "OK" or the error recorded by the last eviction run
    pub eviction_message: String,

    pub config: PoolConfiguration,
}

impl PoolStatus {
    /// Flatten into a map of counts, eviction status and every option
    pub fn export(&self) -> HashMap<String, String> {
        let mut status = self.config.export();
        status.insert("active_objects".to_string(), self.active_count.to_string());
        status.insert("idle_objects".to_string(), self.idle_count.to_string());
        status.insert("idle_check_status".to_string(), self.eviction_state.to_string());
        status.insert("idle_check_message".to_string(), self.eviction_message.clone());
        status
    }
}

/// Health status of an object pool
///
/// # Examples
///
/// ```
/// use common_objectpool::{BoxError, ObjectPool, PoolConfiguration};
///
/// let pool = ObjectPool::from_fn(|| Ok::<_, BoxError>(1), PoolConfiguration::default()).unwrap();
///
/// let health = pool.get_health_status();
/// assert!(health.is_healthy());
/// assert_eq!(health.active_objects, 0);
/// ```
#[derive(Debug, Clone)]
pub struct HealthStatus {
    /// Whether the pool is healthy
    pub is_healthy: bool,

    /// Number of warnings detected
    pub warning_count: usize,

    /// Current pool utilization (0.0 to 1.0)
    pub utilization: f64,

    pub idle_objects: usize,

    pub active_objects: usize,

    pub max_active: usize,

    /// Warning messages
    pub warnings: Vec<String>,
}

impl HealthStatus {
    /// Create a health status from a status snapshot
    pub fn new(status: &PoolStatus) -> Self {
        let max_active = status.config.max_active;
        let utilization = if max_active > 0 {
            status.active_count as f64 / max_active as f64
        } else {
            0.0
        };

        let mut warnings = Vec::new();
        let mut is_healthy = true;

        // Check for high utilization
        if utilization > 0.9 {
            warnings.push(format!("High utilization: {:.1}%", utilization * 100.0));
            is_healthy = false;
        }

        if status.idle_count < status.config.min_idle {
            warnings.push(format!(
                "Idle objects below minimum: {} of {}",
                status.idle_count, status.config.min_idle
            ));
        }

        if status.eviction_message.starts_with("Error") {
            warnings.push(format!("Eviction task: {}", status.eviction_message));
        }

        Self {
            is_healthy,
            warning_count: warnings.len(),
            utilization,
            idle_objects: status.idle_count,
            active_objects: status.active_count,
            max_active,
            warnings,
        }
    }

    /// Check if the pool is healthy
    pub fn is_healthy(&self) -> bool {
        self.is_healthy
    }
}
