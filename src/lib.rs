//! # common_objectpool
//!
//! Thread-safe FIFO object pool for expensive resources such as connections
//! or sessions, with a background task that evicts stale idle objects and
//! keeps a reserve of idle ones ready.
//!
//! ## Features
//!
//! - Pluggable [`ResourceFactory`] for creating and validating resources
//! - FIFO hand-out of idle objects, in the order they were returned
//! - `max_active` / `max_idle` capacity limits and `min_idle` replenishment
//! - Automatic return of objects via RAII (Drop trait)
//! - Immediate, bounded-blocking and async borrowing
//! - Idle eviction by age and validity, with validation timeouts
//! - Runtime reconfiguration and resizing
//! - Status snapshots, health monitoring and metrics
//! - Prometheus metrics export
//!
//! ## Quick Start
//!
//! ```rust
//! use common_objectpool::{BoxError, ObjectPool, PoolConfiguration};
//!
//! let pool = ObjectPool::from_fn(|| Ok::<_, BoxError>(vec![0u8; 1024]), PoolConfiguration::default())
//!     .unwrap();
//! {
//!     let buffer = pool.borrow().unwrap();
//!     println!("Got a buffer of {} bytes", buffer.len());
//!     // Object automatically returned when `buffer` goes out of scope
//! }
//! assert_eq!(pool.idle_count(), 1);
//! ```

mod config;
mod errors;
mod eviction;
mod factory;
mod health;
mod metrics;
mod pool;

pub use config::PoolConfiguration;
pub use errors::{BoxError, PoolError, PoolResult};
pub use eviction::{EvictionReport, EvictionState};
pub use factory::ResourceFactory;
pub use health::{HealthStatus, PoolStatus};
#[cfg(feature = "metrics")]
pub use metrics::MetricsExporter;
pub use metrics::PoolMetrics;
pub use pool::{ObjectPool, PooledObject, ResourceId};
