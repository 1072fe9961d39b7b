//! Error types for the object pool

use std::error::Error as StdError;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

/// Boxed error returned by a [`ResourceFactory`](crate::ResourceFactory).
pub type BoxError = Box<dyn StdError + Send + Sync>;

#[derive(Error, Debug, Clone)]
pub enum PoolError {
    /// The resource factory could not build a new resource.
    #[error("Failed to create pooled resource: {0}")]
    Creation(#[source] Arc<dyn StdError + Send + Sync>),

    #[error("Max number of {max_active} active objects reached")]
    PoolExhausted { max_active: usize },

    #[error("Acquisition timed out after {0:?}")]
    AcquisitionTimeout(Duration),

    /// A resize or reconfiguration asked for fewer slots than are in use.
    #[error("Cannot change max active objects to {requested}: {in_use} objects are held by the pool")]
    Capacity { requested: usize, in_use: usize },

    #[error("Invalid pool configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Operation was cancelled")]
    Cancelled,

    #[cfg(feature = "metrics")]
    #[error("Metrics export failed: {0}")]
    Metrics(String),
}

impl PoolError {
    pub(crate) fn creation(err: BoxError) -> Self {
        PoolError::Creation(Arc::from(err))
    }
}

pub type PoolResult<T> = Result<T, PoolError>;
