//! Resource factories and bounded factory calls

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam::channel;

use crate::errors::BoxError;

/// Creates and validates the resources held by an [`ObjectPool`](crate::ObjectPool)
///
/// # Examples
///
/// ```
/// use common_objectpool::{BoxError, ResourceFactory};
///
/// struct Sessions;
///
/// impl ResourceFactory<String> for Sessions {
///     fn create(&self) -> Result<String, BoxError> {
///         Ok("session".to_string())
///     }
///
///     fn is_valid(&self, session: &String) -> bool {
///         !session.is_empty()
///     }
/// }
/// ```
pub trait ResourceFactory<T>: Send + Sync {
    /// Build a new resource
    fn create(&self) -> Result<T, BoxError>;

    /// Check an idle resource; only the eviction task calls this
    fn is_valid(&self, _resource: &T) -> bool {
        true
    }
}

impl<T, F> ResourceFactory<T> for Arc<F>
where
    F: ResourceFactory<T> + ?Sized,
{
    fn create(&self) -> Result<T, BoxError> {
        (**self).create()
    }

    fn is_valid(&self, resource: &T) -> bool {
        (**self).is_valid(resource)
    }
}

/// Factory backed by a closure, used by [`ObjectPool::from_fn`](crate::ObjectPool::from_fn)
pub(crate) struct FnFactory<F> {
    create: F,
}

impl<F> FnFactory<F> {
    pub(crate) fn new(create: F) -> Self {
        Self { create }
    }
}

impl<T, F> ResourceFactory<T> for FnFactory<F>
where
    F: Fn() -> Result<T, BoxError> + Send + Sync,
{
    fn create(&self) -> Result<T, BoxError> {
        (self.create)()
    }
}

/// Run `call`, giving up after `timeout`
///
/// Without a timeout the call runs on the current thread. With one it runs
/// on a fresh helper thread; a result arriving after the deadline is dropped
/// there, and a call that never returns keeps its thread.
pub(crate) fn call_with_timeout<R, F>(timeout: Option<Duration>, call: F) -> Option<R>
where
    F: FnOnce() -> R + Send + 'static,
    R: Send + 'static,
{
    let Some(timeout) = timeout else {
        return Some(call());
    };

    let (tx, rx) = channel::bounded(1);
    let spawned = thread::Builder::new()
        .name("objectpool-factory".to_string())
        .spawn(move || {
            let _ = tx.send(call());
        });

    if let Err(e) = spawned {
        tracing::warn!(error = %e, "failed to spawn factory call thread");
        return None;
    }

    match Instant::now().checked_add(timeout) {
        Some(deadline) => rx.recv_deadline(deadline).ok(),
        None => rx.recv().ok(),
    }
}
