//! Resource construction and close capabilities

use std::sync::Arc;

use async_trait::async_trait;

use crate::errors::BoxError;

/// Creates and closes the resources held by a pool
///
/// The coordinator calls `create` when it needs a new object and `close`
/// exactly once per object when the object leaves the pool for good. Close
/// failures are logged and otherwise ignored.
#[async_trait]
pub trait Manager: Send + Sync + 'static {
    /// Type of the pooled resource
    type Resource: Send + 'static;

    /// Create a new resource
    async fn create(&self) -> Result<Self::Resource, BoxError>;

    /// Release a resource for good
    async fn close(&self, resource: Self::Resource) -> Result<(), BoxError> {
        drop(resource);
        Ok(())
    }
}

type FactoryFn<T> = dyn Fn() -> Result<T, BoxError> + Send + Sync;
type CloseFn<T> = dyn Fn(T) -> Result<(), BoxError> + Send + Sync;

/// [`Manager`] built from plain closures
///
/// The factory and the close closure run on Tokio's blocking thread pool,
/// so either may block.
///
/// # Examples
///
/// ```
/// use esox_actorpool::FnManager;
///
/// let manager = FnManager::new(|| Ok::<_, std::io::Error>(Vec::<u8>::with_capacity(1024)))
///     .with_close(|buffer| {
///         drop(buffer);
///         Ok::<_, std::io::Error>(())
///     });
/// # let _ = manager;
/// ```
pub struct FnManager<T> {
    factory: Arc<FactoryFn<T>>,
    close: Option<Arc<CloseFn<T>>>,
}

impl<T: Send + 'static> FnManager<T> {
    /// Create a manager from a fallible factory
    pub fn new<F, E>(factory: F) -> Self
    where
        F: Fn() -> Result<T, E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        Self {
            factory: Arc::new(move || factory().map_err(Into::into)),
            close: None,
        }
    }

    /// Set the close capability; without one, resources are simply dropped
    pub fn with_close<C, E>(mut self, close: C) -> Self
    where
        C: Fn(T) -> Result<(), E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        self.close = Some(Arc::new(move |value| close(value).map_err(Into::into)));
        self
    }
}

#[async_trait]
impl<T: Send + 'static> Manager for FnManager<T> {
    type Resource = T;

    async fn create(&self) -> Result<T, BoxError> {
        let factory = Arc::clone(&self.factory);
        tokio::task::spawn_blocking(move || factory())
            .await
            .map_err(|e| -> BoxError { format!("factory task failed: {e}").into() })?
    }

    async fn close(&self, resource: T) -> Result<(), BoxError> {
        let Some(ref close) = self.close else {
            drop(resource);
            return Ok(());
        };
        let close = Arc::clone(close);
        match tokio::task::spawn_blocking(move || close(resource)).await {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!(error = %e, "close task failed");
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_fn_manager_creates_and_closes() {
        let closed = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&closed);
        let manager = FnManager::new(|| Ok::<_, std::io::Error>(7)).with_close(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok::<_, std::io::Error>(())
        });

        let value = manager.create().await.unwrap();
        assert_eq!(value, 7);
        manager.close(value).await.unwrap();
        assert_eq!(closed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_fn_manager_reports_factory_error() {
        let manager = FnManager::<u32>::new(|| Err::<u32, _>("no route to host"));
        let err = manager.create().await.unwrap_err();
        assert_eq!(err.to_string(), "no route to host");
    }

    #[tokio::test]
    async fn test_fn_manager_reports_factory_panic() {
        let manager = FnManager::<u32>::new(|| -> Result<u32, BoxError> { panic!("boom") });
        let err = manager.create().await.unwrap_err();
        assert!(err.to_string().starts_with("factory task failed"));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_blocking_close_leaves_runtime_free() {
        let manager = Arc::new(FnManager::new(|| Ok::<_, std::io::Error>(1)).with_close(|_| {
            std::thread::sleep(Duration::from_millis(200));
            Ok::<_, std::io::Error>(())
        }));

        let closing = {
            let manager = Arc::clone(&manager);
            tokio::spawn(async move { manager.close(1).await })
        };

        let started = std::time::Instant::now();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(started.elapsed() < Duration::from_millis(150));
        assert!(!closing.is_finished());

        closing.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_fn_manager_close_panic_is_contained() {
        let manager = FnManager::new(|| Ok::<_, std::io::Error>(1))
            .with_close(|_| -> Result<(), std::io::Error> { panic!("close exploded") });
        assert!(manager.close(1).await.is_ok());
    }
}
