//! Client side of the pool: acquire, release, scoped use and disposal

use std::fmt;
use std::future::Future;
use std::ops::{Deref, DerefMut};
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot, watch};

use crate::config::PoolConfiguration;
use crate::coordinator::{self, AcquireRequest, Control};
use crate::entry::Entry;
use crate::errors::{BoxError, PoolError, PoolResult};
use crate::manager::{FnManager, Manager};
use crate::status::{PoolState, PoolStatus};

/// Boxed future borrowing a pooled object, as taken by
/// [`ObjectPool::with_instance_async`]
pub type InstanceFuture<'a, R> = Pin<Box<dyn Future<Output = R> + Send + 'a>>;

/// A pooled object that automatically returns to the pool when dropped
///
/// Releasing consumes the handle, so an object can not be returned twice or
/// used after it went back.
pub struct PooledObject<T: Send + 'static> {
    entry: Option<Entry<T>>,
    release_tx: mpsc::UnboundedSender<Entry<T>>,
}

impl<T: Send + 'static> PooledObject<T> {
    fn new(entry: Entry<T>, release_tx: mpsc::UnboundedSender<Entry<T>>) -> Self {
        Self {
            entry: Some(entry),
            release_tx,
        }
    }

    /// Identity of the underlying pool entry
    pub fn id(&self) -> u64 {
        self.entry().id
    }

    fn entry(&self) -> &Entry<T> {
        self.entry.as_ref().expect("Object already returned")
    }
}

impl<T: Send + 'static> Deref for PooledObject<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.entry().value
    }
}

impl<T: Send + 'static> DerefMut for PooledObject<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.entry.as_mut().expect("Object already returned").value
    }
}

impl<T: Send + 'static> Drop for PooledObject<T> {
    fn drop(&mut self) {
        if let Some(entry) = self.entry.take() {
            if let Err(returned) = self.release_tx.send(entry) {
                tracing::warn!(entry = returned.0.id, "pool coordinator is gone; dropping object without closing it");
            }
        }
    }
}

impl<T: Send + fmt::Debug + 'static> fmt::Debug for PooledObject<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PooledObject")
            .field("id", &self.id())
            .field("value", &**self)
            .finish()
    }
}

/// Receiving side of one acquire
///
/// If the acquire is abandoned before the outcome has been read, dropping
/// the reservation closes the slot. An entry the coordinator managed to
/// deliver before that point is already counted as checked out, so it is
/// handed straight back through the release channel.
struct Reservation<T: Send + 'static> {
    reply: oneshot::Receiver<PoolResult<Entry<T>>>,
    release_tx: mpsc::UnboundedSender<Entry<T>>,
    settled: bool,
}

impl<T: Send + 'static> Reservation<T> {
    async fn wait(&mut self) -> PoolResult<PooledObject<T>> {
        let outcome = (&mut self.reply).await;
        self.settled = true;
        match outcome {
            Ok(Ok(entry)) => Ok(PooledObject::new(entry, self.release_tx.clone())),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(PoolError::Disposed),
        }
    }
}

impl<T: Send + 'static> Drop for Reservation<T> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        self.reply.close();
        if let Ok(Ok(entry)) = self.reply.try_recv() {
            tracing::debug!(entry = entry.id, "acquire cancelled after delivery; returning object");
            let _ = self.release_tx.send(entry);
        }
    }
}

struct PoolShared<T> {
    acquire_tx: mpsc::Sender<AcquireRequest<T>>,
    release_tx: mpsc::UnboundedSender<Entry<T>>,
    control_tx: mpsc::UnboundedSender<Control>,
    state_rx: watch::Receiver<PoolState>,
    config: PoolConfiguration,
}

/// Async object pool coordinated by a single background task
///
/// Cloning is cheap; clones share the same pool. When every clone has been
/// dropped the pool disposes itself as if [`ObjectPool::dispose_pool`] had
/// been called.
///
/// # Examples
///
/// ```
/// use esox_actorpool::{ObjectPool, PoolConfiguration};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), esox_actorpool::PoolError> {
/// let pool = ObjectPool::new(
///     || Ok::<_, std::io::Error>(String::with_capacity(64)),
///     PoolConfiguration::new().with_capacity(4),
/// )?;
///
/// {
///     let mut buffer = pool.acquire().await?;
///     buffer.push_str("hello");
///     // Returned to the pool when `buffer` goes out of scope
/// }
///
/// pool.dispose_pool().await;
/// # Ok(())
/// # }
/// ```
pub struct ObjectPool<T: Send + 'static> {
    inner: Arc<PoolShared<T>>,
}

impl<T: Send + 'static> Clone for ObjectPool<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Send + 'static> ObjectPool<T> {
    /// Create a pool from a fallible factory closure
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new<F, E>(factory: F, config: PoolConfiguration) -> PoolResult<Self>
    where
        F: Fn() -> Result<T, E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        Self::with_manager(FnManager::new(factory), config)
    }

    /// Create a pool from a [`Manager`]
    ///
    /// Must be called from within a Tokio runtime.
    pub fn with_manager<M>(manager: M, config: PoolConfiguration) -> PoolResult<Self>
    where
        M: Manager<Resource = T>,
    {
        config.validate()?;
        tracing::debug!(
            capacity = config.capacity,
            idle_timeout_ms = config.idle_timeout.as_millis() as u64,
            "creating object pool"
        );
        let handle = coordinator::spawn(manager, config.clone())?;

        Ok(Self {
            inner: Arc::new(PoolShared {
                acquire_tx: handle.acquire_tx,
                release_tx: handle.release_tx,
                control_tx: handle.control_tx,
                state_rx: handle.state_rx,
                config,
            }),
        })
    }

    /// Get an object, waiting until one is available
    ///
    /// Applies the configured operation timeout, if any. Dropping the
    /// returned future cancels the acquire without losing an object.
    pub async fn acquire(&self) -> PoolResult<PooledObject<T>> {
        match self.inner.config.operation_timeout {
            Some(timeout) => self.acquire_timeout(timeout).await,
            None => self.checkout().await,
        }
    }

    /// Get an object, giving up after `timeout`
    pub async fn acquire_timeout(&self, timeout: Duration) -> PoolResult<PooledObject<T>> {
        tokio::time::timeout(timeout, self.checkout())
            .await
            .map_err(|_| PoolError::Timeout(timeout))?
    }

    /// Get an object, giving up as soon as `cancel` completes
    pub async fn acquire_with_cancel<C>(&self, cancel: C) -> PoolResult<PooledObject<T>>
    where
        C: Future<Output = ()>,
    {
        tokio::select! {
            result = self.checkout() => result,
            () = cancel => Err(PoolError::Cancelled),
        }
    }

    async fn checkout(&self) -> PoolResult<PooledObject<T>> {
        let (reply_tx, reply_rx) = oneshot::channel();
        let mut reservation = Reservation {
            reply: reply_rx,
            release_tx: self.inner.release_tx.clone(),
            settled: false,
        };

        self.inner
            .acquire_tx
            .send(AcquireRequest { reply: reply_tx })
            .await
            .map_err(|_| PoolError::Disposed)?;

        reservation.wait().await
    }

    /// Return an object to the pool
    ///
    /// Equivalent to dropping it.
    ///
    /// # Panics
    ///
    /// Panics if `object` was handed out by a different pool.
    pub fn release(&self, object: PooledObject<T>) {
        assert!(
            object.release_tx.same_channel(&self.inner.release_tx),
            "PooledObject released into a pool that did not issue it"
        );
        drop(object);
    }

    /// Run `f` on a pooled object and return it afterwards
    ///
    /// The object is returned on every exit path, including a panic in `f`.
    /// Acquire failures are converted into `E`.
    pub async fn with_instance<F, R, E>(&self, f: F) -> Result<R, E>
    where
        F: FnOnce(&mut T) -> Result<R, E>,
        E: From<PoolError>,
    {
        let mut object = self.acquire().await?;
        f(&mut object)
    }

    /// Async variant of [`ObjectPool::with_instance`]
    ///
    /// ```
    /// use esox_actorpool::{ObjectPool, PoolConfiguration, PoolError};
    ///
    /// # #[tokio::main(flavor = "current_thread")]
    /// # async fn main() -> Result<(), PoolError> {
    /// let pool = ObjectPool::new(|| Ok::<_, PoolError>(Vec::<u8>::new()), PoolConfiguration::new())?;
    ///
    /// let len = pool
    ///     .with_instance_async(|buffer| {
    ///         Box::pin(async move {
    ///             buffer.extend_from_slice(b"ping");
    ///             Ok::<_, PoolError>(buffer.len())
    ///         })
    ///     })
    ///     .await?;
    /// assert_eq!(len, 4);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn with_instance_async<F, R, E>(&self, f: F) -> Result<R, E>
    where
        F: for<'a> FnOnce(&'a mut T) -> InstanceFuture<'a, Result<R, E>>,
        E: From<PoolError>,
    {
        let mut object = self.acquire().await?;
        f(&mut object).await
    }

    /// Shut the pool down and wait until every object has been closed
    ///
    /// Idle objects are closed right away; checked out objects are closed as
    /// they come back. Acquires issued from here on fail with
    /// [`PoolError::Disposed`]. Any number of callers may wait concurrently.
    ///
    /// Disposal waits for every checked out handle. A handle leaked with
    /// [`std::mem::forget`] never comes back, so the returned future never
    /// completes and the pool stays [`PoolState::Disposing`].
    pub async fn dispose_pool(&self) {
        let _ = self.inner.control_tx.send(Control::Dispose);
        let mut state = self.inner.state_rx.clone();
        let _ = state.wait_for(|s| *s == PoolState::Disposed).await;
    }

    /// Snapshot of the coordinator's bookkeeping
    pub async fn status(&self) -> PoolResult<PoolStatus> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.inner
            .control_tx
            .send(Control::Status(reply_tx))
            .map_err(|_| PoolError::Disposed)?;
        reply_rx.await.map_err(|_| PoolError::Disposed)
    }

    /// Current lifecycle state, without a round-trip to the coordinator
    pub fn state(&self) -> PoolState {
        *self.inner.state_rx.borrow()
    }

    /// The configuration the pool was created with
    pub fn config(&self) -> &PoolConfiguration {
        &self.inner.config
    }
}
