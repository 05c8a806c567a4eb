//! The coordinator task: sole owner of a pool's mutable state
//!
//! All state transitions happen here, one event at a time. Callers talk to
//! the coordinator through channels only:
//!
//! - acquire requests carry a `oneshot` reply slot. Delivering into the slot
//!   races the caller closing it; whichever happens first wins, and an entry
//!   rejected by a closed slot goes back to the idle set.
//! - releases arrive on an unbounded channel fed by `PooledObject::drop`.
//! - idle expiry checks are timers in a `JoinSet` that yield the entry id.
//!   Each idle entry has at most one live timer; checking the entry out
//!   aborts it.
//! - control messages request disposal or a status snapshot.

use std::collections::{HashMap, VecDeque};
use std::mem;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::{AbortHandle, JoinSet};

use crate::config::{PoolConfiguration, ReuseOrder};
use crate::entry::{Entry, EntryId};
use crate::errors::{PoolError, PoolResult};
use crate::manager::Manager;
use crate::status::{PoolState, PoolStatus};

/// Pending acquire requests held by the channel before the coordinator looks
/// at them. Everyone else waits in `send`.
const ACQUIRE_BACKLOG: usize = 1;

/// A checkout request and the slot its outcome is delivered into
pub(crate) struct AcquireRequest<T> {
    pub reply: oneshot::Sender<PoolResult<Entry<T>>>,
}

pub(crate) enum Control {
    Dispose,
    Status(oneshot::Sender<PoolStatus>),
}

/// Sending halves handed to the client side of the pool
pub(crate) struct CoordinatorHandle<T> {
    pub acquire_tx: mpsc::Sender<AcquireRequest<T>>,
    pub release_tx: mpsc::UnboundedSender<Entry<T>>,
    pub control_tx: mpsc::UnboundedSender<Control>,
    pub state_rx: watch::Receiver<PoolState>,
}

/// Spawn a coordinator on the current Tokio runtime
pub(crate) fn spawn<M: Manager>(
    manager: M,
    config: PoolConfiguration,
) -> PoolResult<CoordinatorHandle<M::Resource>> {
    let runtime = tokio::runtime::Handle::try_current().map_err(|_| PoolError::NoRuntime)?;
    let (coordinator, handle) = Coordinator::new(manager, config);
    runtime.spawn(coordinator.run());
    Ok(handle)
}

struct Coordinator<M: Manager> {
    manager: M,
    config: PoolConfiguration,
    idle: VecDeque<Entry<M::Resource>>,
    outstanding: usize,
    next_id: EntryId,
    state: PoolState,
    acquire_rx: mpsc::Receiver<AcquireRequest<M::Resource>>,
    release_rx: mpsc::UnboundedReceiver<Entry<M::Resource>>,
    control_rx: mpsc::UnboundedReceiver<Control>,
    control_open: bool,
    state_tx: watch::Sender<PoolState>,
    expiries: JoinSet<EntryId>,
    timers: HashMap<EntryId, AbortHandle>,
}

impl<M: Manager> Coordinator<M> {
    fn new(manager: M, config: PoolConfiguration) -> (Self, CoordinatorHandle<M::Resource>) {
        let (acquire_tx, acquire_rx) = mpsc::channel(ACQUIRE_BACKLOG);
        let (release_tx, release_rx) = mpsc::unbounded_channel();
        let (control_tx, control_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(PoolState::Running);

        let coordinator = Coordinator {
            manager,
            idle: VecDeque::with_capacity(config.capacity),
            config,
            outstanding: 0,
            next_id: 0,
            state: PoolState::Running,
            acquire_rx,
            release_rx,
            control_rx,
            control_open: true,
            state_tx,
            expiries: JoinSet::new(),
            timers: HashMap::new(),
        };
        let handle = CoordinatorHandle {
            acquire_tx,
            release_tx,
            control_tx,
            state_rx,
        };
        (coordinator, handle)
    }

    async fn run(mut self) {
        self.warm_up().await;

        while self.state != PoolState::Disposed {
            let accepting =
                self.state == PoolState::Running && self.outstanding < self.config.capacity;
            let expiring = self.state == PoolState::Running && !self.expiries.is_empty();

            tokio::select! {
                Some(entry) = self.release_rx.recv() => self.on_release(entry).await,
                Some(request) = self.acquire_rx.recv(), if accepting => self.on_acquire(request).await,
                Some(fired) = self.expiries.join_next(), if expiring => {
                    // Aborted timers come back as errors and need no handling.
                    if let Ok(id) = fired {
                        self.on_maybe_expired(id).await;
                    }
                }
                message = self.control_rx.recv(), if self.control_open => match message {
                    Some(Control::Dispose) => self.begin_dispose().await,
                    Some(Control::Status(reply)) => {
                        self.drain_releases().await;
                        let _ = reply.send(self.status());
                    }
                    None => {
                        tracing::debug!("all pool handles dropped");
                        self.control_open = false;
                        self.begin_dispose().await;
                    }
                },
                else => break,
            }
        }

        if self.state != PoolState::Disposed {
            // Only reachable if the loop ends with every event source closed
            // before the drain completed. A handle leaked with `mem::forget`
            // keeps its release sender alive, so it blocks the drain instead.
            tracing::warn!(
                outstanding = self.outstanding,
                "pool stopped with checked out objects that will never be returned"
            );
            self.dispose_idle().await;
            self.finish();
        }
    }

    async fn warm_up(&mut self) {
        let count = self.config.effective_warmup();
        for _ in 0..count {
            match self.manager.create().await {
                Ok(value) => {
                    let entry = Entry::new(self.next_entry_id(), value);
                    self.schedule_expiry(entry.id, self.config.idle_timeout);
                    self.idle.push_back(entry);
                }
                Err(e) => {
                    tracing::warn!(error = %e, "warm-up construction failed; continuing with fewer objects");
                    break;
                }
            }
        }
        if count > 0 {
            tracing::debug!(idle = self.idle.len(), "pool warmed up");
        }
    }

    async fn on_acquire(&mut self, request: AcquireRequest<M::Resource>) {
        if request.reply.is_closed() {
            tracing::trace!("acquire abandoned before it was served");
            return;
        }
        self.drain_releases().await;

        let entry = match self.take_idle() {
            Some(entry) => {
                tracing::debug!(entry = entry.id, "reusing idle object");
                entry
            }
            None => match self.manager.create().await {
                Ok(value) => {
                    let entry = Entry::new(self.next_entry_id(), value);
                    tracing::debug!(entry = entry.id, "constructed new object");
                    entry
                }
                Err(e) => {
                    tracing::debug!(error = %e, "constructing object failed");
                    let _ = request.reply.send(Err(PoolError::construction(e)));
                    return;
                }
            },
        };

        match request.reply.send(Ok(entry)) {
            Ok(()) => self.outstanding += 1,
            Err(Ok(entry)) => self.recover(entry),
            Err(Err(_)) => {}
        }
    }

    /// Put back an entry whose requester left before delivery
    fn recover(&mut self, entry: Entry<M::Resource>) {
        tracing::debug!(entry = entry.id, "acquire cancelled; object kept in pool");
        let remaining = self.config.idle_timeout.saturating_sub(entry.idle_for());
        self.schedule_expiry(entry.id, remaining);
        match self.config.reuse_order {
            ReuseOrder::Lifo => self.idle.push_back(entry),
            ReuseOrder::Fifo => self.idle.push_front(entry),
        }
    }

    async fn on_release(&mut self, mut entry: Entry<M::Resource>) {
        assert!(
            self.outstanding > 0,
            "object {} released while no object was checked out",
            entry.id
        );
        self.outstanding -= 1;

        match self.state {
            PoolState::Running => {
                tracing::trace!(entry = entry.id, "object returned");
                entry.touch();
                self.schedule_expiry(entry.id, self.config.idle_timeout);
                self.idle.push_back(entry);
            }
            PoolState::Disposing | PoolState::Disposed => {
                entry.dispose(&self.manager).await;
                if self.outstanding == 0 {
                    self.finish();
                }
            }
        }
    }

    /// Process releases already queued, so a release that happened before a
    /// request is visible to it.
    async fn drain_releases(&mut self) {
        while let Ok(entry) = self.release_rx.try_recv() {
            self.on_release(entry).await;
        }
    }

    async fn on_maybe_expired(&mut self, id: EntryId) {
        if self.timers.get(&id).is_some_and(|timer| timer.is_finished()) {
            self.timers.remove(&id);
        }
        let Some(position) = self.idle.iter().position(|entry| entry.id == id) else {
            tracing::trace!(entry = id, "expiry check for object that is no longer idle");
            return;
        };
        if !self.idle[position].is_expired(self.config.idle_timeout) {
            return;
        }
        if let Some(entry) = self.idle.remove(position) {
            tracing::debug!(entry = id, idle_ms = entry.idle_for().as_millis() as u64, "closing expired object");
            entry.dispose(&self.manager).await;
        }
    }

    async fn begin_dispose(&mut self) {
        if self.state != PoolState::Running {
            return;
        }
        tracing::info!(
            idle = self.idle.len(),
            outstanding = self.outstanding,
            "disposing pool"
        );
        self.set_state(PoolState::Disposing);

        self.acquire_rx.close();
        while let Ok(request) = self.acquire_rx.try_recv() {
            let _ = request.reply.send(Err(PoolError::Disposed));
        }
        self.expiries.abort_all();
        self.timers.clear();
        self.dispose_idle().await;

        if self.outstanding == 0 {
            self.finish();
        }
    }

    async fn dispose_idle(&mut self) {
        for entry in mem::take(&mut self.idle) {
            entry.dispose(&self.manager).await;
        }
    }

    fn finish(&mut self) {
        self.set_state(PoolState::Disposed);
        tracing::info!("pool disposed");
    }

    fn set_state(&mut self, state: PoolState) {
        self.state = state;
        self.state_tx.send_replace(state);
    }

    fn take_idle(&mut self) -> Option<Entry<M::Resource>> {
        let entry = match self.config.reuse_order {
            ReuseOrder::Lifo => self.idle.pop_back(),
            ReuseOrder::Fifo => self.idle.pop_front(),
        }?;
        self.cancel_expiry(entry.id);
        Some(entry)
    }

    /// Start the expiry timer for an idle entry, replacing any earlier one
    fn schedule_expiry(&mut self, id: EntryId, delay: Duration) {
        let timer = self.expiries.spawn(async move {
            tokio::time::sleep(delay).await;
            id
        });
        if let Some(previous) = self.timers.insert(id, timer) {
            previous.abort();
        }
    }

    fn cancel_expiry(&mut self, id: EntryId) {
        if let Some(timer) = self.timers.remove(&id) {
            timer.abort();
        }
    }

    fn next_entry_id(&mut self) -> EntryId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn status(&self) -> PoolStatus {
        PoolStatus::new(
            self.state,
            self.idle.len(),
            self.outstanding,
            self.config.capacity,
        )
    }
}
