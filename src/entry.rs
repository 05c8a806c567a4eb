//! Pool entries: a resource plus its lifecycle timestamps

use std::time::Duration;

use tokio::time::Instant;

use crate::manager::Manager;

/// Identity of an entry, unique within one pool
pub(crate) type EntryId = u64;

/// Owning wrapper around one pooled resource
///
/// Entries are compared by `id`, never by value, so a stale expiry check can
/// not close a different object that happens to look the same.
#[derive(Debug)]
pub(crate) struct Entry<T> {
    pub id: EntryId,
    pub value: T,
    pub created_at: Instant,
    pub last_returned: Instant,
}

impl<T> Entry<T> {
    pub fn new(id: EntryId, value: T) -> Self {
        let now = Instant::now();
        Self {
            id,
            value,
            created_at: now,
            last_returned: now,
        }
    }

    pub fn touch(&mut self) {
        self.last_returned = Instant::now();
    }

    pub fn idle_for(&self) -> Duration {
        self.last_returned.elapsed()
    }

    pub fn is_expired(&self, idle_timeout: Duration) -> bool {
        self.idle_for() >= idle_timeout
    }

    /// Close the resource. Consumes the entry, so it can only happen once.
    pub async fn dispose<M>(self, manager: &M)
    where
        M: Manager<Resource = T>,
    {
        let id = self.id;
        let lived = self.created_at.elapsed();
        match manager.close(self.value).await {
            Ok(()) => tracing::debug!(entry = id, lived_ms = lived.as_millis() as u64, "closed pooled object"),
            Err(e) => tracing::warn!(entry = id, error = %e, "closing pooled object failed; ignoring"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manager::FnManager;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test(start_paused = true)]
    async fn test_expiry_follows_last_return() {
        let timeout = Duration::from_secs(10);
        let mut entry = Entry::new(1, "conn");
        assert!(!entry.is_expired(timeout));

        tokio::time::advance(Duration::from_secs(8)).await;
        entry.touch();
        tokio::time::advance(Duration::from_secs(8)).await;
        assert!(!entry.is_expired(timeout));

        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(entry.is_expired(timeout));
    }

    #[tokio::test]
    async fn test_dispose_swallows_close_error() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&attempts);
        let manager = FnManager::new(|| Ok::<_, std::io::Error>(0u8)).with_close(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Err::<(), _>("socket already closed")
        });

        Entry::new(3, 0u8).dispose(&manager).await;
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }
}
