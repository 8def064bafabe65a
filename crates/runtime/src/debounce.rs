//! Coalesces rapid updates per key into one run after a quiet period.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

type Handler<T> = Arc<dyn Fn(T) + Send + Sync>;

struct Pending<T> {
    item: T,
    due: Instant,
}

struct Shared<T> {
    pending: Mutex<HashMap<String, Pending<T>>>,
    notify: Notify,
    handler: Handler<T>,
}

impl<T> Shared<T> {
    fn pending(&self) -> MutexGuard<'_, HashMap<String, Pending<T>>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Removes and returns everything due at `now`.
    fn take_due(&self, now: Instant) -> Vec<(String, T)> {
        let mut pending = self.pending();
        let due: Vec<String> = pending
            .iter()
            .filter(|(_, p)| p.due <= now)
            .map(|(k, _)| k.clone())
            .collect();
        due.into_iter()
            .filter_map(|k| pending.remove(&k).map(|p| (k, p.item)))
            .collect()
    }

    fn next_due(&self) -> Option<Instant> {
        self.pending().values().map(|p| p.due).min()
    }
}

/// Schedules `handler` for the latest item of each key once the key has been
/// quiet for `wait`. Runs on a background tokio task; without a runtime the
/// queue only drains through [`Debouncer::flush`].
pub struct Debouncer<T> {
    shared: Arc<Shared<T>>,
    wait: Duration,
    cancel: CancellationToken,
}

impl<T: Send + 'static> Debouncer<T> {
    pub fn new<F>(wait: Duration, handler: F) -> Self
    where
        F: Fn(T) + Send + Sync + 'static,
    {
        let shared = Arc::new(Shared {
            pending: Mutex::new(HashMap::new()),
            notify: Notify::new(),
            handler: Arc::new(handler),
        });
        let cancel = CancellationToken::new();

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(run_worker(shared.clone(), cancel.clone()));
            }
            Err(_) => warn!("No tokio runtime; debounced updates run only when flushed"),
        }

        Self {
            shared,
            wait,
            cancel,
        }
    }

    /// Replaces any pending item for `key` and restarts its quiet period.
    pub fn schedule(&self, key: impl Into<String>, item: T) {
        let due = Instant::now() + self.wait;
        self.shared.pending().insert(key.into(), Pending { item, due });
        self.shared.notify.notify_one();
    }

    /// Runs the pending item for `key` now. Returns whether there was one.
    pub fn flush(&self, key: &str) -> bool {
        let item = self.shared.pending().remove(key).map(|p| p.item);
        match item {
            Some(item) => {
                (self.shared.handler)(item);
                true
            }
            None => false,
        }
    }

    /// Runs every pending item now.
    pub fn flush_all(&self) -> usize {
        let items: Vec<T> = self.shared.pending().drain().map(|(_, p)| p.item).collect();
        let count = items.len();
        for item in items {
            (self.shared.handler)(item);
        }
        count
    }

    /// Drops the pending item for `key` without running it.
    pub fn cancel(&self, key: &str) -> bool {
        self.shared.pending().remove(key).is_some()
    }

    pub fn is_pending(&self, key: &str) -> bool {
        self.shared.pending().contains_key(key)
    }

    pub fn pending_count(&self) -> usize {
        self.shared.pending().len()
    }

    /// Stops the background task. Pending items stay until flushed.
    pub fn stop(&self) {
        self.cancel.cancel();
    }
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn run_worker<T: Send + 'static>(shared: Arc<Shared<T>>, cancel: CancellationToken) {
    debug!("Debounce worker started");
    loop {
        let next_due = shared.next_due();
        let sleep = async move {
            match next_due {
                Some(due) => tokio::time::sleep_until(due).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            _ = cancel.cancelled() => {
                break;
            }
            _ = shared.notify.notified() => {
                continue;
            }
            _ = sleep => {
                for (key, item) in shared.take_due(Instant::now()) {
                    debug!("Running debounced update for {}", key);
                    (shared.handler)(item);
                }
            }
        }
    }
    debug!("Debounce worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn recorder() -> (Arc<Mutex<Vec<u32>>>, impl Fn(u32) + Send + Sync + 'static) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        (seen, move |v: u32| sink.lock().unwrap().push(v))
    }

    #[tokio::test(start_paused = true)]
    async fn rapid_updates_coalesce_to_latest() {
        let (seen, handler) = recorder();
        let debouncer = Debouncer::new(Duration::from_millis(200), handler);
        debouncer.schedule("a", 1);
        tokio::time::sleep(Duration::from_millis(100)).await;
        debouncer.schedule("a", 2);
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(seen.lock().unwrap().is_empty());
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(*seen.lock().unwrap(), vec![2]);
        assert!(!debouncer.is_pending("a"));
    }

    #[tokio::test]
    async fn flush_runs_immediately_and_once() {
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = runs.clone();
        let debouncer = Debouncer::new(Duration::from_secs(60), move |_: u32| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        debouncer.schedule("a", 1);
        assert!(debouncer.flush("a"));
        assert!(!debouncer.flush("a"));
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn cancel_drops_pending_item() {
        let (seen, handler) = recorder();
        let debouncer = Debouncer::new(Duration::from_secs(60), handler);
        debouncer.schedule("a", 1);
        debouncer.schedule("b", 2);
        assert!(debouncer.cancel("a"));
        assert_eq!(debouncer.flush_all(), 1);
        assert_eq!(*seen.lock().unwrap(), vec![2]);
    }
}
