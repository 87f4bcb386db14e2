//! Completion tracker: a join barrier over live workers with one designated closer.
//!
//! Workers hold a [`WorkerGuard`] for their whole lifetime and drop their result sender
//! before the guard. The closer owns the last sender and drops it only once the count
//! reaches zero, so the result conduit closes exactly once, after the last send.

use crossbeam_channel::Sender;
use log::debug;
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::thread::{self, JoinHandle};

#[derive(Default)]
struct Live {
    count: Mutex<usize>,
    zero: Condvar,
}

#[derive(Clone, Default)]
pub struct CompletionTracker {
    live: Arc<Live>,
}

impl CompletionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one more live worker. Call before spawning it so the closer cannot observe zero early.
    pub fn register(&self) -> WorkerGuard {
        *self.live.count.lock().unwrap_or_else(PoisonError::into_inner) += 1;
        WorkerGuard {
            live: Arc::clone(&self.live),
        }
    }

    #[cfg(test)]
    pub(crate) fn running(&self) -> usize {
        *self.live.count.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Block until every registered guard has been dropped.
    pub fn wait(&self) {
        let mut count = self.live.count.lock().unwrap_or_else(PoisonError::into_inner);
        while *count > 0 {
            count = self
                .live
                .zero
                .wait(count)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }
}

/// Held by a running worker; dropping it (also on panic) marks the worker finished.
pub struct WorkerGuard {
    live: Arc<Live>,
}

impl Drop for WorkerGuard {
    fn drop(&mut self) {
        let mut count = self.live.count.lock().unwrap_or_else(PoisonError::into_inner);
        *count -= 1;
        if *count == 0 {
            self.live.zero.notify_all();
        }
    }
}

/// Spawn the closer: waits for `tracker` to drain, then drops `tx`, the conduit's last sender.
/// Register every worker before calling this.
pub fn spawn_closer<T: Send + 'static>(tracker: CompletionTracker, tx: Sender<T>) -> JoinHandle<()> {
    thread::spawn(move || {
        tracker.wait();
        drop(tx);
        debug!("all workers finished, result conduit closed");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::{RecvTimeoutError, bounded};
    use std::time::Duration;

    #[test]
    fn guards_count_live_workers() {
        let tracker = CompletionTracker::new();
        let a = tracker.register();
        let b = tracker.register();
        assert_eq!(tracker.running(), 2);
        drop(a);
        assert_eq!(tracker.running(), 1);
        drop(b);
        assert_eq!(tracker.running(), 0);
        tracker.wait();
    }

    #[test]
    fn closer_waits_for_last_guard() {
        let tracker = CompletionTracker::new();
        let (tx, rx) = bounded::<u8>(0);
        let guard = tracker.register();
        let worker_tx = tx.clone();
        let closer = spawn_closer(tracker.clone(), tx);

        drop(worker_tx);
        assert_eq!(
            rx.recv_timeout(Duration::from_millis(50)),
            Err(RecvTimeoutError::Timeout)
        );

        drop(guard);
        assert_eq!(
            rx.recv_timeout(Duration::from_secs(5)),
            Err(RecvTimeoutError::Disconnected)
        );
        closer.join().unwrap();
    }

    #[test]
    fn guard_released_on_panic() {
        let tracker = CompletionTracker::new();
        let guard = tracker.register();
        let h = thread::spawn(move || {
            let _guard = guard;
            panic!("worker died");
        });
        assert!(h.join().is_err());
        assert_eq!(tracker.running(), 0);
    }
}
