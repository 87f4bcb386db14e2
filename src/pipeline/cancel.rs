//! Cancellation token and the cancellable handoff used by every downstream send.
//!
//! The token is a one-shot flag paired with a channel whose only sender is dropped
//! when the token fires. A dropped sender disconnects the channel, so every thread
//! parked in `select!` on [`CancelToken::signal`] wakes at once.

use crossbeam_channel::{Receiver, Sender, after, bounded, select};
use log::{debug, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::Duration;

struct TokenInner {
    fired: AtomicBool,
    trigger: Mutex<Option<Sender<()>>>,
    signal: Receiver<()>,
}

/// Broadcast, one-shot cancellation signal shared by every stage of one run. Clones share state.
#[derive(Clone)]
pub struct CancelToken {
    inner: Arc<TokenInner>,
}

impl CancelToken {
    pub fn new() -> Self {
        let (trigger, signal) = bounded::<()>(0);
        Self {
            inner: Arc::new(TokenInner {
                fired: AtomicBool::new(false),
                trigger: Mutex::new(Some(trigger)),
                signal,
            }),
        }
    }

    /// Fire the token. Returns true only for the call that actually fired it; later calls are no-ops.
    pub fn fire(&self) -> bool {
        if self.inner.fired.swap(true, Ordering::SeqCst) {
            return false;
        }
        let trigger = self
            .inner
            .trigger
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        drop(trigger);
        debug!("cancellation token fired");
        true
    }

    /// Non-blocking check.
    pub fn is_fired(&self) -> bool {
        self.inner.fired.load(Ordering::SeqCst)
    }

    /// Receiver that never yields a message and disconnects when the token fires. Use as a `select!` arm.
    pub fn signal(&self) -> &Receiver<()> {
        &self.inner.signal
    }

    /// Block until the token fires or `timeout` elapses. Returns whether it fired.
    #[cfg(test)]
    pub(crate) fn wait_timeout(&self, timeout: Duration) -> bool {
        select! {
            recv(self.signal()) -> _ => true,
            default(timeout) => self.is_fired(),
        }
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CancelToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancelToken")
            .field("fired", &self.is_fired())
            .finish()
    }
}

/// How a cancellable send ended.
#[derive(Debug, PartialEq, Eq)]
pub enum Handoff {
    /// A receiver took the item.
    Delivered,
    /// The token fired first; the item was dropped.
    Cancelled,
    /// Every receiver is gone; the item was dropped.
    Closed,
}

/// Send `item` on `tx`, racing the send against the token. Never blocks past cancellation.
pub fn send_or_cancel<T>(tx: &Sender<T>, item: T, token: &CancelToken) -> Handoff {
    if token.is_fired() {
        return Handoff::Cancelled;
    }
    select! {
        send(tx, item) -> res => match res {
            Ok(()) => Handoff::Delivered,
            Err(_) => Handoff::Closed,
        },
        recv(token.signal()) -> _ => Handoff::Cancelled,
    }
}

/// Guard for [`spawn_deadline`]. Dropping it disarms the timer.
pub struct Deadline {
    _disarm: Sender<()>,
}

/// Fire `token` once `timeout` elapses. The timer thread exits early when the token fires
/// for another reason or the returned guard is dropped.
pub fn spawn_deadline(token: &CancelToken, timeout: Duration) -> Deadline {
    let (disarm_tx, disarm_rx) = bounded::<()>(0);
    let token = token.clone();
    thread::spawn(move || {
        select! {
            recv(token.signal()) -> _ => {},
            recv(disarm_rx) -> _ => {},
            recv(after(timeout)) -> _ => {
                if token.fire() {
                    warn!("deadline of {:?} reached, cancelling run", timeout);
                }
            },
        }
    });
    Deadline {
        _disarm: disarm_tx,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::RecvTimeoutError;

    #[test]
    fn fire_is_idempotent_and_shared() {
        let token = CancelToken::new();
        let other = token.clone();
        assert!(!other.is_fired());
        assert!(token.fire());
        assert!(!token.fire());
        assert!(!other.fire());
        assert!(other.is_fired());
    }

    #[test]
    fn signal_disconnects_on_fire() {
        let token = CancelToken::new();
        assert_eq!(
            token.signal().recv_timeout(Duration::from_millis(10)),
            Err(RecvTimeoutError::Timeout)
        );
        token.fire();
        assert_eq!(
            token.signal().recv_timeout(Duration::from_secs(1)),
            Err(RecvTimeoutError::Disconnected)
        );
    }

    #[test]
    fn blocked_send_is_released_by_fire() {
        let token = CancelToken::new();
        let (tx, _rx) = bounded::<u32>(0);
        let t = token.clone();
        let h = thread::spawn(move || send_or_cancel(&tx, 7, &t));
        thread::sleep(Duration::from_millis(20));
        token.fire();
        assert_eq!(h.join().unwrap(), Handoff::Cancelled);
    }

    #[test]
    fn send_delivers_to_ready_receiver() {
        let token = CancelToken::new();
        let (tx, rx) = bounded::<u32>(0);
        let h = thread::spawn(move || rx.recv().unwrap());
        assert_eq!(send_or_cancel(&tx, 9, &token), Handoff::Delivered);
        assert_eq!(h.join().unwrap(), 9);
    }

    #[test]
    fn send_reports_closed_conduit() {
        let token = CancelToken::new();
        let (tx, rx) = bounded::<u32>(0);
        drop(rx);
        assert_eq!(send_or_cancel(&tx, 1, &token), Handoff::Closed);
    }

    #[test]
    fn fired_token_wins_without_blocking() {
        let token = CancelToken::new();
        token.fire();
        let (tx, _rx) = bounded::<u32>(1);
        assert_eq!(send_or_cancel(&tx, 1, &token), Handoff::Cancelled);
    }

    #[test]
    fn deadline_fires_token() {
        let token = CancelToken::new();
        let _deadline = spawn_deadline(&token, Duration::from_millis(20));
        assert!(token.wait_timeout(Duration::from_secs(5)));
    }

    #[test]
    fn dropped_deadline_never_fires() {
        let token = CancelToken::new();
        drop(spawn_deadline(&token, Duration::from_millis(20)));
        assert!(!token.wait_timeout(Duration::from_millis(100)));
    }
}
