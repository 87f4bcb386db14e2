//! Generic pipeline stages: source, per-item map, and fan-in merge.
//!
//! Each stage runs on its own thread and hands items over rendezvous channels. Every send
//! races the shared token, so firing it winds every stage down even when the consumer
//! stops reading early.

use crossbeam_channel::{Receiver, bounded};
use std::thread;

use crate::utils::config::HANDOFF_CAP;

use super::cancel::{CancelToken, Handoff, send_or_cancel};
use super::tracker::{CompletionTracker, spawn_closer};

/// Emit `items` in order, stopping early on cancellation. The receiver closes when the items run out.
pub fn generate<I>(items: I, token: &CancelToken) -> Receiver<I::Item>
where
    I: IntoIterator,
    I::IntoIter: Send + 'static,
    I::Item: Send + 'static,
{
    let (tx, rx) = bounded(HANDOFF_CAP);
    let token = token.clone();
    let iter = items.into_iter();
    thread::spawn(move || {
        for item in iter {
            if send_or_cancel(&tx, item, &token) != Handoff::Delivered {
                break;
            }
        }
    });
    rx
}

/// Apply `f` to every item from `input` on one thread. Several stages may share one `input` (fan-out).
pub fn map_stage<T, U, F>(input: Receiver<T>, token: &CancelToken, f: F) -> Receiver<U>
where
    T: Send + 'static,
    U: Send + 'static,
    F: Fn(T) -> U + Send + 'static,
{
    let (tx, rx) = bounded(HANDOFF_CAP);
    let token = token.clone();
    thread::spawn(move || {
        for item in input.iter() {
            if send_or_cancel(&tx, f(item), &token) != Handoff::Delivered {
                break;
            }
        }
    });
    rx
}

/// Fan-in: forward every item of every input onto one receiver. It closes once all forwarders finish.
pub fn merge<T: Send + 'static>(inputs: Vec<Receiver<T>>, token: &CancelToken) -> Receiver<T> {
    let (tx, rx) = bounded(HANDOFF_CAP);
    let tracker = CompletionTracker::new();
    for input in inputs {
        let guard = tracker.register();
        let tx = tx.clone();
        let token = token.clone();
        thread::spawn(move || {
            let _guard = guard;
            for item in input.iter() {
                if send_or_cancel(&tx, item, &token) != Handoff::Delivered {
                    break;
                }
            }
            drop(tx);
        });
    }
    spawn_closer(tracker, tx);
    rx
}
