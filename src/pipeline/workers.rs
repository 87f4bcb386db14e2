//! Bounded hashing pool: a fixed number of workers sharing one intake.

use crossbeam_channel::{Receiver, Sender};
use log::debug;
use std::thread::{self, JoinHandle};

use crate::engine::tools::key_for;
use crate::{HashedFile, WorkItem};

use super::cancel::{CancelToken, Handoff, send_or_cancel};
use super::context::WorkerContext;
use super::tracker::{CompletionTracker, WorkerGuard};

/// Single worker: hash items from `intake` until it closes; send each result downstream.
/// A read failure travels inside the result. Exits without sending once the token fires.
fn hash_worker_loop(
    guard: WorkerGuard,
    id: usize,
    intake: Receiver<WorkItem>,
    results: Sender<HashedFile>,
    ctx: WorkerContext,
    token: CancelToken,
) {
    let mut sent = 0_usize;
    while let Ok(item) = intake.recv() {
        if token.is_fired() {
            break;
        }
        let digest = ctx.hasher.hash_file(&item.path);
        let path = key_for(&item.path, &ctx.root, ctx.relative_paths);
        match send_or_cancel(&results, HashedFile { path, digest }, &token) {
            Handoff::Delivered => sent += 1,
            Handoff::Cancelled | Handoff::Closed => break,
        }
    }
    debug!("worker {} exiting after {} results", id, sent);
    // Sender before guard: the closer must never see zero while this sender is alive.
    drop(results);
    drop(guard);
}

/// Spawn exactly `num_workers` hashing workers, each registered with `tracker` before it starts.
/// Spawn the closer only after this returns.
pub fn spawn_hash_workers(
    intake: Receiver<WorkItem>,
    results: &Sender<HashedFile>,
    ctx: &WorkerContext,
    num_workers: usize,
    token: &CancelToken,
    tracker: &CompletionTracker,
) -> Vec<JoinHandle<()>> {
    (0..num_workers)
        .map(|id| {
            let guard = tracker.register();
            let intake = intake.clone();
            let results = results.clone();
            let ctx = ctx.clone();
            let token = token.clone();
            thread::spawn(move || hash_worker_loop(guard, id, intake, results, ctx, token))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::hashing::{Blake3, ContentHasher};
    use crossbeam_channel::bounded;
    use std::path::PathBuf;
    use std::sync::Arc;

    fn worker_ctx(root: PathBuf) -> WorkerContext {
        WorkerContext {
            root,
            relative_paths: true,
            hasher: Arc::new(Blake3),
        }
    }

    #[test]
    fn read_error_is_carried_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("ok.txt"), "hello").unwrap();

        let token = CancelToken::new();
        let tracker = CompletionTracker::new();
        let (intake_tx, intake_rx) = bounded(0);
        let (results_tx, results_rx) = bounded(0);
        let handles = spawn_hash_workers(
            intake_rx,
            &results_tx,
            &worker_ctx(dir.path().to_path_buf()),
            1,
            &token,
            &tracker,
        );
        drop(results_tx);

        let feeder = {
            let root = dir.path().to_path_buf();
            thread::spawn(move || {
                for name in ["missing.txt", "ok.txt"] {
                    intake_tx.send(WorkItem { path: root.join(name) }).unwrap();
                }
            })
        };

        let got: Vec<HashedFile> = results_rx.iter().collect();
        feeder.join().unwrap();
        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(got.len(), 2);
        assert_eq!(got[0].path, PathBuf::from("missing.txt"));
        assert!(got[0].digest.is_err());
        assert_eq!(got[1].path, PathBuf::from("ok.txt"));
        assert_eq!(*got[1].digest.as_ref().unwrap(), Blake3.digest(b"hello"));
        assert_eq!(tracker.running(), 0);
    }

    #[test]
    fn workers_exit_when_token_fires_mid_send() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("f"), "data").unwrap();

        let token = CancelToken::new();
        let tracker = CompletionTracker::new();
        let (intake_tx, intake_rx) = bounded(0);
        let (results_tx, _results_rx) = bounded::<HashedFile>(0);
        let handles = spawn_hash_workers(
            intake_rx,
            &results_tx,
            &worker_ctx(dir.path().to_path_buf()),
            3,
            &token,
            &tracker,
        );

        // Nobody receives results, so the worker parks on its send until the token fires.
        intake_tx
            .send(WorkItem {
                path: dir.path().join("f"),
            })
            .unwrap();
        drop(intake_tx);
        token.fire();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(tracker.running(), 0);
    }
}
