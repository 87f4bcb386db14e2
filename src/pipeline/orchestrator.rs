use log::debug;
use std::path::Path;
use std::sync::Arc;
use std::thread::JoinHandle;

use crate::engine::hashing::ContentHasher;
use crate::error::{Result, TreesumError};
use crate::{HashOpts, Sums};

use super::aggregate::aggregate_with_progress;
use super::cancel::CancelToken;
use super::context::{PipelineHandles, create_pipeline_channels};
use super::tracker::{CompletionTracker, spawn_closer};
use super::walk::spawn_walk_thread;
use super::workers::spawn_hash_workers;

/// Start the walk → workers → result conduit pipeline. Returns handles; the caller consumes
/// `results_rx` (usually via [`PipelineHandles::finish`]) and must join the threads.
///
/// Fails before starting any thread when `opts.workers` is 0.
pub fn run_pipeline(
    root: &Path,
    opts: &HashOpts,
    hasher: Arc<dyn ContentHasher>,
    token: &CancelToken,
) -> Result<PipelineHandles> {
    if opts.workers == 0 {
        return Err(TreesumError::InvalidPoolSize(opts.workers));
    }
    let channels = create_pipeline_channels(root, opts, hasher);

    let walk_handle = spawn_walk_thread(
        channels.intake_tx,
        channels.walk_slot_tx,
        channels.walk_ctx,
        token.clone(),
    );

    let tracker = CompletionTracker::new();
    let worker_handles = spawn_hash_workers(
        channels.intake_rx,
        &channels.results_tx,
        &channels.worker_ctx,
        opts.workers,
        token,
        &tracker,
    );
    debug!("started {} hashing workers", worker_handles.len());

    // The closer holds the last result sender; the conduit closes when it drops it.
    let closer_handle = spawn_closer(tracker, channels.results_tx);

    Ok(PipelineHandles {
        results_rx: channels.results_rx,
        walk_slot_rx: channels.walk_slot_rx,
        token: token.clone(),
        walk_handle,
        worker_handles,
        closer_handle,
    })
}

impl PipelineHandles {
    /// Aggregate the run, then join every pipeline thread before returning.
    pub fn finish(self) -> Result<Sums> {
        self.finish_with_progress(None)
    }

    /// A panicked worker turns any outcome but a read or traversal error into [`TreesumError::WorkerLost`].
    pub fn finish_with_progress(self, on_progress: Option<&dyn Fn(usize)>) -> Result<Sums> {
        let PipelineHandles {
            results_rx,
            walk_slot_rx,
            token,
            walk_handle,
            worker_handles,
            closer_handle,
        } = self;

        let outcome = aggregate_with_progress(results_rx, walk_slot_rx, &token, on_progress);
        let workers_ok = shutdown_pipeline_handles(walk_handle, worker_handles, closer_handle);
        if workers_ok {
            return outcome;
        }
        match outcome {
            Err(e @ (TreesumError::Read { .. } | TreesumError::Traversal(_))) => Err(e),
            _ => Err(TreesumError::WorkerLost),
        }
    }
}

/// Join walk, workers and closer. Returns false if any worker panicked.
/// Bounded once the result stream is drained or the token has fired.
pub fn shutdown_pipeline_handles(
    walk_handle: JoinHandle<()>,
    worker_handles: Vec<JoinHandle<()>>,
    closer_handle: JoinHandle<()>,
) -> bool {
    if walk_handle.join().is_err() {
        debug!("walk thread panicked");
    }
    let mut workers_ok = true;
    for h in worker_handles {
        if h.join().is_err() {
            workers_ok = false;
        }
    }
    let _ = closer_handle.join();
    workers_ok
}

/// Hash every regular file under `root` with `hasher`, cancellable through `token`.
/// Returns only after every pipeline thread has exited.
pub fn hash_dir_with_token(
    root: &Path,
    opts: &HashOpts,
    hasher: Arc<dyn ContentHasher>,
    token: &CancelToken,
) -> Result<Sums> {
    debug!(
        "{} CONFIG: root={} {:?}",
        env!("CARGO_PKG_NAME").to_uppercase(),
        root.display(),
        opts
    );
    run_pipeline(root, opts, hasher, token)?.finish()
}
