//! Pipeline context: conduits and per-stage settings for one run.

use crossbeam_channel::{Receiver, Sender, bounded};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::JoinHandle;

use crate::engine::hashing::ContentHasher;
use crate::error::TreesumError;
use crate::utils::config::{HANDOFF_CAP, WALK_SLOT_CAP};
use crate::{HashOpts, HashedFile, WorkItem};

use super::cancel::CancelToken;

/// What the walk reports once, on its way out: files handed off, or why it stopped.
pub type WalkReport = Result<usize, TreesumError>;

/// Settings the walk thread needs.
#[derive(Clone, Debug)]
pub struct WalkContext {
    pub root: PathBuf,
    pub follow_links: bool,
    pub exclude: Vec<String>,
}

/// Settings every hashing worker shares.
#[derive(Clone)]
pub struct WorkerContext {
    pub root: PathBuf,
    pub relative_paths: bool,
    pub hasher: Arc<dyn ContentHasher>,
}

/// Conduits for one run. Walk gets `intake_tx` and `walk_slot_tx`; workers get `intake_rx` and `results_tx`.
pub struct PipelineChannels {
    pub intake_tx: Sender<WorkItem>,
    pub intake_rx: Receiver<WorkItem>,
    pub results_tx: Sender<HashedFile>,
    pub results_rx: Receiver<HashedFile>,
    pub walk_slot_tx: Sender<WalkReport>,
    pub walk_slot_rx: Receiver<WalkReport>,
    pub walk_ctx: WalkContext,
    pub worker_ctx: WorkerContext,
}

pub fn create_pipeline_channels(
    root: &Path,
    opts: &HashOpts,
    hasher: Arc<dyn ContentHasher>,
) -> PipelineChannels {
    let (intake_tx, intake_rx) = bounded::<WorkItem>(HANDOFF_CAP);
    let (results_tx, results_rx) = bounded::<HashedFile>(HANDOFF_CAP);
    let (walk_slot_tx, walk_slot_rx) = bounded::<WalkReport>(WALK_SLOT_CAP);

    let walk_ctx = WalkContext {
        root: root.to_path_buf(),
        follow_links: opts.follow_links,
        exclude: opts.exclude.clone(),
    };
    let worker_ctx = WorkerContext {
        root: root.to_path_buf(),
        relative_paths: opts.relative_paths,
        hasher,
    };

    PipelineChannels {
        intake_tx,
        intake_rx,
        results_tx,
        results_rx,
        walk_slot_tx,
        walk_slot_rx,
        walk_ctx,
        worker_ctx,
    }
}

/// Handles returned by [`run_pipeline`](super::run_pipeline): the result stream, the walk's
/// report slot, the run's token and every thread to join.
pub struct PipelineHandles {
    pub results_rx: Receiver<HashedFile>,
    pub walk_slot_rx: Receiver<WalkReport>,
    pub token: CancelToken,
    pub walk_handle: JoinHandle<()>,
    pub worker_handles: Vec<JoinHandle<()>>,
    pub closer_handle: JoinHandle<()>,
}
