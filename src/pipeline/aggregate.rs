//! Aggregator: the only writer of the final map.

use crossbeam_channel::Receiver;
use log::debug;

use crate::error::{Result, TreesumError};
use crate::utils::config::PROGRESS_UPDATE_BATCH_SIZE;
use crate::{HashedFile, Sums};

use super::cancel::CancelToken;
use super::context::WalkReport;

/// Consume `results` until the conduit closes and build the map.
///
/// The first error-bearing result fires `token` and returns that error at once; the map built
/// so far is dropped and nothing more is awaited. After a clean close the walk's report decides:
/// a walk error wins, then a fired token ([`TreesumError::Cancelled`]), then success.
pub fn aggregate(
    results: Receiver<HashedFile>,
    walk_slot: Receiver<WalkReport>,
    token: &CancelToken,
) -> Result<Sums> {
    aggregate_with_progress(results, walk_slot, token, None)
}

/// [`aggregate`] that also reports progress in batches of [`PROGRESS_UPDATE_BATCH_SIZE`] results.
pub fn aggregate_with_progress(
    results: Receiver<HashedFile>,
    walk_slot: Receiver<WalkReport>,
    token: &CancelToken,
    on_progress: Option<&dyn Fn(usize)>,
) -> Result<Sums> {
    let mut sums = Sums::new();
    let mut pending = 0_usize;

    for HashedFile { path, digest } in results.iter() {
        match digest {
            Ok(digest) => {
                sums.insert(path, digest);
            }
            Err(source) => {
                token.fire();
                debug!("aggregate: {} failed, cancelling run", path.display());
                return Err(TreesumError::Read { path, source });
            }
        }
        pending += 1;
        if pending == PROGRESS_UPDATE_BATCH_SIZE {
            if let Some(cb) = on_progress {
                cb(pending);
            }
            pending = 0;
        }
    }
    if pending > 0
        && let Some(cb) = on_progress
    {
        cb(pending);
    }
    debug!("aggregate: result conduit closed, {} entries", sums.len());

    // The walk fills its slot before closing the intake, so this does not wait on a live walk
    // unless the workers stopped early on cancellation.
    match walk_slot.recv() {
        Ok(Ok(_)) => {}
        Ok(Err(e)) => return Err(e),
        Err(_) => return Err(TreesumError::WalkerLost),
    }
    if token.is_fired() {
        return Err(TreesumError::Cancelled);
    }
    Ok(sums)
}
