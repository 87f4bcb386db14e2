//! Walk loop: hands every regular file under the root to the worker intake.

use crossbeam_channel::Sender;
use log::debug;
use std::thread::{self, JoinHandle};
use walkdir::WalkDir;

use crate::WorkItem;
use crate::engine::tools::is_excluded;
use crate::error::TreesumError;

use super::cancel::{CancelToken, Handoff, send_or_cancel};
use super::context::{WalkContext, WalkReport};

/// Walk `ctx.root` depth-first, handing each regular file to `intake`.
///
/// Stops at the first filesystem error and returns it; stops with
/// [`TreesumError::WalkCancelled`] once the token fires, and with [`TreesumError::WorkerLost`]
/// if every worker is gone while the token is still clear. Directories are never emitted,
/// and excluded directories are not descended into. Returns the number of files handed off.
pub fn walk(ctx: &WalkContext, intake: &Sender<WorkItem>, token: &CancelToken) -> WalkReport {
    let mut count = 0_usize;
    let iter = WalkDir::new(&ctx.root)
        .follow_links(ctx.follow_links)
        .into_iter()
        .filter_entry(|e| !is_excluded(e.path(), &ctx.root, &ctx.exclude));

    for entry in iter {
        if token.is_fired() {
            return Err(TreesumError::WalkCancelled);
        }
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let item = WorkItem {
            path: entry.into_path(),
        };
        match send_or_cancel(intake, item, token) {
            Handoff::Delivered => count += 1,
            Handoff::Cancelled => return Err(TreesumError::WalkCancelled),
            Handoff::Closed if token.is_fired() => return Err(TreesumError::WalkCancelled),
            Handoff::Closed => {
                debug!("walk: intake closed with no workers left after {} files", count);
                return Err(TreesumError::WorkerLost);
            }
        }
    }
    Ok(count)
}

/// Run [`walk`] on its own thread. The report goes into the single-slot `walk_slot` before
/// the intake is closed, so it is always readable once the result conduit has closed.
pub fn spawn_walk_thread(
    intake: Sender<WorkItem>,
    walk_slot: Sender<WalkReport>,
    ctx: WalkContext,
    token: CancelToken,
) -> JoinHandle<()> {
    thread::spawn(move || {
        let report = walk(&ctx, &intake, &token);
        match &report {
            Ok(count) => debug!("walk finished: {} files handed off", count),
            Err(e) => debug!("walk stopped: {}", e),
        }
        // Slot has capacity 1 and exactly one report is ever sent.
        let _ = walk_slot.try_send(report);
        drop(intake);
    })
}
