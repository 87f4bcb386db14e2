//! Pipeline components: cancellation, walk, bounded hashing pool, completion tracking, aggregation.
//!
//! Walk → intake → workers → results → aggregator, with one [`CancelToken`] wired into every
//! downstream handoff. Intake and results are rendezvous channels, so each stage is
//! back-pressured by the next.

pub mod aggregate;
pub mod cancel;
pub mod context;
pub mod orchestrator;
pub mod stages;
pub mod tracker;
pub mod walk;
pub mod workers;

pub use aggregate::{aggregate, aggregate_with_progress};
pub use cancel::{CancelToken, Deadline, Handoff, send_or_cancel, spawn_deadline};
pub use context::{
    PipelineChannels, PipelineHandles, WalkContext, WalkReport, WorkerContext,
    create_pipeline_channels,
};
pub use orchestrator::{hash_dir_with_token, run_pipeline, shutdown_pipeline_handles};
pub use stages::{generate, map_stage, merge};
pub use tracker::{CompletionTracker, WorkerGuard, spawn_closer};
pub use walk::{spawn_walk_thread, walk};
pub use workers::spawn_hash_workers;
