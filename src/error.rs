//! Error taxonomy for a hashing run.
//!
//! Exactly one of these reaches the caller per failing run. Abandoning work after
//! the token fires is internal bookkeeping and never surfaces here on its own.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TreesumError {
    /// The filesystem walk failed (missing root, permission denied on a directory, broken link).
    #[error("walk failed: {0}")]
    Traversal(#[from] walkdir::Error),

    /// The walk observed the cancellation token before it finished.
    #[error("walk cancelled")]
    WalkCancelled,

    /// A regular file could not be fully read.
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The run was cancelled from outside (caller, Ctrl+C, deadline).
    #[error("run cancelled")]
    Cancelled,

    /// The walk thread went away without reporting its outcome.
    #[error("walk thread exited without reporting")]
    WalkerLost,

    /// A hashing worker panicked, or every worker was gone before the walk finished.
    #[error("hashing worker panicked")]
    WorkerLost,

    #[error("worker pool size must be at least 1 (got {0})")]
    InvalidPoolSize(usize),
}

impl TreesumError {
    /// True for errors caused by cancellation rather than by the filesystem.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::WalkCancelled | Self::Cancelled)
    }
}

pub type Result<T> = std::result::Result<T, TreesumError>;
