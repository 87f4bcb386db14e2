//! Public and internal types for the treesum API and pipeline.

use std::collections::HashMap;
use std::path::PathBuf;

use crate::engine::hashing::HashAlgorithm;

/// Fixed-size content hash of one file.
pub type Digest = [u8; 32];

/// A path the walk found to be a regular file. Moved from the walk to exactly one worker.
#[derive(Debug)]
pub struct WorkItem {
    pub path: PathBuf,
}

/// Outcome of hashing one [`WorkItem`]. A read failure is carried here instead of stopping the worker.
#[derive(Debug)]
pub struct HashedFile {
    /// Key for the final map: the walked path, or root-relative when [`HashOpts::relative_paths`] is set.
    pub path: PathBuf,
    pub digest: std::io::Result<Digest>,
}

/// Map of path → digest for every regular file under the root.
///
/// Only ever returned whole: a run with any error returns no map at all.
pub type Sums = HashMap<PathBuf, Digest>;

/// Lib options for [`hash_dir`](crate::hash_dir).
#[derive(Clone, Debug)]
pub struct HashOpts {
    /// Worker pool size. Fixed for the run; must be at least 1.
    pub workers: usize,
    /// Hash used when the caller does not pass its own hasher.
    pub algorithm: HashAlgorithm,
    /// Follow symbolic links. When false a symlink is never a regular file and is not hashed.
    pub follow_links: bool,
    /// Exclude patterns (glob syntax, e.g. `target`, `*.log`). A matching directory prunes its subtree.
    pub exclude: Vec<String>,
    /// Key the map by path relative to the root instead of the walked path.
    pub relative_paths: bool,
}

impl Default for HashOpts {
    fn default() -> Self {
        Self {
            workers: crate::utils::config::WorkerThreadLimits::DEFAULT_WORKERS,
            algorithm: HashAlgorithm::default(),
            follow_links: false,
            exclude: Vec::new(),
            relative_paths: false,
        }
    }
}

impl From<&Opts> for HashOpts {
    fn from(o: &Opts) -> Self {
        HashOpts {
            workers: o.workers,
            algorithm: o.algorithm,
            follow_links: o.follow_links,
            exclude: o.exclude.clone(),
            relative_paths: o.relative_paths,
        }
    }
}

/// Full options (CLI). Use [`HashOpts`] for lib.
#[derive(Clone, Debug)]
pub struct Opts {
    pub workers: usize,
    pub algorithm: HashAlgorithm,
    pub follow_links: bool,
    pub exclude: Vec<String>,
    pub relative_paths: bool,
    /// Show a progress counter and debug logging.
    pub verbose: bool,
    /// Fire the cancellation token after this many seconds.
    pub timeout_secs: Option<u64>,
    /// Print a JSON object instead of `hex  path` lines.
    pub json: bool,
}

impl Default for Opts {
    fn default() -> Self {
        let lib = HashOpts::default();
        Self {
            workers: crate::utils::config::WorkerThreadLimits::current().default_workers(),
            algorithm: lib.algorithm,
            follow_links: lib.follow_links,
            exclude: lib.exclude,
            relative_paths: lib.relative_paths,
            verbose: false,
            timeout_secs: None,
            json: false,
        }
    }
}
