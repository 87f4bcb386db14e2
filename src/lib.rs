//! Treesum: content-hash a directory tree with a bounded worker pool and fail-fast errors

pub mod engine;
pub mod error;
pub mod pipeline;
pub mod types;
pub mod utils;

/// Re-export types for API
pub use types::*;

pub use engine::hashing::{ContentHasher, HashAlgorithm};
pub use error::{Result, TreesumError};
pub use pipeline::{CancelToken, hash_dir_with_token, spawn_deadline};

use std::path::Path;

/// Single entry point: hash every regular file under `root` with `opts.workers` workers and
/// the hash named by `opts.algorithm`. Returns the full map, or the first error with no map.
///
/// Use [`hash_dir_with_token`] to bring your own hasher or cancel from another thread:
///
/// ```ignore
/// let token = treesum::CancelToken::new();
/// let _deadline = treesum::spawn_deadline(&token, std::time::Duration::from_secs(30));
/// let sums = treesum::hash_dir_with_token(path, &opts, opts.algorithm.hasher(), &token)?;
/// ```
pub fn hash_dir(root: &Path, opts: &HashOpts) -> Result<Sums> {
    hash_dir_with_token(root, opts, opts.algorithm.hasher(), &CancelToken::new())
}
