//! Application configuration constants.
//! Tuning and thresholds in one place.

use std::sync::OnceLock;

use crate::utils::fd_limit::max_workers_by_fd_limit;

// ---- Package / paths (from CARGO_PKG_NAME, cached) ----

/// Package-derived names: built once from `CARGO_PKG_NAME`, then cached.
pub struct PackagePaths {
    pkg_name: &'static str,
    config_filename: String,
}

static PACKAGE_PATHS: OnceLock<PackagePaths> = OnceLock::new();

impl PackagePaths {
    /// Build and cache names from `CARGO_PKG_NAME`. Called once on first use.
    pub fn get() -> &'static PackagePaths {
        PACKAGE_PATHS.get_or_init(|| {
            let pkg = env!("CARGO_PKG_NAME");
            PackagePaths {
                pkg_name: pkg,
                config_filename: format!(".{pkg}.toml"),
            }
        })
    }

    pub fn pkg_name(&self) -> &str {
        self.pkg_name
    }

    /// Per-directory config file read by the CLI (e.g. `.treesum.toml`).
    pub fn config_filename(&self) -> &str {
        &self.config_filename
    }

    /// Patterns the CLI always excludes so its own files never show up in DIR's sums.
    pub fn default_exclude_patterns(&self) -> Vec<String> {
        vec![self.config_filename.clone()]
    }
}

// ---- Worker threads ----

/// Limits for sizing the worker pool when the caller does not pick a size.
#[derive(Clone, Copy, Debug)]
pub struct WorkerThreadLimits {
    /// Available threads (from rayon); set by [`WorkerThreadLimits::current()`].
    pub all_threads: usize,
    /// Floor for the derived pool size.
    pub floor: usize,
    /// Ceiling for the derived pool size; more readers than this rarely help a single disk.
    pub max: usize,
}

impl Default for WorkerThreadLimits {
    fn default() -> Self {
        Self {
            all_threads: 0, // use current() to set from rayon
            floor: Self::FLOOR_THREADS,
            max: Self::MAX_THREADS,
        }
    }
}

impl WorkerThreadLimits {
    /// Lib default when [`HashOpts`](crate::HashOpts) is built with `Default`.
    pub const DEFAULT_WORKERS: usize = 5;
    pub const FLOOR_THREADS: usize = 2;
    pub const MAX_THREADS: usize = 32;

    /// Build limits with `all_threads` set from `rayon::current_num_threads()`.
    pub fn current() -> Self {
        Self {
            all_threads: rayon::current_num_threads(),
            ..Self::default()
        }
    }

    /// Pool size derived from available threads, clamped to `[floor, max]`, then capped by the FD limit.
    pub fn default_workers(&self) -> usize {
        let n = self.all_threads.clamp(self.floor, self.max);
        match max_workers_by_fd_limit() {
            Some(fd_cap) if fd_cap < n => {
                log::debug!("Capping workers {} -> {} (FD limit ~80%)", n, fd_cap);
                fd_cap
            }
            _ => n,
        }
    }
}

// ---- Hashing ----

/// Hashing I/O thresholds.
pub struct HashingConsts;

impl HashingConsts {
    /// File size above which the whole file is memory-mapped instead of read into a buffer (bytes). 100 MB.
    pub const HASH_MMAP_THRESHOLD: u64 = 100 * 1024 * 1024;
}

// ---- Conduits ----

/// Intake and result conduits are rendezvous channels: a send completes only when a receiver takes it.
pub const HANDOFF_CAP: usize = 0;

/// Walk-outcome slot: one value, so the walk never blocks reporting it.
pub const WALK_SLOT_CAP: usize = 1;

// ---- Progress ----

/// Update the progress counter every this many results.
pub const PROGRESS_UPDATE_BATCH_SIZE: usize = 64;
