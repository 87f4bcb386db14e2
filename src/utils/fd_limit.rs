//! Open-file budget for the hashing pool (Unix `RLIMIT_NOFILE`).

/// Descriptors one hashing worker may hold at once: the file, its mapping, and a share of the walk's dir handles.
pub const FDS_PER_WORKER: usize = 4;

/// Percent of the soft limit the pool may claim; the rest stays free for stdio, logging and the walk.
const FD_BUDGET_PERCENT: u64 = 80;

/// Soft `RLIMIT_NOFILE`, or `None` when it is unlimited or cannot be read.
#[cfg(unix)]
pub fn soft_fd_limit() -> Option<u64> {
    let mut rlim = libc::rlimit {
        rlim_cur: 0,
        rlim_max: 0,
    };
    // SAFETY: `rlim` is a valid, initialized out-parameter for the duration of the call.
    if unsafe { libc::getrlimit(libc::RLIMIT_NOFILE, &mut rlim) } != 0 {
        return None;
    }
    let soft = u64::from(rlim.rlim_cur);
    (rlim.rlim_cur != libc::RLIM_INFINITY && soft <= i64::MAX as u64).then_some(soft)
}

#[cfg(not(unix))]
pub fn soft_fd_limit() -> Option<u64> {
    None
}

/// Workers that fit in the descriptor budget, at least one. `None` when there is no limit to respect.
pub fn max_workers_by_fd_limit() -> Option<usize> {
    let budget = soft_fd_limit()? * FD_BUDGET_PERCENT / 100;
    let workers = usize::try_from(budget).unwrap_or(usize::MAX) / FDS_PER_WORKER;
    Some(workers.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fd_cap_is_never_zero() {
        if let Some(n) = max_workers_by_fd_limit() {
            assert!(n >= 1);
        }
    }

    #[cfg(unix)]
    #[test]
    fn fd_cap_fits_inside_soft_limit() {
        if let (Some(limit), Some(n)) = (soft_fd_limit(), max_workers_by_fd_limit()) {
            assert!((n * FDS_PER_WORKER) as u64 <= limit.max(FDS_PER_WORKER as u64));
        }
    }
}
