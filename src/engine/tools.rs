//! Path and filter utilities

use std::path::{Path, PathBuf};

/// Convert absolute path to relative path from base
pub fn path_relative_to(path: &Path, base: &Path) -> Option<PathBuf> {
    path.strip_prefix(base).ok().map(|p| p.to_path_buf())
}

/// Map key for a walked path: root-relative when `relative`, otherwise the path as walked.
/// A root that is itself a file keys by its file name in relative mode.
pub fn key_for(path: &Path, root: &Path, relative: bool) -> PathBuf {
    if !relative {
        return path.to_path_buf();
    }
    match path_relative_to(path, root) {
        Some(rel) if rel.as_os_str().is_empty() => path
            .file_name()
            .map(PathBuf::from)
            .unwrap_or_else(|| path.to_path_buf()),
        Some(rel) => rel,
        None => path.to_path_buf(),
    }
}

/// Returns true if `path` (not the root itself) matches an exclude pattern by file name or full path
/// and no `!pattern` re-includes it. A negation cannot reach into a directory that is already excluded.
pub fn is_excluded(path: &Path, root: &Path, exclude_patterns: &[String]) -> bool {
    if exclude_patterns.is_empty() || path == root {
        return false;
    }
    let name = match path.file_name().and_then(|n| n.to_str()) {
        Some(n) => n,
        None => return false,
    };
    let path_str = path.to_str().unwrap_or("");
    let hits = |pattern: &str| glob_match(pattern, name) || glob_match(pattern, path_str);

    let (negated, plain): (Vec<&str>, Vec<&str>) = exclude_patterns
        .iter()
        .map(String::as_str)
        .partition(|p| p.starts_with('!'));
    plain.iter().any(|&p| hits(p)) && !negated.iter().any(|&p| hits(&p[1..]))
}

/// Wildcard match with `*` (any run, including empty) and `?` (one char). Everything else is literal.
///
/// Backtracks only to the most recent `*`, so a match costs at most pattern × text steps.
pub fn glob_match(pattern: &str, text: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = text.chars().collect();
    let (mut p, mut t) = (0, 0);
    // (pattern index after the last `*`, text index it was tried against)
    let mut star: Option<(usize, usize)> = None;

    while t < text.len() {
        match pattern.get(p) {
            Some('*') => {
                star = Some((p + 1, t));
                p += 1;
            }
            Some(&c) if c == '?' || c == text[t] => {
                p += 1;
                t += 1;
            }
            _ => match star {
                Some((after_star, tried)) => {
                    p = after_star;
                    t = tried + 1;
                    star = Some((after_star, tried + 1));
                }
                None => return false,
            },
        }
    }
    pattern[p..].iter().all(|&c| c == '*')
}

/// True if the process is running with effective uid 0 (e.g. via sudo). Permission bits do not stop root from reading.
#[cfg(unix)]
pub fn running_as_root() -> bool {
    unsafe { libc::geteuid() == 0 }
}

#[cfg(not(unix))]
pub fn running_as_root() -> bool {
    false
}
