//! Load `.treesum.toml` from the target directory (CLI only). Lib callers pass [`HashOpts`](crate::HashOpts) directly.

use serde::Deserialize;
use std::path::Path;

use crate::Opts;
use crate::engine::hashing::HashAlgorithm;
use crate::utils::config::PackagePaths;

#[derive(Debug, Default, Deserialize)]
pub struct TreesumToml {
    #[serde(default)]
    settings: Settings,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct Settings {
    workers: Option<usize>,
    algorithm: Option<HashAlgorithm>,
    follow_links: Option<bool>,
    exclude: Option<Vec<String>>,
    relative: Option<bool>,
    verbose: Option<bool>,
    timeout_secs: Option<u64>,
    json: Option<bool>,
}

/// Load the config file from `dir` if present. Returns None if missing; logs and returns None if it does not parse.
pub fn load_treesum_toml(dir: &Path) -> Option<TreesumToml> {
    let path = dir.join(PackagePaths::get().config_filename());
    let s = std::fs::read_to_string(&path).ok()?;
    parse_treesum_toml(&s)
        .map_err(|e| log::warn!("{}: {}", path.display(), e))
        .ok()
}

pub(crate) fn parse_treesum_toml(s: &str) -> Result<TreesumToml, toml::de::Error> {
    toml::from_str(s)
}

/// Overwrite opts field from file when present.
macro_rules! apply_file_opt {
    ($file:expr, $opts:expr, $file_field:ident => $opts_field:ident) => {
        if let Some(v) = $file.$file_field {
            $opts.$opts_field = v;
        }
    };
}

/// Apply file config to opts (only fields present in the file). Call before applying CLI flags.
pub fn apply_file_to_opts(file: &TreesumToml, opts: &mut Opts) {
    let s = &file.settings;
    apply_file_opt!(s, opts, workers => workers);
    apply_file_opt!(s, opts, algorithm => algorithm);
    apply_file_opt!(s, opts, follow_links => follow_links);
    if let Some(ref v) = s.exclude {
        opts.exclude = v.clone();
    }
    apply_file_opt!(s, opts, relative => relative_paths);
    apply_file_opt!(s, opts, verbose => verbose);
    if s.timeout_secs.is_some() {
        opts.timeout_secs = s.timeout_secs;
    }
    apply_file_opt!(s, opts, json => json);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_overrides_only_present_fields() {
        let file = parse_treesum_toml(
            r#"
            [settings]
            workers = 3
            algorithm = "sha256"
            exclude = ["target", "*.log"]
            "#,
        )
        .unwrap();
        let mut opts = Opts {
            json: true,
            ..Opts::default()
        };
        apply_file_to_opts(&file, &mut opts);
        assert_eq!(opts.workers, 3);
        assert_eq!(opts.algorithm, HashAlgorithm::Sha256);
        assert_eq!(opts.exclude, vec!["target".to_string(), "*.log".to_string()]);
        assert!(opts.json);
        assert!(!opts.follow_links);
    }

    #[test]
    fn empty_file_is_valid() {
        let file = parse_treesum_toml("").unwrap();
        let before = Opts::default();
        let mut opts = before.clone();
        apply_file_to_opts(&file, &mut opts);
        assert_eq!(opts.workers, before.workers);
        assert_eq!(opts.timeout_secs, None);
    }

    #[test]
    fn unknown_key_is_rejected() {
        assert!(parse_treesum_toml("[settings]\nthreads = 4\n").is_err());
    }
}
