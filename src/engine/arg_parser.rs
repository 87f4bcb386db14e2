use clap::Parser;
use std::path::PathBuf;

use crate::engine::hashing::HashAlgorithm;

struct DefaultArgs;

impl DefaultArgs {
    pub const DIR: &'static str = ".";
}

/// Content-hash every regular file under a directory.
#[derive(Clone, Parser)]
#[command(name = "treesum")]
#[command(about = "Hash every regular file under DIR with a bounded worker pool; any error fails the whole run.")]
pub struct Cli {
    /// Directory to hash. Default: current directory.
    #[arg(value_name = "DIR", default_value = DefaultArgs::DIR)]
    pub dir: PathBuf,

    /// Number of concurrent hashing workers. Default: derived from available threads and the FD limit.
    #[arg(long, short = 'w', value_parser = parse_workers)]
    pub workers: Option<usize>,

    /// Content hash to use.
    #[arg(long, short = 'a', value_enum)]
    pub algorithm: Option<HashAlgorithm>,

    /// Follow symbolic links.
    #[arg(long, short = 'f', num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub follow_links: Option<bool>,

    /// Exclude patterns (glob syntax). Can specify multiple: -e pattern1 pattern2 pattern3
    #[arg(long, short = 'e', num_args = 1..)]
    pub exclude: Vec<String>,

    /// Print paths relative to DIR.
    #[arg(long, short = 'r', num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub relative: Option<bool>,

    /// Cancel the run after this many seconds.
    #[arg(long, short = 't', value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Print a JSON object of path -> hex digest.
    #[arg(long, num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub json: Option<bool>,

    /// Verbose output with a progress counter.
    #[arg(long, short = 'v', num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub verbose: Option<bool>,
}

fn parse_workers(s: &str) -> Result<usize, String> {
    match s.parse::<usize>() {
        Ok(0) => Err("must be at least 1".to_string()),
        Ok(n) => Ok(n),
        Err(e) => Err(e.to_string()),
    }
}
