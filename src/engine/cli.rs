//! CLI command handler: merge config, run the pipeline with Ctrl+C and deadline cancellation, print sums.

use anyhow::{Context, Result};
use log::debug;
use std::collections::BTreeMap;
use std::io::Write;
use std::time::Duration;

use crate::engine::arg_parser::Cli;
use crate::engine::hashing::to_hex;
use crate::engine::progress::HashProgress;
use crate::pipeline::{CancelToken, run_pipeline, spawn_deadline};
use crate::utils::config::PackagePaths;
use crate::utils::{apply_file_to_opts, load_treesum_toml, setup_logging};
use crate::{HashOpts, Opts, Sums};

/// Defaults, then `.treesum.toml` in DIR, then CLI flags. The config file itself is always excluded.
pub fn setup_opts(cli: &Cli) -> Opts {
    let mut opts = Opts::default();
    if let Some(file) = load_treesum_toml(&cli.dir) {
        apply_file_to_opts(&file, &mut opts);
    }
    if let Some(n) = cli.workers {
        opts.workers = n;
    }
    if let Some(a) = cli.algorithm {
        opts.algorithm = a;
    }
    if let Some(v) = cli.follow_links {
        opts.follow_links = v;
    }
    if !cli.exclude.is_empty() {
        opts.exclude = cli.exclude.clone();
    }
    if let Some(v) = cli.relative {
        opts.relative_paths = v;
    }
    if cli.timeout.is_some() {
        opts.timeout_secs = cli.timeout;
    }
    if let Some(v) = cli.json {
        opts.json = v;
    }
    if let Some(v) = cli.verbose {
        opts.verbose = v;
    }
    opts.exclude.extend(PackagePaths::get().default_exclude_patterns());
    opts
}

/// Hash `cli.dir` and print the sums to stdout. Any error fails the run with no output.
pub fn handle_run(cli: &Cli) -> Result<()> {
    let opts = setup_opts(cli);
    setup_logging(opts.verbose);
    if opts.workers == 0 {
        anyhow::bail!("worker count must be at least 1");
    }
    debug!(
        "Hashing {} with {} workers ({})",
        cli.dir.display(),
        opts.workers,
        opts.algorithm
    );

    let token = CancelToken::new();
    let handler_token = token.clone();
    ctrlc::set_handler(move || {
        handler_token.fire();
    })
    .context("set Ctrl+C handler")?;
    let _deadline = opts
        .timeout_secs
        .map(|secs| spawn_deadline(&token, Duration::from_secs(secs)));

    let bar = opts.verbose.then(|| HashProgress::start("Hashing"));
    let on_progress = bar.as_ref().map(HashProgress::callback);

    let handles = run_pipeline(
        &cli.dir,
        &HashOpts::from(&opts),
        opts.algorithm.hasher(),
        &token,
    )?;
    let sums = handles
        .finish_with_progress(on_progress.as_ref().map(|f| f.as_ref() as &dyn Fn(usize)))
        .with_context(|| format!("hashing {}", cli.dir.display()))?;
    if let Some(bar) = &bar {
        bar.finish();
    }

    let rendered = render_sums(&sums, opts.json)?;
    let mut out = std::io::stdout().lock();
    out.write_all(rendered.as_bytes())
        .context("write sums to stdout")?;
    Ok(())
}

/// Render sums sorted by path: `hex  path` lines, or a pretty JSON object.
pub fn render_sums(sums: &Sums, json: bool) -> Result<String> {
    let sorted: BTreeMap<String, String> = sums
        .iter()
        .map(|(path, digest)| (path.to_string_lossy().into_owned(), to_hex(digest)))
        .collect();
    if json {
        let mut s = serde_json::to_string_pretty(&sorted).context("serialize sums")?;
        s.push('\n');
        return Ok(s);
    }
    Ok(sorted
        .iter()
        .map(|(path, hex)| format!("{hex}  {path}\n"))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::path::PathBuf;

    fn sums() -> Sums {
        let mut s = Sums::new();
        s.insert(PathBuf::from("b.txt"), [0xab; 32]);
        s.insert(PathBuf::from("a.txt"), [0x01; 32]);
        s
    }

    #[test]
    fn text_lines_sorted_by_path() {
        let out = render_sums(&sums(), false).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], format!("{}  a.txt", "01".repeat(32)));
        assert!(lines[1].ends_with("  b.txt"));
    }

    #[test]
    fn json_object_of_hex() {
        let out = render_sums(&sums(), true).unwrap();
        let v: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(v["b.txt"], "ab".repeat(32));
    }

    #[test]
    fn cli_flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(".treesum.toml"),
            "[settings]\nworkers = 3\nrelative = true\njson = true\n",
        )
        .unwrap();
        let dir_arg = dir.path().to_str().unwrap();
        let cli = Cli::try_parse_from(["treesum", dir_arg, "-w", "7", "--json", "false"]).unwrap();
        let opts = setup_opts(&cli);
        assert_eq!(opts.workers, 7);
        assert!(opts.relative_paths);
        assert!(!opts.json);
    }

    #[test]
    fn config_file_is_left_out_of_sums() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(".treesum.toml"), "[settings]\nrelative = true\n").unwrap();
        std::fs::write(dir.path().join("data.txt"), "payload").unwrap();
        let dir_arg = dir.path().to_str().unwrap();
        let cli = Cli::try_parse_from(["treesum", dir_arg, "-e", "*.bak"]).unwrap();
        let opts = setup_opts(&cli);
        assert!(opts.exclude.contains(&"*.bak".to_string()));

        let sums = crate::hash_dir(dir.path(), &HashOpts::from(&opts)).unwrap();
        let keys: Vec<&PathBuf> = sums.keys().collect();
        assert_eq!(keys, vec![&PathBuf::from("data.txt")]);
    }
}
