//! Engine module: hashing, path helpers, CLI plumbing

pub mod arg_parser;
pub mod cli;
pub mod hashing;
pub mod progress;
pub mod tools;

// Re-export commonly used functions
pub use arg_parser::Cli;
pub use cli::{handle_run, render_sums};
pub use hashing::{Blake3, ContentHasher, HashAlgorithm, Sha256, to_hex};
pub use tools::{glob_match, is_excluded, key_for, path_relative_to, running_as_root};
