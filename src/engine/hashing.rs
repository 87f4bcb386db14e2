//! Pluggable content hashing.

use memmap2::Mmap;
use serde::Deserialize;
use sha2::{Digest as _, Sha256 as Sha256Core};
use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use std::sync::Arc;

use crate::Digest;
use crate::utils::config::HashingConsts;

/// Computes a fixed-size digest over a file's full byte content.
///
/// Implement [`digest`](ContentHasher::digest) for a new algorithm. [`hash_file`](ContentHasher::hash_file)
/// owns the file handle for the duration of one call; override it only to change how bytes are read.
/// Any `Fn(&[u8]) -> Digest + Send + Sync` closure is a hasher.
pub trait ContentHasher: Send + Sync {
    fn digest(&self, bytes: &[u8]) -> Digest;

    /// Open, fully read and hash `path`. Large files are memory-mapped; the handle is closed on return.
    fn hash_file(&self, path: &Path) -> io::Result<Digest> {
        let mut file = File::open(path)?;
        let size = file.metadata()?.len();
        if size > HashingConsts::HASH_MMAP_THRESHOLD {
            let mmap = unsafe { Mmap::map(&file)? };
            Ok(self.digest(&mmap))
        } else {
            let mut data = Vec::with_capacity(size as usize);
            file.read_to_end(&mut data)?;
            Ok(self.digest(&data))
        }
    }
}

impl<F> ContentHasher for F
where
    F: Fn(&[u8]) -> Digest + Send + Sync,
{
    fn digest(&self, bytes: &[u8]) -> Digest {
        self(bytes)
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Blake3;

impl ContentHasher for Blake3 {
    fn digest(&self, bytes: &[u8]) -> Digest {
        *blake3::hash(bytes).as_bytes()
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Sha256;

impl ContentHasher for Sha256 {
    fn digest(&self, bytes: &[u8]) -> Digest {
        let out = Sha256Core::digest(bytes);
        let mut digest = [0u8; 32];
        digest.copy_from_slice(&out);
        digest
    }
}

/// Built-in hashes selectable from the CLI and config file.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    #[default]
    Blake3,
    Sha256,
}

impl HashAlgorithm {
    pub fn hasher(self) -> Arc<dyn ContentHasher> {
        match self {
            HashAlgorithm::Blake3 => Arc::new(Blake3),
            HashAlgorithm::Sha256 => Arc::new(Sha256),
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HashAlgorithm::Blake3 => f.write_str("blake3"),
            HashAlgorithm::Sha256 => f.write_str("sha256"),
        }
    }
}

/// Lowercase hex rendering of a digest.
pub fn to_hex(digest: &Digest) -> String {
    use std::fmt::Write;
    digest.iter().fold(String::with_capacity(64), |mut s, b| {
        let _ = write!(s, "{:02x}", b);
        s
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn sha256_known_vector() {
        assert_eq!(
            to_hex(&Sha256.digest(b"hello")),
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }

    #[test]
    fn blake3_matches_crate() {
        assert_eq!(Blake3.digest(b"world"), *blake3::hash(b"world").as_bytes());
    }

    #[test]
    fn hash_file_reads_full_content() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(b"hello").unwrap();
        f.flush().unwrap();
        assert_eq!(Sha256.hash_file(f.path()).unwrap(), Sha256.digest(b"hello"));
    }

    #[test]
    fn hash_file_missing_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Blake3.hash_file(&dir.path().join("nope")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn closure_is_a_hasher() {
        let h = |b: &[u8]| {
            let mut d = [0u8; 32];
            d[0] = b.len() as u8;
            d
        };
        assert_eq!(h.digest(b"abc")[0], 3);
    }

    #[test]
    fn algorithm_selects_hasher() {
        assert_eq!(
            HashAlgorithm::Sha256.hasher().digest(b"x"),
            Sha256.digest(b"x")
        );
        assert_eq!(HashAlgorithm::default(), HashAlgorithm::Blake3);
        assert_eq!(HashAlgorithm::Blake3.to_string(), "blake3");
    }
}
