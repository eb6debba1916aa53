//! Checksum computation and verification.
//!
//! The catalog publishes an MD5 digest for raw instrument files and a SHA-256
//! digest for products. Both are hex encoded, so the algorithm is detected
//! from the length of the published value.
//!
//! Files are hashed in fixed-size chunks and never loaded whole into memory.
//!
//! ```rust
//! use cloudnet_dl::download::checksum::{Checksum, ChecksumAlgorithm};
//!
//! let checksum = Checksum::parse("D41D8CD98F00B204E9800998ECF8427E")?;
//! assert_eq!(checksum.algorithm(), ChecksumAlgorithm::Md5);
//! assert!(checksum.matches("d41d8cd98f00b204e9800998ecf8427e"));
//! # Ok::<(), cloudnet_dl::FetchError>(())
//! ```

use crate::error::FetchError;

use md5::Md5;
use sha2::{Digest, Sha256};
use std::io;
use std::path::Path;
use tokio::{fs::File, io::AsyncReadExt};

const CHUNK_SIZE: usize = 64 * 1024;

/// Supported digest algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChecksumAlgorithm {
    /// MD5, published for raw instrument files.
    Md5,
    /// SHA-256, published for products.
    Sha256,
}

impl ChecksumAlgorithm {
    /// Detect the algorithm from a hex-encoded digest.
    ///
    /// Returns `None` when the value is neither a 32 nor a 64 character hex
    /// string.
    pub fn detect(hex_digest: &str) -> Option<Self> {
        if !hex_digest.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        match hex_digest.len() {
            32 => Some(ChecksumAlgorithm::Md5),
            64 => Some(ChecksumAlgorithm::Sha256),
            _ => None,
        }
    }

    fn hasher(self) -> Hasher {
        match self {
            ChecksumAlgorithm::Md5 => Hasher::Md5(Md5::new()),
            ChecksumAlgorithm::Sha256 => Hasher::Sha256(Sha256::new()),
        }
    }
}

enum Hasher {
    Md5(Md5),
    Sha256(Sha256),
}

impl Hasher {
    fn update(&mut self, data: &[u8]) {
        match self {
            Hasher::Md5(h) => h.update(data),
            Hasher::Sha256(h) => h.update(data),
        }
    }

    fn finalize_hex(self) -> String {
        match self {
            Hasher::Md5(h) => hex::encode(h.finalize()),
            Hasher::Sha256(h) => hex::encode(h.finalize()),
        }
    }
}

/// An expected digest together with its algorithm.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checksum {
    algorithm: ChecksumAlgorithm,
    expected: String,
}

impl Checksum {
    /// Parse a published checksum.
    pub fn parse(value: &str) -> Result<Self, FetchError> {
        let value = value.trim();
        let algorithm =
            ChecksumAlgorithm::detect(value).ok_or_else(|| FetchError::UnrecognizedChecksum {
                checksum: value.to_string(),
            })?;
        Ok(Self {
            algorithm,
            expected: value.to_ascii_lowercase(),
        })
    }

    /// Get the detected algorithm.
    pub fn algorithm(&self) -> ChecksumAlgorithm {
        self.algorithm
    }

    /// Get the expected digest, lowercase hex.
    pub fn expected(&self) -> &str {
        &self.expected
    }

    /// Compare against a computed hex digest, ignoring case.
    pub fn matches(&self, actual: &str) -> bool {
        self.expected.eq_ignore_ascii_case(actual)
    }

    /// Hash `path` and compare it with the expected digest.
    pub async fn verify(&self, path: &Path) -> io::Result<bool> {
        let actual = digest_file(path, self.algorithm).await?;
        Ok(self.matches(&actual))
    }
}

/// Compute the lowercase hex digest of a local file.
pub async fn digest_file(path: &Path, algorithm: ChecksumAlgorithm) -> io::Result<String> {
    let mut file = File::open(path).await?;
    let mut hasher = algorithm.hasher();
    let mut buf = vec![0u8; CHUNK_SIZE];
    loop {
        let n = file.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hasher.finalize_hex())
}
