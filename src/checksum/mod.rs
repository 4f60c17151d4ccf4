//! Payload checksums.
//!
//! # Data Flow
//! ```text
//! GET /checksums/<algo>
//!     → Algorithm::from_str (lowercased; unknown → 404, never cached)
//!     → cache.rs (single-flight per algorithm)
//!     → Payload::reader() → digest → "<algo> <hex> <base-name>\n"
//! ```

pub mod cache;

use std::fmt;
use std::str::FromStr;

use md5::Md5;
use sha1::Sha1;
use sha2::digest::DynDigest;
use sha2::{Sha256, Sha512};

use crate::error::OfferError;

pub use cache::ChecksumCache;

/// Supported digest algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Algorithm {
    Md5,
    Sha1,
    Sha256,
    Sha512,
}

impl Algorithm {
    /// Every algorithm, sorted by name.
    pub const ALL: [Algorithm; 4] = [Algorithm::Md5, Algorithm::Sha1, Algorithm::Sha256, Algorithm::Sha512];

    pub fn name(self) -> &'static str {
        match self {
            Algorithm::Md5 => "md5",
            Algorithm::Sha1 => "sha1",
            Algorithm::Sha256 => "sha256",
            Algorithm::Sha512 => "sha512",
        }
    }

    pub(crate) fn hasher(self) -> Box<dyn DynDigest + Send> {
        match self {
            Algorithm::Md5 => Box::new(Md5::default()),
            Algorithm::Sha1 => Box::new(Sha1::default()),
            Algorithm::Sha256 => Box::new(Sha256::default()),
            Algorithm::Sha512 => Box::new(Sha512::default()),
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Algorithm {
    type Err = OfferError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_ascii_lowercase();
        Algorithm::ALL
            .into_iter()
            .find(|algo| algo.name() == lower)
            .ok_or_else(|| OfferError::UnknownAlgorithm(lower))
    }
}

/// Format one checksum line.
pub fn format_line(algo: Algorithm, digest: &[u8], base_name: &str) -> String {
    format!("{} {} {}\n", algo, hex::encode(digest), base_name)
}
