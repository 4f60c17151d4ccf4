//! No-clobber placement of received files.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::{OfferError, Result};

/// Highest numeric suffix tried before giving up.
pub const MAX_SUFFIX: u32 = 999;

/// `out.txt` → `out-<n>.txt`; `n == 0` returns the path unchanged.
pub fn suffixed(path: &Path, n: u32) -> PathBuf {
    if n == 0 {
        return path.to_path_buf();
    }
    let stem = path.file_stem().map(|s| s.to_string_lossy()).unwrap_or_default();
    let name = match path.extension() {
        Some(ext) => format!("{}-{}.{}", stem, n, ext.to_string_lossy()),
        None => format!("{}-{}", stem, n),
    };
    path.with_file_name(name)
}

/// Move `from` to `to`, or to the first free `to-<n>` variant.
///
/// Placement uses a hard link, which fails instead of replacing an
/// existing name, so concurrent uploads cannot clobber each other.
pub async fn safe_rename(from: &Path, to: &Path) -> Result<PathBuf> {
    for n in 0..=MAX_SUFFIX {
        let candidate = suffixed(to, n);
        match tokio::fs::hard_link(from, &candidate).await {
            Ok(()) => {
                if let Err(e) = tokio::fs::remove_file(from).await {
                    tracing::warn!(path = %from.display(), error = %e, "Failed to remove temporary upload");
                }
                return Ok(candidate);
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Err(OfferError::NameCollision(to.to_path_buf()))
}
