//! Receive mode: storing uploaded parts.
//!
//! # Data Flow
//! ```text
//! multipart part (byte stream + declared filename)
//!     → stdout                       (serialized, one part at a time)
//!     → .offer-upload-* temp file    (same directory as the destination)
//!         → rename.rs safe_rename    (out.txt, out-1.txt, ...)
//! ```
//!
//! # Design Decisions
//! - Body-side failures are 400, local I/O failures are 500
//! - A failed transfer never reaches the final name; its data stays at the
//!   temporary name

pub mod rename;

use std::fmt::Display;
use std::path::{Path, PathBuf};

use axum::body::Bytes;
use futures_util::{Stream, StreamExt};
use tokio::io::{AsyncWriteExt, Stdout};
use tokio::sync::Mutex;

use crate::config::ReceiveDestination;
use crate::error::{OfferError, Result};
use crate::observability::metrics;

pub use rename::safe_rename;

const TEMP_PREFIX: &str = ".offer-upload-";

/// Where one part ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoredPart {
    Stdout { bytes: u64 },
    File { path: PathBuf, bytes: u64 },
}

impl StoredPart {
    /// Name reported back to the uploader.
    pub fn display_name(&self) -> String {
        match self {
            StoredPart::Stdout { .. } => "-".to_string(),
            StoredPart::File { path, .. } => path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default(),
        }
    }
}

/// Stores received parts at the configured destination.
pub struct UploadReceiver {
    destination: ReceiveDestination,
    stdout: Mutex<Stdout>,
}

impl UploadReceiver {
    pub fn new(destination: ReceiveDestination) -> Self {
        Self {
            destination,
            stdout: Mutex::new(tokio::io::stdout()),
        }
    }

    /// Store one part. `declared` is the filename the uploader supplied.
    pub async fn store<S, E>(&self, declared: Option<&str>, body: S) -> Result<StoredPart>
    where
        S: Stream<Item = std::result::Result<Bytes, E>>,
        E: Display,
    {
        let result = match &self.destination {
            ReceiveDestination::Stdout => self.store_stdout(body).await,
            ReceiveDestination::File(path) => store_file(path, body).await,
            ReceiveDestination::Directory(dir) => match declared.and_then(sanitize) {
                Some(name) => store_file(&dir.join(name), body).await,
                None => Err(OfferError::MissingFilename),
            },
        };
        metrics::record_upload(if result.is_ok() { "stored" } else { "failed" });
        result
    }

    async fn store_stdout<S, E>(&self, body: S) -> Result<StoredPart>
    where
        S: Stream<Item = std::result::Result<Bytes, E>>,
        E: Display,
    {
        let mut body = std::pin::pin!(body);
        let mut stdout = self.stdout.lock().await;
        let mut bytes = 0u64;
        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(|e| OfferError::Multipart(e.to_string()))?;
            stdout.write_all(&chunk).await?;
            bytes += chunk.len() as u64;
        }
        stdout.flush().await?;
        Ok(StoredPart::Stdout { bytes })
    }
}

async fn store_file<S, E>(target: &Path, body: S) -> Result<StoredPart>
where
    S: Stream<Item = std::result::Result<Bytes, E>>,
    E: Display,
{
    let dir = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let (file, temp_path) = tempfile::Builder::new()
        .prefix(TEMP_PREFIX)
        .tempfile_in(&dir)?
        .into_parts();
    let temp = temp_path.keep().map_err(|e| OfferError::Io(e.error))?;

    let mut file = tokio::fs::File::from_std(file);
    let copied = copy_stream(body, &mut file).await;
    drop(file);

    let bytes = match copied {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(path = %temp.display(), error = %e, "Upload failed, partial data left in place");
            return Err(e);
        }
    };

    let path = safe_rename(&temp, target).await?;
    tracing::info!(path = %path.display(), bytes, "Stored upload");
    Ok(StoredPart::File { path, bytes })
}

async fn copy_stream<S, E>(body: S, file: &mut tokio::fs::File) -> Result<u64>
where
    S: Stream<Item = std::result::Result<Bytes, E>>,
    E: Display,
{
    let mut body = std::pin::pin!(body);
    let mut bytes = 0u64;
    while let Some(chunk) = body.next().await {
        let chunk = chunk.map_err(|e| OfferError::Multipart(e.to_string()))?;
        file.write_all(&chunk).await?;
        bytes += chunk.len() as u64;
    }
    file.flush().await?;
    file.sync_all().await?;
    Ok(bytes)
}

/// Reduce an uploader-supplied filename to a plain base name.
fn sanitize(declared: &str) -> Option<&str> {
    // Browsers on Windows may send full paths.
    let base = declared.rsplit(['/', '\\']).next()?;
    match base {
        "" | "." | ".." => None,
        name => Some(name),
    }
}
