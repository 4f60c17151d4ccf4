//! Payload resolution, run once before the listener starts.

use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use tokio::io::{AsyncRead, AsyncWriteExt};

use crate::config::PayloadConfig;
use crate::error::{OfferError, Result};
use crate::payload::probe::{read_bounded, Probe};
use crate::payload::{Payload, PayloadReader};

/// Prefix shared by synthesized names and spooled files.
pub const NAME_PREFIX: &str = "offer";

/// Resolve the configured source into a payload.
pub async fn resolve(config: &PayloadConfig) -> Result<Payload> {
    if !config.reads_stdin() {
        if let Some(path) = &config.source {
            return resolve_file(path, config.buffer_size).await;
        }
    }
    if config.stream {
        tracing::info!("Streaming stdin without buffering");
        return Ok(resolve_live(Box::pin(tokio::io::stdin())));
    }
    let mut stdin = tokio::io::stdin();
    resolve_reader(&mut stdin, config.buffer_size, &config.temp_dir).await
}

/// Resolve a named file: small files are read into memory, large ones are
/// streamed from disk on every request.
pub async fn resolve_file(path: &Path, max_bytes: usize) -> Result<Payload> {
    let meta = tokio::fs::metadata(path).await?;
    if meta.is_dir() {
        return Err(OfferError::IsDirectory(path.to_path_buf()));
    }
    if meta.len() > max_bytes as u64 {
        tracing::debug!(path = %path.display(), size = meta.len(), "Serving from disk");
        return Ok(Payload::disk(path, false));
    }

    let mut file = tokio::fs::File::open(path).await?;
    match read_bounded(&mut file, max_bytes).await? {
        Probe::Complete(buf) => {
            tracing::debug!(path = %path.display(), size = buf.len(), "Buffered file in memory");
            Ok(Payload::memory(path.display().to_string(), buf))
        }
        // The file grew between stat and read.
        Probe::Overflow(_) => Err(OfferError::TooBig { limit: max_bytes }),
    }
}

/// Resolve an unseekable source: buffer it when it fits, otherwise spool it
/// into a temporary file inside `temp_dir`.
pub async fn resolve_reader<R>(reader: &mut R, max_bytes: usize, temp_dir: &Path) -> Result<Payload>
where
    R: AsyncRead + Unpin + ?Sized,
{
    match read_bounded(reader, max_bytes).await? {
        Probe::Complete(buf) => {
            let name = synthesized_name();
            tracing::debug!(name = %name, size = buf.len(), "Buffered stdin in memory");
            Ok(Payload::memory(name, buf))
        }
        Probe::Overflow(prefix) => spool(prefix, reader, temp_dir).await,
    }
}

/// Wrap a live stream. Nothing is read ahead of the transfer.
pub fn resolve_live(reader: PayloadReader) -> Payload {
    Payload::live(synthesized_name(), reader)
}

async fn spool<R>(prefix: Vec<u8>, rest: &mut R, temp_dir: &Path) -> Result<Payload>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let tmp = tempfile::Builder::new()
        .prefix(&format!("{NAME_PREFIX}-"))
        .tempfile_in(temp_dir)?;
    // `temp_path` deletes the file on drop, covering every early return below.
    let (file, temp_path) = tmp.into_parts();
    let mut file = tokio::fs::File::from_std(file);

    file.write_all(&prefix).await?;
    tokio::io::copy(rest, &mut file).await?;
    file.flush().await?;
    drop(file);

    let path = temp_path.keep().map_err(|e| OfferError::Io(e.error))?;
    tracing::info!(path = %path.display(), "Saved stdin to temporary file");
    Ok(Payload::disk(path, true))
}

fn synthesized_name() -> String {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    format!("{NAME_PREFIX}-{secs}")
}
