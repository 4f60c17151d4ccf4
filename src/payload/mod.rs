//! The single payload offered per run.
//!
//! # Data Flow
//! ```text
//! Startup (resolver.rs):
//!     file / stdin → probe.rs (bounded read) → memory | disk | live stream
//!
//! Per request:
//!     Payload::reader()       → fresh reader over memory or disk (checksums, serving)
//!     Payload::take_stream()  → the live stream, at most once
//!
//! Exit:
//!     Payload::remove_temporary() → spooled stdin deleted unless kept
//! ```
//!
//! # Design Decisions
//! - Exactly one authoritative source, chosen by [`Origin`]
//! - Memory buffer is immutable `Bytes`, shared without locks
//! - Every disk reader opens its own handle (no shared offset)

pub mod probe;
pub mod resolver;

use std::fmt;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Mutex;

use axum::body::Bytes;
use tokio::io::AsyncRead;

pub use resolver::{resolve, resolve_file, resolve_live, resolve_reader};

/// Boxed byte source handed to readers of the payload.
pub type PayloadReader = Pin<Box<dyn AsyncRead + Send>>;

/// Where the authoritative bytes of a payload live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Memory,
    Disk,
    Live,
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Origin::Memory => write!(f, "memory"),
            Origin::Disk => write!(f, "disk"),
            Origin::Live => write!(f, "live-stream"),
        }
    }
}

enum Source {
    Memory(Bytes),
    Disk(PathBuf),
    Live(Mutex<Option<PayloadReader>>),
}

/// The unit of data being offered.
pub struct Payload {
    name: String,
    source: Source,
    temporary: bool,
}

impl Payload {
    /// A payload held fully in memory.
    pub fn memory(name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            source: Source::Memory(data.into()),
            temporary: false,
        }
    }

    /// A payload streamed from disk on every request.
    ///
    /// `temporary` marks a spooled file that is removed on exit.
    pub fn disk(path: impl Into<PathBuf>, temporary: bool) -> Self {
        let path = path.into();
        Self {
            name: path.display().to_string(),
            source: Source::Disk(path),
            temporary,
        }
    }

    /// A one-shot pass-through stream.
    pub fn live(name: impl Into<String>, reader: PayloadReader) -> Self {
        Self {
            name: name.into(),
            source: Source::Live(Mutex::new(Some(reader))),
            temporary: false,
        }
    }

    /// Logical name, used for checksum lines.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Last path component of the logical name.
    pub fn base_name(&self) -> &str {
        Path::new(&self.name)
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or(&self.name)
    }

    pub fn origin(&self) -> Origin {
        match self.source {
            Source::Memory(_) => Origin::Memory,
            Source::Disk(_) => Origin::Disk,
            Source::Live(_) => Origin::Live,
        }
    }

    pub fn is_temporary(&self) -> bool {
        self.temporary
    }

    /// The backing file, for disk payloads.
    pub fn path(&self) -> Option<&Path> {
        match &self.source {
            Source::Disk(path) => Some(path),
            _ => None,
        }
    }

    /// The in-memory bytes, for memory payloads.
    pub fn bytes(&self) -> Option<Bytes> {
        match &self.source {
            Source::Memory(data) => Some(data.clone()),
            _ => None,
        }
    }

    /// Open a fresh reader over the authoritative source.
    ///
    /// Live streams cannot be replayed and report `Unsupported`.
    pub async fn reader(&self) -> std::io::Result<PayloadReader> {
        match &self.source {
            Source::Memory(data) => Ok(Box::pin(Cursor::new(data.clone()))),
            Source::Disk(path) => {
                let file = tokio::fs::File::open(path).await?;
                Ok(Box::pin(file))
            }
            Source::Live(_) => Err(std::io::Error::new(
                std::io::ErrorKind::Unsupported,
                "a live stream cannot be re-read",
            )),
        }
    }

    /// Hand out the live stream. Returns `None` once taken or for other origins.
    pub fn take_stream(&self) -> Option<PayloadReader> {
        match &self.source {
            Source::Live(slot) => slot
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .take(),
            _ => None,
        }
    }

    /// Delete the spooled file, if this payload owns one.
    ///
    /// Returns whether a file was removed.
    pub async fn remove_temporary(&self) -> std::io::Result<bool> {
        match (&self.source, self.temporary) {
            (Source::Disk(path), true) => {
                tokio::fs::remove_file(path).await?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Payload")
            .field("name", &self.name)
            .field("origin", &self.origin())
            .field("temporary", &self.temporary)
            .finish()
    }
}
