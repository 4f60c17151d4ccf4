//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for offer.
//! All types derive Serde traits for deserialization from config files.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default in-memory buffer size: 20 MiB.
pub const DEFAULT_BUFFER_SIZE: usize = 20 * (1 << 20);

/// Reserved request count meaning "no limit".
pub const UNLIMITED_REQUESTS: i64 = -1;

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct OfferConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// What is offered and how it is materialized.
    pub payload: PayloadConfig,

    /// Request budget and lifetime.
    pub limits: LimitConfig,

    /// Receive mode settings.
    pub receive: ReceiveConfig,

    /// Optional single credential pair.
    pub auth: Option<AuthConfig>,

    /// Logging settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Payload source and materialization settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PayloadConfig {
    /// File to offer. `None` or `-` reads standard input.
    pub source: Option<PathBuf>,

    /// Payloads up to this many bytes are held in memory.
    pub buffer_size: usize,

    /// Directory where oversized stdin is spooled.
    pub temp_dir: PathBuf,

    /// Keep the spooled stdin file on exit.
    pub keep_temp: bool,

    /// Pass stdin through without buffering (one request only).
    pub stream: bool,

    /// Filename announced in `Content-Disposition`.
    pub disposition: Option<String>,
}

impl Default for PayloadConfig {
    fn default() -> Self {
        Self {
            source: None,
            buffer_size: DEFAULT_BUFFER_SIZE,
            temp_dir: std::env::temp_dir(),
            keep_temp: false,
            stream: false,
            disposition: None,
        }
    }
}

impl PayloadConfig {
    /// Whether the payload comes from standard input.
    pub fn reads_stdin(&self) -> bool {
        match &self.source {
            None => true,
            Some(path) => path.as_os_str() == "-",
        }
    }
}

/// Request budget and server lifetime.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitConfig {
    /// Requests allowed before shutdown; `-1` means unlimited.
    pub max_requests: i64,

    /// Seconds before the server shuts down; `0` means never.
    pub timeout_secs: u64,
}

impl Default for LimitConfig {
    fn default() -> Self {
        Self {
            max_requests: UNLIMITED_REQUESTS,
            timeout_secs: 0,
        }
    }
}

impl LimitConfig {
    /// Typed view of `max_requests`. Call after validation.
    pub fn budget(&self) -> RequestBudget {
        if self.max_requests < 0 {
            RequestBudget::Unlimited
        } else {
            RequestBudget::Limited(self.max_requests as u64)
        }
    }

    /// The lifetime deadline, if any.
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }
}

/// Remaining-request budget for one HTTP method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestBudget {
    Unlimited,
    Limited(u64),
}

/// Receive mode configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ReceiveConfig {
    /// Accept uploads instead of offering a payload.
    pub enabled: bool,

    /// Where received parts go.
    pub destination: ReceiveDestination,
}

/// Destination for received multipart parts.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReceiveDestination {
    /// Write every part to standard output.
    Stdout,
    /// Store every part under this path, suffixed on collision.
    File(PathBuf),
    /// Store parts in this directory under their declared filenames.
    Directory(PathBuf),
}

impl Default for ReceiveDestination {
    fn default() -> Self {
        ReceiveDestination::Directory(PathBuf::from("."))
    }
}

/// HTTP Basic credentials.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    pub username: String,
    pub password: String,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Enable verbose logging.
    pub verbose: bool,

    /// Explicit filter directive, overrides `verbose`.
    pub log_filter: Option<String>,
}
