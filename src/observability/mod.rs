//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events via `tracing`)
//!     → metrics.rs (counters via the `metrics` facade)
//!
//! Consumers:
//!     → stderr (stdout may carry received uploads)
//!     → whatever metrics recorder an embedder installs
//! ```
//!
//! # Design Decisions
//! - Quiet by default (warnings only); `--log` enables debug output
//! - Metrics are cheap (no-ops until a recorder is installed)

pub mod logging;
pub mod metrics;
