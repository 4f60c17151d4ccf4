//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → auth.rs (HTTP Basic credentials, when configured)
//!     → limits.rs (admission gate: remaining-request budget)
//!     → Pass to handler
//! ```
//!
//! # Design Decisions
//! - Fail closed: rejected requests never reach a handler
//! - Unauthenticated requests do not spend the budget

pub mod auth;
pub mod limits;

pub use limits::{AdmissionGate, ExhaustedSignal};
