//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Resolve payload → Build server → Bind listener → Serve
//!
//! Shutdown (shutdown.rs):
//!     race(signal, deadline, exhaustion) → Shutdown::trigger
//!         → Stop accepting → Drain in-flight requests → Cleanup → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Signal source of the race
//! ```
//!
//! # Design Decisions
//! - Ordered startup: payload first, listener last (traffic only when ready)
//! - Ordered shutdown: stop accept, drain, remove temporary payload
//! - Listening → Draining → Stopped, each transition logged

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::{race, ServerState, Shutdown, ShutdownReason};
pub use startup::{prepare, run, Launch};
