//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, layers, graceful drain)
//!     → [auth, admission gate] (security/)
//!     → transfer.rs (payload, checksums)   serve mode
//!     → upload.rs (form, multipart parts)  receive mode
//!     → response.rs (status pages, headers)
//!     → Send to client
//! ```

pub mod response;
pub mod server;
pub mod transfer;
pub mod upload;

pub use server::{Mode, OfferServer, SERVER_HEADER};
pub use transfer::ServeState;
