//! offer: serve one file (or stdin) over HTTP for a bounded number of
//! requests, or receive uploads, then shut down.

pub mod checksum;
pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod payload;
pub mod receive;
pub mod security;

pub use config::schema::OfferConfig;
pub use error::{OfferError, Result};
pub use http::OfferServer;
pub use lifecycle::Shutdown;
