//! Error taxonomy shared by every subsystem.
//!
//! Resolution-time errors abort startup. Per-request errors are rendered by
//! [`IntoResponse`] as a bare status page; the detail only goes to the log.

use std::path::PathBuf;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::http::response::status_page;

/// Errors raised while resolving, serving or receiving the payload.
#[derive(Error, Debug)]
pub enum OfferError {
    #[error("{0}: is a directory")]
    IsDirectory(PathBuf),

    #[error("too big: more than {limit} bytes")]
    TooBig { limit: usize },

    #[error("{0}: unknown hash algorithm")]
    UnknownAlgorithm(String),

    #[error("checksum unavailable: {0}")]
    ChecksumUnavailable(#[source] std::io::Error),

    #[error("{0}: no free name left")]
    NameCollision(PathBuf),

    #[error("no filename in multipart part")]
    MissingFilename,

    #[error("malformed multipart body: {0}")]
    Multipart(String),

    #[error("live stream already consumed")]
    StreamConsumed,

    #[error("transport error: {0}")]
    Transport(#[source] std::io::Error),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl OfferError {
    /// HTTP status reported when this error ends a request.
    pub fn status(&self) -> StatusCode {
        match self {
            OfferError::UnknownAlgorithm(_) => StatusCode::NOT_FOUND,
            OfferError::MissingFilename | OfferError::Multipart(_) => StatusCode::BAD_REQUEST,
            OfferError::StreamConsumed => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for OfferError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, status = status.as_u16(), "Request failed");
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "Request rejected");
        }
        status_page(status)
    }
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, OfferError>;
