//! Serving the payload.
//!
//! # Responsibilities
//! - Memory payloads: one `Bytes` body with a known length
//! - Disk payloads: a fresh file handle per request, streamed
//! - Live payloads: straight pass-through, no length, single use
//!
//! # Design Decisions
//! - HEAD never consumes the live stream
//! - Mid-stream failures cannot change the status; they are only logged

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
};
use futures_util::TryStreamExt;
use tokio_util::io::ReaderStream;

use crate::checksum::ChecksumCache;
use crate::error::{OfferError, Result};
use crate::http::response::{attachment, status_page};
use crate::observability::metrics;
use crate::payload::{Payload, PayloadReader};

/// State shared by the serving handlers.
#[derive(Clone)]
pub struct ServeState {
    pub payload: Arc<Payload>,
    pub checksums: ChecksumCache,
    pub disposition: Option<HeaderValue>,
}

impl ServeState {
    pub fn new(payload: Arc<Payload>, disposition: Option<&str>) -> Self {
        Self {
            checksums: ChecksumCache::new(Arc::clone(&payload)),
            payload,
            disposition: disposition.and_then(attachment),
        }
    }

    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/octet-stream"));
        if let Some(value) = &self.disposition {
            headers.insert(header::CONTENT_DISPOSITION, value.clone());
        }
        headers
    }
}

/// `GET /` (and every other non-checksum path).
pub async fn serve_payload(State(state): State<ServeState>, method: Method) -> Result<Response> {
    let mut headers = state.headers();

    if let Some(data) = state.payload.bytes() {
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from(data.len()));
        if method != Method::HEAD {
            metrics::record_bytes_served(data.len() as u64);
        }
        return Ok((headers, data).into_response());
    }

    if let Some(path) = state.payload.path() {
        let file = match tokio::fs::File::open(path).await {
            Ok(file) => file,
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "Cannot open payload");
                let status = if e.kind() == std::io::ErrorKind::NotFound {
                    StatusCode::NOT_FOUND
                } else {
                    StatusCode::INTERNAL_SERVER_ERROR
                };
                return Ok(status_page(status));
            }
        };
        let len = file.metadata().await?.len();
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from(len));
        return Ok((headers, stream_body(Box::pin(file))).into_response());
    }

    if method == Method::HEAD {
        return Ok((headers, Body::empty()).into_response());
    }
    let reader = state.payload.take_stream().ok_or(OfferError::StreamConsumed)?;
    tracing::info!("Streaming live payload");
    Ok((headers, stream_body(reader)).into_response())
}

fn stream_body(reader: PayloadReader) -> Body {
    let stream = ReaderStream::new(reader)
        .inspect_ok(|chunk| metrics::record_bytes_served(chunk.len() as u64))
        .inspect_err(|e| tracing::warn!(error = %e, "Transfer aborted"));
    Body::from_stream(stream)
}

/// `GET /checksums` and `GET /checksums/`.
pub async fn all_checksums(State(state): State<ServeState>) -> Result<String> {
    state.checksums.all().await
}

/// `GET /checksums/{algorithm}`. Deeper paths name no algorithm and are 404.
pub async fn single_checksum(
    State(state): State<ServeState>,
    axum::extract::Path(algorithm): axum::extract::Path<String>,
) -> Result<String> {
    state.checksums.get_named(&algorithm).await
}
