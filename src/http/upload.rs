//! Receive mode handlers.

use std::sync::Arc;

use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    response::Html,
};

use crate::error::{OfferError, Result};
use crate::receive::UploadReceiver;

/// The upload form, served verbatim.
pub const UPLOAD_PAGE: &str = include_str!("../../assets/upload.html");

/// `GET /` in receive mode.
pub async fn upload_page() -> Html<&'static str> {
    Html(UPLOAD_PAGE)
}

/// `POST /` in receive mode: store every part, answer with one line per part.
pub async fn receive_upload(
    State(receiver): State<Arc<UploadReceiver>>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<String> {
    let mut multipart = multipart.map_err(|e| OfferError::Multipart(e.body_text()))?;

    let mut stored = String::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| OfferError::Multipart(e.body_text()))?
    {
        let declared = field.file_name().map(str::to_owned);
        tracing::debug!(field = field.name().unwrap_or_default(), filename = ?declared, "Receiving part");
        let part = receiver.store(declared.as_deref(), field).await?;
        stored.push_str(&part.display_name());
        stored.push('\n');
    }

    if stored.is_empty() {
        return Err(OfferError::Multipart("no parts".to_string()));
    }
    Ok(stored)
}
