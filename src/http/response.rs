//! Response helpers.
//!
//! # Responsibilities
//! - Render status pages (`"<code> <reason>\n"`, plain text)
//! - Normalize framework-generated error responses to the same format
//! - Build `Content-Disposition` values
//!
//! # Design Decisions
//! - Error bodies never carry internal detail; that goes to the log

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};

/// A minimal plain-text page naming the status.
pub fn status_page(status: StatusCode) -> Response {
    let body = format!(
        "{} {}\n",
        status.as_u16(),
        status.canonical_reason().unwrap_or("Unknown Status")
    );
    (status, [(header::CONTENT_TYPE, "text/plain; charset=utf-8")], body).into_response()
}

/// Replace bodiless error responses (405 from method routing, for example)
/// with a status page.
pub async fn fill_status_page(response: Response) -> Response {
    let status = response.status();
    let is_error = status.is_client_error() || status.is_server_error();
    if is_error && !response.headers().contains_key(header::CONTENT_TYPE) {
        let mut page = status_page(status);
        for (name, value) in response.headers() {
            if !page.headers().contains_key(name) {
                page.headers_mut().insert(name.clone(), value.clone());
            }
        }
        return page;
    }
    response
}

/// `attachment; filename="<name>"`.
pub fn attachment(name: &str) -> Option<HeaderValue> {
    HeaderValue::from_str(&format!("attachment; filename=\"{}\"", name)).ok()
}

/// Fallback for unmatched routes.
pub async fn not_found() -> Response {
    status_page(StatusCode::NOT_FOUND)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    fn empty(status: StatusCode) -> Response {
        (status, Body::empty()).into_response()
    }

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn page_carries_code_and_reason() {
        let response = status_page(StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body_text(response).await, "503 Service Unavailable\n");
    }

    #[tokio::test]
    async fn bodiless_errors_are_filled_in() {
        let mut raw = empty(StatusCode::METHOD_NOT_ALLOWED);
        raw.headers_mut().insert(header::ALLOW, HeaderValue::from_static("GET"));

        let response = fill_status_page(raw).await;
        assert_eq!(response.headers()[header::ALLOW], "GET");
        assert_eq!(body_text(response).await, "405 Method Not Allowed\n");
    }

    #[tokio::test]
    async fn successful_responses_are_untouched() {
        let response = fill_status_page(empty(StatusCode::OK)).await;
        assert_eq!(body_text(response).await, "");
    }

    #[test]
    fn attachment_header() {
        assert_eq!(attachment("a b.tar").unwrap(), "attachment; filename=\"a b.tar\"");
    }
}
