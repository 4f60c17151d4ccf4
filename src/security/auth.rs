//! HTTP Basic authentication against a single credential pair.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderValue, Request, StatusCode},
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{authorization::Basic, Authorization, HeaderMapExt};

use crate::config::AuthConfig;
use crate::http::response::status_page;

const CHALLENGE: &str = r#"Basic realm="offer""#;

/// Reject requests whose credentials do not match the configured pair.
pub async fn basic_auth_middleware(
    State(auth): State<Arc<AuthConfig>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let credentials = request.headers().typed_get::<Authorization<Basic>>();
    if let Some(Authorization(basic)) = credentials {
        if basic.username() == auth.username && basic.password() == auth.password {
            return next.run(request).await;
        }
        tracing::warn!(user = basic.username(), "Rejected credentials");
    }

    let mut response = status_page(StatusCode::UNAUTHORIZED);
    response
        .headers_mut()
        .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static(CHALLENGE));
    response
}
