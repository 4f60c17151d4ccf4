//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router for serve or receive mode
//! - Wire up middleware (tracing, request ID, auth, admission, Server header)
//! - Bind server to listener
//! - Drain in-flight requests when the shutdown future resolves

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{ConnectInfo, DefaultBodyLimit},
    http::{header, HeaderValue, Method, Request},
    middleware::{self, Next},
    response::Response,
    routing::get,
    Router,
};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};

use crate::config::{AuthConfig, RequestBudget};
use crate::error::{OfferError, Result};
use crate::http::response::{fill_status_page, not_found};
use crate::http::transfer::{all_checksums, serve_payload, single_checksum, ServeState};
use crate::http::upload::{receive_upload, upload_page};
use crate::payload::Origin;
use crate::receive::UploadReceiver;
use crate::security::auth::basic_auth_middleware;
use crate::security::limits::{admission_middleware, AdmissionGate, ExhaustedSignal};

/// `Server` header value: program name and version.
pub const SERVER_HEADER: &str = concat!("offer ", env!("CARGO_PKG_VERSION"));

/// What the server does with requests.
#[derive(Clone)]
pub enum Mode {
    /// Offer a payload.
    Serve(ServeState),
    /// Accept uploads.
    Receive(Arc<UploadReceiver>),
}

impl Mode {
    /// Method whose budget drives shutdown.
    pub fn tracked_method(&self) -> Method {
        match self {
            Mode::Serve(_) => Method::GET,
            Mode::Receive(_) => Method::POST,
        }
    }

    /// A live stream can only be read once, whatever was configured.
    fn effective_budget(&self, budget: RequestBudget) -> RequestBudget {
        match self {
            Mode::Serve(state) if state.payload.origin() == Origin::Live => RequestBudget::Limited(1),
            _ => budget,
        }
    }
}

/// HTTP server for one offer run.
pub struct OfferServer {
    router: Router,
    gate: Arc<AdmissionGate>,
}

impl OfferServer {
    /// Build the server and the signal fired when its request budget is spent.
    pub fn new(mode: Mode, budget: RequestBudget, auth: Option<AuthConfig>) -> (Self, ExhaustedSignal) {
        let budget = mode.effective_budget(budget);
        let (gate, exhausted) = AdmissionGate::new(mode.tracked_method(), budget);
        tracing::debug!(method = %gate.method(), ?budget, "Admission gate configured");

        let router = Self::build_router(mode, Arc::clone(&gate), auth.map(Arc::new));
        (Self { router, gate }, exhausted)
    }

    fn build_router(mode: Mode, gate: Arc<AdmissionGate>, auth: Option<Arc<AuthConfig>>) -> Router {
        let live = matches!(&mode, Mode::Serve(state) if state.payload.origin() == Origin::Live);
        let routes = match mode {
            Mode::Serve(state) => {
                let mut routes = Router::new();
                if !live {
                    routes = routes
                        .route("/checksums", get(all_checksums))
                        .route("/checksums/", get(all_checksums))
                        .route("/checksums/{*algorithm}", get(single_checksum));
                }
                routes
                    .route("/", get(serve_payload))
                    .route("/{*path}", get(serve_payload))
                    .with_state(state)
            }
            Mode::Receive(receiver) => Router::new()
                .route("/", get(upload_page).post(receive_upload))
                .layer(DefaultBodyLimit::disable())
                .with_state(receiver),
        };

        let mut router = routes.route_layer(middleware::from_fn_with_state(gate, admission_middleware));
        if live {
            // Outside the gate: these must not spend the single request.
            router = router
                .route("/checksums", get(not_found))
                .route("/checksums/", get(not_found))
                .route("/checksums/{*algorithm}", get(not_found));
        }
        let mut router = router.fallback(not_found);
        if let Some(auth) = auth {
            router = router.layer(middleware::from_fn_with_state(auth, basic_auth_middleware));
        }

        router
            .layer(middleware::from_fn(log_request))
            .layer(middleware::map_response(fill_status_page))
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::x_request_id())
                    .layer(SetResponseHeaderLayer::overriding(
                        header::SERVER,
                        HeaderValue::from_static(SERVER_HEADER),
                    )),
            )
    }

    /// The admission gate guarding the tracked method.
    pub fn gate(&self) -> &Arc<AdmissionGate> {
        &self.gate
    }

    /// The fully layered router, for driving the server in-process.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve until `drain` resolves, then wait for in-flight requests.
    pub async fn run<F>(self, listener: TcpListener, drain: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr().map_err(OfferError::Transport)?;
        tracing::info!(address = %addr, "HTTP server starting");

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        axum::serve(listener, app)
            .with_graceful_shutdown(drain)
            .await
            .map_err(OfferError::Transport)?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

async fn log_request(request: Request<Body>, next: Next) -> Response {
    let remote = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.to_string())
        .unwrap_or_else(|| "-".to_string());
    tracing::debug!(
        remote = %remote,
        method = %request.method(),
        uri = %request.uri(),
        "Request"
    );
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::Payload;
    use axum::http::StatusCode;
    use tower::ServiceExt;

    fn serve(payload: Payload, budget: RequestBudget) -> (OfferServer, ExhaustedSignal) {
        let state = ServeState::new(Arc::new(payload), Some("report.txt"));
        OfferServer::new(Mode::Serve(state), budget, None)
    }

    async fn send(server: &OfferServer, method: Method, uri: &str) -> (StatusCode, axum::http::HeaderMap, String) {
        let request = Request::builder().method(method).uri(uri).body(Body::empty()).unwrap();
        let response = server.router().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, headers, String::from_utf8_lossy(&bytes).into_owned())
    }

    #[tokio::test]
    async fn serves_payload_with_headers() {
        let (server, _) = serve(Payload::memory("notes.txt", &b"foobar"[..]), RequestBudget::Unlimited);
        let (status, headers, body) = send(&server, Method::GET, "/").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "foobar");
        assert_eq!(headers[header::SERVER], SERVER_HEADER);
        assert_eq!(headers[header::CONTENT_DISPOSITION], "attachment; filename=\"report.txt\"");
        assert_eq!(headers[header::CONTENT_LENGTH], "6");
        assert!(headers.contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn any_path_serves_the_payload() {
        let (server, _) = serve(Payload::memory("notes.txt", &b"foobar"[..]), RequestBudget::Unlimited);
        let (status, _, body) = send(&server, Method::GET, "/some/file.txt").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "foobar");
    }

    #[tokio::test]
    async fn checksum_routes() {
        let (server, _) = serve(Payload::memory("dir/notes.txt", &b"foobar"[..]), RequestBudget::Unlimited);

        let (status, _, single) = send(&server, Method::GET, "/checksums/SHA1").await;
        assert_eq!(status, StatusCode::OK);
        assert!(single.starts_with("sha1 ") && single.ends_with(" notes.txt\n"));

        let (_, _, all) = send(&server, Method::GET, "/checksums").await;
        let (_, _, all_slash) = send(&server, Method::GET, "/checksums/").await;
        assert_eq!(all, all_slash);
        assert_eq!(all.lines().count(), 4);
        assert!(all.contains(&single));

        let (status, headers, body) = send(&server, Method::GET, "/checksums/crc32").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, "404 Not Found\n");
        assert_eq!(headers[header::SERVER], SERVER_HEADER);
    }

    #[tokio::test]
    async fn paths_below_an_algorithm_are_404() {
        let (server, _) = serve(Payload::memory("notes.txt", &b"foobar"[..]), RequestBudget::Unlimited);
        for uri in ["/checksums/md5/", "/checksums/md5/extra", "/checksums/a/b/c"] {
            let (status, _, body) = send(&server, Method::GET, uri).await;
            assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
            assert_eq!(body, "404 Not Found\n");
        }
    }

    #[tokio::test]
    async fn wrong_method_is_405() {
        let (server, _) = serve(Payload::memory("notes.txt", &b"foobar"[..]), RequestBudget::Unlimited);
        let (status, _, body) = send(&server, Method::POST, "/").await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body, "405 Method Not Allowed\n");
    }

    #[tokio::test]
    async fn checksum_requests_spend_get_budget() {
        let (server, _) = serve(Payload::memory("notes.txt", &b"foobar"[..]), RequestBudget::Limited(2));
        assert_eq!(send(&server, Method::GET, "/checksums/md5").await.0, StatusCode::OK);
        assert_eq!(send(&server, Method::GET, "/").await.0, StatusCode::OK);

        let (status, headers, body) = send(&server, Method::GET, "/").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body, "503 Service Unavailable\n");
        assert_eq!(headers[header::SERVER], SERVER_HEADER);
    }

    #[tokio::test]
    async fn live_stream_is_served_once() {
        let payload = Payload::live("offer-1", Box::pin(&b"streamed"[..]));
        let (server, _) = serve(payload, RequestBudget::Unlimited);
        assert_eq!(server.gate().remaining(), Some(1));

        let (status, _, body) = send(&server, Method::GET, "/").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "streamed");
        assert_eq!(send(&server, Method::GET, "/").await.0, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn live_stream_has_no_checksum_routes() {
        let payload = Payload::live("offer-1", Box::pin(&b"streamed"[..]));
        let (server, _) = serve(payload, RequestBudget::Unlimited);

        assert_eq!(send(&server, Method::GET, "/checksums").await.0, StatusCode::NOT_FOUND);
        assert_eq!(send(&server, Method::GET, "/checksums/md5").await.0, StatusCode::NOT_FOUND);
        assert_eq!(send(&server, Method::GET, "/checksums/md5/").await.0, StatusCode::NOT_FOUND);
        assert_eq!(server.gate().remaining(), Some(1));

        let (status, _, body) = send(&server, Method::GET, "/").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "streamed");
    }

    #[tokio::test]
    async fn auth_runs_before_admission() {
        let state = ServeState::new(Arc::new(Payload::memory("n", &b"x"[..])), None);
        let auth = AuthConfig {
            username: "alice".into(),
            password: "s3cret".into(),
        };
        let (server, _) = OfferServer::new(Mode::Serve(state), RequestBudget::Limited(1), Some(auth));

        let (status, headers, _) = send(&server, Method::GET, "/").await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(headers.contains_key(header::WWW_AUTHENTICATE));
        assert_eq!(server.gate().remaining(), Some(1));
    }

    #[tokio::test]
    async fn receive_mode_serves_the_form() {
        let dir = tempfile::tempdir().unwrap();
        let receiver = Arc::new(UploadReceiver::new(crate::config::ReceiveDestination::Directory(
            dir.path().to_path_buf(),
        )));
        let (server, _) = OfferServer::new(Mode::Receive(receiver), RequestBudget::Limited(1), None);
        assert_eq!(server.gate().method(), Method::POST);

        for _ in 0..3 {
            let (status, headers, body) = send(&server, Method::GET, "/").await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body, crate::http::upload::UPLOAD_PAGE);
            assert!(headers[header::CONTENT_TYPE].to_str().unwrap().starts_with("text/html"));
        }
        assert_eq!(server.gate().remaining(), Some(1));

        let (status, _, _) = send(&server, Method::POST, "/").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
