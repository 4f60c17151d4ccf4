//! Startup orchestration.
//!
//! # Responsibilities
//! - Resolve the payload (serve mode) before any socket is opened
//! - Build the server and bind the listener
//! - Start the shutdown race and serve until drained
//! - Remove a temporary payload on the way out
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - The lifetime deadline starts when the listener is bound
//! - Cleanup runs even when serving failed; the serve error wins

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;

use crate::config::OfferConfig;
use crate::error::{OfferError, Result};
use crate::http::{Mode, OfferServer, ServeState};
use crate::lifecycle::shutdown::{race, ServerState, Shutdown, ShutdownReason};
use crate::lifecycle::signals;
use crate::payload::{self, Payload};
use crate::receive::UploadReceiver;
use crate::security::ExhaustedSignal;

/// A bound, ready-to-serve offer.
pub struct Launch {
    listener: TcpListener,
    server: OfferServer,
    exhausted: ExhaustedSignal,
    timeout: Option<Duration>,
    /// Payload to clean up on exit, if it is a temporary file we own.
    cleanup: Option<Arc<Payload>>,
}

/// Run one offer from a validated configuration until it shuts down.
pub async fn run(config: OfferConfig) -> Result<()> {
    let launch = prepare(config).await?;
    let reason = launch.serve(Shutdown::new(), signals::terminate()).await?;
    tracing::info!(%reason, "Shutdown complete");
    Ok(())
}

/// Resolve the payload, build the server and bind the listener.
pub async fn prepare(config: OfferConfig) -> Result<Launch> {
    let (mode, owned) = if config.receive.enabled {
        tracing::info!(destination = ?config.receive.destination, "Receive mode");
        let receiver = UploadReceiver::new(config.receive.destination.clone());
        (Mode::Receive(Arc::new(receiver)), None)
    } else {
        let payload = Arc::new(payload::resolve(&config.payload).await?);
        tracing::info!(name = payload.name(), origin = %payload.origin(), "Payload ready");
        let state = ServeState::new(Arc::clone(&payload), config.payload.disposition.as_deref());
        (Mode::Serve(state), Some(payload))
    };

    let cleanup = owned.filter(|payload| payload.is_temporary() && !config.payload.keep_temp);
    let (server, exhausted) = OfferServer::new(mode, config.limits.budget(), config.auth.clone());

    let listener = match TcpListener::bind(&config.listener.bind_address).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(address = %config.listener.bind_address, error = %e, "Failed to bind");
            if let Some(payload) = &cleanup {
                remove(payload).await?;
            }
            return Err(OfferError::Transport(e));
        }
    };

    Ok(Launch {
        listener,
        server,
        exhausted,
        timeout: config.limits.timeout(),
        cleanup,
    })
}

impl Launch {
    /// Address the listener is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.listener.local_addr().map_err(OfferError::Transport)
    }

    /// The server about to be run.
    pub fn server(&self) -> &OfferServer {
        &self.server
    }

    /// Serve until `signal`, the deadline, the request budget or a trigger
    /// on `shutdown` ends the run. Returns what ended it.
    pub async fn serve<S>(self, shutdown: Shutdown, signal: S) -> Result<ShutdownReason>
    where
        S: Future<Output = ()> + Send + 'static,
    {
        let Launch {
            listener,
            server,
            exhausted,
            timeout,
            cleanup,
        } = self;

        let drain_rx = shutdown.subscribe();
        let mut reason_rx = shutdown.subscribe();

        let trigger = shutdown.clone();
        let racer = tokio::spawn(async move {
            let reason = race(signal, timeout, exhausted).await;
            trigger.trigger(reason);
        });

        tracing::info!(state = ?ServerState::Listening, ?timeout, "Accepting connections");
        let drain = async move {
            let reason = Shutdown::recv(drain_rx).await;
            tracing::info!(state = ?ServerState::Draining, %reason, "Draining in-flight requests");
        };
        let served = server.run(listener, drain).await;
        racer.abort();
        tracing::info!(state = ?ServerState::Stopped, "Server stopped");

        let cleaned = match &cleanup {
            Some(payload) => remove(payload).await,
            None => Ok(()),
        };
        served?;
        cleaned?;

        Ok(reason_rx.try_recv().unwrap_or(ShutdownReason::Requested))
    }
}

async fn remove(payload: &Payload) -> Result<()> {
    match payload.remove_temporary().await {
        Ok(true) => {
            tracing::debug!(path = ?payload.path(), "Removed temporary payload");
            Ok(())
        }
        Ok(false) => Ok(()),
        Err(e) => {
            tracing::error!(path = ?payload.path(), error = %e, "Failed to remove temporary payload");
            Err(OfferError::Io(e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PayloadConfig, RequestBudget};

    fn config_for(source: &std::path::Path) -> OfferConfig {
        let mut config = OfferConfig::default();
        config.listener.bind_address = "127.0.0.1:0".to_string();
        config.payload = PayloadConfig {
            source: Some(source.to_path_buf()),
            ..PayloadConfig::default()
        };
        config
    }

    #[tokio::test]
    async fn requested_shutdown_stops_the_server() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("notes.txt");
        std::fs::write(&file, b"hello").unwrap();

        let launch = prepare(config_for(&file)).await.unwrap();
        assert_ne!(launch.local_addr().unwrap().port(), 0);

        let shutdown = Shutdown::new();
        let running = tokio::spawn(launch.serve(shutdown.clone(), std::future::pending()));
        while shutdown.receiver_count() < 2 {
            tokio::task::yield_now().await;
        }
        shutdown.trigger(ShutdownReason::Requested);

        let reason = tokio::time::timeout(Duration::from_secs(5), running)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert_eq!(reason, ShutdownReason::Requested);
    }

    #[tokio::test]
    async fn signal_source_ends_the_run() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("notes.txt");
        std::fs::write(&file, b"hello").unwrap();

        let launch = prepare(config_for(&file)).await.unwrap();
        let reason = tokio::time::timeout(Duration::from_secs(5), launch.serve(Shutdown::new(), async {}))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(reason, ShutdownReason::Signal);
    }

    #[tokio::test]
    async fn spooled_payload_is_removed_after_drain() {
        let dir = tempfile::tempdir().unwrap();
        let mut input = &b"larger than the buffer"[..];
        let payload = Arc::new(payload::resolve_reader(&mut input, 4, dir.path()).await.unwrap());
        let spooled = payload.path().unwrap().to_path_buf();
        assert!(spooled.exists());

        let state = ServeState::new(Arc::clone(&payload), None);
        let (server, exhausted) = OfferServer::new(Mode::Serve(state), RequestBudget::Unlimited, None);
        let launch = Launch {
            listener: TcpListener::bind("127.0.0.1:0").await.unwrap(),
            server,
            exhausted,
            timeout: None,
            cleanup: Some(payload),
        };

        let reason = launch.serve(Shutdown::new(), async {}).await.unwrap();
        assert_eq!(reason, ShutdownReason::Signal);
        assert!(!spooled.exists());
    }

    #[tokio::test]
    async fn spooled_payload_outlives_an_in_flight_transfer() {
        let dir = tempfile::tempdir().unwrap();
        let contents: Vec<u8> = (0..8 * 1024 * 1024).map(|i| (i % 253) as u8).collect();
        let payload = Arc::new(payload::resolve_reader(&mut &contents[..], 4, dir.path()).await.unwrap());
        let spooled = payload.path().unwrap().to_path_buf();

        let state = ServeState::new(Arc::clone(&payload), None);
        let (server, exhausted) = OfferServer::new(Mode::Serve(state), RequestBudget::Unlimited, None);
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let launch = Launch {
            listener,
            server,
            exhausted,
            timeout: None,
            cleanup: Some(payload),
        };

        let shutdown = Shutdown::new();
        let running = tokio::spawn(launch.serve(shutdown.clone(), std::future::pending()));
        while shutdown.receiver_count() < 2 {
            tokio::task::yield_now().await;
        }

        let mut response = reqwest::get(format!("http://{addr}/")).await.unwrap();
        let mut received = response.chunk().await.unwrap().unwrap().to_vec();
        shutdown.trigger(ShutdownReason::Requested);

        while let Some(chunk) = response.chunk().await.unwrap() {
            received.extend_from_slice(&chunk);
        }
        assert!(received == contents);

        let reason = tokio::time::timeout(Duration::from_secs(10), running)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert_eq!(reason, ShutdownReason::Requested);
        assert!(!spooled.exists());
    }

    #[tokio::test]
    async fn directory_source_is_rejected_before_binding() {
        let dir = tempfile::tempdir().unwrap();
        let err = prepare(config_for(dir.path())).await.err().unwrap();
        assert!(matches!(err, OfferError::IsDirectory(_)));
    }

    #[tokio::test]
    async fn bind_failure_is_a_transport_error() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("notes.txt");
        std::fs::write(&file, b"hello").unwrap();

        let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let mut config = config_for(&file);
        config.listener.bind_address = taken.local_addr().unwrap().to_string();

        let err = prepare(config).await.err().unwrap();
        assert!(matches!(err, OfferError::Transport(_)));
    }
}
