//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use offer::config::OfferConfig;
use offer::lifecycle::{prepare, Shutdown, ShutdownReason};
use offer::Result;
use tokio::task::JoinHandle;

/// A server running in the background on an ephemeral port.
pub struct Running {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub handle: JoinHandle<Result<ShutdownReason>>,
}

impl Running {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Wait for the server to stop on its own.
    pub async fn finished(self) -> ShutdownReason {
        tokio::time::timeout(Duration::from_secs(10), self.handle)
            .await
            .expect("server did not stop")
            .expect("server task panicked")
            .expect("server failed")
    }
}

/// Config serving `file` on 127.0.0.1:0.
pub fn serving(file: &Path) -> OfferConfig {
    let mut config = OfferConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.payload.source = Some(file.to_path_buf());
    config
}

/// Start the server; OS signals are not part of the race.
pub async fn start(config: OfferConfig) -> Running {
    let launch = prepare(config).await.expect("prepare failed");
    let addr = launch.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let handle = tokio::spawn(launch.serve(shutdown.clone(), std::future::pending()));
    while shutdown.receiver_count() < 2 {
        tokio::task::yield_now().await;
    }
    Running { addr, shutdown, handle }
}

/// A client that does not reuse connections between requests.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .timeout(Duration::from_secs(10))
        .build()
        .unwrap()
}
