//! offer
//!
//! Offers a single file (or standard input) over HTTP for a limited number
//! of requests, or accepts uploads in receive mode, then exits.
//!
//! # Architecture Overview
//!
//! ```text
//!     CLI flags + TOML ──▶ config ──▶ payload::resolve ──▶ http::OfferServer
//!                                                             │
//!     Client ◀── transfer / checksums / upload ◀── auth ◀── admission gate
//!                                                             │
//!     lifecycle::race(signal, deadline, exhaustion) ──▶ drain ──▶ cleanup
//! ```

use clap::Parser;

use offer::config::cli::Cli;
use offer::lifecycle;
use offer::observability::logging::init_logging;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("offer: {e}");
        std::process::exit(1);
    }
}

async fn run() -> offer::Result<()> {
    let config = Cli::parse().into_config()?;
    init_logging(&config.observability);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        bind_address = %config.listener.bind_address,
        max_requests = config.limits.max_requests,
        timeout_secs = config.limits.timeout_secs,
        receive = config.receive.enabled,
        "offer starting"
    );

    lifecycle::run(config).await
}
