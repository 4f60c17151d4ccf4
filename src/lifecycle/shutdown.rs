//! Shutdown coordination.
//!
//! Three independent sources can end a run: an OS signal, the lifetime
//! deadline, and the admission gate running out. [`race`] selects over them;
//! the winner is broadcast through [`Shutdown`] as the single "begin drain"
//! event.

use std::fmt;
use std::future::{pending, Future};
use std::time::Duration;

use tokio::sync::broadcast;

use crate::security::limits::ExhaustedSignal;

/// Why the server began draining.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReason {
    /// SIGINT or SIGTERM.
    Signal,
    /// The configured lifetime elapsed.
    Timeout,
    /// The request budget was spent.
    Exhausted,
    /// Triggered programmatically.
    Requested,
}

impl fmt::Display for ShutdownReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ShutdownReason::Signal => "signal",
            ShutdownReason::Timeout => "timeout",
            ShutdownReason::Exhausted => "requests exhausted",
            ShutdownReason::Requested => "requested",
        };
        f.write_str(s)
    }
}

/// Server lifecycle state, logged on every transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    Listening,
    Draining,
    Stopped,
}

/// Coordinator for graceful shutdown.
///
/// Provides a broadcast channel that all long-running tasks can subscribe to.
/// Only the first trigger matters; receivers see the reason it carried.
#[derive(Clone)]
pub struct Shutdown {
    tx: broadcast::Sender<ShutdownReason>,
}

impl Shutdown {
    /// Create a new shutdown coordinator.
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(4);
        Self { tx }
    }

    /// Subscribe to the shutdown signal.
    pub fn subscribe(&self) -> broadcast::Receiver<ShutdownReason> {
        self.tx.subscribe()
    }

    /// Trigger the shutdown signal.
    pub fn trigger(&self, reason: ShutdownReason) {
        let _ = self.tx.send(reason);
    }

    /// Get the number of active subscribers (tasks still running).
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Resolve with the first reason delivered to `rx`.
    pub async fn recv(mut rx: broadcast::Receiver<ShutdownReason>) -> ShutdownReason {
        match rx.recv().await {
            Ok(reason) => reason,
            Err(broadcast::error::RecvError::Lagged(_)) => rx.try_recv().unwrap_or(ShutdownReason::Requested),
            // Every sender is gone, nobody can trigger anymore.
            Err(broadcast::error::RecvError::Closed) => ShutdownReason::Requested,
        }
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Wait for whichever source fires first.
///
/// `timeout` is measured from the call; `None` never expires.
pub async fn race<S>(signal: S, timeout: Option<Duration>, exhausted: ExhaustedSignal) -> ShutdownReason
where
    S: Future<Output = ()>,
{
    let deadline = async {
        match timeout {
            Some(limit) => tokio::time::sleep(limit).await,
            None => pending::<()>().await,
        }
    };

    tokio::select! {
        _ = signal => ShutdownReason::Signal,
        _ = deadline => ShutdownReason::Timeout,
        _ = exhausted.wait() => ShutdownReason::Exhausted,
    }
}
