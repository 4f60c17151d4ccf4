//! Request admission gate.
//!
//! # Responsibilities
//! - Enforce a remaining-request budget for one HTTP method
//! - Reject requests beyond the budget with 503 without running the handler
//! - Signal exhaustion exactly once, when the last admitted request completes
//!
//! # Design Decisions
//! - Other methods bypass the budget entirely
//! - The critical section only touches the counter; no I/O under the lock
//! - The exhaustion signal is a oneshot, so it cannot fire twice
//! - Settling happens on drop, so cancelled requests count too

use std::future::pending;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::{
    body::Body,
    extract::State,
    http::{Method, Request, StatusCode},
    middleware::Next,
    response::Response,
};
use tokio::sync::oneshot;

use crate::config::RequestBudget;
use crate::http::response::status_page;
use crate::observability::metrics;

struct GateState {
    remaining: u64,
    on_exhausted: Option<oneshot::Sender<()>>,
}

/// Remaining-request budget for one HTTP method.
pub struct AdmissionGate {
    method: Method,
    /// `None` when the budget is unlimited.
    state: Option<Mutex<GateState>>,
}

/// Resolves once the gate's budget is used up. Never resolves for an
/// unlimited gate.
#[derive(Debug)]
pub struct ExhaustedSignal(Option<oneshot::Receiver<()>>);

impl ExhaustedSignal {
    /// A signal that never fires.
    pub fn never() -> Self {
        Self(None)
    }

    pub async fn wait(self) {
        if let Some(rx) = self.0 {
            if rx.await.is_ok() {
                return;
            }
        }
        // Gate dropped without exhausting, or unlimited.
        pending::<()>().await
    }
}

impl AdmissionGate {
    /// Build a gate and the signal fired when it is exhausted.
    pub fn new(method: Method, budget: RequestBudget) -> (Arc<Self>, ExhaustedSignal) {
        match budget {
            RequestBudget::Unlimited => (Arc::new(Self { method, state: None }), ExhaustedSignal::never()),
            RequestBudget::Limited(remaining) => {
                let (tx, rx) = oneshot::channel();
                let gate = Self {
                    method,
                    state: Some(Mutex::new(GateState {
                        remaining,
                        on_exhausted: Some(tx),
                    })),
                };
                (Arc::new(gate), ExhaustedSignal(Some(rx)))
            }
        }
    }

    /// The guarded method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Requests still admissible, `None` when unlimited.
    pub fn remaining(&self) -> Option<u64> {
        self.state.as_ref().map(|state| lock(state).remaining)
    }

    /// Whether the exhaustion signal has been fired.
    pub fn is_exhausted(&self) -> bool {
        self.state
            .as_ref()
            .map(|state| lock(state).on_exhausted.is_none())
            .unwrap_or(false)
    }

    /// Take one unit of budget. Returns `false` when none is left.
    fn try_admit(&self) -> bool {
        let Some(state) = &self.state else {
            return true;
        };
        let mut state = lock(state);
        if state.remaining == 0 {
            return false;
        }
        state.remaining -= 1;
        true
    }

    /// Fire the exhaustion signal if the budget has just run out.
    fn settle(&self) {
        let Some(state) = &self.state else {
            return;
        };
        let signal = {
            let mut state = lock(state);
            if state.remaining > 0 {
                return;
            }
            state.on_exhausted.take()
        };
        if let Some(tx) = signal {
            tracing::info!(method = %self.method, "Request budget exhausted");
            let _ = tx.send(());
        }
    }
}

/// One admitted request. Settles the gate when dropped, so a request
/// cancelled mid-handler still counts toward exhaustion.
struct Admission(Arc<AdmissionGate>);

impl Drop for Admission {
    fn drop(&mut self) {
        self.0.settle();
    }
}

fn lock(state: &Mutex<GateState>) -> MutexGuard<'_, GateState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Middleware enforcing an [`AdmissionGate`].
pub async fn admission_middleware(
    State(gate): State<Arc<AdmissionGate>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if request.method() != gate.method() {
        return next.run(request).await;
    }

    if !gate.try_admit() {
        tracing::warn!(method = %gate.method(), uri = %request.uri(), "Request budget exhausted, rejecting");
        metrics::record_admission(gate.method().as_str(), false);
        return status_page(StatusCode::SERVICE_UNAVAILABLE);
    }
    metrics::record_admission(gate.method().as_str(), true);

    let _admission = Admission(Arc::clone(&gate));
    next.run(request).await
}
