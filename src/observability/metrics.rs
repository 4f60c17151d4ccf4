//! Metrics collection.
//!
//! # Metrics
//! - `offer_requests_total` (counter): guarded requests by method, outcome
//! - `offer_checksum_computations_total` (counter): digests run, by algorithm
//! - `offer_uploads_total` (counter): received parts by outcome
//! - `offer_bytes_served_total` (counter): payload bytes handed to responses
//!
//! # Design Decisions
//! - Facade only; no exporter is bundled
//! - Labels are static strings to keep cardinality bounded

pub fn record_admission(method: &str, admitted: bool) {
    let outcome = if admitted { "admitted" } else { "rejected" };
    ::metrics::counter!("offer_requests_total", "method" => method.to_string(), "outcome" => outcome)
        .increment(1);
}

pub fn record_checksum_computation(algorithm: &'static str) {
    ::metrics::counter!("offer_checksum_computations_total", "algorithm" => algorithm).increment(1);
}

pub fn record_upload(outcome: &'static str) {
    ::metrics::counter!("offer_uploads_total", "outcome" => outcome).increment(1);
}

pub fn record_bytes_served(bytes: u64) {
    ::metrics::counter!("offer_bytes_served_total").increment(bytes);
}
