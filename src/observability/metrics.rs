//! Metrics collection.
//!
//! # Responsibilities
//! - Define the transaction-lifecycle metrics
//! - Keep call sites to one line
//!
//! # Metrics
//! - `bookie_submissions_total` (counter): submissions by mode and outcome
//! - `bookie_fallback_attempts_total` (counter): classic fallbacks by outcome
//! - `bookie_poll_attempts_total` (counter): status checks by result
//! - `bookie_signer_rejections_total` (counter): signer failures by reason
//! - `bookie_endpoint_health` (gauge): 1=reachable, 0=unreachable
//! - `bookie_cache_records` (gauge): records held by the asset cache
//!
//! # Design Decisions
//! - Only the `metrics` facade is used; without an installed recorder every
//!   call is a no-op
//! - Label values are a small closed set

use crate::mode::TransactionMode;

pub fn record_submission(mode: TransactionMode, outcome: &'static str) {
    ::metrics::counter!(
        "bookie_submissions_total",
        "mode" => mode.to_string(),
        "outcome" => outcome
    )
    .increment(1);
}

pub fn record_fallback(outcome: &'static str) {
    ::metrics::counter!("bookie_fallback_attempts_total", "outcome" => outcome).increment(1);
}

pub fn record_poll_attempt(result: &'static str) {
    ::metrics::counter!("bookie_poll_attempts_total", "result" => result).increment(1);
}

pub fn record_signer_rejection(reason: &'static str) {
    ::metrics::counter!("bookie_signer_rejections_total", "reason" => reason).increment(1);
}

pub fn record_endpoint_health(endpoint: &'static str, healthy: bool) {
    ::metrics::gauge!("bookie_endpoint_health", "endpoint" => endpoint)
        .set(if healthy { 1.0 } else { 0.0 });
}

pub fn record_cache_size(records: usize) {
    ::metrics::gauge!("bookie_cache_records").set(records as f64);
}
