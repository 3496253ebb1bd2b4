//! Metrics collection.
//!
//! # Metrics
//! - `flow_transactions_submitted_total` (counter): transactions accepted by an access node
//! - `flow_scripts_executed_total` (counter): scripts executed
//! - `flow_seal_polls_total` (counter): transaction status lookups made while waiting
//! - `flow_seal_wait_seconds` (histogram): time from first poll to seal
//!
//! # Design Decisions
//! - Low-overhead metric updates through the `metrics` facade
//! - Recording is a no-op until a recorder is installed

use std::time::Duration;

pub const TRANSACTIONS_SUBMITTED: &str = "flow_transactions_submitted_total";
pub const SCRIPTS_EXECUTED: &str = "flow_scripts_executed_total";
pub const SEAL_POLLS: &str = "flow_seal_polls_total";
pub const SEAL_WAIT_SECONDS: &str = "flow_seal_wait_seconds";

pub fn record_transaction_submitted() {
    metrics::counter!(TRANSACTIONS_SUBMITTED).increment(1);
}

pub fn record_script_executed() {
    metrics::counter!(SCRIPTS_EXECUTED).increment(1);
}

pub fn record_seal_poll() {
    metrics::counter!(SEAL_POLLS).increment(1);
}

pub fn record_seal_wait(waited: Duration) {
    metrics::histogram!(SEAL_WAIT_SECONDS).record(waited.as_secs_f64());
}
