//! Metrics collection.
//!
//! # Metrics
//! - `walletmux_chain_id_updates_total` (counter): canonical chain-id
//!   publications, by backend
//! - `walletmux_stale_chain_results_total` (counter): discarded chain-id
//!   results from no-longer-active backends, by backend
//! - `walletmux_network_switch_attempts_total` (counter): switch
//!   attempts, by backend and outcome
//! - `walletmux_transactions_total` (counter): dispatched writes, by
//!   function and outcome
//!
//! Recording goes through the `metrics` facade; the host application
//! decides whether and where to export.

pub const CHAIN_ID_UPDATES: &str = "walletmux_chain_id_updates_total";
pub const STALE_CHAIN_RESULTS: &str = "walletmux_stale_chain_results_total";
pub const SWITCH_ATTEMPTS: &str = "walletmux_network_switch_attempts_total";
pub const TRANSACTIONS: &str = "walletmux_transactions_total";

/// A chain-id result made it into the canonical value.
pub fn record_chain_update(backend: &'static str) {
    metrics::counter!(CHAIN_ID_UPDATES, "backend" => backend).increment(1);
}

/// A chain-id result was discarded as stale.
pub fn record_stale_chain_result(backend: &'static str) {
    metrics::counter!(STALE_CHAIN_RESULTS, "backend" => backend).increment(1);
}

/// A network switch attempt finished.
pub fn record_switch_attempt(backend: &'static str, outcome: &'static str) {
    metrics::counter!(SWITCH_ATTEMPTS, "backend" => backend, "outcome" => outcome).increment(1);
}

/// A transaction dispatch finished.
pub fn record_transaction(function: &'static str, outcome: &'static str) {
    metrics::counter!(TRANSACTIONS, "function" => function, "outcome" => outcome).increment(1);
}
