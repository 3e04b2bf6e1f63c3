//! Unified wallet backend mux for the Counter dApp.
//!
//! Reconciles four wallet-connection backends — a browser-injected
//! extension and three hosted/custodial SDKs — into one session, network,
//! and transaction model. Election picks at most one active backend; a
//! single chain resolver keeps one canonical chain id with stale-result
//! suppression; network switches recover from unknown chains with one
//! add-then-retry; and every signing path converges on the same
//! observable transaction state.
//!
//! Known, deliberate gaps: receipt waits have no timeout (a silent
//! backend pins a request at confirming), and identical concurrent
//! dispatches are not deduplicated.

pub mod backend;
pub mod chain;
pub mod config;
pub mod contract;
pub mod hub;
pub mod network;
pub mod observability;
pub mod session;
pub mod tx;

pub use backend::{ActiveBackend, BackendKind, Capabilities, ConnectionTracker};
pub use chain::ChainResolver;
pub use hub::WalletHub;
pub use network::switch::SwitchNetworkError;
pub use network::targets::NetworkTarget;
pub use session::registry::WalletSession;
pub use tx::dispatcher::TransactionError;
pub use tx::state::{TransactionState, TxStatus};
