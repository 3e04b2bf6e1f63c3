//! EIP-1193 style provider seam.
//!
//! # Responsibilities
//! - Define the request surface the injected extension and the hosted SDK
//!   expose their wallets through
//! - Carry provider-level `chainChanged` notifications
//! - Classify the one recoverable error code (unknown chain)

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::broadcast;

/// EIP-1193 error code returned when the wallet does not know the
/// requested chain. The only recoverable switch failure.
pub const UNKNOWN_CHAIN_CODE: i64 = 4902;

/// Errors surfaced by a wallet provider.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    /// The provider processed the request and rejected it.
    #[error("provider rejected request (code {code}): {message}")]
    Rpc { code: i64, message: String },

    /// The request never reached the wallet.
    #[error("provider transport failure: {0}")]
    Transport(String),
}

impl ProviderError {
    /// True for the "unknown chain" rejection that an add-chain request
    /// can recover from.
    pub fn is_unknown_chain(&self) -> bool {
        matches!(self, Self::Rpc { code, .. } if *code == UNKNOWN_CHAIN_CODE)
    }
}

/// A wallet's raw request/notify surface, treated as a black box.
#[async_trait]
pub trait Eip1193Provider: Send + Sync {
    /// Issue a JSON-RPC style request against the wallet.
    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderError>;

    /// Subscribe to `chainChanged` notifications. Payloads are
    /// hex-encoded chain ids (e.g. `"0x7a69"`). Dropping the receiver
    /// ends the subscription.
    fn chain_changed(&self) -> broadcast::Receiver<String>;
}
