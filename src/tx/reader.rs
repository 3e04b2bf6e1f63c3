//! Shared read path bound to a network target.
//!
//! # Responsibilities
//! - Serve `number()` reads against the target network's RPC endpoint
//! - Await transaction receipts for the write paths that have no native
//!   receipt client
//!
//! Receipt waits carry no timeout: a non-responding backend leaves the
//! request confirming until the user gives up.

use std::sync::Arc;
use std::time::Duration;

use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, TxHash, U256};
use alloy::providers::{Provider, ProviderBuilder};
use alloy::rpc::types::TransactionRequest;
use async_trait::async_trait;
use thiserror::Error;
use tokio::time::interval;

use crate::contract::{decode_number, number_calldata};
use crate::network::targets::{counter_address, AddressLookupError, NetworkTarget};

/// How often a pending receipt is re-polled.
const RECEIPT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Read-path failure.
#[derive(Debug, Error)]
pub enum ReadError {
    #[error("invalid RPC URL {url:?}: {message}")]
    InvalidUrl { url: String, message: String },

    #[error(transparent)]
    Address(#[from] AddressLookupError),

    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("malformed call return: {0}")]
    Decode(String),
}

/// The read surface the dispatcher and pollers go through.
#[async_trait]
pub trait ContractReader: Send + Sync {
    /// Current Counter value on the bound network.
    async fn number(&self) -> Result<U256, ReadError>;

    /// Poll until the receipt lands; `Ok(true)` when the transaction
    /// succeeded on-chain. No timeout.
    async fn wait_for_receipt(&self, hash: TxHash) -> Result<bool, ReadError>;
}

/// Builds a reader for a network target.
pub trait ReaderFactory: Send + Sync {
    fn connect(&self, target: &NetworkTarget) -> Result<Arc<dyn ContractReader>, ReadError>;
}

/// Plain HTTP JSON-RPC reader.
pub struct RpcReader {
    provider: Arc<dyn Provider + Send + Sync>,
    counter: Address,
}

impl RpcReader {
    /// Connect to the target's RPC endpoint and resolve its Counter
    /// deployment.
    pub fn connect(target: &NetworkTarget) -> Result<Self, ReadError> {
        let url: url::Url = target.rpc_url.parse().map_err(|e| ReadError::InvalidUrl {
            url: target.rpc_url.clone(),
            message: format!("{e}"),
        })?;
        let provider =
            Arc::new(ProviderBuilder::new().connect_http(url)) as Arc<dyn Provider + Send + Sync>;
        let counter = counter_address(target.id)?;
        tracing::debug!(rpc_url = %target.rpc_url, chain_id = target.id, "read client bound");
        Ok(Self { provider, counter })
    }
}

#[async_trait]
impl ContractReader for RpcReader {
    async fn number(&self) -> Result<U256, ReadError> {
        let tx = TransactionRequest::default()
            .with_to(self.counter)
            .with_input(number_calldata());
        let ret = self
            .provider
            .call(tx)
            .await
            .map_err(|e| ReadError::Rpc(e.to_string()))?;
        decode_number(&ret).map_err(|e| ReadError::Decode(e.to_string()))
    }

    async fn wait_for_receipt(&self, hash: TxHash) -> Result<bool, ReadError> {
        let mut ticker = interval(RECEIPT_POLL_INTERVAL);
        loop {
            ticker.tick().await;
            match self.provider.get_transaction_receipt(hash).await {
                Ok(Some(receipt)) => return Ok(receipt.status()),
                Ok(None) => {
                    tracing::debug!(tx_hash = %hash, "transaction pending");
                }
                Err(e) => return Err(ReadError::Rpc(e.to_string())),
            }
        }
    }
}

/// Factory producing [`RpcReader`]s.
pub struct RpcReaderFactory;

impl ReaderFactory for RpcReaderFactory {
    fn connect(&self, target: &NetworkTarget) -> Result<Arc<dyn ContractReader>, ReadError> {
        Ok(Arc::new(RpcReader::connect(target)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_rejects_bad_url() {
        let mut target = NetworkTarget::anvil();
        target.rpc_url = "not a url".to_string();
        assert!(matches!(
            RpcReader::connect(&target),
            Err(ReadError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn test_connect_rejects_unknown_deployment() {
        let mut target = NetworkTarget::anvil();
        target.id = 1;
        assert!(matches!(
            RpcReader::connect(&target),
            Err(ReadError::Address(AddressLookupError(1)))
        ));
    }
}
