//! Custodial-widget backend.
//!
//! The custodial SDK connects through the shared connection layer (it is
//! elected by connector name), hands out a wallet-bound client for signing
//! and a companion read-only client for receipts, and reports network
//! changes through a backend-level event. Programmatic network switching
//! is optional and advertised by a connector capability flag.

use std::sync::Arc;

use alloy::primitives::{Address, Bytes, TxHash};
use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::backend::injected::ConnectionTracker;
use crate::backend::{ConnectionError, SdkError};

/// Connector name the shared layer reports for the custodial widget.
pub const CUSTODIAL_CONNECTOR: &str = "custodial";

/// One account as listed by the custodial SDK at login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustodialAccount {
    /// SDK-side network label (not a chain id).
    pub network: String,
    pub address: Address,
}

/// Wallet-bound signing client the SDK hands out per request.
#[async_trait]
pub trait CustodialWalletClient: Send + Sync {
    /// Network id embedded in the client, when the SDK exposes one.
    fn chain_id(&self) -> Option<u64>;

    /// Sign and broadcast a call to `to` with the given calldata.
    async fn send_transaction(&self, to: Address, data: Bytes) -> Result<TxHash, SdkError>;
}

/// Companion read-only client native to the custodial backend.
#[async_trait]
pub trait CustodialReadClient: Send + Sync {
    async fn chain_id(&self) -> Result<u64, SdkError>;

    /// Poll until the receipt lands; `Ok(true)` when the transaction
    /// succeeded on-chain. There is no timeout here.
    async fn wait_for_receipt(&self, hash: TxHash) -> Result<bool, SdkError>;
}

/// Custodial SDK surface (black box).
#[async_trait]
pub trait CustodialSdk: Send + Sync {
    async fn login(&self) -> Result<(), ConnectionError>;

    async fn logout(&self) -> Result<(), ConnectionError>;

    fn authenticated(&self) -> bool;

    /// Accounts fetched at login.
    fn accounts(&self) -> Vec<CustodialAccount>;

    /// Request a wallet-bound signing client.
    async fn wallet_client(&self) -> Result<Arc<dyn CustodialWalletClient>, SdkError>;

    /// Request the companion read-only client.
    async fn read_client(&self) -> Result<Arc<dyn CustodialReadClient>, SdkError>;

    /// Connector capability flag for programmatic network switching.
    fn supports_switch_network(&self) -> bool;

    async fn switch_network(&self, chain_id: u64) -> Result<(), SdkError>;

    /// Backend-level network-changed notifications (decimal chain ids).
    fn network_changed(&self) -> broadcast::Receiver<u64>;
}

#[derive(Clone)]
pub struct CustodialBackend {
    sdk: Arc<dyn CustodialSdk>,
    tracker: ConnectionTracker,
}

impl CustodialBackend {
    pub fn new(sdk: Arc<dyn CustodialSdk>, tracker: ConnectionTracker) -> Self {
        Self { sdk, tracker }
    }

    pub fn sdk(&self) -> &Arc<dyn CustodialSdk> {
        &self.sdk
    }

    pub fn address(&self) -> Option<Address> {
        self.tracker
            .snapshot()
            .address
            .or_else(|| self.sdk.accounts().first().map(|a| a.address))
    }

    pub fn supports_switch_network(&self) -> bool {
        self.sdk.supports_switch_network()
    }

    pub async fn wallet_client(&self) -> Result<Arc<dyn CustodialWalletClient>, SdkError> {
        self.sdk.wallet_client().await
    }

    pub async fn read_client(&self) -> Result<Arc<dyn CustodialReadClient>, SdkError> {
        self.sdk.read_client().await
    }

    pub async fn switch_network(&self, chain_id: u64) -> Result<(), SdkError> {
        self.sdk.switch_network(chain_id).await
    }

    pub fn network_changed(&self) -> broadcast::Receiver<u64> {
        self.sdk.network_changed()
    }
}
