//! Transaction dispatch across backend signing paths.
//!
//! # Responsibilities
//! - Route writes through the signing path the active backend requires
//! - Keep the observable transaction state moving pending → confirming →
//!   confirmed, or failed
//! - Refresh the shared read value after every successful write
//!
//! Concurrent identical dispatches are not deduplicated here; the UI
//! disables the triggering control while a request is in flight, and that
//! is best-effort only.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use alloy::primitives::{Address, Bytes, TxHash, U256};
use async_trait::async_trait;
use serde_json::json;
use thiserror::Error;
use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};

use crate::backend::injected::ConnectionTracker;
use crate::backend::provider::Eip1193Provider;
use crate::backend::{ActiveBackend, SdkError};
use crate::chain::SubscriptionGuard;
use crate::contract::CounterWrite;
use crate::network::switch::hex_chain_id;
use crate::network::targets::NetworkTarget;
use crate::observability::metrics;
use crate::tx::reader::{ContractReader, ReadError, ReaderFactory};
use crate::tx::state::TxStateCell;

/// Fallback shown when a failure carries no message of its own.
pub const GENERIC_TX_FAILURE: &str = "Please check your wallet and network.";

/// Fixed read-refresh cadence while on the correct network.
pub const READ_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Terminal failure of one transaction request. Never affects the
/// session; the user retries manually.
#[derive(Debug, Error)]
pub enum TransactionError {
    #[error("no backend is active")]
    NoActiveBackend,

    #[error("no input value to submit")]
    EmptyInput,

    #[error("not a valid number: {0:?}")]
    InvalidInput(String),

    #[error("wallet error: {0}")]
    Sdk(#[from] SdkError),

    #[error(transparent)]
    Read(#[from] ReadError),

    #[error("transaction reverted on-chain")]
    Reverted,
}

impl TransactionError {
    /// The blocking message surfaced to the user.
    pub fn user_message(&self) -> String {
        let message = self.to_string();
        if message.trim().is_empty() {
            GENERIC_TX_FAILURE.to_string()
        } else {
            message
        }
    }
}

/// The single shared write entrypoint the connector-routed backends go
/// through, already bound to the target network.
#[async_trait]
pub trait SharedWriteChannel: Send + Sync {
    async fn write_contract(
        &self,
        chain_id: u64,
        to: Address,
        data: Bytes,
    ) -> Result<TxHash, SdkError>;
}

enum FromSource {
    Fixed(Address),
    Tracked(ConnectionTracker),
}

/// Write channel that signs through a wallet's raw provider transport.
///
/// Serves two roles: the long-lived shared entrypoint over the injected
/// provider (`tracked`), and the ephemeral per-write signing client the
/// hosted path constructs (`bound`).
pub struct ProviderWriteChannel {
    provider: Arc<dyn Eip1193Provider>,
    from: FromSource,
}

impl ProviderWriteChannel {
    /// Sign as a fixed account.
    pub fn bound(provider: Arc<dyn Eip1193Provider>, from: Address) -> Self {
        Self {
            provider,
            from: FromSource::Fixed(from),
        }
    }

    /// Sign as whichever account the shared connection layer tracks.
    pub fn tracked(provider: Arc<dyn Eip1193Provider>, tracker: ConnectionTracker) -> Self {
        Self {
            provider,
            from: FromSource::Tracked(tracker),
        }
    }

    fn from_address(&self) -> Result<Address, SdkError> {
        match &self.from {
            FromSource::Fixed(address) => Ok(*address),
            FromSource::Tracked(tracker) => tracker
                .snapshot()
                .address
                .ok_or_else(|| SdkError("no connected account".to_string())),
        }
    }
}

#[async_trait]
impl SharedWriteChannel for ProviderWriteChannel {
    async fn write_contract(
        &self,
        chain_id: u64,
        to: Address,
        data: Bytes,
    ) -> Result<TxHash, SdkError> {
        let from = self.from_address()?;
        let params = json!([{
            "from": from.to_string(),
            "to": to.to_string(),
            "data": data.to_string(),
            "chainId": hex_chain_id(chain_id),
        }]);
        let value = self
            .provider
            .request("eth_sendTransaction", params)
            .await
            .map_err(|e| SdkError(e.to_string()))?;
        let raw = value
            .as_str()
            .ok_or_else(|| SdkError(format!("malformed tx hash {value}")))?;
        raw.parse::<TxHash>()
            .map_err(|e| SdkError(format!("malformed tx hash {raw:?}: {e}")))
    }
}

/// Submits Counter reads and writes for one target network.
pub struct TransactionDispatcher {
    target: NetworkTarget,
    counter: Address,
    readers: Arc<dyn ReaderFactory>,
    reader: Arc<dyn ContractReader>,
    shared_write: Arc<dyn SharedWriteChannel>,
    number: watch::Sender<Option<U256>>,
    increment_state: TxStateCell,
    set_number_state: TxStateCell,
    pending_input: Mutex<Option<String>>,
}

impl TransactionDispatcher {
    pub fn new(
        target: NetworkTarget,
        readers: Arc<dyn ReaderFactory>,
        shared_write: Arc<dyn SharedWriteChannel>,
    ) -> Result<Self, ReadError> {
        let counter = crate::network::targets::counter_address(target.id)?;
        let reader = readers.connect(&target)?;
        let (number, _) = watch::channel(None);
        Ok(Self {
            target,
            counter,
            readers,
            reader,
            shared_write,
            number,
            increment_state: TxStateCell::new(),
            set_number_state: TxStateCell::new(),
            pending_input: Mutex::new(None),
        })
    }

    pub fn target(&self) -> &NetworkTarget {
        &self.target
    }

    /// Latest `number()` value read from the target network.
    pub fn number(&self) -> Option<U256> {
        *self.number.borrow()
    }

    pub fn subscribe_number(&self) -> watch::Receiver<Option<U256>> {
        self.number.subscribe()
    }

    pub fn increment_state(&self) -> &TxStateCell {
        &self.increment_state
    }

    pub fn set_number_state(&self) -> &TxStateCell {
        &self.set_number_state
    }

    /// Stage the numeric input for the next `set_number` dispatch.
    pub fn set_pending_input(&self, raw: impl Into<String>) {
        *self.pending_input.lock().unwrap() = Some(raw.into());
    }

    pub fn pending_input(&self) -> Option<String> {
        self.pending_input.lock().unwrap().clone()
    }

    /// Read `number()` once and publish it.
    pub async fn refresh_number(&self) -> Result<U256, ReadError> {
        let value = self.reader.number().await?;
        self.number.send_replace(Some(value));
        Ok(value)
    }

    /// Poll `number()` on a fixed interval, but only while the canonical
    /// chain id equals the target network.
    pub fn spawn_number_poller(
        self: &Arc<Self>,
        mut chain: watch::Receiver<Option<u64>>,
    ) -> SubscriptionGuard {
        let dispatcher = Arc::clone(self);
        SubscriptionGuard::spawn(async move {
            let mut ticker = interval(READ_POLL_INTERVAL);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                // No polling off-network.
                if *chain.borrow_and_update() != Some(dispatcher.target.id) {
                    continue;
                }
                if let Err(err) = dispatcher.refresh_number().await {
                    tracing::warn!(error = %err, "number refresh failed");
                }
            }
        })
    }

    /// Dispatch `increment()` through the active backend.
    pub async fn increment(&self, backend: &ActiveBackend) -> Result<(), TransactionError> {
        self.dispatch(backend, CounterWrite::Increment, &self.increment_state)
            .await
    }

    /// Dispatch `setNumber` with the staged input; the input is cleared
    /// only on success.
    pub async fn set_number(&self, backend: &ActiveBackend) -> Result<(), TransactionError> {
        let raw = self.pending_input().ok_or(TransactionError::EmptyInput)?;
        let value = match U256::from_str_radix(raw.trim(), 10) {
            Ok(value) => value,
            Err(_) => {
                let err = TransactionError::InvalidInput(raw);
                self.set_number_state.reset();
                self.set_number_state.failed(err.user_message());
                return Err(err);
            }
        };

        self.dispatch(backend, CounterWrite::SetNumber(value), &self.set_number_state)
            .await?;
        *self.pending_input.lock().unwrap() = None;
        Ok(())
    }

    /// One write from reset to confirmed or failed. Every error out of
    /// encode/sign/broadcast/receipt-wait lands here.
    async fn dispatch(
        &self,
        backend: &ActiveBackend,
        call: CounterWrite,
        cell: &TxStateCell,
    ) -> Result<(), TransactionError> {
        cell.reset();
        cell.pending();
        tracing::info!(
            backend = %backend.kind(),
            function = call.function_name(),
            chain_id = self.target.id,
            "dispatching transaction"
        );

        match self.submit(backend, &call, cell).await {
            Ok(hash) => {
                cell.confirmed();
                metrics::record_transaction(call.function_name(), "confirmed");
                tracing::info!(tx_hash = %hash, function = call.function_name(), "transaction confirmed");
                if let Err(err) = self.refresh_number().await {
                    tracing::warn!(error = %err, "post-write number refresh failed");
                }
                Ok(())
            }
            Err(err) => {
                metrics::record_transaction(call.function_name(), "failed");
                tracing::error!(
                    function = call.function_name(),
                    error = %err,
                    "transaction failed"
                );
                cell.failed(err.user_message());
                Err(err)
            }
        }
    }

    async fn submit(
        &self,
        backend: &ActiveBackend,
        call: &CounterWrite,
        cell: &TxStateCell,
    ) -> Result<TxHash, TransactionError> {
        let data = call.calldata();
        match backend {
            // Custodial: wallet-bound client signs, the companion
            // read-only client awaits the receipt.
            ActiveBackend::Custodial(b) => {
                let wallet = b.wallet_client().await?;
                let hash = wallet.send_transaction(self.counter, data).await?;
                cell.confirming(hash);
                let receipts = b.read_client().await?;
                if !receipts.wait_for_receipt(hash).await? {
                    return Err(TransactionError::Reverted);
                }
                Ok(hash)
            }
            // Hosted: ephemeral signing client over the SDK's raw
            // provider, ephemeral plain-transport reader for the receipt.
            ActiveBackend::Hosted(b) => {
                let provider = b.provider().await?;
                let from = b
                    .address()
                    .ok_or_else(|| SdkError("no primary wallet".to_string()))?;
                let signer = ProviderWriteChannel::bound(provider, from);
                let hash = signer
                    .write_contract(self.target.id, self.counter, data)
                    .await?;
                cell.confirming(hash);
                let receipts = self.readers.connect(&self.target)?;
                if !receipts.wait_for_receipt(hash).await? {
                    return Err(TransactionError::Reverted);
                }
                Ok(hash)
            }
            // Injected and embedded ride the shared write entrypoint and
            // the shared read path.
            ActiveBackend::Injected(_) | ActiveBackend::Embedded(_) => {
                let hash = self
                    .shared_write
                    .write_contract(self.target.id, self.counter, data)
                    .await?;
                cell.confirming(hash);
                if !self.reader.wait_for_receipt(hash).await? {
                    return Err(TransactionError::Reverted);
                }
                Ok(hash)
            }
        }
    }
}
