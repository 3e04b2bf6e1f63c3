//! In-memory wallet SDK and chain mocks for testing without a network.
//!
//! Simulates the four backend black boxes plus a tiny per-network chain
//! holding one Counter deployment. Used by unit tests and the integration
//! suite under `tests/`.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use alloy::primitives::{Address, Bytes, TxHash, B256, U256};
use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::broadcast;

use crate::backend::custodial::{
    CustodialAccount, CustodialReadClient, CustodialSdk, CustodialWalletClient,
};
use crate::backend::embedded::EmbeddedSdk;
use crate::backend::hosted::HostedSdk;
use crate::backend::provider::{Eip1193Provider, ProviderError, UNKNOWN_CHAIN_CODE};
use crate::backend::{ConnectionError, SdkError};
use crate::contract::ICounter;
use crate::network::targets::NetworkTarget;
use crate::tx::reader::{ContractReader, ReadError, ReaderFactory};
use alloy::sol_types::SolCall;

const RECEIPT_POLL: Duration = Duration::from_millis(5);

/// In-memory chain with a single Counter deployment.
pub struct MockChain {
    chain_id: u64,
    number: Mutex<U256>,
    receipts: Mutex<HashMap<TxHash, bool>>,
    held: Mutex<Vec<(TxHash, bool)>>,
    hold_receipts: AtomicBool,
    revert_next: AtomicBool,
    next_tx: AtomicU64,
}

impl MockChain {
    pub fn new(chain_id: u64) -> Arc<Self> {
        Arc::new(Self {
            chain_id,
            number: Mutex::new(U256::ZERO),
            receipts: Mutex::new(HashMap::new()),
            held: Mutex::new(Vec::new()),
            hold_receipts: AtomicBool::new(false),
            revert_next: AtomicBool::new(false),
            next_tx: AtomicU64::new(1),
        })
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub fn number(&self) -> U256 {
        *self.number.lock().unwrap()
    }

    pub fn set_number(&self, value: U256) {
        *self.number.lock().unwrap() = value;
    }

    /// Withhold receipts for subsequent transactions until
    /// [`MockChain::release_receipts`] is called. Lets tests observe the
    /// confirming state.
    pub fn hold_receipts(&self) {
        self.hold_receipts.store(true, Ordering::SeqCst);
    }

    pub fn release_receipts(&self) {
        self.hold_receipts.store(false, Ordering::SeqCst);
        let mut receipts = self.receipts.lock().unwrap();
        for (hash, ok) in self.held.lock().unwrap().drain(..) {
            receipts.insert(hash, ok);
        }
    }

    /// Make the next applied transaction revert on-chain.
    pub fn revert_next(&self) {
        self.revert_next.store(true, Ordering::SeqCst);
    }

    pub fn receipt(&self, hash: TxHash) -> Option<bool> {
        self.receipts.lock().unwrap().get(&hash).copied()
    }

    /// Decode and execute Counter calldata, returning the tx hash.
    pub fn apply(&self, data: &Bytes) -> Result<TxHash, SdkError> {
        let reverted = self.revert_next.swap(false, Ordering::SeqCst);
        if !reverted {
            if ICounter::incrementCall::abi_decode(data).is_ok() {
                let mut number = self.number.lock().unwrap();
                *number += U256::from(1u64);
            } else if let Ok(call) = ICounter::setNumberCall::abi_decode(data) {
                *self.number.lock().unwrap() = call.newNumber;
            } else {
                return Err(SdkError("unknown calldata".to_string()));
            }
        }

        let seq = self.next_tx.fetch_add(1, Ordering::SeqCst);
        let hash = B256::from(U256::from(seq));
        if self.hold_receipts.load(Ordering::SeqCst) {
            self.held.lock().unwrap().push((hash, !reverted));
        } else {
            self.receipts.lock().unwrap().insert(hash, !reverted);
        }
        Ok(hash)
    }

    async fn wait_for_receipt(&self, hash: TxHash) -> bool {
        loop {
            if let Some(ok) = self.receipt(hash) {
                return ok;
            }
            tokio::time::sleep(RECEIPT_POLL).await;
        }
    }
}

/// EIP-1193 provider over a set of mock chains.
///
/// Tracks which chains the wallet "knows" so unknown-chain (4902) and
/// add-chain behavior can be exercised.
pub struct MockProvider {
    chains: Mutex<HashMap<u64, Arc<MockChain>>>,
    known: Mutex<HashSet<u64>>,
    current: Mutex<u64>,
    calls: Mutex<Vec<String>>,
    chain_changed: broadcast::Sender<String>,
    emit_events: AtomicBool,
    rejections: Mutex<HashMap<String, (i64, String)>>,
}

impl MockProvider {
    pub fn new(chains: Vec<Arc<MockChain>>, current: u64) -> Arc<Self> {
        let known = chains.iter().map(|c| c.chain_id()).collect();
        let chains = chains.into_iter().map(|c| (c.chain_id(), c)).collect();
        let (tx, _) = broadcast::channel(16);
        Arc::new(Self {
            chains: Mutex::new(chains),
            known: Mutex::new(known),
            current: Mutex::new(current),
            calls: Mutex::new(Vec::new()),
            chain_changed: tx,
            emit_events: AtomicBool::new(true),
            rejections: Mutex::new(HashMap::new()),
        })
    }

    pub fn current_chain(&self) -> u64 {
        *self.current.lock().unwrap()
    }

    /// Host-side network change (e.g. the user flipped it in the wallet).
    pub fn set_chain(&self, chain_id: u64) {
        *self.current.lock().unwrap() = chain_id;
        self.emit_chain_changed(chain_id);
    }

    /// Pretend the wallet does not know this chain until it is added.
    pub fn forget_chain(&self, chain_id: u64) {
        self.known.lock().unwrap().remove(&chain_id);
    }

    pub fn knows_chain(&self, chain_id: u64) -> bool {
        self.known.lock().unwrap().contains(&chain_id)
    }

    /// Reject every future call of `method` with the given error code.
    pub fn reject_method(&self, method: &str, code: i64, message: &str) {
        self.rejections
            .lock()
            .unwrap()
            .insert(method.to_string(), (code, message.to_string()));
    }

    pub fn clear_rejection(&self, method: &str) {
        self.rejections.lock().unwrap().remove(method);
    }

    /// Suppress `chainChanged` notifications (a silent wallet).
    pub fn set_emit_events(&self, emit: bool) {
        self.emit_events.store(emit, Ordering::SeqCst);
    }

    /// Number of requests issued for `method`.
    pub fn call_count(&self, method: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.as_str() == method)
            .count()
    }

    pub fn chain(&self, chain_id: u64) -> Option<Arc<MockChain>> {
        self.chains.lock().unwrap().get(&chain_id).cloned()
    }

    fn current_mock_chain(&self) -> Result<Arc<MockChain>, ProviderError> {
        let id = self.current_chain();
        self.chain(id)
            .ok_or_else(|| ProviderError::Transport(format!("no mock chain for id {id}")))
    }

    fn emit_chain_changed(&self, chain_id: u64) {
        if self.emit_events.load(Ordering::SeqCst) {
            let _ = self.chain_changed.send(format!("{chain_id:#x}"));
        }
    }

    fn param_chain_id(params: &Value) -> Result<u64, ProviderError> {
        let raw = params
            .get(0)
            .and_then(|p| p.get("chainId"))
            .and_then(Value::as_str)
            .ok_or_else(|| ProviderError::Transport("missing chainId param".to_string()))?;
        u64::from_str_radix(raw.trim_start_matches("0x"), 16)
            .map_err(|e| ProviderError::Transport(format!("bad chainId param: {e}")))
    }
}

#[async_trait]
impl Eip1193Provider for MockProvider {
    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderError> {
        self.calls.lock().unwrap().push(method.to_string());
        if let Some((code, message)) = self.rejections.lock().unwrap().get(method).cloned() {
            return Err(ProviderError::Rpc { code, message });
        }

        match method {
            "eth_chainId" => Ok(json!(format!("{:#x}", self.current_chain()))),
            "wallet_switchEthereumChain" => {
                let chain_id = Self::param_chain_id(&params)?;
                if !self.knows_chain(chain_id) {
                    return Err(ProviderError::Rpc {
                        code: UNKNOWN_CHAIN_CODE,
                        message: format!("Unrecognized chain ID {chain_id:#x}"),
                    });
                }
                *self.current.lock().unwrap() = chain_id;
                self.emit_chain_changed(chain_id);
                Ok(Value::Null)
            }
            "wallet_addEthereumChain" => {
                let chain_id = Self::param_chain_id(&params)?;
                self.known.lock().unwrap().insert(chain_id);
                self.chains
                    .lock()
                    .unwrap()
                    .entry(chain_id)
                    .or_insert_with(|| MockChain::new(chain_id));
                Ok(Value::Null)
            }
            "eth_sendTransaction" => {
                let data = params
                    .get(0)
                    .and_then(|p| p.get("data"))
                    .and_then(Value::as_str)
                    .ok_or_else(|| ProviderError::Transport("missing tx data".to_string()))?
                    .parse::<Bytes>()
                    .map_err(|e| ProviderError::Transport(format!("bad tx data: {e}")))?;
                let chain = self.current_mock_chain()?;
                let hash = chain
                    .apply(&data)
                    .map_err(|e| ProviderError::Transport(e.to_string()))?;
                Ok(json!(format!("{hash}")))
            }
            other => Err(ProviderError::Rpc {
                code: -32601,
                message: format!("unsupported method {other}"),
            }),
        }
    }

    fn chain_changed(&self) -> broadcast::Receiver<String> {
        self.chain_changed.subscribe()
    }
}

/// Embedded-wallet SDK mock.
pub struct MockEmbeddedSdk {
    authenticated: AtomicBool,
    wallets: Mutex<Vec<Address>>,
    fail_login: AtomicBool,
}

impl MockEmbeddedSdk {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            authenticated: AtomicBool::new(false),
            wallets: Mutex::new(Vec::new()),
            fail_login: AtomicBool::new(false),
        })
    }

    pub fn provision_wallet(&self, address: Address) {
        self.wallets.lock().unwrap().push(address);
    }

    pub fn set_fail_login(&self) {
        self.fail_login.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl EmbeddedSdk for MockEmbeddedSdk {
    async fn login(&self) -> Result<(), ConnectionError> {
        if self.fail_login.load(Ordering::SeqCst) {
            return Err(ConnectionError::LoginFailed {
                backend: crate::backend::BackendKind::Embedded,
                message: "login window dismissed".to_string(),
            });
        }
        self.authenticated.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn logout(&self) -> Result<(), ConnectionError> {
        self.authenticated.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn authenticated(&self) -> bool {
        self.authenticated.load(Ordering::SeqCst)
    }

    fn wallets(&self) -> Vec<Address> {
        self.wallets.lock().unwrap().clone()
    }
}

/// Hosted-auth SDK mock wrapping a [`MockProvider`].
pub struct MockHostedSdk {
    authenticated: AtomicBool,
    primary: Mutex<Option<Address>>,
    provider: Arc<MockProvider>,
}

impl MockHostedSdk {
    pub fn new(provider: Arc<MockProvider>) -> Arc<Self> {
        Arc::new(Self {
            authenticated: AtomicBool::new(false),
            primary: Mutex::new(None),
            provider,
        })
    }

    pub fn set_primary_wallet(&self, address: Address) {
        *self.primary.lock().unwrap() = Some(address);
    }

    pub fn provider_handle(&self) -> Arc<MockProvider> {
        Arc::clone(&self.provider)
    }
}

#[async_trait]
impl HostedSdk for MockHostedSdk {
    async fn login(&self) -> Result<(), ConnectionError> {
        self.authenticated.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn logout(&self) -> Result<(), ConnectionError> {
        self.authenticated.store(false, Ordering::SeqCst);
        *self.primary.lock().unwrap() = None;
        Ok(())
    }

    fn authenticated(&self) -> bool {
        self.authenticated.load(Ordering::SeqCst)
    }

    fn primary_wallet(&self) -> Option<Address> {
        *self.primary.lock().unwrap()
    }

    async fn provider(&self) -> Result<Arc<dyn Eip1193Provider>, SdkError> {
        if !self.authenticated() {
            return Err(SdkError("no wallet provisioned".to_string()));
        }
        Ok(self.provider.clone())
    }
}

/// Custodial SDK mock.
pub struct MockCustodialSdk {
    authenticated: AtomicBool,
    accounts: Mutex<Vec<CustodialAccount>>,
    chains: Mutex<HashMap<u64, Arc<MockChain>>>,
    current: Mutex<u64>,
    wallet_reports_chain: AtomicBool,
    supports_switch: AtomicBool,
    network_changed: broadcast::Sender<u64>,
    fail_logout: AtomicBool,
}

impl MockCustodialSdk {
    pub fn new(chains: Vec<Arc<MockChain>>, current: u64) -> Arc<Self> {
        let chains = chains.into_iter().map(|c| (c.chain_id(), c)).collect();
        let (tx, _) = broadcast::channel(16);
        Arc::new(Self {
            authenticated: AtomicBool::new(false),
            accounts: Mutex::new(Vec::new()),
            chains: Mutex::new(chains),
            current: Mutex::new(current),
            wallet_reports_chain: AtomicBool::new(true),
            supports_switch: AtomicBool::new(false),
            network_changed: tx,
            fail_logout: AtomicBool::new(false),
        })
    }

    pub fn add_account(&self, network: &str, address: Address) {
        self.accounts.lock().unwrap().push(CustodialAccount {
            network: network.to_string(),
            address,
        });
    }

    pub fn set_supports_switch(&self, supported: bool) {
        self.supports_switch.store(supported, Ordering::SeqCst);
    }

    /// When false, the wallet-bound client reports no embedded network id
    /// and resolution must fall back to the read-only client.
    pub fn set_wallet_reports_chain(&self, reports: bool) {
        self.wallet_reports_chain.store(reports, Ordering::SeqCst);
    }

    pub fn set_fail_logout(&self) {
        self.fail_logout.store(true, Ordering::SeqCst);
    }

    pub fn current_chain(&self) -> u64 {
        *self.current.lock().unwrap()
    }

    /// Host-side network change with a backend-level notification.
    pub fn set_chain(&self, chain_id: u64) {
        *self.current.lock().unwrap() = chain_id;
        let _ = self.network_changed.send(chain_id);
    }

    fn current_mock_chain(&self) -> Result<Arc<MockChain>, SdkError> {
        let id = self.current_chain();
        self.chains
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or_else(|| SdkError(format!("no mock chain for id {id}")))
    }
}

#[async_trait]
impl CustodialSdk for MockCustodialSdk {
    async fn login(&self) -> Result<(), ConnectionError> {
        self.authenticated.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn logout(&self) -> Result<(), ConnectionError> {
        if self.fail_logout.load(Ordering::SeqCst) {
            return Err(ConnectionError::LogoutFailed {
                backend: crate::backend::BackendKind::Custodial,
                message: "widget session expired".to_string(),
            });
        }
        self.authenticated.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn authenticated(&self) -> bool {
        self.authenticated.load(Ordering::SeqCst)
    }

    fn accounts(&self) -> Vec<CustodialAccount> {
        self.accounts.lock().unwrap().clone()
    }

    async fn wallet_client(&self) -> Result<Arc<dyn CustodialWalletClient>, SdkError> {
        let chain = self.current_mock_chain()?;
        let reported = self
            .wallet_reports_chain
            .load(Ordering::SeqCst)
            .then(|| chain.chain_id());
        Ok(Arc::new(MockCustodialWalletClient { chain, reported }))
    }

    async fn read_client(&self) -> Result<Arc<dyn CustodialReadClient>, SdkError> {
        Ok(Arc::new(MockCustodialReadClient {
            chain: self.current_mock_chain()?,
        }))
    }

    fn supports_switch_network(&self) -> bool {
        self.supports_switch.load(Ordering::SeqCst)
    }

    async fn switch_network(&self, chain_id: u64) -> Result<(), SdkError> {
        if !self.supports_switch_network() {
            return Err(SdkError("connector has no switchNetwork".to_string()));
        }
        if !self.chains.lock().unwrap().contains_key(&chain_id) {
            return Err(SdkError(format!("network {chain_id} not offered")));
        }
        self.set_chain(chain_id);
        Ok(())
    }

    fn network_changed(&self) -> broadcast::Receiver<u64> {
        self.network_changed.subscribe()
    }
}

struct MockCustodialWalletClient {
    chain: Arc<MockChain>,
    reported: Option<u64>,
}

#[async_trait]
impl CustodialWalletClient for MockCustodialWalletClient {
    fn chain_id(&self) -> Option<u64> {
        self.reported
    }

    async fn send_transaction(&self, _to: Address, data: Bytes) -> Result<TxHash, SdkError> {
        self.chain.apply(&data)
    }
}

struct MockCustodialReadClient {
    chain: Arc<MockChain>,
}

#[async_trait]
impl CustodialReadClient for MockCustodialReadClient {
    async fn chain_id(&self) -> Result<u64, SdkError> {
        Ok(self.chain.chain_id())
    }

    async fn wait_for_receipt(&self, hash: TxHash) -> Result<bool, SdkError> {
        Ok(self.chain.wait_for_receipt(hash).await)
    }
}

/// Shared read path over a mock chain.
pub struct MockReader {
    chain: Arc<MockChain>,
    number_reads: AtomicU64,
}

impl MockReader {
    pub fn new(chain: Arc<MockChain>) -> Arc<Self> {
        Arc::new(Self {
            chain,
            number_reads: AtomicU64::new(0),
        })
    }

    pub fn number_reads(&self) -> u64 {
        self.number_reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContractReader for MockReader {
    async fn number(&self) -> Result<U256, ReadError> {
        self.number_reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.chain.number())
    }

    async fn wait_for_receipt(&self, hash: TxHash) -> Result<bool, ReadError> {
        Ok(self.chain.wait_for_receipt(hash).await)
    }
}

/// Reader factory serving mock chains keyed by target chain id.
pub struct MockReaderFactory {
    chains: HashMap<u64, Arc<MockChain>>,
    readers: Mutex<HashMap<u64, Arc<MockReader>>>,
}

impl MockReaderFactory {
    pub fn new(chains: Vec<Arc<MockChain>>) -> Arc<Self> {
        Arc::new(Self {
            chains: chains.into_iter().map(|c| (c.chain_id(), c)).collect(),
            readers: Mutex::new(HashMap::new()),
        })
    }

    /// The reader handed out for `chain_id`, if one was built.
    pub fn reader(&self, chain_id: u64) -> Option<Arc<MockReader>> {
        self.readers.lock().unwrap().get(&chain_id).cloned()
    }
}

impl ReaderFactory for MockReaderFactory {
    fn connect(&self, target: &NetworkTarget) -> Result<Arc<dyn ContractReader>, ReadError> {
        let chain = self
            .chains
            .get(&target.id)
            .ok_or_else(|| ReadError::Rpc(format!("no mock chain for target {}", target.id)))?;
        let reader = MockReader::new(Arc::clone(chain));
        self.readers
            .lock()
            .unwrap()
            .insert(target.id, Arc::clone(&reader));
        Ok(reader)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::CounterWrite;

    #[tokio::test]
    async fn test_mock_chain_counter() {
        let chain = MockChain::new(31337);
        let hash = chain.apply(&CounterWrite::Increment.calldata()).unwrap();
        assert_eq!(chain.number(), U256::from(1u64));
        assert_eq!(chain.receipt(hash), Some(true));

        chain
            .apply(&CounterWrite::SetNumber(U256::from(42u64)).calldata())
            .unwrap();
        assert_eq!(chain.number(), U256::from(42u64));
    }

    #[tokio::test]
    async fn test_mock_provider_switch_and_add() {
        let provider = MockProvider::new(vec![MockChain::new(31337)], 31337);

        let err = provider
            .request(
                "wallet_switchEthereumChain",
                json!([{ "chainId": "0xaa36a7" }]),
            )
            .await
            .unwrap_err();
        assert!(err.is_unknown_chain());

        provider
            .request(
                "wallet_addEthereumChain",
                json!([{ "chainId": "0xaa36a7", "chainName": "Sepolia" }]),
            )
            .await
            .unwrap();
        provider
            .request(
                "wallet_switchEthereumChain",
                json!([{ "chainId": "0xaa36a7" }]),
            )
            .await
            .unwrap();
        assert_eq!(provider.current_chain(), 11155111);
    }
}
