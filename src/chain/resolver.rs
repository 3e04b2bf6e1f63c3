//! Chain-id acquisition and stale-result suppression.
//!
//! # Responsibilities
//! - Determine the chain id of whichever backend is active, by that
//!   backend's own acquisition method
//! - Keep it current through the backend's network-change notifications
//! - Discard results from fetches dispatched under a backend that is no
//!   longer active
//!
//! # Design Decisions
//! - Every fetch and listener carries the epoch current at dispatch time;
//!   the epoch advances on every active-backend change, so an A→B→A flip
//!   also invalidates in-flight work from the first A
//! - Acquisition errors are logged and the prior canonical value is
//!   retained; the canonical chain id never moves to an error state

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::json;
use thiserror::Error;
use tokio::sync::{broadcast, watch};

use crate::backend::custodial::CustodialBackend;
use crate::backend::hosted::HostedBackend;
use crate::backend::injected::ConnectionTracker;
use crate::backend::provider::{Eip1193Provider, ProviderError};
use crate::backend::{ActiveBackend, BackendKind, SdkError};
use crate::chain::subscription::SubscriptionGuard;
use crate::observability::metrics;

/// Transient chain-id acquisition failure. Logged; never propagated into
/// the canonical value.
#[derive(Debug, Clone, Error)]
pub enum ChainResolutionError {
    #[error("malformed chain id payload {raw:?}")]
    Malformed { raw: String },

    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("wallet SDK error: {0}")]
    Sdk(#[from] SdkError),
}

/// Parse a hex-encoded chain id as providers report it (`"0x7a69"`).
pub fn parse_hex_chain_id(raw: &str) -> Result<u64, ChainResolutionError> {
    let digits = raw
        .strip_prefix("0x")
        .or_else(|| raw.strip_prefix("0X"))
        .unwrap_or(raw);
    u64::from_str_radix(digits, 16).map_err(|_| ChainResolutionError::Malformed {
        raw: raw.to_string(),
    })
}

/// Fetch the current chain id from a raw provider.
pub async fn provider_chain_id(
    provider: &dyn Eip1193Provider,
) -> Result<u64, ChainResolutionError> {
    let value = provider.request("eth_chainId", json!([])).await?;
    let raw = value.as_str().ok_or_else(|| ChainResolutionError::Malformed {
        raw: value.to_string(),
    })?;
    parse_hex_chain_id(raw)
}

/// Resolve the custodial backend's chain id: prefer the network id
/// embedded in the wallet-bound client, fall back to the companion
/// read-only client.
pub async fn custodial_chain_id(
    backend: &CustodialBackend,
) -> Result<u64, ChainResolutionError> {
    let wallet = backend.wallet_client().await?;
    if let Some(id) = wallet.chain_id() {
        return Ok(id);
    }
    let read = backend.read_client().await?;
    Ok(read.chain_id().await?)
}

/// The single reconciled view of which network the active backend points
/// at. Cheap to clone; all clones share one canonical value.
#[derive(Clone)]
pub struct ChainResolver {
    inner: Arc<ResolverInner>,
}

struct ResolverInner {
    canonical: watch::Sender<Option<u64>>,
    /// Advances on every active-backend change; publications carry the
    /// epoch they were dispatched under.
    epoch: AtomicU64,
    listener: Mutex<Option<SubscriptionGuard>>,
}

impl ChainResolver {
    pub fn new() -> Self {
        let (canonical, _) = watch::channel(None);
        Self {
            inner: Arc::new(ResolverInner {
                canonical,
                epoch: AtomicU64::new(0),
                listener: Mutex::new(None),
            }),
        }
    }

    /// Observe canonical chain-id changes.
    pub fn subscribe(&self) -> watch::Receiver<Option<u64>> {
        self.inner.canonical.subscribe()
    }

    pub fn chain_id(&self) -> Option<u64> {
        *self.inner.canonical.borrow()
    }

    /// Re-point the resolver at the newly elected backend (or none).
    ///
    /// Invalidates every in-flight fetch and replaces the event listener;
    /// the previous listener's task is aborted when its guard drops.
    pub fn set_active(&self, backend: Option<ActiveBackend>) {
        let epoch = self.inner.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        let guard = match backend {
            Some(backend) => {
                tracing::debug!(backend = %backend.kind(), epoch, "resolver tracking backend");
                Some(self.spawn_listener(backend, epoch))
            }
            None => {
                self.inner.canonical.send_replace(None);
                None
            }
        };
        *self.inner.listener.lock().unwrap() = guard;
    }

    /// Fetch the active backend's chain id right now, bypassing its event
    /// subscription. Used after a network switch that the backend may not
    /// notify about promptly.
    pub async fn force_refresh(&self, backend: &ActiveBackend) {
        let epoch = self.inner.epoch.load(Ordering::SeqCst);
        match acquire(backend).await {
            Ok(Some(id)) => self.publish(backend.kind(), epoch, id),
            Ok(None) => {}
            Err(err) => {
                tracing::warn!(
                    backend = %backend.kind(),
                    error = %err,
                    "forced chain refresh failed; keeping previous value"
                );
            }
        }
    }

    fn publish(&self, kind: BackendKind, epoch: u64, chain_id: u64) {
        if self.inner.epoch.load(Ordering::SeqCst) != epoch {
            metrics::record_stale_chain_result(kind.as_str());
            tracing::debug!(
                backend = %kind,
                chain_id,
                "discarding chain id from a no-longer-active backend"
            );
            return;
        }
        metrics::record_chain_update(kind.as_str());
        self.inner.canonical.send_replace(Some(chain_id));
    }

    fn spawn_listener(&self, backend: ActiveBackend, epoch: u64) -> SubscriptionGuard {
        let resolver = self.clone();
        match backend {
            ActiveBackend::Injected(b) => {
                let tracker = b.tracker().clone();
                SubscriptionGuard::spawn(track_connection(
                    resolver,
                    tracker,
                    BackendKind::Injected,
                    epoch,
                ))
            }
            ActiveBackend::Embedded(b) => {
                let tracker = b.tracker().clone();
                SubscriptionGuard::spawn(track_connection(
                    resolver,
                    tracker,
                    BackendKind::Embedded,
                    epoch,
                ))
            }
            ActiveBackend::Hosted(b) => SubscriptionGuard::spawn(track_hosted(resolver, b, epoch)),
            ActiveBackend::Custodial(b) => {
                SubscriptionGuard::spawn(track_custodial(resolver, b, epoch))
            }
        }
    }
}

impl Default for ChainResolver {
    fn default() -> Self {
        Self::new()
    }
}

async fn acquire(backend: &ActiveBackend) -> Result<Option<u64>, ChainResolutionError> {
    match backend {
        ActiveBackend::Injected(b) => Ok(b.chain_id()),
        ActiveBackend::Embedded(b) => Ok(b.chain_id()),
        ActiveBackend::Hosted(b) => {
            let provider = b.provider().await?;
            Ok(Some(provider_chain_id(provider.as_ref()).await?))
        }
        ActiveBackend::Custodial(b) => Ok(Some(custodial_chain_id(b).await?)),
    }
}

/// Injected and embedded wallets: republish the chain id the shared
/// connection layer already tracks, as it changes.
async fn track_connection(
    resolver: ChainResolver,
    tracker: ConnectionTracker,
    kind: BackendKind,
    epoch: u64,
) {
    let mut updates = tracker.subscribe();
    loop {
        let chain_id = updates.borrow_and_update().chain_id;
        if let Some(id) = chain_id {
            resolver.publish(kind, epoch, id);
        }
        if updates.changed().await.is_err() {
            break;
        }
    }
}

/// Hosted wallet: ask the raw provider once, then follow `chainChanged`.
async fn track_hosted(resolver: ChainResolver, backend: HostedBackend, epoch: u64) {
    let kind = BackendKind::Hosted;
    let provider = match backend.provider().await {
        Ok(provider) => provider,
        Err(err) => {
            tracing::warn!(error = %err, "hosted provider unavailable for chain resolution");
            return;
        }
    };

    // Subscribe before the initial fetch so no change slips between them.
    let mut events = provider.chain_changed();
    match provider_chain_id(provider.as_ref()).await {
        Ok(id) => resolver.publish(kind, epoch, id),
        Err(err) => {
            tracing::warn!(error = %err, "chain id query failed; keeping previous value");
        }
    }

    loop {
        match events.recv().await {
            Ok(raw) => match parse_hex_chain_id(&raw) {
                Ok(id) => resolver.publish(kind, epoch, id),
                Err(err) => {
                    tracing::warn!(error = %err, "ignoring malformed chainChanged payload");
                }
            },
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "chainChanged listener lagged");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

/// Custodial wallet: wallet-bound client first, read-only client as
/// fallback, then follow the backend-level network-changed event.
async fn track_custodial(resolver: ChainResolver, backend: CustodialBackend, epoch: u64) {
    let kind = BackendKind::Custodial;
    let mut events = backend.network_changed();
    match custodial_chain_id(&backend).await {
        Ok(id) => resolver.publish(kind, epoch, id),
        Err(err) => {
            tracing::warn!(error = %err, "chain id query failed; keeping previous value");
        }
    }

    loop {
        match events.recv().await {
            Ok(id) => resolver.publish(kind, epoch, id),
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "network-changed listener lagged");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}
