//! The UI-facing composition of the core components.
//!
//! # Data Flow
//! ```text
//! connect action → session registry election → chain resolver retarget
//!     → canonical chain id vs selected target → is_correct_network
//!     → transaction dispatcher (reads poll on-network, writes per backend)
//! ```
//!
//! The hub owns one of everything: one registry, one resolver, and one
//! dispatcher bound to the currently selected network target. UI layers
//! read state from here and call the action methods; they never talk to
//! a wallet SDK directly.

use std::sync::Arc;

use alloy::primitives::U256;
use tokio::sync::watch;

use crate::backend::custodial::CUSTODIAL_CONNECTOR;
use crate::backend::injected::TrackedConnection;
use crate::backend::{ActiveBackend, BackendKind, ConnectionError, ConnectionTracker};
use crate::chain::{ChainResolver, SubscriptionGuard};
use crate::config::ValidationReport;
use crate::network::switch::{self, SwitchNetworkError};
use crate::network::targets::NetworkTarget;
use crate::session::registry::{SessionRegistry, WalletSession};
use crate::tx::dispatcher::{SharedWriteChannel, TransactionDispatcher, TransactionError};
use crate::tx::reader::{ReadError, ReaderFactory};
use crate::tx::state::TransactionState;

/// Unified facade over session, chain, switch, and transaction state.
pub struct WalletHub {
    registry: SessionRegistry,
    resolver: ChainResolver,
    readers: Arc<dyn ReaderFactory>,
    shared_write: Arc<dyn SharedWriteChannel>,
    validation: ValidationReport,
    selected: NetworkTarget,
    dispatcher: Arc<TransactionDispatcher>,
    _poller: SubscriptionGuard,
    active_kind: Option<BackendKind>,
}

impl WalletHub {
    /// Build the hub with the local devnet selected.
    ///
    /// Must run inside a tokio runtime: the read poller starts
    /// immediately (and stays idle until the chain id matches).
    pub fn new(
        registry: SessionRegistry,
        validation: ValidationReport,
        readers: Arc<dyn ReaderFactory>,
        shared_write: Arc<dyn SharedWriteChannel>,
    ) -> Result<Self, ReadError> {
        let resolver = ChainResolver::new();
        let selected = NetworkTarget::anvil();
        let (dispatcher, poller) =
            Self::bind_target(&readers, &shared_write, &resolver, selected.clone())?;
        let mut hub = Self {
            registry,
            resolver,
            readers,
            shared_write,
            validation,
            selected,
            dispatcher,
            _poller: poller,
            active_kind: None,
        };
        hub.refresh_election();
        Ok(hub)
    }

    fn bind_target(
        readers: &Arc<dyn ReaderFactory>,
        shared_write: &Arc<dyn SharedWriteChannel>,
        resolver: &ChainResolver,
        target: NetworkTarget,
    ) -> Result<(Arc<TransactionDispatcher>, SubscriptionGuard), ReadError> {
        let dispatcher = Arc::new(TransactionDispatcher::new(
            target,
            Arc::clone(readers),
            Arc::clone(shared_write),
        )?);
        let poller = dispatcher.spawn_number_poller(resolver.subscribe());
        Ok((dispatcher, poller))
    }

    // ------------------------------------------------------------------
    // Network target selection
    // ------------------------------------------------------------------

    /// Re-bind reads and writes to a new target network. Transaction
    /// state starts over; the wallet's chain id is untouched, so
    /// `is_correct_network` flips immediately without any new fetch.
    pub fn select_target(&mut self, target: NetworkTarget) -> Result<(), ReadError> {
        if self.selected.id == target.id {
            return Ok(());
        }
        let (dispatcher, poller) = Self::bind_target(
            &self.readers,
            &self.shared_write,
            &self.resolver,
            target.clone(),
        )?;
        tracing::info!(chain_id = target.id, network = %target.name, "network target selected");
        self.selected = target;
        self.dispatcher = dispatcher;
        self._poller = poller;
        Ok(())
    }

    pub fn selected_target(&self) -> &NetworkTarget {
        &self.selected
    }

    /// Canonical chain id equals the selected target's id.
    pub fn is_correct_network(&self) -> bool {
        self.resolver.chain_id() == Some(self.selected.id)
    }

    pub fn chain_id(&self) -> Option<u64> {
        self.resolver.chain_id()
    }

    pub fn chain_updates(&self) -> watch::Receiver<Option<u64>> {
        self.resolver.subscribe()
    }

    // ------------------------------------------------------------------
    // Session
    // ------------------------------------------------------------------

    /// Re-evaluate election and re-point the chain resolver when the
    /// elected backend changed. Call after any authentication change the
    /// hub did not make itself (e.g. the injected extension attaching).
    pub fn refresh_election(&mut self) {
        let active = self.registry.active();
        let kind = active.as_ref().map(ActiveBackend::kind);
        if kind != self.active_kind {
            match kind {
                Some(kind) => tracing::info!(backend = %kind, "active backend changed"),
                None => tracing::info!("no backend active"),
            }
            self.active_kind = kind;
            self.resolver.set_active(active);
        }
    }

    pub fn active_backend(&self) -> Option<ActiveBackend> {
        self.registry.active()
    }

    pub fn session(&self) -> Option<WalletSession> {
        self.registry.session(self.resolver.chain_id())
    }

    pub fn any_connected(&self) -> bool {
        self.registry.any_connected()
    }

    /// The shared connection layer; host applications push injected
    /// extension events here, then call [`WalletHub::refresh_election`].
    pub fn tracker(&self) -> &ConnectionTracker {
        self.registry.tracker()
    }

    // ------------------------------------------------------------------
    // Connect / disconnect
    // ------------------------------------------------------------------

    /// Whether this backend's connect control should be enabled.
    pub fn connect_enabled(&self, backend: BackendKind) -> bool {
        self.validation.is_valid(backend)
    }

    /// Inline message for a backend whose credentials failed validation.
    pub fn validation_message(&self, backend: BackendKind) -> Option<&str> {
        self.validation.message(backend)
    }

    fn ensure_enabled(&self, backend: BackendKind) -> Result<(), ConnectionError> {
        match self.validation.message(backend) {
            None => Ok(()),
            Some(message) => Err(ConnectionError::ConfigBlocked {
                backend,
                message: message.to_string(),
            }),
        }
    }

    pub async fn connect_embedded(&mut self) -> Result<(), ConnectionError> {
        self.ensure_enabled(BackendKind::Embedded)?;
        let sdk = self
            .registry
            .embedded_sdk()
            .cloned()
            .ok_or(ConnectionError::NotConfigured {
                backend: BackendKind::Embedded,
            })?;
        sdk.login().await?;
        self.refresh_election();
        Ok(())
    }

    pub async fn connect_hosted(&mut self) -> Result<(), ConnectionError> {
        self.ensure_enabled(BackendKind::Hosted)?;
        let sdk = self
            .registry
            .hosted_sdk()
            .cloned()
            .ok_or(ConnectionError::NotConfigured {
                backend: BackendKind::Hosted,
            })?;
        sdk.login().await?;
        self.refresh_election();
        Ok(())
    }

    /// Log in to the custodial SDK and attach its connector to the shared
    /// connection layer once an account is listed.
    pub async fn connect_custodial(&mut self) -> Result<(), ConnectionError> {
        self.ensure_enabled(BackendKind::Custodial)?;
        let sdk = self
            .registry
            .custodial_sdk()
            .cloned()
            .ok_or(ConnectionError::NotConfigured {
                backend: BackendKind::Custodial,
            })?;
        sdk.login().await?;
        if let Some(account) = sdk.accounts().first() {
            self.registry.tracker().update(TrackedConnection {
                connector: Some(CUSTODIAL_CONNECTOR.to_string()),
                address: Some(account.address),
                chain_id: None,
                connected: true,
            });
        }
        self.refresh_election();
        Ok(())
    }

    /// Disconnect whichever backend is active.
    pub async fn disconnect(&mut self) -> Result<(), ConnectionError> {
        let Some(active) = self.registry.active() else {
            return Ok(());
        };
        match active {
            ActiveBackend::Embedded(b) => b.sdk().logout().await?,
            ActiveBackend::Hosted(b) => b.sdk().logout().await?,
            ActiveBackend::Custodial(b) => {
                // Local session state resets even when the SDK logout
                // throws.
                let result = b.sdk().logout().await;
                self.registry.tracker().clear();
                if let Err(err) = result {
                    tracing::warn!(error = %err, "custodial logout failed; local session cleared");
                }
            }
            ActiveBackend::Injected(_) => self.registry.tracker().clear(),
        }
        self.refresh_election();
        Ok(())
    }

    // ------------------------------------------------------------------
    // Network switching
    // ------------------------------------------------------------------

    /// Ask the active backend to switch to the selected target.
    pub async fn switch_network(&self) -> Result<(), SwitchNetworkError> {
        let backend = self
            .registry
            .active()
            .ok_or(SwitchNetworkError::NoActiveBackend)?;
        switch::switch_network(&backend, &self.selected, &self.resolver).await
    }

    // ------------------------------------------------------------------
    // Transactions
    // ------------------------------------------------------------------

    pub fn number(&self) -> Option<U256> {
        self.dispatcher.number()
    }

    pub fn subscribe_number(&self) -> watch::Receiver<Option<U256>> {
        self.dispatcher.subscribe_number()
    }

    pub fn increment_state(&self) -> TransactionState {
        self.dispatcher.increment_state().get()
    }

    pub fn set_number_state(&self) -> TransactionState {
        self.dispatcher.set_number_state().get()
    }

    pub fn set_pending_input(&self, raw: impl Into<String>) {
        self.dispatcher.set_pending_input(raw);
    }

    pub fn pending_input(&self) -> Option<String> {
        self.dispatcher.pending_input()
    }

    pub async fn increment(&self) -> Result<(), TransactionError> {
        let backend = self
            .registry
            .active()
            .ok_or(TransactionError::NoActiveBackend)?;
        self.dispatcher.increment(&backend).await
    }

    pub async fn set_number(&self) -> Result<(), TransactionError> {
        let backend = self
            .registry
            .active()
            .ok_or(TransactionError::NoActiveBackend)?;
        self.dispatcher.set_number(&backend).await
    }

    pub fn dispatcher(&self) -> &Arc<TransactionDispatcher> {
        &self.dispatcher
    }
}
