//! Backend election over competing authentication states.
//!
//! # Responsibilities
//! - Reduce four independent authentication states to at most one active
//!   backend under a fixed priority order
//! - Expose the aggregate "any wallet connected" flag
//! - Produce the unified session summary the UI consumes
//!
//! # Design Decisions
//! - Election is a pure function of four booleans; it is re-evaluated on
//!   every relevant state change and never cached across them
//! - Election has no side effects; "nothing active" is a valid outcome,
//!   not a failure

use std::sync::Arc;

use alloy::primitives::Address;

use crate::backend::custodial::{CustodialSdk, CUSTODIAL_CONNECTOR};
use crate::backend::embedded::EmbeddedSdk;
use crate::backend::hosted::HostedSdk;
use crate::backend::injected::INJECTED_CONNECTOR;
use crate::backend::provider::Eip1193Provider;
use crate::backend::{
    ActiveBackend, BackendKind, Capabilities, ConnectionTracker, CustodialBackend,
    EmbeddedBackend, HostedBackend, InjectedBackend,
};

/// The four authentication flags election is computed from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AuthFlags {
    pub custodial: bool,
    pub embedded: bool,
    pub hosted: bool,
    pub injected: bool,
}

/// Elect the active backend. Pure; fixed priority order.
pub fn elect(flags: AuthFlags) -> Option<BackendKind> {
    if flags.custodial {
        Some(BackendKind::Custodial)
    } else if flags.embedded {
        Some(BackendKind::Embedded)
    } else if flags.hosted {
        Some(BackendKind::Hosted)
    } else if flags.injected {
        Some(BackendKind::Injected)
    } else {
        None
    }
}

/// Whether any wallet is connected, independent of election.
pub fn any_connected(flags: AuthFlags) -> bool {
    flags.custodial || flags.embedded || flags.hosted || flags.injected
}

/// Unified session summary for the active backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletSession {
    pub backend: BackendKind,
    pub address: Option<Address>,
    /// Canonical chain id as the chain resolver last published it.
    pub chain_id: Option<u64>,
    pub connected: bool,
    pub capabilities: Capabilities,
}

/// Holds the backend handles and evaluates election over them.
pub struct SessionRegistry {
    tracker: ConnectionTracker,
    injected_provider: Arc<dyn Eip1193Provider>,
    embedded: Option<Arc<dyn EmbeddedSdk>>,
    hosted: Option<Arc<dyn HostedSdk>>,
    custodial: Option<Arc<dyn CustodialSdk>>,
}

impl SessionRegistry {
    /// A registry with only the injected extension wired up. Hosted SDKs
    /// are attached with the `with_*` builders as they are configured.
    pub fn new(tracker: ConnectionTracker, injected_provider: Arc<dyn Eip1193Provider>) -> Self {
        Self {
            tracker,
            injected_provider,
            embedded: None,
            hosted: None,
            custodial: None,
        }
    }

    pub fn with_embedded(mut self, sdk: Arc<dyn EmbeddedSdk>) -> Self {
        self.embedded = Some(sdk);
        self
    }

    pub fn with_hosted(mut self, sdk: Arc<dyn HostedSdk>) -> Self {
        self.hosted = Some(sdk);
        self
    }

    pub fn with_custodial(mut self, sdk: Arc<dyn CustodialSdk>) -> Self {
        self.custodial = Some(sdk);
        self
    }

    pub fn tracker(&self) -> &ConnectionTracker {
        &self.tracker
    }

    pub fn embedded_sdk(&self) -> Option<&Arc<dyn EmbeddedSdk>> {
        self.embedded.as_ref()
    }

    pub fn hosted_sdk(&self) -> Option<&Arc<dyn HostedSdk>> {
        self.hosted.as_ref()
    }

    pub fn custodial_sdk(&self) -> Option<&Arc<dyn CustodialSdk>> {
        self.custodial.as_ref()
    }

    /// Current authentication flags, read fresh from every backend.
    pub fn flags(&self) -> AuthFlags {
        let connection = self.tracker.snapshot();
        AuthFlags {
            custodial: connection.connected
                && connection.connector.as_deref() == Some(CUSTODIAL_CONNECTOR),
            embedded: self
                .embedded
                .as_ref()
                .is_some_and(|sdk| sdk.authenticated() && !sdk.wallets().is_empty()),
            hosted: self
                .hosted
                .as_ref()
                .is_some_and(|sdk| sdk.authenticated() && sdk.primary_wallet().is_some()),
            injected: connection.connected
                && connection.connector.as_deref() == Some(INJECTED_CONNECTOR),
        }
    }

    pub fn any_connected(&self) -> bool {
        any_connected(self.flags())
    }

    /// The elected backend with its live handles, or `None`.
    pub fn active(&self) -> Option<ActiveBackend> {
        match elect(self.flags())? {
            BackendKind::Custodial => {
                let sdk = self.custodial.as_ref()?;
                Some(ActiveBackend::Custodial(CustodialBackend::new(
                    Arc::clone(sdk),
                    self.tracker.clone(),
                )))
            }
            BackendKind::Embedded => {
                let sdk = self.embedded.as_ref()?;
                Some(ActiveBackend::Embedded(EmbeddedBackend::new(
                    Arc::clone(sdk),
                    self.tracker.clone(),
                    Arc::clone(&self.injected_provider),
                )))
            }
            BackendKind::Hosted => {
                let sdk = self.hosted.as_ref()?;
                Some(ActiveBackend::Hosted(HostedBackend::new(Arc::clone(sdk))))
            }
            BackendKind::Injected => Some(ActiveBackend::Injected(InjectedBackend::new(
                self.tracker.clone(),
                Arc::clone(&self.injected_provider),
            ))),
        }
    }

    /// Unified session summary. Display address falls back from the
    /// shared connection layer to the backend's own wallet.
    pub fn session(&self, chain_id: Option<u64>) -> Option<WalletSession> {
        let active = self.active()?;
        let address = self.tracker.snapshot().address.or_else(|| active.address());
        Some(WalletSession {
            backend: active.kind(),
            address,
            chain_id,
            connected: true,
            capabilities: active.capabilities(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flags(custodial: bool, embedded: bool, hosted: bool, injected: bool) -> AuthFlags {
        AuthFlags { custodial, embedded, hosted, injected }
    }

    #[test]
    fn test_election_priority_order() {
        assert_eq!(elect(flags(true, true, true, true)), Some(BackendKind::Custodial));
        assert_eq!(elect(flags(false, true, true, true)), Some(BackendKind::Embedded));
        assert_eq!(elect(flags(false, false, true, true)), Some(BackendKind::Hosted));
        assert_eq!(elect(flags(false, false, false, true)), Some(BackendKind::Injected));
        assert_eq!(elect(flags(false, false, false, false)), None);
    }

    #[test]
    fn test_at_most_one_active() {
        // Exactly 0 or 1 backend elected for every flag combination.
        for bits in 0u8..16 {
            let f = flags(bits & 1 != 0, bits & 2 != 0, bits & 4 != 0, bits & 8 != 0);
            let elected = elect(f);
            assert_eq!(elected.is_some(), any_connected(f));
            // Re-evaluating is deterministic.
            assert_eq!(elect(f), elected);
        }
    }

    #[test]
    fn test_any_connected_is_an_or() {
        assert!(!any_connected(flags(false, false, false, false)));
        assert!(any_connected(flags(false, false, true, false)));
        assert!(any_connected(flags(true, false, false, true)));
    }
}
