//! Injected-extension backend and the shared connection layer.
//!
//! The connection layer tracks whichever connector is currently attached
//! (connector name, address, chain id). The injected and embedded backends
//! read their network context from it synchronously; the custodial backend
//! is elected by its connector name showing up here.

use std::sync::Arc;

use alloy::primitives::Address;
use tokio::sync::watch;

use crate::backend::provider::Eip1193Provider;

/// Connector name the shared layer reports for the browser extension.
pub const INJECTED_CONNECTOR: &str = "injected";

/// Snapshot of the shared connection layer's tracked state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackedConnection {
    /// Name of the attached connector, if any.
    pub connector: Option<String>,
    pub address: Option<Address>,
    pub chain_id: Option<u64>,
    pub connected: bool,
}

/// Handle on the shared connection layer.
///
/// Cheap to clone; every clone observes the same tracked state. The host
/// application pushes connector events in via [`ConnectionTracker::update`].
#[derive(Debug, Clone)]
pub struct ConnectionTracker {
    state: Arc<watch::Sender<TrackedConnection>>,
}

impl ConnectionTracker {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(TrackedConnection::default());
        Self { state: Arc::new(tx) }
    }

    /// Current tracked state.
    pub fn snapshot(&self) -> TrackedConnection {
        self.state.borrow().clone()
    }

    /// Observe tracked-state changes.
    pub fn subscribe(&self) -> watch::Receiver<TrackedConnection> {
        self.state.subscribe()
    }

    /// Replace the tracked state (connector attach, account or chain change).
    pub fn update(&self, connection: TrackedConnection) {
        self.state.send_replace(connection);
    }

    /// Drop the tracked connection entirely.
    pub fn clear(&self) {
        self.state.send_replace(TrackedConnection::default());
    }
}

impl Default for ConnectionTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// The browser-injected wallet, served through the shared connection layer.
#[derive(Clone)]
pub struct InjectedBackend {
    tracker: ConnectionTracker,
    provider: Arc<dyn Eip1193Provider>,
}

impl InjectedBackend {
    pub fn new(tracker: ConnectionTracker, provider: Arc<dyn Eip1193Provider>) -> Self {
        Self { tracker, provider }
    }

    pub fn tracker(&self) -> &ConnectionTracker {
        &self.tracker
    }

    /// The extension's provider, used for switch and add-chain requests.
    pub fn provider(&self) -> &Arc<dyn Eip1193Provider> {
        &self.provider
    }

    pub fn address(&self) -> Option<Address> {
        self.tracker.snapshot().address
    }

    /// Chain id as already tracked by the connection layer. Synchronous:
    /// the extension reports changes into the tracker, nothing is fetched.
    pub fn chain_id(&self) -> Option<u64> {
        self.tracker.snapshot().chain_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracker_update_and_clear() {
        let tracker = ConnectionTracker::new();
        assert_eq!(tracker.snapshot(), TrackedConnection::default());

        tracker.update(TrackedConnection {
            connector: Some(INJECTED_CONNECTOR.to_string()),
            address: Some(Address::ZERO),
            chain_id: Some(31337),
            connected: true,
        });
        let snap = tracker.snapshot();
        assert!(snap.connected);
        assert_eq!(snap.chain_id, Some(31337));

        // Clones observe the same state.
        let other = tracker.clone();
        other.clear();
        assert_eq!(tracker.snapshot(), TrackedConnection::default());
    }
}
