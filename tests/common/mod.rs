//! Shared harness for integration tests: mock chains, mock SDKs, and a
//! fully wired hub.

// Each test binary uses a different slice of the harness.
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::{address, Address};
use tokio::time::timeout;

use wallet_mux::backend::injected::{TrackedConnection, INJECTED_CONNECTOR};
use wallet_mux::backend::mock::{
    MockChain, MockCustodialSdk, MockEmbeddedSdk, MockHostedSdk, MockProvider, MockReaderFactory,
};
use wallet_mux::config::{validate_credentials, CredentialPair, MuxConfig};
use wallet_mux::session::registry::SessionRegistry;
use wallet_mux::tx::dispatcher::ProviderWriteChannel;
use wallet_mux::{ConnectionTracker, WalletHub};

/// The test user's wallet address.
pub const USER: Address = address!("00000000000000000000000000000000000000aa");

pub const ANVIL: u64 = 31337;
pub const SEPOLIA: u64 = 11155111;

pub struct Harness {
    pub hub: WalletHub,
    pub anvil: Arc<MockChain>,
    pub sepolia: Arc<MockChain>,
    pub provider: Arc<MockProvider>,
    pub tracker: ConnectionTracker,
    pub embedded: Arc<MockEmbeddedSdk>,
    pub hosted: Arc<MockHostedSdk>,
    pub custodial: Arc<MockCustodialSdk>,
    pub readers: Arc<MockReaderFactory>,
}

/// Credentials that pass every format check.
pub fn valid_config() -> MuxConfig {
    MuxConfig {
        embedded: CredentialPair {
            app_id: "cl9f2k3j4h5g6f7d8s9a0".to_string(),
            app_key: "sk_live_01".to_string(),
        },
        hosted: CredentialPair {
            app_id: "3f2b8c1a-9d4e-4f6a-8b2c-1d3e5f7a9b0c".to_string(),
            app_key: "env_live_01".to_string(),
        },
        custodial: CredentialPair {
            app_id: "0123456789abcdef0123456789abcdef".to_string(),
            app_key: "ak_live_01".to_string(),
        },
    }
}

pub fn harness() -> Harness {
    harness_with_config(&valid_config())
}

pub fn harness_with_config(config: &MuxConfig) -> Harness {
    let anvil = MockChain::new(ANVIL);
    let sepolia = MockChain::new(SEPOLIA);
    let provider = MockProvider::new(vec![Arc::clone(&anvil), Arc::clone(&sepolia)], ANVIL);
    let tracker = ConnectionTracker::new();
    let embedded = MockEmbeddedSdk::new();
    let hosted = MockHostedSdk::new(Arc::clone(&provider));
    let custodial = MockCustodialSdk::new(
        vec![Arc::clone(&anvil), Arc::clone(&sepolia)],
        ANVIL,
    );
    let readers = MockReaderFactory::new(vec![Arc::clone(&anvil), Arc::clone(&sepolia)]);

    let registry = SessionRegistry::new(tracker.clone(), Arc::clone(&provider) as _)
        .with_embedded(Arc::clone(&embedded) as _)
        .with_hosted(Arc::clone(&hosted) as _)
        .with_custodial(Arc::clone(&custodial) as _);
    let shared = Arc::new(ProviderWriteChannel::tracked(
        Arc::clone(&provider) as _,
        tracker.clone(),
    ));
    let validation = validate_credentials(config);

    let hub = WalletHub::new(registry, validation, Arc::clone(&readers) as _, shared)
        .expect("hub construction");

    Harness {
        hub,
        anvil,
        sepolia,
        provider,
        tracker,
        embedded,
        hosted,
        custodial,
        readers,
    }
}

impl Harness {
    /// Attach the injected extension on the given chain.
    pub fn connect_injected(&mut self, chain_id: u64) {
        self.tracker.update(TrackedConnection {
            connector: Some(INJECTED_CONNECTOR.to_string()),
            address: Some(USER),
            chain_id: Some(chain_id),
            connected: true,
        });
        self.hub.refresh_election();
    }

    /// Block until the canonical chain id reaches `expected`.
    pub async fn wait_for_chain(&self, expected: Option<u64>) {
        let mut updates = self.hub.chain_updates();
        timeout(Duration::from_secs(1), updates.wait_for(|v| *v == expected))
            .await
            .expect("canonical chain id never reached expected value")
            .expect("chain resolver dropped");
    }
}
