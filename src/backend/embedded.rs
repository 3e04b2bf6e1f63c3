//! Embedded-wallet backend.
//!
//! The embedded SDK authenticates the user and provisions a wallet list,
//! but shares the injected extension's network context: chain id comes
//! from the connection tracker and switch requests go through the shared
//! provider.

use std::sync::Arc;

use alloy::primitives::Address;
use async_trait::async_trait;

use crate::backend::injected::ConnectionTracker;
use crate::backend::provider::Eip1193Provider;
use crate::backend::ConnectionError;

/// Embedded-wallet SDK surface (black box).
#[async_trait]
pub trait EmbeddedSdk: Send + Sync {
    /// Open the SDK's login flow and wait for it to settle.
    async fn login(&self) -> Result<(), ConnectionError>;

    async fn logout(&self) -> Result<(), ConnectionError>;

    fn authenticated(&self) -> bool;

    /// Wallets provisioned for the authenticated user.
    fn wallets(&self) -> Vec<Address>;
}

/// The embedded backend: SDK auth state plus the shared network context.
#[derive(Clone)]
pub struct EmbeddedBackend {
    sdk: Arc<dyn EmbeddedSdk>,
    tracker: ConnectionTracker,
    provider: Arc<dyn Eip1193Provider>,
}

impl EmbeddedBackend {
    pub fn new(
        sdk: Arc<dyn EmbeddedSdk>,
        tracker: ConnectionTracker,
        provider: Arc<dyn Eip1193Provider>,
    ) -> Self {
        Self { sdk, tracker, provider }
    }

    pub fn sdk(&self) -> &Arc<dyn EmbeddedSdk> {
        &self.sdk
    }

    pub fn tracker(&self) -> &ConnectionTracker {
        &self.tracker
    }

    /// The shared provider; embedded switch requests ride through it.
    pub fn provider(&self) -> &Arc<dyn Eip1193Provider> {
        &self.provider
    }

    pub fn address(&self) -> Option<Address> {
        self.sdk.wallets().first().copied()
    }

    /// Embedded wallets run on the same underlying network context as the
    /// injected extension, so the tracked chain id is authoritative.
    pub fn chain_id(&self) -> Option<u64> {
        self.tracker.snapshot().chain_id
    }
}
