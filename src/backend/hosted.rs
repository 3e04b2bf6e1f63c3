//! Hosted-auth backend.
//!
//! The hosted SDK authenticates the user and exposes the primary wallet's
//! raw EIP-1193 provider. Chain ids arrive hex-encoded from `eth_chainId`
//! and `chainChanged`; signing goes through the same provider.

use std::sync::Arc;

use alloy::primitives::Address;
use async_trait::async_trait;

use crate::backend::provider::Eip1193Provider;
use crate::backend::{ConnectionError, SdkError};

/// Hosted-auth SDK surface (black box).
#[async_trait]
pub trait HostedSdk: Send + Sync {
    async fn login(&self) -> Result<(), ConnectionError>;

    async fn logout(&self) -> Result<(), ConnectionError>;

    fn authenticated(&self) -> bool;

    /// The user's primary wallet, once provisioned.
    fn primary_wallet(&self) -> Option<Address>;

    /// Raw provider of the primary wallet. Fails when no wallet is
    /// provisioned yet.
    async fn provider(&self) -> Result<Arc<dyn Eip1193Provider>, SdkError>;
}

#[derive(Clone)]
pub struct HostedBackend {
    sdk: Arc<dyn HostedSdk>,
}

impl HostedBackend {
    pub fn new(sdk: Arc<dyn HostedSdk>) -> Self {
        Self { sdk }
    }

    pub fn sdk(&self) -> &Arc<dyn HostedSdk> {
        &self.sdk
    }

    pub fn address(&self) -> Option<Address> {
        self.sdk.primary_wallet()
    }

    pub async fn provider(&self) -> Result<Arc<dyn Eip1193Provider>, SdkError> {
        self.sdk.provider().await
    }
}
