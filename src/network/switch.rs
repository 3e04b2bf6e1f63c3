//! Network switch coordination.
//!
//! # Responsibilities
//! - Request a network change on whichever backend is active
//! - Recover from "unknown chain" with a single add-then-retry
//! - Report a capability gap instead of silently succeeding
//!
//! One add-then-retry is the only automatic recovery; every other failure
//! is terminal for the attempt and surfaces to the user.

use std::sync::Arc;

use serde_json::{json, Value};
use thiserror::Error;

use crate::backend::provider::Eip1193Provider;
use crate::backend::{ActiveBackend, SdkError};
use crate::chain::ChainResolver;
use crate::network::targets::NetworkTarget;
use crate::observability::metrics;

/// Network switch failure. Only `AddRejected`/`RetryFailed` involve the
/// add-chain recovery path; everything here is terminal for the attempt.
#[derive(Debug, Clone, Error)]
pub enum SwitchNetworkError {
    #[error("no backend is active")]
    NoActiveBackend,

    /// The wallet did not know the chain and rejected adding it.
    #[error("wallet rejected adding chain {chain_id}: {message}")]
    AddRejected { chain_id: u64, message: String },

    /// The chain was added but the single retry still failed.
    #[error("switch to chain {chain_id} failed after adding it: {message}")]
    RetryFailed { chain_id: u64, message: String },

    /// Any switch rejection other than the unknown-chain code.
    #[error("switch to chain {chain_id} failed: {message}")]
    Rejected { chain_id: u64, message: String },

    /// The active wallet advertises no switch capability.
    #[error("network switching is not supported by this wallet")]
    Unsupported,

    #[error("wallet SDK error: {0}")]
    Sdk(#[from] SdkError),
}

/// Hex-encode a chain id the way providers expect it.
pub fn hex_chain_id(chain_id: u64) -> String {
    format!("{chain_id:#x}")
}

/// Request a network change to `target` on the active backend.
pub async fn switch_network(
    backend: &ActiveBackend,
    target: &NetworkTarget,
    resolver: &ChainResolver,
) -> Result<(), SwitchNetworkError> {
    let kind = backend.kind();
    let result = match backend {
        ActiveBackend::Injected(b) => switch_via_provider(b.provider(), target).await,
        ActiveBackend::Embedded(b) => switch_via_provider(b.provider(), target).await,
        ActiveBackend::Hosted(b) => {
            let provider = b
                .provider()
                .await
                .map_err(SwitchNetworkError::Sdk)?;
            switch_via_provider(&provider, target).await?;
            // The hosted provider's chainChanged can trail the switch;
            // re-read the chain id immediately instead of waiting on it.
            resolver.force_refresh(backend).await;
            Ok(())
        }
        ActiveBackend::Custodial(b) => {
            if !b.supports_switch_network() {
                Err(SwitchNetworkError::Unsupported)
            } else {
                b.switch_network(target.id).await.map_err(Into::into)
            }
        }
    };

    match &result {
        Ok(()) => {
            metrics::record_switch_attempt(kind.as_str(), "ok");
            tracing::info!(backend = %kind, chain_id = target.id, "network switch succeeded");
        }
        Err(err) => {
            metrics::record_switch_attempt(kind.as_str(), "error");
            tracing::warn!(backend = %kind, chain_id = target.id, error = %err, "network switch failed");
        }
    }
    result
}

/// The provider-routed switch path: switch, add the chain on the
/// unknown-chain code, then retry the switch exactly once.
async fn switch_via_provider(
    provider: &Arc<dyn Eip1193Provider>,
    target: &NetworkTarget,
) -> Result<(), SwitchNetworkError> {
    let switch_params = json!([{ "chainId": hex_chain_id(target.id) }]);

    let err = match provider
        .request("wallet_switchEthereumChain", switch_params.clone())
        .await
    {
        Ok(_) => return Ok(()),
        Err(err) => err,
    };

    if !err.is_unknown_chain() {
        return Err(SwitchNetworkError::Rejected {
            chain_id: target.id,
            message: err.to_string(),
        });
    }

    tracing::info!(chain_id = target.id, "chain unknown to wallet, adding it");
    provider
        .request("wallet_addEthereumChain", json!([add_chain_params(target)]))
        .await
        .map_err(|err| SwitchNetworkError::AddRejected {
            chain_id: target.id,
            message: err.to_string(),
        })?;

    provider
        .request("wallet_switchEthereumChain", switch_params)
        .await
        .map(|_| ())
        .map_err(|err| SwitchNetworkError::RetryFailed {
            chain_id: target.id,
            message: err.to_string(),
        })
}

/// Full chain metadata for a `wallet_addEthereumChain` request.
fn add_chain_params(target: &NetworkTarget) -> Value {
    let mut params = json!({
        "chainId": hex_chain_id(target.id),
        "chainName": target.name,
        "nativeCurrency": {
            "name": target.native_currency.name,
            "symbol": target.native_currency.symbol,
            "decimals": target.native_currency.decimals,
        },
        "rpcUrls": [target.rpc_url],
    });
    if let Some(explorer) = &target.block_explorer {
        params["blockExplorerUrls"] = json!([explorer.url]);
    }
    params
}

#[cfg(test)]
mod tests {
    use super::*;

    use alloy::primitives::Address;
    use tokio::time::{timeout, Duration};

    use crate::backend::hosted::{HostedBackend, HostedSdk};
    use crate::backend::injected::{
        ConnectionTracker, InjectedBackend, TrackedConnection, INJECTED_CONNECTOR,
    };
    use crate::backend::mock::{MockChain, MockCustodialSdk, MockHostedSdk, MockProvider};
    use crate::backend::CustodialBackend;

    fn injected(provider: Arc<MockProvider>) -> ActiveBackend {
        let tracker = ConnectionTracker::new();
        tracker.update(TrackedConnection {
            connector: Some(INJECTED_CONNECTOR.to_string()),
            address: Some(Address::ZERO),
            chain_id: Some(31337),
            connected: true,
        });
        ActiveBackend::Injected(InjectedBackend::new(tracker, provider))
    }

    #[tokio::test]
    async fn test_switch_known_chain() {
        let provider = MockProvider::new(
            vec![MockChain::new(31337), MockChain::new(11155111)],
            31337,
        );
        let backend = injected(Arc::clone(&provider));
        let resolver = ChainResolver::new();

        switch_network(&backend, &NetworkTarget::sepolia(), &resolver)
            .await
            .unwrap();
        assert_eq!(provider.current_chain(), 11155111);
        assert_eq!(provider.call_count("wallet_addEthereumChain"), 0);
    }

    #[tokio::test]
    async fn test_unknown_chain_adds_then_retries_once() {
        let provider = MockProvider::new(vec![MockChain::new(31337)], 31337);
        let backend = injected(Arc::clone(&provider));
        let resolver = ChainResolver::new();

        switch_network(&backend, &NetworkTarget::sepolia(), &resolver)
            .await
            .unwrap();
        assert_eq!(provider.call_count("wallet_addEthereumChain"), 1);
        assert_eq!(provider.call_count("wallet_switchEthereumChain"), 2);
        assert_eq!(provider.current_chain(), 11155111);
    }

    #[tokio::test]
    async fn test_no_second_add_retry_cycle() {
        let provider = MockProvider::new(vec![MockChain::new(31337)], 31337);
        // Adding succeeds but the wallet keeps rejecting the switch with
        // the unknown-chain code.
        provider.reject_method("wallet_switchEthereumChain", 4902, "Unrecognized chain ID");
        let backend = injected(Arc::clone(&provider));
        let resolver = ChainResolver::new();

        let err = switch_network(&backend, &NetworkTarget::sepolia(), &resolver)
            .await
            .unwrap_err();
        assert!(matches!(err, SwitchNetworkError::RetryFailed { .. }));
        assert_eq!(provider.call_count("wallet_addEthereumChain"), 1);
        assert_eq!(provider.call_count("wallet_switchEthereumChain"), 2);
    }

    #[tokio::test]
    async fn test_user_rejection_is_terminal() {
        let provider = MockProvider::new(vec![MockChain::new(31337)], 31337);
        provider.reject_method("wallet_switchEthereumChain", 4001, "User rejected the request");
        let backend = injected(Arc::clone(&provider));
        let resolver = ChainResolver::new();

        let err = switch_network(&backend, &NetworkTarget::sepolia(), &resolver)
            .await
            .unwrap_err();
        assert!(matches!(err, SwitchNetworkError::Rejected { .. }));
        assert_eq!(provider.call_count("wallet_addEthereumChain"), 0);
        assert_eq!(provider.call_count("wallet_switchEthereumChain"), 1);
    }

    #[tokio::test]
    async fn test_hosted_switch_forces_refresh_without_event() {
        let provider = MockProvider::new(
            vec![MockChain::new(31337), MockChain::new(11155111)],
            31337,
        );
        // A silent wallet: no chainChanged notifications at all.
        provider.set_emit_events(false);
        let hosted = MockHostedSdk::new(Arc::clone(&provider));
        hosted.login().await.unwrap();
        hosted.set_primary_wallet(Address::ZERO);
        let backend = ActiveBackend::Hosted(HostedBackend::new(hosted));

        let resolver = ChainResolver::new();
        resolver.set_active(Some(backend.clone()));
        let mut rx = resolver.subscribe();
        timeout(Duration::from_secs(1), rx.wait_for(|v| *v == Some(31337)))
            .await
            .unwrap()
            .unwrap();

        switch_network(&backend, &NetworkTarget::sepolia(), &resolver)
            .await
            .unwrap();
        // The canonical chain id moved despite no event firing.
        assert_eq!(resolver.chain_id(), Some(11155111));
    }

    #[tokio::test]
    async fn test_custodial_without_capability_reports_unsupported() {
        let sdk = MockCustodialSdk::new(vec![MockChain::new(31337)], 31337);
        sdk.set_supports_switch(false);
        let backend =
            ActiveBackend::Custodial(CustodialBackend::new(sdk, ConnectionTracker::new()));
        let resolver = ChainResolver::new();

        let err = switch_network(&backend, &NetworkTarget::sepolia(), &resolver)
            .await
            .unwrap_err();
        assert!(matches!(err, SwitchNetworkError::Unsupported));
    }

    #[tokio::test]
    async fn test_custodial_with_capability_switches() {
        let sdk = MockCustodialSdk::new(
            vec![MockChain::new(31337), MockChain::new(11155111)],
            31337,
        );
        sdk.set_supports_switch(true);
        let backend = ActiveBackend::Custodial(CustodialBackend::new(
            Arc::clone(&sdk) as Arc<dyn crate::backend::custodial::CustodialSdk>,
            ConnectionTracker::new(),
        ));
        let resolver = ChainResolver::new();

        switch_network(&backend, &NetworkTarget::sepolia(), &resolver)
            .await
            .unwrap();
        assert_eq!(sdk.current_chain(), 11155111);
    }
}
