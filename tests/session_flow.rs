//! End-to-end session scenarios: election, chain resolution, and the
//! unified session summary.

mod common;

use std::time::Duration;

use alloy::primitives::U256;
use tokio::time::timeout;

use common::{ANVIL, SEPOLIA, USER};
use wallet_mux::backend::custodial::CustodialSdk;
use wallet_mux::backend::{BackendKind, ConnectionError};
use wallet_mux::{NetworkTarget, SwitchNetworkError};

#[tokio::test]
async fn test_injected_anvil_increment_scenario() {
    let mut h = common::harness();

    // Session just connected: chain id is still unresolved.
    assert_eq!(h.hub.chain_id(), None);
    assert!(!h.hub.is_correct_network());
    h.connect_injected(ANVIL);
    assert!(h.hub.any_connected());
    assert_eq!(h.hub.session().unwrap().backend, BackendKind::Injected);

    // Resolution lands and the network check flips.
    h.wait_for_chain(Some(ANVIL)).await;
    assert!(h.hub.is_correct_network());

    // Increment moves through confirming to confirmed and bumps the read
    // value by exactly one.
    let before = h.anvil.number();
    h.anvil.hold_receipts();
    let dispatcher = h.hub.dispatcher().clone();
    let backend = h.hub.active_backend().unwrap();
    let request = tokio::spawn(async move { dispatcher.increment(&backend).await });

    let mut states = h.hub.dispatcher().increment_state().subscribe();
    timeout(Duration::from_secs(1), states.wait_for(|s| s.is_confirming()))
        .await
        .expect("request never reached confirming")
        .unwrap();
    assert!(h.hub.increment_state().hash.is_some());

    h.anvil.release_receipts();
    request.await.unwrap().unwrap();
    assert!(h.hub.increment_state().is_success());
    assert_eq!(h.anvil.number(), before + U256::from(1u64));
    assert_eq!(h.hub.number(), Some(before + U256::from(1u64)));
}

#[tokio::test]
async fn test_custodial_without_switch_capability_scenario() {
    let mut h = common::harness();
    h.custodial.add_account("evm", USER);
    h.custodial.set_supports_switch(false);

    // Wallet sits on the local chain; the user targets the testnet.
    h.hub.connect_custodial().await.unwrap();
    h.wait_for_chain(Some(ANVIL)).await;
    h.hub.select_target(NetworkTarget::sepolia()).unwrap();

    assert!(!h.hub.is_correct_network());
    let session = h.hub.session().unwrap();
    assert_eq!(session.backend, BackendKind::Custodial);
    assert!(!session.capabilities.switch_network);

    // The coordinator reports the gap instead of pretending to switch.
    let err = h.hub.switch_network().await.unwrap_err();
    assert!(matches!(err, SwitchNetworkError::Unsupported));
    assert_eq!(h.hub.chain_id(), Some(ANVIL));
    assert!(h.hub.any_connected());
}

#[tokio::test]
async fn test_election_falls_back_down_the_priority_order() {
    let mut h = common::harness();

    h.hosted.set_primary_wallet(USER);
    h.hub.connect_hosted().await.unwrap();
    assert_eq!(h.hub.session().unwrap().backend, BackendKind::Hosted);

    // Embedded outranks hosted.
    h.embedded.provision_wallet(USER);
    h.hub.connect_embedded().await.unwrap();
    assert_eq!(h.hub.session().unwrap().backend, BackendKind::Embedded);

    // Disconnecting the active backend falls back to the next one.
    h.hub.disconnect().await.unwrap();
    assert_eq!(h.hub.session().unwrap().backend, BackendKind::Hosted);

    h.hub.disconnect().await.unwrap();
    assert!(h.hub.session().is_none());
    assert!(!h.hub.any_connected());
}

#[tokio::test]
async fn test_target_flip_needs_no_new_fetch() {
    let mut h = common::harness();
    h.connect_injected(ANVIL);
    h.wait_for_chain(Some(ANVIL)).await;
    assert!(h.hub.is_correct_network());

    let queries_before = h.provider.call_count("eth_chainId");
    h.hub.select_target(NetworkTarget::sepolia()).unwrap();

    // The check flips from the already-known chain id alone.
    assert!(!h.hub.is_correct_network());
    assert_eq!(h.hub.chain_id(), Some(ANVIL));
    assert_eq!(h.provider.call_count("eth_chainId"), queries_before);

    h.hub.select_target(NetworkTarget::anvil()).unwrap();
    assert!(h.hub.is_correct_network());
}

#[tokio::test]
async fn test_stale_resolution_discarded_when_election_changes() {
    let mut h = common::harness();

    // Hosted resolves against a provider sitting on the testnet chain.
    h.provider.set_chain(SEPOLIA);
    h.hosted.set_primary_wallet(USER);
    h.hub.connect_hosted().await.unwrap();
    h.wait_for_chain(Some(SEPOLIA)).await;

    // The custodial backend outranks hosted and sits on the local chain;
    // electing it tears the hosted listener down.
    h.custodial.add_account("evm", USER);
    h.hub.connect_custodial().await.unwrap();
    h.wait_for_chain(Some(ANVIL)).await;

    // A late event from the no-longer-active hosted provider must not
    // move the canonical chain id.
    h.provider.set_chain(SEPOLIA);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(h.hub.chain_id(), Some(ANVIL));
}

#[tokio::test]
async fn test_invalid_credentials_block_connect_before_any_call() {
    let mut config = common::valid_config();
    config.custodial.app_key = "pk_wrong".to_string();
    let mut h = common::harness_with_config(&config);

    assert!(!h.hub.connect_enabled(BackendKind::Custodial));
    assert!(h
        .hub
        .validation_message(BackendKind::Custodial)
        .unwrap()
        .contains("ak_"));
    // The other backends stay usable.
    assert!(h.hub.connect_enabled(BackendKind::Embedded));
    assert!(h.hub.connect_enabled(BackendKind::Injected));

    let err = h.hub.connect_custodial().await.unwrap_err();
    assert!(matches!(err, ConnectionError::ConfigBlocked { .. }));
    // The SDK was never asked to log in.
    assert!(!h.custodial.authenticated());
}

#[tokio::test]
async fn test_custodial_disconnect_clears_session_even_if_logout_fails() {
    let mut h = common::harness();
    h.custodial.add_account("evm", USER);
    h.hub.connect_custodial().await.unwrap();
    assert_eq!(h.hub.session().unwrap().backend, BackendKind::Custodial);

    h.custodial.set_fail_logout();
    h.hub.disconnect().await.unwrap();
    assert!(h.hub.session().is_none());
    assert!(!h.hub.any_connected());
}
