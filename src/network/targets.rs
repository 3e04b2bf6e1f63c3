//! Selectable network definitions and contract deployments.
//!
//! Exactly two networks are supported: the local devnet and the public
//! testnet. The Counter deployment addresses are fixed per chain id;
//! looking up any other id is an explicit error, not a fallback.

use alloy::primitives::{address, Address};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Local devnet chain id.
pub const LOCAL_CHAIN_ID: u64 = 31337;

/// Public testnet chain id.
pub const TESTNET_CHAIN_ID: u64 = 11155111;

/// Native currency of a network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeCurrency {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

impl NativeCurrency {
    fn ether() -> Self {
        Self {
            name: "Ether".to_string(),
            symbol: "ETH".to_string(),
            decimals: 18,
        }
    }
}

/// Block explorer entry carried into add-chain requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockExplorer {
    pub name: String,
    pub url: String,
}

/// A selectable blockchain network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkTarget {
    pub id: u64,
    pub name: String,
    pub rpc_url: String,
    pub native_currency: NativeCurrency,
    pub block_explorer: Option<BlockExplorer>,
}

impl NetworkTarget {
    /// The local development network.
    pub fn anvil() -> Self {
        Self {
            id: LOCAL_CHAIN_ID,
            name: "Anvil".to_string(),
            rpc_url: "http://127.0.0.1:8545".to_string(),
            native_currency: NativeCurrency::ether(),
            block_explorer: Some(BlockExplorer {
                name: "Anvil".to_string(),
                url: "http://localhost:8545".to_string(),
            }),
        }
    }

    /// The public test network.
    pub fn sepolia() -> Self {
        Self {
            id: TESTNET_CHAIN_ID,
            name: "Sepolia".to_string(),
            rpc_url: "https://rpc.sepolia.org".to_string(),
            native_currency: NativeCurrency::ether(),
            block_explorer: Some(BlockExplorer {
                name: "Etherscan".to_string(),
                url: "https://sepolia.etherscan.io".to_string(),
            }),
        }
    }
}

/// No Counter deployment is known for this chain id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("no contract addresses configured for chain {0}")]
pub struct AddressLookupError(pub u64);

/// Counter deployment address for a chain id.
pub fn counter_address(chain_id: u64) -> Result<Address, AddressLookupError> {
    match chain_id {
        LOCAL_CHAIN_ID => Ok(address!("5fbdb2315678afecb367f032d93f642f64180aa3")),
        TESTNET_CHAIN_ID => Ok(address!("594740950525cd4dd311bbbb73ee079cdc01205b")),
        other => Err(AddressLookupError(other)),
    }
}
