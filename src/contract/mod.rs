//! Counter contract surface.
//!
//! The crate talks to exactly one contract. Its ABI is fixed here and the
//! per-network deployment addresses live in [`crate::network::targets`].

use alloy::primitives::{Bytes, U256};
use alloy::sol;
use alloy::sol_types::SolCall;

sol! {
    /// The Counter contract.
    interface ICounter {
        function number() external view returns (uint256);
        function increment() external;
        function setNumber(uint256 newNumber) external;
    }
}

/// A mutating Counter call, ready to be encoded for any signing path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CounterWrite {
    Increment,
    SetNumber(U256),
}

impl CounterWrite {
    /// ABI-encoded calldata for this call.
    pub fn calldata(&self) -> Bytes {
        match self {
            Self::Increment => ICounter::incrementCall {}.abi_encode().into(),
            Self::SetNumber(value) => ICounter::setNumberCall { newNumber: *value }
                .abi_encode()
                .into(),
        }
    }

    /// Function name, for logs and metrics labels.
    pub fn function_name(&self) -> &'static str {
        match self {
            Self::Increment => "increment",
            Self::SetNumber(_) => "setNumber",
        }
    }
}

/// Calldata for the read-only `number()` call.
pub fn number_calldata() -> Bytes {
    ICounter::numberCall {}.abi_encode().into()
}

/// Decode the return data of a `number()` call.
pub fn decode_number(data: &[u8]) -> Result<U256, alloy::sol_types::Error> {
    ICounter::numberCall::abi_decode_returns(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_selectors() {
        // Well-known selectors for the Counter template contract.
        assert_eq!(&CounterWrite::Increment.calldata()[..4], [0xd0, 0x9d, 0xe0, 0x8a]);
        let set = CounterWrite::SetNumber(U256::from(42)).calldata();
        assert_eq!(&set[..4], [0x3f, 0xb5, 0xc1, 0xcb]);
        // One uint256 argument after the selector.
        assert_eq!(set.len(), 4 + 32);
    }

    #[test]
    fn test_number_call_shape() {
        let data = number_calldata();
        assert_eq!(&data[..4], [0x83, 0x81, 0xf5, 0x8a]);
        assert_eq!(data.len(), 4);

        let ret = U256::from(7u64).to_be_bytes::<32>();
        assert_eq!(decode_number(&ret).unwrap(), U256::from(7u64));
    }
}
