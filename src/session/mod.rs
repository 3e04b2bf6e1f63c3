//! Session election and the unified wallet session summary.

pub mod registry;

pub use registry::{AuthFlags, SessionRegistry, WalletSession};
