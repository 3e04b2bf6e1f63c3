//! Network targets and the switch coordinator.

pub mod switch;
pub mod targets;

pub use switch::{switch_network, SwitchNetworkError};
pub use targets::{counter_address, NetworkTarget};
