//! Canonical chain-id resolution.
//!
//! # Data Flow
//! ```text
//! elected backend (session registry)
//!     → resolver.rs (per-backend acquisition + event listeners)
//!     → canonical chain id (watch channel, last write wins)
//!     → consumers (network check, read poller, UI)
//! ```
//!
//! One resolver instance serves every consumer; competing ad hoc
//! resolutions of the same inputs are exactly what this module exists to
//! prevent.

pub mod resolver;
pub mod subscription;

pub use resolver::{ChainResolutionError, ChainResolver};
pub use subscription::SubscriptionGuard;
