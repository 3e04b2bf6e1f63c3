//! Wallet backend integration subsystem.
//!
//! # Data Flow
//! ```text
//! host application SDK handles (black boxes)
//!     → injected.rs (shared connection layer tracking)
//!     → embedded.rs / hosted.rs / custodial.rs (per-SDK seams)
//!     → ActiveBackend (the elected backend + its live handles)
//!     → chain resolver / switch coordinator / transaction dispatcher
//! ```
//!
//! Every backend satisfies the same capability surface — address, chain
//! id acquisition, optional network switch, sign-and-send — and the rest
//! of the crate dispatches over the closed [`BackendKind`] tag rather
//! than scattering per-backend conditionals.

pub mod custodial;
pub mod embedded;
pub mod hosted;
pub mod injected;
pub mod mock;
pub mod provider;

use std::fmt;

use alloy::primitives::Address;
use thiserror::Error;

pub use custodial::CustodialBackend;
pub use embedded::EmbeddedBackend;
pub use hosted::HostedBackend;
pub use injected::{ConnectionTracker, InjectedBackend, TrackedConnection};

/// The four wallet-connection mechanisms, as a closed tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    Injected,
    Embedded,
    Hosted,
    Custodial,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Injected => "injected",
            Self::Embedded => "embedded",
            Self::Hosted => "hosted",
            Self::Custodial => "custodial",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Backend-reported support for optional operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities {
    pub switch_network: bool,
    pub add_network: bool,
}

/// Opaque failure reported by a wallet SDK call.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct SdkError(pub String);

/// A backend's login or logout threw. Never fatal for other backends.
#[derive(Debug, Clone, Error)]
pub enum ConnectionError {
    #[error("{backend} login failed: {message}")]
    LoginFailed { backend: BackendKind, message: String },

    #[error("{backend} logout failed: {message}")]
    LogoutFailed { backend: BackendKind, message: String },

    /// Credentials failed their format check; connect is disabled before
    /// any network call is made.
    #[error("{backend} connect disabled: {message}")]
    ConfigBlocked { backend: BackendKind, message: String },

    #[error("{backend} backend is not configured")]
    NotConfigured { backend: BackendKind },
}

/// The elected backend together with the live handles needed to serve it.
///
/// At most one of these exists per evaluated session instant; components
/// dispatch over it with a single `match`.
#[derive(Clone)]
pub enum ActiveBackend {
    Injected(InjectedBackend),
    Embedded(EmbeddedBackend),
    Hosted(HostedBackend),
    Custodial(CustodialBackend),
}

impl ActiveBackend {
    pub fn kind(&self) -> BackendKind {
        match self {
            Self::Injected(_) => BackendKind::Injected,
            Self::Embedded(_) => BackendKind::Embedded,
            Self::Hosted(_) => BackendKind::Hosted,
            Self::Custodial(_) => BackendKind::Custodial,
        }
    }

    pub fn address(&self) -> Option<Address> {
        match self {
            Self::Injected(b) => b.address(),
            Self::Embedded(b) => b.address(),
            Self::Hosted(b) => b.address(),
            Self::Custodial(b) => b.address(),
        }
    }

    /// Optional-operation support as the backend advertises it. The
    /// provider-routed backends can always attempt switch and add-chain;
    /// the custodial connector decides for itself and never adds chains.
    pub fn capabilities(&self) -> Capabilities {
        match self {
            Self::Injected(_) | Self::Embedded(_) | Self::Hosted(_) => Capabilities {
                switch_network: true,
                add_network: true,
            },
            Self::Custodial(b) => Capabilities {
                switch_network: b.supports_switch_network(),
                add_network: false,
            },
        }
    }
}

impl fmt::Debug for ActiveBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActiveBackend")
            .field("kind", &self.kind())
            .field("address", &self.address())
            .finish()
    }
}
