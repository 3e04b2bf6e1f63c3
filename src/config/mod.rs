//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (per-backend credential format checks)
//!     → ValidationReport (which connect actions are enabled)
//! ```
//!
//! # Design Decisions
//! - A malformed credential never fails the load; it disables that one
//!   backend's connect action and carries an inline message
//! - Format checks run before any network call is made

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{CredentialPair, MuxConfig};
pub use validation::{validate_credentials, ValidationReport};
