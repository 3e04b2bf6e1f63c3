//! Structured logging initialization.
//!
//! All modules log through `tracing` with structured fields; this is the
//! one place a subscriber gets installed. Host applications that bring
//! their own subscriber simply skip calling this.

use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber.
///
/// Honors `RUST_LOG` when set, falling back to `default_level`
/// (e.g. `"wallet_mux=info"`). Safe to call more than once; later calls
/// are no-ops.
pub fn init_logging(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        init_logging("wallet_mux=debug");
        init_logging("wallet_mux=info");
    }
}
