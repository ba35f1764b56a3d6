//! Tracing initialization.
//!
//! Binaries embedding the engine call [`init_tracing`] once at startup; tests
//! use [`init_tracing_with_filter`] so output goes through the test writer.

use std::sync::Once;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

static INIT: Once = Once::new();

/// Initialize structured logging for the engine.
///
/// Reads the `EC_LOG` environment variable for per-target log levels, e.g.
/// `EC_LOG=ec_consensus=debug,ec_ledger=info`. Falls back to `ec=info` when
/// unset or invalid.
///
/// Idempotent: only the first call installs a subscriber.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_env("EC_LOG").unwrap_or_else(|_| EnvFilter::new("ec=info"));

        let _ = tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_file(true)
                    .with_line_number(true),
            )
            .with(filter)
            .try_init();
        tracing::debug!("tracing initialized");
    });
}

/// Initialize tracing with a custom filter string (for tests or embedding).
///
/// Silently keeps an already-installed subscriber.
pub fn init_tracing_with_filter(filter: &str) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(true)
        .with_test_writer()
        .try_init();
}
