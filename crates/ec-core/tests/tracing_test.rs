//! Tracing setup: repeated initialization keeps the first subscriber.

use ec_core::tracing_setup::{init_tracing, init_tracing_with_filter};

#[test]
fn initialization_is_idempotent() {
    init_tracing();
    init_tracing();
    init_tracing_with_filter("ec_core=trace");
    tracing::info!(target: "ec_core", "still logging after repeated setup");
    assert!(tracing::dispatcher::has_been_set());
}
