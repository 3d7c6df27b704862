//! Crate-level integration tests: the HTTP pipeline against a mock server,
//! the full wizard flow over a mocked service, and property checks for the
//! scoring heuristics.

mod wizard_flow;

/// Opt-in tracing output for debugging test failures (`RUST_LOG=debug`).
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
