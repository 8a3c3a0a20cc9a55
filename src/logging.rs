//! Log output for applications and the test suite.

use tracing_subscriber::EnvFilter;

/// Setup logging of events reported by contexts and their engines.
///
/// Use the RUST_LOG environment variable to override the defaults.
///
/// E.g. To enable debug level logging:
///   RUST_LOG=DEBUG
///
/// Or to see every transaction being issued and delivered:
///   RUST_LOG=domain_context::context=TRACE
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_thread_ids(true)
        .without_time()
        .try_init()
        .ok();
}
