//! Telemetry helpers for structured logging and tracing.

use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "prometheus_handoff_queue=info";

/// Initialize tracing/telemetry. Users can install their own subscriber; this
/// helper installs an env-based subscriber if none is set, falling back to
/// `prometheus_handoff_queue=info` when `RUST_LOG` is absent.
pub fn init_tracing() {
    if tracing::dispatcher::has_been_set() {
        return;
    }
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
