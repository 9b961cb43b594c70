// Logging setup shared by every worker role.

use tracing_subscriber::EnvFilter;

/// Initialize the tracing subscriber. Level defaults to INFO and can be
/// overridden via `RUST_LOG`.
pub fn init() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .init();
}
