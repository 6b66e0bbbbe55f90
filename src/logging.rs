use tracing_subscriber::EnvFilter;

/// Install the global fmt subscriber.
///
/// Filtering comes from `L360_LOG` (e.g. `l360_stats=debug,tower_http=info`),
/// defaulting to `info`.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_env("L360_LOG").unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}
