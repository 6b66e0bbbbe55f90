use l360_stats::logging::init_tracing;
use l360_stats::routes::{router, AppState};
use l360_stats::StatsConfig;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    init_tracing();

    let config = StatsConfig::from_env();
    let state = match AppState::from_config(&config) {
        Ok(state) => state,
        Err(e) => {
            error!(error = %e, "invalid configuration");
            std::process::exit(1);
        }
    };

    let app = router(state);

    let listener = match tokio::net::TcpListener::bind(config.bind_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(addr = %config.bind_addr, error = %e, "failed to bind");
            std::process::exit(1);
        }
    };
    info!(addr = %config.bind_addr, mode = ?config.mode, backend = %config.api_url, "stats server listening");

    if let Err(e) = axum::serve(listener, app).await {
        error!(error = %e, "server stopped");
    }
}
