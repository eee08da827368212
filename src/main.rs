use std::sync::Arc;

use imagegen_router::api::routes::{router, AppState};
use imagegen_router::config::Config;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env first so RUST_LOG from it applies
    Config::dotenv_load();
    tracing_subscriber::fmt::init();

    let config = Config::new()?;
    Config::print_env_vars();

    // Backend settings are resolved from the environment on every request
    let state = Arc::new(AppState::from_env());
    let app = router(state);

    let socket_address = config.socket_addr();
    tracing::info!("listening on {}", socket_address);
    axum::Server::bind(&socket_address)
        .serve(app.into_make_service())
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("shutting down");
        })
        .await?;
    Ok(())
}
