use tracing_subscriber::EnvFilter;

use jobly_api::app::app;
use jobly_api::config;
use jobly_api::database::DatabaseManager;
use jobly_api::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL and SECRET_KEY
    let _ = dotenvy::dotenv();

    let config = config::config();

    let default_filter = if jobly_api::is_development!() {
        "jobly_api=debug,tower_http=info"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
        .init();

    tracing::info!("Starting Jobly API in {:?} mode", config.environment);
    if jobly_api::is_production!() && config.security.jwt_secret.is_empty() {
        anyhow::bail!("SECRET_KEY must be set in production");
    }
    if jobly_api::is_development!() {
        tracing::warn!("Using development secret and password hash cost");
    }

    let pool = DatabaseManager::connect(&config.database).await?;
    if config.database.run_migrations {
        DatabaseManager::run_migrations(&pool).await?;
    }

    let bind_addr = format!("0.0.0.0:{}", config.api.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("Jobly API listening on http://{}", bind_addr);

    axum::serve(listener, app(AppState::new(pool))).await?;
    Ok(())
}
