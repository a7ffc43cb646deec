use tokio_util::sync::CancellationToken;

use ecomgo::{app, config::AppConfig, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // searches the working directory and its parents for .env
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "ecomgo=debug,axum=info,tower_http=info,sqlx=warn".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let config = AppConfig::from_env()?;
    tracing::info!(
        db_type = %config.database.kind,
        db_user = %config.database.user,
        db_host = %config.database.host,
        db_port = config.database.port,
        db_name = %config.database.name,
        has_password = !config.database.password.is_empty(),
        "configuration loaded"
    );

    let shutdown = CancellationToken::new();
    let state = AppState::init(&config, shutdown.clone()).await?;

    app::serve(app::build_app(state), &config.server, shutdown).await
}
