use anyhow::Context;
use tower_http::services::ServeDir;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use backend::config::{LogFormat, StoreBackend};
use backend::{router, AppState, Config};

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "backend=debug,tower_http=debug".into());
    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;
    init_tracing(config.log_format);

    let state = AppState::from_config(&config).context("failed to open the task store")?;
    match &config.store {
        StoreBackend::Redis { url } => tracing::info!(redis_url = %url, "using redis store"),
        StoreBackend::Memory => tracing::warn!("using in-memory store, data is lost on exit"),
    }

    let app = router(state).fallback_service(ServeDir::new(&config.static_dir));

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    tracing::info!(
        addr = %config.bind_addr,
        policy = ?config.access_policy,
        "server running"
    );
    axum::serve(listener, app).await?;
    Ok(())
}
