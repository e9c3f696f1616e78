use trial_queries::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if it exists
    dotenvy::dotenv().ok();

    // Default to Info, keep sqlx quiet; RUST_LOG overrides both
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .filter_module("sqlx", log::LevelFilter::Warn)
        .parse_default_env()
        .init();

    let config = AppConfig::load()?;
    log::info!(
        "Configuration loaded: server={}:{} backend={:?}",
        config.server.host,
        config.server.port,
        config.database.backend
    );

    trial_queries::run_server(config).await
}
