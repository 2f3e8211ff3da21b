use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up AUTH_WHITELIST, LLM_BASE_URL, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Initialize configuration (this loads the config singleton)
    let config = chatbi_api::config::config();
    tracing::info!("Starting ChatBI API in {:?} mode", config.environment);
    if chatbi_api::is_development!() {
        tracing::debug!("Effective configuration: {:?}", config);
    }

    chatbi_api::app::serve(config).await
}
