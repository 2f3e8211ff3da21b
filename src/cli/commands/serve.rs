use crate::app;
use crate::config;

pub async fn handle() -> anyhow::Result<()> {
    let config = config::config();
    tracing::info!("Starting ChatBI API in {:?} mode", config.environment);
    app::serve(config).await
}
