use tracing::info;
use tracing_subscriber::EnvFilter;

use matcher_service::{config::MatcherConfig, wiring};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = MatcherConfig::load()?;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    info!("starting route-pooling matcher service");

    let workers = wiring::start(&config).await?;

    tokio::signal::ctrl_c()
        .await
        .expect("failed to install CTRL+C signal handler");
    info!("shutdown signal received");

    workers.shutdown().await;
    info!("matcher service shut down cleanly");
    Ok(())
}
