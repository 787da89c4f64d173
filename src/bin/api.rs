use market_brief_orchestrator::{api::start_server, config::PipelineConfig, graph::Workflow};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = PipelineConfig::from_env();

    info!("Market Brief Orchestrator - API Server");
    info!(
        port = config.port,
        portfolio = %config.portfolio_path.display(),
        daily_log = %config.previous_portfolio_path.display(),
        "Configuration loaded"
    );

    let workflow = Arc::new(Workflow::from_config(&config)?);

    info!("Starting API server...");
    start_server(workflow, config.port).await?;

    Ok(())
}
