use market_brief_orchestrator::{config::PipelineConfig, graph::Workflow};
use tracing::info;
use tracing_subscriber::EnvFilter;

const DEFAULT_QUERY: &str = "What's our risk exposure in Asia tech stocks today, and highlight any earnings surprises?";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let query = if args.is_empty() {
        DEFAULT_QUERY.to_string()
    } else {
        args.join(" ")
    };

    let config = PipelineConfig::from_env();
    let workflow = Workflow::from_config(&config)?;

    info!(query = %query, "Running workflow");

    match workflow.run(&query).await {
        Ok(outcome) => {
            println!("\n=== RESPONSE ===");
            println!("{}", outcome.response());
            println!("\nRun ID: {}", outcome.run_id);
            println!("Elapsed: {} ms", outcome.elapsed_ms);
            println!("\nPath:");
            for (i, node) in outcome.path.iter().enumerate() {
                println!("  {}: {}", i + 1, node);
            }
            if let Some(scores) = &outcome.state.retrieval_scores {
                println!("\nRetrieval scores: {:?}", scores);
            }
            Ok(())
        }
        Err(e) => {
            eprintln!("Workflow failed: {}", e);
            Err(Box::new(e) as Box<dyn std::error::Error>)
        }
    }
}
