//! Command-line surface: run one full analysis for a ticker and print the
//! result as JSON.
//!
//! Required environment: FMP_API_KEY. Optional: STOCKDATA_API_TOKEN
//! (secondary quote provider), RESEARCH_BACKEND_URL or OPENAI_API_BASE /
//! OPENAI_MODEL / OPENAI_API_KEY depending on the research mode.

use clap::Parser;
use valuation_orchestrator::{ResearchMode, ValuationOrchestrator};

#[derive(Parser, Debug)]
#[command(name = "ruleone", about = "Rule #1 valuation and Fisher scorecard for a stock ticker")]
struct Args {
    /// Ticker symbol to analyze (e.g. AAPL)
    symbol: String,

    /// Growth rate override in percent (default: the conservative minimum
    /// of the reported growth rates)
    #[arg(long)]
    growth_rate: Option<f64>,

    /// Skip the qualitative scorecard (no research call)
    #[arg(long)]
    skip_research: bool,

    /// Research the qualitative criteria with a direct LLM call instead of
    /// the research backend
    #[arg(long)]
    llm: bool,

    /// Drop any cached research for this symbol before analyzing
    #[arg(long)]
    refresh_research: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = Args::parse();
    let mode = if args.llm {
        ResearchMode::Llm
    } else {
        ResearchMode::Backend
    };

    let orchestrator = ValuationOrchestrator::from_env(mode)?;
    if args.refresh_research {
        orchestrator.invalidate_research(&args.symbol);
    }

    let analysis = orchestrator
        .analyze(&args.symbol, args.growth_rate, !args.skip_research)
        .await?;

    println!("{}", serde_json::to_string_pretty(&analysis)?);
    Ok(())
}
