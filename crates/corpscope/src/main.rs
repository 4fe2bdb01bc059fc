use anyhow::{Context, Result};
use clap::Parser;

const DEFAULT_CONFIG: &str = "config/corpscope.toml";

#[derive(Parser, Debug)]
#[command(
    name = "corpscope",
    about = "Research a company: AI summary, recent news and current stock quote"
)]
struct Cli {
    /// Company name, e.g. "Petrobras"
    company: String,

    /// Path to configuration file
    #[arg(short, long)]
    config: Option<String>,

    /// Print single-line JSON
    #[arg(long)]
    compact: bool,

    /// Include per-source status and timings
    #[arg(long)]
    report: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Loads .env first, so RUST_LOG may come from there
    tracing_subscriber::fmt()
        .with_env_filter(corpscope::log_filter(None))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // An explicit --config must exist; the default path may be absent.
    let (config_path, required) = match &cli.config {
        Some(path) => (path.as_str(), true),
        None => (DEFAULT_CONFIG, false),
    };
    let config = corpscope::load_config(config_path, required)?.with_env_overrides();

    let orchestrator =
        corpscope::build_orchestrator(&config).context("Failed to build orchestrator")?;

    let output = if cli.report {
        let report = orchestrator
            .run_with_report(&cli.company)
            .await
            .map_err(|e| anyhow::anyhow!("Research failed: {e}"))?;
        render(&report, cli.compact)?
    } else {
        let result = corpscope::research(&orchestrator, &cli.company)
            .await
            .map_err(|e| anyhow::anyhow!("Research failed: {e}"))?;
        render(&result, cli.compact)?
    };
    println!("{output}");

    Ok(())
}

fn render<T: serde::Serialize>(value: &T, compact: bool) -> Result<String> {
    let output = if compact {
        serde_json::to_string(value)?
    } else {
        serde_json::to_string_pretty(value)?
    };
    Ok(output)
}
