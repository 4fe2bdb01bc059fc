//! corpscope - company research aggregator
//!
//! Given a company name, gathers an AI-generated business summary, recent
//! news headlines and the current stock quote concurrently, and merges them
//! into one result. Every source degrades to a sentinel value on failure, so
//! a research run only fails for a blank company name.
//!
//! # Library Usage
//!
//! ```rust,no_run
//! use corpscope::models::ResearchConfig;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = ResearchConfig::default().with_env_overrides();
//! let orchestrator = corpscope::build_orchestrator(&config)?;
//! let result = corpscope::research(&orchestrator, "Petrobras").await?;
//! println!("{}", result.stock_price.ticker);
//! # Ok(())
//! # }
//! ```

pub use corpscope_models as models;
pub use corpscope_sources as sources;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use corpscope_models::{ResearchConfig, ResearchResult};
use corpscope_sources::prompts::SummaryPrompt;
use corpscope_sources::{
    build_generator, build_news_source, build_resolver, NewsProvider, ResearchError,
    ResearchOrchestrator, StockPriceProvider, SummaryProvider, YahooMarketData,
};
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Load a `.env` file, then build the log filter from `RUST_LOG`.
///
/// Loads `./.env` when `dotenv` is `None`. A missing file is fine. Variables
/// already set in the process win over the file.
pub fn log_filter(dotenv: Option<&Path>) -> EnvFilter {
    let _ = match dotenv {
        Some(path) => dotenvy::from_path(path),
        None => dotenvy::dotenv().map(|_| ()),
    };
    EnvFilter::from_default_env()
}

/// Read a TOML config file.
///
/// A missing file yields built-in defaults unless `required` is set.
pub fn load_config(path: impl AsRef<Path>, required: bool) -> anyhow::Result<ResearchConfig> {
    let path = path.as_ref();
    if !required && !path.exists() {
        debug!(path = %path.display(), "No config file, using defaults");
        return Ok(ResearchConfig::default());
    }

    let config_str = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config: {}", path.display()))?;
    toml::from_str(&config_str)
        .with_context(|| format!("Failed to parse config: {}", path.display()))
}

/// Build a ResearchOrchestrator from configuration.
pub fn build_orchestrator(config: &ResearchConfig) -> anyhow::Result<ResearchOrchestrator> {
    let http_timeout = Duration::from_secs(config.http.timeout_secs);

    let generator = build_generator(&config.llm, http_timeout)
        .context("Failed to build text generator")?;
    let resolver = build_resolver(&config.ticker, Arc::clone(&generator));

    let market = YahooMarketData::new(
        &config.market_data.base_url,
        &config.http.user_agent,
        http_timeout,
    )
    .context("Failed to build market data client")?;
    let news = build_news_source(&config.news, &config.http.user_agent, http_timeout)
        .context("Failed to build news client")?;

    let prompt = SummaryPrompt::load_or_builtin(&config.summary.prompt_path);

    Ok(ResearchOrchestrator::new(
        Arc::new(SummaryProvider::new(generator, prompt)),
        Arc::new(NewsProvider::with_count(news, config.news.count)),
        Arc::new(StockPriceProvider::with_default_currency(
            Arc::new(market),
            &config.market_data.default_currency,
        )),
        resolver,
    ))
}

/// Research one company with the given orchestrator.
pub async fn research(
    orchestrator: &ResearchOrchestrator,
    company_name: &str,
) -> Result<ResearchResult, ResearchError> {
    orchestrator.run(company_name).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_optional_config_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(dir.path().join("absent.toml"), false).unwrap();
        assert_eq!(config, ResearchConfig::default());
    }

    #[test]
    fn missing_required_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config(dir.path().join("absent.toml"), true).unwrap_err();
        assert!(err.to_string().contains("Failed to read config"));
    }

    #[test]
    fn loads_partial_config() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[news]\ncount = 5\n\n[ticker]\nstrategy = \"static_then_llm\"").unwrap();

        let config = load_config(file.path(), true).unwrap();
        assert_eq!(config.news.count, 5);
        assert_eq!(config.news.market, "pt-BR");
    }

    #[test]
    fn malformed_config_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[news\ncount = ").unwrap();

        let err = load_config(file.path(), false).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config"));
    }

    // Bing without a key, no OpenAI key and an unlisted company: no branch
    // touches the network, so this runs offline.
    #[tokio::test]
    async fn unconfigured_run_degrades_to_sentinels() {
        let mut config = ResearchConfig::default();
        config.news.backend = corpscope_models::NewsBackend::Bing;
        let orchestrator = build_orchestrator(&config).unwrap();
        let result = research(&orchestrator, "Empresa Inexistente").await.unwrap();

        assert_eq!(result.company, "Empresa Inexistente");
        assert_eq!(result.summary.sector, "Unknown");
        assert!(result.summary.description.contains("OPENAI_API_KEY"));
        assert!(result.news.is_empty());
        assert!(result.stock_price.is_unknown());
    }

    #[test]
    fn news_backend_comes_from_config() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[news]\nbackend = \"bing\"").unwrap();

        let config = load_config(file.path(), true).unwrap();
        assert_eq!(config.news.backend, corpscope_models::NewsBackend::Bing);
        assert!(build_orchestrator(&config).is_ok());
    }

    #[test]
    fn log_filter_sees_rust_log_from_dotenv() {
        if std::env::var_os("RUST_LOG").is_some() {
            eprintln!("Skipping: RUST_LOG already set");
            return;
        }
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "RUST_LOG=corpscope=trace").unwrap();

        let filter = log_filter(Some(file.path()));
        assert!(filter.to_string().contains("corpscope=trace"), "{filter}");
    }

    #[tokio::test]
    async fn blank_name_is_rejected() {
        let orchestrator = build_orchestrator(&ResearchConfig::default()).unwrap();
        let err = research(&orchestrator, "   ").await.unwrap_err();
        assert_eq!(err, ResearchError::InvalidCompanyName);
    }
}
