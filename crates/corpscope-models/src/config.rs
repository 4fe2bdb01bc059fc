use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Top-level configuration for corpscope.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ResearchConfig {
    pub http: HttpConfig,
    pub llm: LlmConfig,
    pub news: NewsConfig,
    pub market_data: MarketDataConfig,
    pub ticker: TickerConfig,
    pub summary: SummaryConfig,
}

impl ResearchConfig {
    /// Apply credential and model overrides from the process environment.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable lookup. Empty values are ignored.
    pub fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = get("BING_API_KEY") {
            self.news.api_key = Some(key);
        }
        if let Some(key) = get("OPENAI_API_KEY") {
            self.llm.api_key = Some(key);
        }
        if let Some(base) = get("OPENAI_API_BASE") {
            self.llm.api_base = base;
        }
        if let Some(model) = get("LLM_MODEL") {
            self.llm.model = model;
        }
        if let Some(temperature) = get("LLM_TEMPERATURE").and_then(|t| t.parse().ok()) {
            self.llm.temperature = temperature;
        }
        self
    }
}

/// Settings shared by every HTTP-backed source.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HttpConfig {
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            user_agent: concat!("corpscope/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Which text-generation backend to talk to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LlmBackend {
    /// Any OpenAI-compatible chat completions endpoint.
    #[default]
    Openai,
    /// The locally installed `claude` CLI.
    ClaudeCli,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LlmConfig {
    pub backend: LlmBackend,
    pub model: String,
    pub temperature: f32,
    pub api_base: String,
    /// Usually supplied through `OPENAI_API_KEY` rather than the config file.
    pub api_key: Option<String>,
    pub cli_timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            backend: LlmBackend::Openai,
            model: "gpt-3.5-turbo".to_string(),
            temperature: 0.0,
            api_base: "https://api.openai.com/v1".to_string(),
            api_key: None,
            cli_timeout_secs: 45,
        }
    }
}

/// Which news-search backend to query.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NewsBackend {
    /// Keyless DuckDuckGo news search.
    #[default]
    Duckduckgo,
    /// Bing Web Search v7. Needs `BING_API_KEY`.
    Bing,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct NewsConfig {
    pub backend: NewsBackend,
    /// Bing search endpoint.
    pub endpoint: String,
    /// Bing locale hint.
    pub market: String,
    pub duckduckgo_url: String,
    /// DuckDuckGo region code.
    pub region: String,
    /// Time window filter (Day, Week, Month).
    pub freshness: String,
    /// Maximum number of items returned per company.
    pub count: usize,
    /// Usually supplied through `BING_API_KEY`.
    pub api_key: Option<String>,
}

impl Default for NewsConfig {
    fn default() -> Self {
        Self {
            backend: NewsBackend::Duckduckgo,
            endpoint: "https://api.bing.microsoft.com/v7.0/search".to_string(),
            market: "pt-BR".to_string(),
            duckduckgo_url: "https://duckduckgo.com".to_string(),
            region: "br-pt".to_string(),
            freshness: "Week".to_string(),
            count: 3,
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MarketDataConfig {
    pub base_url: String,
    pub default_currency: String,
}

impl Default for MarketDataConfig {
    fn default() -> Self {
        Self {
            base_url: "https://query1.finance.yahoo.com".to_string(),
            default_currency: crate::research::DEFAULT_CURRENCY.to_string(),
        }
    }
}

/// How company names are turned into tickers.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TickerStrategy {
    /// Static table only.
    #[default]
    Static,
    /// Ask the model for every name.
    Llm,
    /// Static table first, model on a miss.
    StaticThenLlm,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TickerConfig {
    pub strategy: TickerStrategy,
    /// Extra name to ticker entries, merged over the built-in table.
    pub extra: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SummaryConfig {
    /// Optional prompt template with a `{company_name}` placeholder.
    pub prompt_path: String,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            prompt_path: "prompts/company_summary.txt".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_research_config() {
        let config = ResearchConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let deserialized: ResearchConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, deserialized);
    }

    #[test]
    fn defaults_match_reference_behavior() {
        let config = ResearchConfig::default();
        assert_eq!(config.http.timeout_secs, 10);
        assert_eq!(config.news.count, 3);
        assert_eq!(config.news.market, "pt-BR");
        assert_eq!(config.news.backend, NewsBackend::Duckduckgo);
        assert_eq!(config.news.region, "br-pt");
        assert_eq!(config.market_data.default_currency, "BRL");
        assert_eq!(config.ticker.strategy, TickerStrategy::Static);
        assert_eq!(config.llm.backend, LlmBackend::Openai);
        assert!(config.llm.api_key.is_none());
        assert!(config.news.api_key.is_none());
    }

    #[test]
    fn config_from_partial_toml() {
        let toml_str = r#"
[llm]
backend = "claude_cli"
model = "claude-3-5-haiku-latest"

[news]
backend = "bing"
count = 5

[ticker]
strategy = "static_then_llm"

[ticker.extra]
"Banco do Brasil" = "BBAS3.SA"
"#;

        let config: ResearchConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.llm.backend, LlmBackend::ClaudeCli);
        assert_eq!(config.llm.model, "claude-3-5-haiku-latest");
        assert_eq!(config.llm.cli_timeout_secs, 45);
        assert_eq!(config.news.backend, NewsBackend::Bing);
        assert_eq!(config.news.count, 5);
        assert_eq!(config.news.freshness, "Week");
        assert_eq!(config.news.region, "br-pt");
        assert_eq!(config.ticker.strategy, TickerStrategy::StaticThenLlm);
        assert_eq!(
            config.ticker.extra.get("Banco do Brasil").map(String::as_str),
            Some("BBAS3.SA")
        );
        assert_eq!(config.http, HttpConfig::default());
    }

    #[test]
    fn empty_toml_is_all_defaults() {
        let config: ResearchConfig = toml::from_str("").unwrap();
        assert_eq!(config, ResearchConfig::default());
    }

    #[test]
    fn env_overrides_fill_credentials() {
        let vars = |key: &str| match key {
            "BING_API_KEY" => Some("bing-key".to_string()),
            "OPENAI_API_KEY" => Some("sk-test".to_string()),
            "LLM_TEMPERATURE" => Some("0.3".to_string()),
            "LLM_MODEL" => Some("   ".to_string()),
            _ => None,
        };

        let config = ResearchConfig::default().with_overrides_from(vars);
        assert_eq!(config.news.api_key.as_deref(), Some("bing-key"));
        assert_eq!(config.llm.api_key.as_deref(), Some("sk-test"));
        assert!((config.llm.temperature - 0.3).abs() < f32::EPSILON);
        assert_eq!(config.llm.model, "gpt-3.5-turbo");
    }

    #[test]
    fn unparseable_temperature_is_ignored() {
        let config = ResearchConfig::default().with_overrides_from(|key| {
            (key == "LLM_TEMPERATURE").then(|| "warm".to_string())
        });
        assert_eq!(config.llm.temperature, 0.0);
    }
}
