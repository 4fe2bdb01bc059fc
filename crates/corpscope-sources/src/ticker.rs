use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use corpscope_models::config::{TickerConfig, TickerStrategy};
use corpscope_models::UNKNOWN_TICKER;
use tracing::{debug, warn};

use crate::llm::TextGenerator;
use crate::prompts::{ticker_prompt, TICKER_SYSTEM_PROMPT};

/// Built-in company name to ticker table. Keys are canonical display names.
pub const COMPANY_TICKERS: &[(&str, &str)] = &[
    ("Petrobras", "PETR4.SA"),
    ("Vale", "VALE3.SA"),
    ("Itau", "ITUB4.SA"),
    ("Ambev", "ABEV3.SA"),
    ("Minerva", "BEEF3.SA"),
];

const MAX_TICKER_LEN: usize = 15;

/// Maps a company name to a ticker. Never fails: anything unresolvable
/// becomes [`UNKNOWN_TICKER`].
#[async_trait]
pub trait TickerResolver: Send + Sync {
    async fn resolve(&self, company_name: &str) -> String;
}

/// Exact, case-sensitive lookup in a static table.
#[derive(Debug, Clone)]
pub struct StaticTickerResolver {
    table: BTreeMap<String, String>,
}

impl StaticTickerResolver {
    pub fn builtin() -> Self {
        Self::with_extra(BTreeMap::new())
    }

    /// Built-in table with `extra` entries merged over it.
    pub fn with_extra(extra: BTreeMap<String, String>) -> Self {
        let mut table: BTreeMap<String, String> = COMPANY_TICKERS
            .iter()
            .map(|(name, ticker)| (name.to_string(), ticker.to_string()))
            .collect();
        table.extend(extra);
        Self { table }
    }

    pub fn lookup(&self, company_name: &str) -> Option<&str> {
        self.table.get(company_name).map(String::as_str)
    }
}

#[async_trait]
impl TickerResolver for StaticTickerResolver {
    async fn resolve(&self, company_name: &str) -> String {
        match self.lookup(company_name) {
            Some(ticker) => ticker.to_string(),
            None => {
                debug!(company = company_name, "No static ticker entry");
                UNKNOWN_TICKER.to_string()
            }
        }
    }
}

/// Asks a text-generation model for the ticker.
pub struct LlmTickerResolver {
    generator: Arc<dyn TextGenerator>,
}

impl LlmTickerResolver {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }
}

#[async_trait]
impl TickerResolver for LlmTickerResolver {
    async fn resolve(&self, company_name: &str) -> String {
        let prompt = ticker_prompt(company_name);
        match self.generator.complete(TICKER_SYSTEM_PROMPT, &prompt).await {
            Ok(answer) => match normalize_ticker_answer(&answer) {
                Some(ticker) => {
                    debug!(company = company_name, ticker = %ticker, "Model resolved ticker");
                    ticker
                }
                None => {
                    warn!(company = company_name, answer = %answer.trim(), "Unusable ticker answer");
                    UNKNOWN_TICKER.to_string()
                }
            },
            Err(e) => {
                warn!(company = company_name, error = %e, "Ticker inference failed");
                UNKNOWN_TICKER.to_string()
            }
        }
    }
}

/// Static table first, then the model on a miss.
pub struct ChainedTickerResolver {
    primary: StaticTickerResolver,
    fallback: Arc<dyn TickerResolver>,
}

impl ChainedTickerResolver {
    pub fn new(primary: StaticTickerResolver, fallback: Arc<dyn TickerResolver>) -> Self {
        Self { primary, fallback }
    }
}

#[async_trait]
impl TickerResolver for ChainedTickerResolver {
    async fn resolve(&self, company_name: &str) -> String {
        match self.primary.lookup(company_name) {
            Some(ticker) => ticker.to_string(),
            None => self.fallback.resolve(company_name).await,
        }
    }
}

/// Build the resolver selected by `config.strategy`.
pub fn build_resolver(
    config: &TickerConfig,
    generator: Arc<dyn TextGenerator>,
) -> Arc<dyn TickerResolver> {
    let table = StaticTickerResolver::with_extra(config.extra.clone());
    match config.strategy {
        TickerStrategy::Static => Arc::new(table),
        TickerStrategy::Llm => Arc::new(LlmTickerResolver::new(generator)),
        TickerStrategy::StaticThenLlm => Arc::new(ChainedTickerResolver::new(
            table,
            Arc::new(LlmTickerResolver::new(generator)),
        )),
    }
}

/// Turn a raw model answer into a ticker, or `None` if it is not one.
///
/// The literal `UNKNOWN` answer is returned as-is.
pub fn normalize_ticker_answer(answer: &str) -> Option<String> {
    let token = answer
        .trim()
        .trim_matches(|c| c == '"' || c == '\'' || c == '`')
        .trim();

    let valid = !token.is_empty()
        && token.len() <= MAX_TICKER_LEN
        && token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '^' | '='));

    valid.then(|| token.to_ascii_uppercase())
}
