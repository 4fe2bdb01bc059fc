//! End-to-end research scenarios.
//!
//! Each test wires the real providers and orchestrator to scripted fakes and
//! checks the merged result a caller would print.

use std::collections::BTreeMap;
use std::sync::Arc;

use corpscope_models::config::{TickerConfig, TickerStrategy};
use corpscope_models::{ResearchResult, SourceKind, SourceStatus};
use corpscope_sources::market::{FastQuote, QuoteDetails};
use corpscope_sources::news::RawNewsItem;
use corpscope_sources::prompts::SummaryPrompt;
use corpscope_sources::test_support::{FakeMarketData, FakeNewsSource, ScriptedGenerator};
use corpscope_sources::ticker::StaticTickerResolver;
use corpscope_sources::{
    build_resolver, NewsProvider, ResearchError, ResearchOrchestrator, StockPriceProvider,
    SummaryProvider, TextGenerator, TickerResolver,
};

struct Harness {
    generator: Arc<dyn TextGenerator>,
    news: Arc<FakeNewsSource>,
    market: Arc<FakeMarketData>,
    resolver: Arc<dyn TickerResolver>,
}

impl Harness {
    fn new(generator: ScriptedGenerator, news: FakeNewsSource, market: FakeMarketData) -> Self {
        Self {
            generator: Arc::new(generator),
            news: Arc::new(news),
            market: Arc::new(market),
            resolver: Arc::new(StaticTickerResolver::builtin()),
        }
    }

    fn with_resolver(mut self, resolver: Arc<dyn TickerResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    fn orchestrator(&self) -> ResearchOrchestrator {
        ResearchOrchestrator::new(
            Arc::new(SummaryProvider::new(
                Arc::clone(&self.generator),
                SummaryPrompt::builtin(),
            )),
            Arc::new(NewsProvider::new(self.news.clone())),
            Arc::new(StockPriceProvider::new(self.market.clone())),
            Arc::clone(&self.resolver),
        )
    }
}

fn petrobras_summary() -> ScriptedGenerator {
    ScriptedGenerator::replying(
        "```json\n{\n  \"company_name\": \"Petróleo Brasileiro S.A. - Petrobras\",\n  \"sector\": \"Oil & Gas\",\n  \"description\": \"State-controlled integrated energy company.\"\n}\n```",
    )
}

fn headlines() -> FakeNewsSource {
    FakeNewsSource::returning(vec![
        RawNewsItem {
            title: Some("Petrobras anuncia dividendos".to_string()),
            source: Some("InfoMoney".to_string()),
            url: Some("https://example.com/1".to_string()),
        },
        RawNewsItem {
            title: Some("Petróleo sobe no exterior".to_string()),
            source: Some("Valor".to_string()),
            url: Some("https://example.com/2".to_string()),
        },
        RawNewsItem {
            title: Some("Conselho aprova plano".to_string()),
            source: None,
            url: Some("https://example.com/3".to_string()),
        },
        RawNewsItem {
            title: Some("Quarta manchete".to_string()),
            source: None,
            url: None,
        },
    ])
}

fn open_market() -> FakeMarketData {
    FakeMarketData::new()
        .with_fast(FastQuote {
            last_price: Some(38.45),
            currency: Some("BRL".to_string()),
            ..FastQuote::default()
        })
        .with_details(QuoteDetails {
            regular_market_time: Some(1_700_000_000),
            market_state: Some("REGULAR".to_string()),
            ..QuoteDetails::default()
        })
}

#[tokio::test]
async fn healthy_research_for_known_company() {
    let harness = Harness::new(petrobras_summary(), headlines(), open_market());
    let report = harness
        .orchestrator()
        .run_with_report("Petrobras")
        .await
        .unwrap();

    assert!(!report.is_degraded());
    let kinds: Vec<SourceKind> = report.sources.iter().map(|s| s.source).collect();
    assert_eq!(
        kinds,
        [SourceKind::Summary, SourceKind::News, SourceKind::StockPrice]
    );

    let result = report.result;
    assert_eq!(result.summary.sector, "Oil & Gas");
    assert_eq!(result.news.len(), 3);
    assert_eq!(result.news[0].title, "Petrobras anuncia dividendos");

    let price = &result.stock_price;
    assert_eq!(price.ticker, "PETR4.SA");
    assert_eq!(price.price, 38.45);
    assert_eq!(price.currency, "BRL");
    assert_eq!(price.last_update.as_deref(), Some("14/11/2023 19:13:20 (BRT)"));
    assert_eq!(price.market_status.as_deref(), Some("Aberto"));
}

#[tokio::test]
async fn result_serializes_with_stable_keys() {
    let harness = Harness::new(petrobras_summary(), headlines(), open_market());
    let result = harness.orchestrator().run("Petrobras").await.unwrap();

    let json = serde_json::to_value(&result).unwrap();
    let mut keys: Vec<&str> = json
        .as_object()
        .unwrap()
        .keys()
        .map(String::as_str)
        .collect();
    keys.sort_unstable();
    assert_eq!(keys, ["company", "news", "stock_price", "summary"]);
    assert_eq!(json["stock_price"]["ticker"], "PETR4.SA");

    let back: ResearchResult = serde_json::from_value(json).unwrap();
    assert_eq!(back, result);
}

#[tokio::test]
async fn unconfigured_environment_degrades_everywhere() {
    // No OpenAI key, no Bing key, market data down
    let harness = Harness::new(
        ScriptedGenerator::missing_key(),
        FakeNewsSource::failing(),
        FakeMarketData::new().failing_fast().failing_details(),
    );
    let report = harness
        .orchestrator()
        .run_with_report("Minerva")
        .await
        .unwrap();

    assert!(report
        .sources
        .iter()
        .all(|s| s.status == SourceStatus::Fallback));

    let result = report.result;
    assert_eq!(result.company, "Minerva");
    assert_eq!(result.summary.company_name, "Minerva");
    assert_eq!(result.summary.sector, "Unknown");
    assert!(result.news.is_empty());
    assert_eq!(result.stock_price.ticker, "BEEF3.SA");
    assert_eq!(result.stock_price.price, 0.0);
    assert_eq!(result.stock_price.currency, "BRL");
    assert_eq!(result.stock_price.last_update.as_deref(), Some("N/A"));
    assert_eq!(result.stock_price.market_status.as_deref(), Some("UNKNOWN"));
}

#[tokio::test]
async fn detailed_quote_fills_in_when_fast_path_fails() {
    let market = FakeMarketData::new()
        .failing_fast()
        .with_details(QuoteDetails {
            current_price: None,
            regular_market_price: Some(12.5),
            currency: Some("USD".to_string()),
            regular_market_time: Some(1_700_000_000),
            market_state: Some("POST".to_string()),
        });
    let harness = Harness::new(petrobras_summary(), headlines(), market);
    let report = harness
        .orchestrator()
        .run_with_report("Petrobras")
        .await
        .unwrap();

    // One tier failing is still a live result
    assert!(!report.is_degraded());
    let price = report.result.stock_price;
    assert_eq!(price.price, 12.5);
    assert_eq!(price.currency, "USD");
    // The ticker is a B3 listing, so BRT wins over the currency
    assert_eq!(price.last_update.as_deref(), Some("14/11/2023 19:13:20 (BRT)"));
    assert_eq!(price.market_status.as_deref(), Some("After-Market"));
}

#[tokio::test]
async fn model_resolves_ticker_for_unlisted_company() {
    let harness = Harness::new(petrobras_summary(), headlines(), open_market());
    let ticker_model: Arc<dyn TextGenerator> = Arc::new(ScriptedGenerator::replying(" wege3.sa\n"));
    let config = TickerConfig {
        strategy: TickerStrategy::StaticThenLlm,
        extra: BTreeMap::new(),
    };
    let harness = harness.with_resolver(build_resolver(&config, ticker_model));

    let result = harness.orchestrator().run("WEG").await.unwrap();
    assert_eq!(result.stock_price.ticker, "WEGE3.SA");
    assert_eq!(result.stock_price.price, 38.45);
}

#[tokio::test]
async fn configured_extra_ticker_skips_the_model() {
    let harness = Harness::new(petrobras_summary(), headlines(), open_market());
    let ticker_model = Arc::new(ScriptedGenerator::replying("WRONG3.SA"));
    let config = TickerConfig {
        strategy: TickerStrategy::StaticThenLlm,
        extra: BTreeMap::from([("Embraer".to_string(), "EMBR3.SA".to_string())]),
    };
    let harness = harness.with_resolver(build_resolver(&config, ticker_model.clone()));

    let result = harness.orchestrator().run("Embraer").await.unwrap();
    assert_eq!(result.stock_price.ticker, "EMBR3.SA");
    assert_eq!(ticker_model.calls(), 0);
}

#[tokio::test]
async fn unknown_company_never_queries_market_data() {
    let harness = Harness::new(petrobras_summary(), headlines(), open_market());
    let report = harness
        .orchestrator()
        .run_with_report("Empresa Inexistente")
        .await
        .unwrap();

    assert!(report.result.stock_price.is_unknown());
    assert_eq!(report.result.stock_price.last_update, None);
    assert_eq!(report.result.stock_price.market_status, None);
    assert_eq!(harness.market.calls(), 0);
    // Summary and news still ran
    assert_eq!(report.result.news.len(), 3);
    assert_eq!(harness.news.calls(), 1);
}

#[tokio::test]
async fn blank_company_is_rejected() {
    let harness = Harness::new(petrobras_summary(), headlines(), open_market());
    let err = harness.orchestrator().run("").await.unwrap_err();

    assert_eq!(err, ResearchError::InvalidCompanyName);
    assert_eq!(err.to_string(), "company_name must be a non-empty string");
    assert_eq!(harness.news.calls() + harness.market.calls(), 0);
}
