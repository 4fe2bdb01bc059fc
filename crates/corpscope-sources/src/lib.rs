pub mod bing;
pub mod claude_cli;
pub mod duckduckgo;
pub mod error;
pub mod llm;
pub mod market;
pub mod news;
pub mod orchestrator;
pub mod parser;
pub mod prompts;
pub mod stock;
pub mod summary;
pub mod ticker;
pub mod yahoo;

pub mod test_support;

pub use bing::BingNewsSource;
pub use duckduckgo::DuckDuckGoNewsSource;
pub use error::{ResearchError, SourceError};
pub use llm::{build_generator, OpenAiGenerator, TextGenerator};
pub use market::MarketDataSource;
pub use news::{build_news_source, NewsProvider, NewsSource};
pub use orchestrator::ResearchOrchestrator;
pub use stock::StockPriceProvider;
pub use summary::SummaryProvider;
pub use ticker::{build_resolver, TickerResolver};
pub use yahoo::YahooMarketData;
