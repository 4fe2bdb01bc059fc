pub mod config;
pub mod request;
pub mod research;
pub mod sourced;

pub use config::{
    HttpConfig, LlmBackend, LlmConfig, MarketDataConfig, NewsBackend, NewsConfig, ResearchConfig,
    SummaryConfig, TickerConfig, TickerStrategy,
};
pub use request::ResearchRequest;
pub use research::{
    CompanySummary, NewsItem, ResearchReport, ResearchResult, SourceKind, SourceReport,
    SourceStatus, StockPrice, DEFAULT_CURRENCY, UNKNOWN_TICKER,
};
pub use sourced::Sourced;
