use async_trait::async_trait;

use crate::error::SourceError;

/// Cheap last-trade snapshot.
///
/// Time and session state are best effort here; [`QuoteDetails`] wins when
/// both are available.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FastQuote {
    pub last_price: Option<f64>,
    pub currency: Option<String>,
    pub regular_market_time: Option<i64>,
    pub market_state: Option<String>,
}

/// Fuller quote metadata with exchange time and session state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuoteDetails {
    pub current_price: Option<f64>,
    pub regular_market_price: Option<f64>,
    pub currency: Option<String>,
    /// Unix seconds of the last trade.
    pub regular_market_time: Option<i64>,
    /// Raw session code such as `REGULAR` or `CLOSED`.
    pub market_state: Option<String>,
}

/// A market-data provider. Mockable for testing.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    fn name(&self) -> &str;

    async fn fast_quote(&self, ticker: &str) -> Result<FastQuote, SourceError>;

    async fn quote_details(&self, ticker: &str) -> Result<QuoteDetails, SourceError>;
}
