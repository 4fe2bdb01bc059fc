use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use corpscope_models::research::UNKNOWN_MARKET_STATE;
use corpscope_models::{Sourced, StockPrice, DEFAULT_CURRENCY, UNKNOWN_TICKER};
use tracing::{debug, info, warn};

use crate::market::MarketDataSource;
use crate::ticker::TickerResolver;

/// Brasília is treated as a constant UTC-3, no daylight saving.
const BRT_OFFSET_HOURS: i64 = 3;

/// Shown when the exchange reports no trade time.
const NO_TIMESTAMP: &str = "N/A";

/// Display label for a raw market-state code. Unmapped codes pass through.
pub fn market_status_label(raw_state: &str) -> &str {
    match raw_state {
        "REGULAR" => "Aberto",
        "CLOSED" | "PREPRE" | "POSTPOST" => "Fechado",
        "PRE" => "Pré-Market",
        "POST" => "After-Market",
        other => other,
    }
}

/// True for B3 tickers or BRL-quoted assets.
pub fn is_brazilian(ticker: &str, currency: &str) -> bool {
    ticker.to_ascii_uppercase().contains(".SA") || currency == "BRL"
}

/// Render an exchange Unix timestamp for display.
///
/// Brazilian assets get `DD/MM/YYYY HH:MM:SS (BRT)` at UTC-3, everything else
/// `YYYY-MM-DD HH:MM:SS (UTC)`.
pub fn format_last_update(timestamp: i64, ticker: &str, currency: &str) -> String {
    let Some(utc) = DateTime::<Utc>::from_timestamp(timestamp, 0) else {
        return NO_TIMESTAMP.to_string();
    };

    if is_brazilian(ticker, currency) {
        // Timestamps at the bottom of chrono's range cannot be shifted back
        match utc.checked_sub_signed(TimeDelta::hours(BRT_OFFSET_HOURS)) {
            Some(brt) => brt.format("%d/%m/%Y %H:%M:%S (BRT)").to_string(),
            None => NO_TIMESTAMP.to_string(),
        }
    } else {
        utc.format("%Y-%m-%d %H:%M:%S (UTC)").to_string()
    }
}

/// Fetches current price data for a resolved ticker.
pub struct StockPriceProvider {
    source: Arc<dyn MarketDataSource>,
    default_currency: String,
}

impl StockPriceProvider {
    pub fn new(source: Arc<dyn MarketDataSource>) -> Self {
        Self::with_default_currency(source, DEFAULT_CURRENCY)
    }

    pub fn with_default_currency(
        source: Arc<dyn MarketDataSource>,
        default_currency: impl Into<String>,
    ) -> Self {
        Self {
            source,
            default_currency: default_currency.into(),
        }
    }

    /// Resolve the company's ticker, then fetch its price.
    pub async fn for_company(
        &self,
        company_name: &str,
        resolver: &dyn TickerResolver,
    ) -> Sourced<StockPrice> {
        let ticker = resolver.resolve(company_name).await;
        debug!(company = company_name, ticker = %ticker, "Resolved ticker");
        self.get_price(&ticker).await
    }

    /// Never fails. An unknown ticker returns the sentinel without touching the
    /// network; fetch failures degrade to a best-effort record.
    pub async fn get_price(&self, ticker: &str) -> Sourced<StockPrice> {
        if ticker == UNKNOWN_TICKER {
            return Sourced::fallback(StockPrice::unknown(), "ticker could not be resolved");
        }

        // Both tiers are independent, so fetch them together.
        let (fast, details) = tokio::join!(
            self.source.fast_quote(ticker),
            self.source.quote_details(ticker)
        );

        let mut failures: Vec<String> = Vec::new();
        let fast = fast
            .map_err(|e| {
                warn!(ticker, source = self.source.name(), error = %e, "Fast quote failed");
                failures.push(format!("fast quote: {e}"));
            })
            .unwrap_or_default();
        let details = details
            .map_err(|e| {
                warn!(ticker, source = self.source.name(), error = %e, "Quote details failed");
                failures.push(format!("quote details: {e}"));
            })
            .unwrap_or_default();

        let (price, currency) = match fast.last_price {
            Some(price) => (Some(price), fast.currency),
            None => (
                details.current_price.or(details.regular_market_price),
                details.currency.or(fast.currency),
            ),
        };
        // The detailed tier is authoritative for time and session state; the
        // chart metadata covers for it when it is unavailable.
        let timestamp = details.regular_market_time.or(fast.regular_market_time);
        let raw_state = details
            .market_state
            .or(fast.market_state)
            .unwrap_or_else(|| UNKNOWN_MARKET_STATE.to_string());

        let currency = currency
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(|| self.default_currency.clone());
        let price = price.filter(|p| p.is_finite() && *p >= 0.0);

        let last_update = match timestamp {
            Some(ts) => format_last_update(ts, ticker, &currency),
            None => NO_TIMESTAMP.to_string(),
        };

        let stock_price = StockPrice {
            ticker: ticker.to_string(),
            price: price.unwrap_or(0.0),
            last_update: Some(last_update),
            market_status: Some(market_status_label(&raw_state).to_string()),
            raw_state: Some(raw_state),
            currency,
        };

        if failures.len() == 2 {
            return Sourced::fallback(stock_price, failures.join("; "));
        }
        if price.is_none() {
            warn!(ticker, "No price available");
            return Sourced::fallback(stock_price, "no price available");
        }

        info!(
            ticker,
            source = self.source.name(),
            price = stock_price.price,
            currency = %stock_price.currency,
            status = ?stock_price.market_status,
            "Fetched stock price"
        );
        Sourced::Live(stock_price)
    }
}
