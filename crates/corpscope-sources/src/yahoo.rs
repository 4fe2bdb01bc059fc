//! Yahoo Finance market data over plain HTTP.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::error::SourceError;
use crate::market::{FastQuote, MarketDataSource, QuoteDetails};

pub struct YahooMarketData {
    client: Client,
    base_url: String,
}

impl YahooMarketData {
    pub fn new(
        base_url: impl Into<String>,
        user_agent: &str,
        timeout: Duration,
    ) -> Result<Self, SourceError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<T, SourceError> {
        let response = self.client.get(url).query(query).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::Status {
                source_name: "yahoo",
                status,
                body,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| SourceError::Parse(format!("Yahoo response: {e}")))
    }
}

#[async_trait]
impl MarketDataSource for YahooMarketData {
    fn name(&self) -> &str {
        "yahoo"
    }

    #[instrument(skip(self))]
    async fn fast_quote(&self, ticker: &str) -> Result<FastQuote, SourceError> {
        let url = format!("{}/v8/finance/chart/{ticker}", self.base_url);
        let body: ChartEnvelope = self
            .get_json(&url, &[("range", "1d"), ("interval", "1d")])
            .await?;
        let quote = chart_to_fast_quote(body, ticker, Utc::now().timestamp())?;
        debug!(price = ?quote.last_price, currency = ?quote.currency, state = ?quote.market_state, "Fast quote");
        Ok(quote)
    }

    /// The v7 quote endpoint rejects requests without a cookie/crumb session
    /// (HTTP 401). The provider then relies on the chart metadata.
    #[instrument(skip(self))]
    async fn quote_details(&self, ticker: &str) -> Result<QuoteDetails, SourceError> {
        let url = format!("{}/v7/finance/quote", self.base_url);
        let body: QuoteEnvelope = self.get_json(&url, &[("symbols", ticker)]).await?;
        let details = quote_to_details(body, ticker)?;
        debug!(state = ?details.market_state, time = ?details.regular_market_time, "Quote details");
        Ok(details)
    }
}

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
    #[serde(default)]
    error: Option<YahooError>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: ChartMeta,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    currency: Option<String>,
    regular_market_price: Option<f64>,
    regular_market_time: Option<i64>,
    current_trading_period: Option<TradingPeriods>,
}

#[derive(Debug, Deserialize)]
struct TradingPeriods {
    pre: Option<TradingWindow>,
    regular: Option<TradingWindow>,
    post: Option<TradingWindow>,
}

#[derive(Debug, Deserialize)]
struct TradingWindow {
    start: i64,
    end: i64,
}

impl TradingWindow {
    fn contains(&self, ts: i64) -> bool {
        self.start <= ts && ts < self.end
    }
}

impl TradingPeriods {
    /// Session code at `now`, using the same codes as the quote endpoint.
    fn session_at(&self, now: i64) -> &'static str {
        let within = |w: &Option<TradingWindow>| w.as_ref().is_some_and(|w| w.contains(now));
        if within(&self.regular) {
            "REGULAR"
        } else if within(&self.pre) {
            "PRE"
        } else if within(&self.post) {
            "POST"
        } else {
            "CLOSED"
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteEnvelope {
    quote_response: QuoteBody,
}

#[derive(Debug, Deserialize)]
struct QuoteBody {
    #[serde(default)]
    result: Option<Vec<QuoteResult>>,
    #[serde(default)]
    error: Option<YahooError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteResult {
    currency: Option<String>,
    current_price: Option<f64>,
    regular_market_price: Option<f64>,
    regular_market_time: Option<i64>,
    market_state: Option<String>,
}

#[derive(Debug, Deserialize)]
struct YahooError {
    code: Option<String>,
    description: Option<String>,
}

impl YahooError {
    fn into_source_error(self, ticker: &str) -> SourceError {
        SourceError::Parse(format!(
            "Yahoo error for {ticker}: {} {}",
            self.code.unwrap_or_default(),
            self.description.unwrap_or_default()
        ))
    }
}

fn chart_to_fast_quote(
    body: ChartEnvelope,
    ticker: &str,
    now: i64,
) -> Result<FastQuote, SourceError> {
    if let Some(err) = body.chart.error {
        return Err(err.into_source_error(ticker));
    }
    let meta = body
        .chart
        .result
        .and_then(|r| r.into_iter().next())
        .map(|r| r.meta)
        .ok_or_else(|| SourceError::Parse(format!("No chart data for {ticker}")))?;

    Ok(FastQuote {
        last_price: meta.regular_market_price,
        currency: meta.currency,
        regular_market_time: meta.regular_market_time,
        market_state: meta
            .current_trading_period
            .map(|periods| periods.session_at(now).to_string()),
    })
}

fn quote_to_details(body: QuoteEnvelope, ticker: &str) -> Result<QuoteDetails, SourceError> {
    if let Some(err) = body.quote_response.error {
        return Err(err.into_source_error(ticker));
    }
    let quote = body
        .quote_response
        .result
        .and_then(|r| r.into_iter().next())
        .ok_or_else(|| SourceError::Parse(format!("No quote data for {ticker}")))?;

    Ok(QuoteDetails {
        current_price: quote.current_price,
        regular_market_price: quote.regular_market_price,
        currency: quote.currency,
        regular_market_time: quote.regular_market_time,
        market_state: quote.market_state,
    })
}
