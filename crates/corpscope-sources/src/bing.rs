//! Bing news search over HTTP.

use std::time::Duration;

use async_trait::async_trait;
use corpscope_models::config::NewsConfig;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::error::SourceError;
use crate::news::{NewsQuery, NewsSource, RawNewsItem};

const KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";

pub struct BingNewsSource {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    market: String,
    freshness: String,
}

impl BingNewsSource {
    pub fn new(config: &NewsConfig, timeout: Duration) -> Result<Self, SourceError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
            market: config.market.clone(),
            freshness: config.freshness.clone(),
        })
    }
}

#[async_trait]
impl NewsSource for BingNewsSource {
    fn name(&self) -> &str {
        "bing"
    }

    #[instrument(skip(self), fields(q = %query.text))]
    async fn search(&self, query: &NewsQuery) -> Result<Vec<RawNewsItem>, SourceError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(SourceError::MissingCredential("BING_API_KEY"))?;

        let count = query.count.to_string();
        let response = self
            .client
            .get(&self.endpoint)
            .header(KEY_HEADER, api_key)
            .query(&[
                ("q", query.text.as_str()),
                ("mkt", self.market.as_str()),
                ("freshness", self.freshness.as_str()),
                ("responseFilter", "News"),
                ("count", count.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::Status {
                source_name: "bing",
                status,
                body,
            });
        }

        let body: BingSearchResponse = response
            .json()
            .await
            .map_err(|e| SourceError::Parse(format!("Bing response: {e}")))?;
        let items = into_raw_items(body);
        debug!(hits = items.len(), "Bing search complete");
        Ok(items)
    }
}

#[derive(Debug, Default, Deserialize)]
struct BingSearchResponse {
    #[serde(default)]
    news: Option<BingNewsAnswer>,
}

#[derive(Debug, Default, Deserialize)]
struct BingNewsAnswer {
    #[serde(default)]
    value: Vec<BingNewsArticle>,
}

#[derive(Debug, Deserialize)]
struct BingNewsArticle {
    name: Option<String>,
    url: Option<String>,
    #[serde(default)]
    provider: Vec<BingProvider>,
}

#[derive(Debug, Deserialize)]
struct BingProvider {
    name: Option<String>,
}

fn into_raw_items(body: BingSearchResponse) -> Vec<RawNewsItem> {
    body.news
        .unwrap_or_default()
        .value
        .into_iter()
        .map(|article| RawNewsItem {
            title: article.name,
            source: article.provider.into_iter().next().and_then(|p| p.name),
            url: article.url,
        })
        .collect()
}
