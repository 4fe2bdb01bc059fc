//! DuckDuckGo news search. No API key.
//!
//! A search is two requests: the landing page hands out a `vqd` token, which
//! `news.js` then requires alongside the query.

use std::time::Duration;

use async_trait::async_trait;
use corpscope_models::config::NewsConfig;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::error::SourceError;
use crate::news::{NewsQuery, NewsSource, RawNewsItem};

/// Safe search off, as `p=-2`.
const SAFESEARCH_OFF: &str = "-2";

pub struct DuckDuckGoNewsSource {
    client: Client,
    base_url: String,
    region: String,
    timelimit: Option<&'static str>,
}

impl DuckDuckGoNewsSource {
    pub fn new(config: &NewsConfig, user_agent: &str, timeout: Duration) -> Result<Self, SourceError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            base_url: config.duckduckgo_url.trim_end_matches('/').to_string(),
            region: config.region.clone(),
            timelimit: timelimit(&config.freshness),
        })
    }

    async fn fetch_vqd(&self, text: &str) -> Result<String, SourceError> {
        let response = self
            .client
            .get(format!("{}/", self.base_url))
            .query(&[("q", text)])
            .send()
            .await?;
        let html = check_status(response).await?.text().await?;
        extract_vqd(&html)
            .ok_or_else(|| SourceError::Parse("DuckDuckGo page has no vqd token".to_string()))
    }
}

/// Map a freshness window name onto DuckDuckGo's `df` code.
fn timelimit(freshness: &str) -> Option<&'static str> {
    match freshness.to_ascii_lowercase().as_str() {
        "day" => Some("d"),
        "week" => Some("w"),
        "month" => Some("m"),
        _ => None,
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, SourceError> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    Err(SourceError::Status {
        source_name: "duckduckgo",
        status,
        body,
    })
}

#[async_trait]
impl NewsSource for DuckDuckGoNewsSource {
    fn name(&self) -> &str {
        "duckduckgo"
    }

    #[instrument(skip(self), fields(q = %query.text))]
    async fn search(&self, query: &NewsQuery) -> Result<Vec<RawNewsItem>, SourceError> {
        let vqd = self.fetch_vqd(&query.text).await?;

        let mut params = vec![
            ("l", self.region.as_str()),
            ("o", "json"),
            ("noamp", "1"),
            ("q", query.text.as_str()),
            ("vqd", vqd.as_str()),
            ("p", SAFESEARCH_OFF),
        ];
        if let Some(df) = self.timelimit {
            params.push(("df", df));
        }

        let response = self
            .client
            .get(format!("{}/news.js", self.base_url))
            .query(&params)
            .send()
            .await?;
        let body: DdgNewsResponse = check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| SourceError::Parse(format!("DuckDuckGo response: {e}")))?;

        let items = into_raw_items(body, query.count);
        debug!(hits = items.len(), "DuckDuckGo search complete");
        Ok(items)
    }
}

/// Pull the `vqd` token out of the landing page, quoted or as a URL parameter.
fn extract_vqd(html: &str) -> Option<String> {
    for (open, close) in [("vqd=\"", '"'), ("vqd='", '\''), ("vqd=", '&')] {
        if let Some(start) = html.find(open) {
            let rest = &html[start + open.len()..];
            if let Some(end) = rest.find(close) {
                let token = &rest[..end];
                if !token.is_empty() {
                    return Some(token.to_string());
                }
            }
        }
    }
    None
}

#[derive(Debug, Default, Deserialize)]
struct DdgNewsResponse {
    #[serde(default)]
    results: Vec<DdgNewsArticle>,
}

#[derive(Debug, Deserialize)]
struct DdgNewsArticle {
    title: Option<String>,
    url: Option<String>,
    source: Option<String>,
}

fn into_raw_items(body: DdgNewsResponse, count: usize) -> Vec<RawNewsItem> {
    body.results
        .into_iter()
        .take(count)
        .map(|article| RawNewsItem {
            title: article.title,
            source: article.source,
            url: article.url,
        })
        .collect()
}
