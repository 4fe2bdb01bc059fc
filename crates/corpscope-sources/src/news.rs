use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use corpscope_models::config::{NewsBackend, NewsConfig};
use corpscope_models::{NewsItem, Sourced};
use tracing::{debug, info, warn};

use crate::bing::BingNewsSource;
use crate::duckduckgo::DuckDuckGoNewsSource;
use crate::error::SourceError;

/// Default number of headlines per company.
pub const DEFAULT_NEWS_COUNT: usize = 3;

/// A search request as sent to a news source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewsQuery {
    pub text: String,
    pub count: usize,
}

/// A search hit before normalization. Any field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawNewsItem {
    pub title: Option<String>,
    pub source: Option<String>,
    pub url: Option<String>,
}

/// A news-search provider. Mockable for testing.
#[async_trait]
pub trait NewsSource: Send + Sync {
    fn name(&self) -> &str;

    async fn search(&self, query: &NewsQuery) -> Result<Vec<RawNewsItem>, SourceError>;
}

/// Build the backend selected by `config.backend`.
pub fn build_news_source(
    config: &NewsConfig,
    user_agent: &str,
    timeout: Duration,
) -> Result<Arc<dyn NewsSource>, SourceError> {
    let source: Arc<dyn NewsSource> = match config.backend {
        NewsBackend::Duckduckgo => Arc::new(DuckDuckGoNewsSource::new(config, user_agent, timeout)?),
        NewsBackend::Bing => Arc::new(BingNewsSource::new(config, timeout)?),
    };
    Ok(source)
}

/// Search query used for a company.
pub fn news_query_text(company_name: &str) -> String {
    format!("{company_name} stock market news")
}

/// Fetches recent headlines for a company.
pub struct NewsProvider {
    source: Arc<dyn NewsSource>,
    count: usize,
}

impl NewsProvider {
    pub fn new(source: Arc<dyn NewsSource>) -> Self {
        Self::with_count(source, DEFAULT_NEWS_COUNT)
    }

    pub fn with_count(source: Arc<dyn NewsSource>, count: usize) -> Self {
        Self { source, count }
    }

    /// Never fails. Search errors yield an empty list.
    pub async fn get_news(&self, company_name: &str) -> Sourced<Vec<NewsItem>> {
        let query = NewsQuery {
            text: news_query_text(company_name),
            count: self.count,
        };

        match self.source.search(&query).await {
            Ok(raw) => {
                let items = normalize(raw, self.count);
                info!(
                    company = company_name,
                    source = self.source.name(),
                    count = items.len(),
                    "Fetched news"
                );
                Sourced::Live(items)
            }
            Err(e) => {
                warn!(company = company_name, source = self.source.name(), error = %e, "News search failed");
                Sourced::fallback(Vec::new(), e.to_string())
            }
        }
    }
}

/// Keep titled items, in source order, up to `count`.
fn normalize(raw: Vec<RawNewsItem>, count: usize) -> Vec<NewsItem> {
    raw.into_iter()
        .filter_map(|item| {
            let title = item
                .title
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty());
            match title {
                Some(title) => Some(NewsItem {
                    title,
                    source: item.source.filter(|s| !s.trim().is_empty()),
                    url: item.url.filter(|u| !u.trim().is_empty()),
                }),
                None => {
                    debug!(url = ?item.url, "Dropping untitled news item");
                    None
                }
            }
        })
        .take(count)
        .collect()
}
