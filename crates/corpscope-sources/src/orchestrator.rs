use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use corpscope_models::{
    CompanySummary, NewsItem, ResearchReport, ResearchRequest, ResearchResult, SourceKind,
    SourceReport, SourceStatus, Sourced, StockPrice,
};
use tokio::task::JoinError;
use tracing::{error, info, info_span, warn, Instrument};

use crate::error::ResearchError;
use crate::news::NewsProvider;
use crate::stock::StockPriceProvider;
use crate::summary::{validate_company_name, SummaryProvider};
use crate::ticker::TickerResolver;

/// Runs the summary, news and stock-price branches concurrently and merges
/// them into one [`ResearchResult`].
pub struct ResearchOrchestrator {
    summary: Arc<SummaryProvider>,
    news: Arc<NewsProvider>,
    stock: Arc<StockPriceProvider>,
    resolver: Arc<dyn TickerResolver>,
}

impl ResearchOrchestrator {
    pub fn new(
        summary: Arc<SummaryProvider>,
        news: Arc<NewsProvider>,
        stock: Arc<StockPriceProvider>,
        resolver: Arc<dyn TickerResolver>,
    ) -> Self {
        Self {
            summary,
            news,
            stock,
            resolver,
        }
    }

    /// Research a company. Fails only for a blank name.
    pub async fn run(&self, company_name: &str) -> Result<ResearchResult, ResearchError> {
        Ok(self.run_with_report(company_name).await?.result)
    }

    /// Like [`run`](Self::run), plus per-branch status and latency.
    pub async fn run_with_report(
        &self,
        company_name: &str,
    ) -> Result<ResearchReport, ResearchError> {
        validate_company_name(company_name)?;

        let request = ResearchRequest::new(company_name);
        let span = info_span!("research", request_id = %request.request_id, company = %request.company_name);
        let start = Instant::now();
        info!(parent: &span, "Starting research");

        // Fan out. Branches share nothing, so each gets its own task.
        let summary_task = {
            let provider = Arc::clone(&self.summary);
            let name = request.company_name.clone();
            tokio::spawn(timed(async move { provider.get_summary(&name).await }).instrument(span.clone()))
        };
        let news_task = {
            let provider = Arc::clone(&self.news);
            let name = request.company_name.clone();
            tokio::spawn(timed(async move { provider.get_news(&name).await }).instrument(span.clone()))
        };
        let stock_task = {
            let provider = Arc::clone(&self.stock);
            let resolver = Arc::clone(&self.resolver);
            let name = request.company_name.clone();
            tokio::spawn(
                timed(async move { provider.for_company(&name, resolver.as_ref()).await })
                    .instrument(span.clone()),
            )
        };

        // Join, not race: every branch is needed.
        let (summary, news, stock) = tokio::join!(summary_task, news_task, stock_task);

        let (summary, summary_elapsed) = match summary {
            Ok((outcome, elapsed)) => (outcome?, elapsed),
            Err(e) => (
                panicked(
                    SourceKind::Summary,
                    CompanySummary::fallback(&request.company_name, &e),
                    &e,
                ),
                start.elapsed(),
            ),
        };
        let (news, news_elapsed) = recover(news, SourceKind::News, Vec::<NewsItem>::new, start);
        let (stock, stock_elapsed) = recover(stock, SourceKind::StockPrice, StockPrice::unknown, start);

        let sources = vec![
            report(SourceKind::Summary, &summary, summary_elapsed),
            report(SourceKind::News, &news, news_elapsed),
            report(SourceKind::StockPrice, &stock, stock_elapsed),
        ];

        let elapsed = start.elapsed();
        let research = ResearchReport {
            result: ResearchResult {
                company: request.company_name.clone(),
                summary: summary.into_value(),
                news: news.into_value(),
                stock_price: stock.into_value(),
            },
            sources,
            elapsed_ms: elapsed.as_millis() as u64,
        };

        if research.is_degraded() {
            let degraded: Vec<SourceKind> = research
                .sources
                .iter()
                .filter(|s| s.status == SourceStatus::Fallback)
                .map(|s| s.source)
                .collect();
            warn!(parent: &span, degraded = ?degraded, elapsed_ms = research.elapsed_ms, "Research complete with fallbacks");
        } else {
            info!(parent: &span, elapsed_ms = research.elapsed_ms, "Research complete");
        }

        Ok(research)
    }
}

async fn timed<F: Future>(fut: F) -> (F::Output, Duration) {
    let start = Instant::now();
    let output = fut.await;
    (output, start.elapsed())
}

/// Unwrap a branch's join result, substituting its sentinel if the task panicked.
fn recover<T>(
    joined: Result<(Sourced<T>, Duration), JoinError>,
    kind: SourceKind,
    sentinel: impl FnOnce() -> T,
    start: Instant,
) -> (Sourced<T>, Duration) {
    match joined {
        Ok(done) => done,
        Err(e) => (panicked(kind, sentinel(), &e), start.elapsed()),
    }
}

fn panicked<T>(kind: SourceKind, sentinel: T, e: &JoinError) -> Sourced<T> {
    error!(source = ?kind, error = %e, "Research branch panicked");
    Sourced::fallback(sentinel, format!("branch task failed: {e}"))
}

fn report<T>(source: SourceKind, outcome: &Sourced<T>, elapsed: Duration) -> SourceReport {
    SourceReport {
        source,
        status: outcome.status(),
        reason: outcome.reason().map(str::to_string),
        elapsed_ms: elapsed.as_millis() as u64,
    }
}
