//! Scripted stand-ins for the external collaborators.
//!
//! Each fake answers from a fixed script, can be slowed down with a
//! `tokio::time::sleep` (so tests under a paused clock can reason about
//! latency), and counts its calls so tests can assert that no request was made.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::SourceError;
use crate::llm::TextGenerator;
use crate::market::{FastQuote, MarketDataSource, QuoteDetails};
use crate::news::{NewsQuery, NewsSource, RawNewsItem};

/// How a scripted call fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    MissingCredential(&'static str),
    Status(u16),
    Panic,
}

impl Failure {
    fn raise(self, source_name: &'static str) -> SourceError {
        match self {
            Failure::MissingCredential(key) => SourceError::MissingCredential(key),
            Failure::Status(status) => SourceError::Status {
                source_name,
                status,
                body: "scripted failure".to_string(),
            },
            Failure::Panic => panic!("scripted panic in {source_name}"),
        }
    }
}

async fn pause(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

/// A [`TextGenerator`] that returns a fixed reply or a fixed failure.
pub struct ScriptedGenerator {
    reply: Result<String, Failure>,
    delay: Duration,
    calls: AtomicUsize,
    last_prompt: Mutex<Option<String>>,
}

impl ScriptedGenerator {
    pub fn replying(reply: impl Into<String>) -> Self {
        Self::scripted(Ok(reply.into()))
    }

    pub fn failing(failure: Failure) -> Self {
        Self::scripted(Err(failure))
    }

    /// Behaves like an OpenAI backend with no key configured.
    pub fn missing_key() -> Self {
        Self::failing(Failure::MissingCredential("OPENAI_API_KEY"))
    }

    fn scripted(reply: Result<String, Failure>) -> Self {
        Self {
            reply,
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
            last_prompt: Mutex::new(None),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.last_prompt.lock().ok().and_then(|p| p.clone())
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(
        &self,
        _system_prompt: &str,
        user_prompt: &str,
    ) -> Result<String, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut last) = self.last_prompt.lock() {
            *last = Some(user_prompt.to_string());
        }
        pause(self.delay).await;
        self.reply.clone().map_err(|f| f.raise("scripted"))
    }
}

/// A [`NewsSource`] that returns fixed hits or a fixed failure.
pub struct FakeNewsSource {
    hits: Result<Vec<RawNewsItem>, Failure>,
    delay: Duration,
    calls: AtomicUsize,
    last_query: Mutex<Option<NewsQuery>>,
}

impl FakeNewsSource {
    pub fn returning(hits: Vec<RawNewsItem>) -> Self {
        Self::scripted(Ok(hits))
    }

    /// Behaves like Bing with no key configured.
    pub fn failing() -> Self {
        Self::failing_with(Failure::MissingCredential("BING_API_KEY"))
    }

    pub fn failing_with(failure: Failure) -> Self {
        Self::scripted(Err(failure))
    }

    fn scripted(hits: Result<Vec<RawNewsItem>, Failure>) -> Self {
        Self {
            hits,
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
            last_query: Mutex::new(None),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_query(&self) -> Option<NewsQuery> {
        self.last_query.lock().ok().and_then(|q| q.clone())
    }
}

#[async_trait]
impl NewsSource for FakeNewsSource {
    fn name(&self) -> &str {
        "fake-news"
    }

    async fn search(&self, query: &NewsQuery) -> Result<Vec<RawNewsItem>, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut last) = self.last_query.lock() {
            *last = Some(query.clone());
        }
        pause(self.delay).await;
        self.hits.clone().map_err(|f| f.raise("fake-news"))
    }
}

/// A [`MarketDataSource`] with independently scripted fast and detailed paths.
pub struct FakeMarketData {
    fast: Result<FastQuote, Failure>,
    details: Result<QuoteDetails, Failure>,
    delay: Duration,
    calls: AtomicUsize,
}

impl FakeMarketData {
    /// Both paths succeed with empty data until scripted otherwise.
    pub fn new() -> Self {
        Self {
            fast: Ok(FastQuote::default()),
            details: Ok(QuoteDetails::default()),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_fast(mut self, quote: FastQuote) -> Self {
        self.fast = Ok(quote);
        self
    }

    pub fn with_details(mut self, details: QuoteDetails) -> Self {
        self.details = Ok(details);
        self
    }

    pub fn failing_fast(mut self) -> Self {
        self.fast = Err(Failure::Status(503));
        self
    }

    pub fn failing_details(mut self) -> Self {
        self.details = Err(Failure::Status(404));
        self
    }

    /// Delay applied to each of the two calls.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Total calls across both paths.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for FakeMarketData {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MarketDataSource for FakeMarketData {
    fn name(&self) -> &str {
        "fake-market"
    }

    async fn fast_quote(&self, _ticker: &str) -> Result<FastQuote, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        pause(self.delay).await;
        self.fast.clone().map_err(|f| f.raise("fake-market"))
    }

    async fn quote_details(&self, _ticker: &str) -> Result<QuoteDetails, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        pause(self.delay).await;
        self.details.clone().map_err(|f| f.raise("fake-market"))
    }
}
