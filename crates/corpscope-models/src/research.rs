use serde::{Deserialize, Serialize};

/// Ticker value meaning "no ticker could be resolved".
pub const UNKNOWN_TICKER: &str = "UNKNOWN";

/// Currency assumed when a source does not report one.
pub const DEFAULT_CURRENCY: &str = "BRL";

/// Market state used when the source reports none.
pub const UNKNOWN_MARKET_STATE: &str = "UNKNOWN";

/// Sector written into the summary when generation fails.
pub const FALLBACK_SECTOR: &str = "Unknown";

/// Sector written into the summary when the model omits one.
pub const MISSING_SECTOR: &str = "N/A";

/// Structured company summary produced by the text-generation model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CompanySummary {
    pub company_name: String,
    pub sector: String,
    pub description: String,
}

impl CompanySummary {
    /// The summary returned when generation or parsing fails.
    pub fn fallback(company_name: &str, error: impl std::fmt::Display) -> Self {
        Self {
            company_name: company_name.to_string(),
            sector: FALLBACK_SECTOR.to_string(),
            description: format!("Automated summary not available due to an error: {error}"),
        }
    }
}

/// A single news headline, in the order the search source returned it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewsItem {
    pub title: String,
    pub source: Option<String>,
    pub url: Option<String>,
}

/// Latest known price for a ticker.
///
/// `ticker == "UNKNOWN"` is the not-found sentinel. Do not test `price == 0.0`
/// for that, a real asset can trade at zero.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StockPrice {
    pub ticker: String,
    pub currency: String,
    pub price: f64,
    pub last_update: Option<String>,
    pub market_status: Option<String>,
    pub raw_state: Option<String>,
}

impl StockPrice {
    /// Sentinel for an unresolved ticker.
    pub fn unknown() -> Self {
        Self {
            ticker: UNKNOWN_TICKER.to_string(),
            currency: DEFAULT_CURRENCY.to_string(),
            price: 0.0,
            last_update: None,
            market_status: None,
            raw_state: None,
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.ticker == UNKNOWN_TICKER
    }
}

/// The merged research output. Every field is always populated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResearchResult {
    pub company: String,
    pub summary: CompanySummary,
    pub news: Vec<NewsItem>,
    pub stock_price: StockPrice,
}

/// Which research branch a report describes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Summary,
    News,
    StockPrice,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SourceStatus {
    Live,
    Fallback,
}

/// Diagnostics for one branch of a research run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SourceReport {
    pub source: SourceKind,
    pub status: SourceStatus,
    pub reason: Option<String>,
    pub elapsed_ms: u64,
}

/// A research result together with per-branch diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResearchReport {
    pub result: ResearchResult,
    pub sources: Vec<SourceReport>,
    pub elapsed_ms: u64,
}

impl ResearchReport {
    /// True if any branch fell back to sentinel data.
    pub fn is_degraded(&self) -> bool {
        self.sources
            .iter()
            .any(|s| s.status == SourceStatus::Fallback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_result() -> ResearchResult {
        ResearchResult {
            company: "Vale".to_string(),
            summary: CompanySummary {
                company_name: "Vale S.A.".to_string(),
                sector: "Mining".to_string(),
                description: "Brazilian mining company.".to_string(),
            },
            news: vec![NewsItem {
                title: "Vale reports output".to_string(),
                source: Some("Reuters".to_string()),
                url: None,
            }],
            stock_price: StockPrice::unknown(),
        }
    }

    #[test]
    fn result_serializes_with_exact_field_names() {
        let value = serde_json::to_value(sample_result()).unwrap();
        let obj = value.as_object().unwrap();
        let mut keys: Vec<&str> = obj.keys().map(|k| k.as_str()).collect();
        keys.sort_unstable();
        assert_eq!(keys, ["company", "news", "stock_price", "summary"]);

        let summary = value["summary"].as_object().unwrap();
        assert!(summary.contains_key("company_name"));
        assert!(summary.contains_key("sector"));
        assert!(summary.contains_key("description"));
    }

    #[test]
    fn optional_fields_serialize_as_null_not_absent() {
        let value = serde_json::to_value(StockPrice::unknown()).unwrap();
        assert_eq!(value["ticker"], "UNKNOWN");
        assert_eq!(value["currency"], "BRL");
        assert_eq!(value["price"], 0.0);
        assert!(value.as_object().unwrap().contains_key("last_update"));
        assert!(value["last_update"].is_null());
        assert!(value["market_status"].is_null());
        assert!(value["raw_state"].is_null());

        let news = serde_json::to_value(&sample_result().news[0]).unwrap();
        assert!(news["url"].is_null());
    }

    #[test]
    fn fallback_summary_carries_error_text() {
        let summary = CompanySummary::fallback("Minerva", "connection refused");
        assert_eq!(summary.company_name, "Minerva");
        assert_eq!(summary.sector, "Unknown");
        assert!(summary.description.contains("connection refused"));
    }

    #[test]
    fn unknown_sentinel_is_detected_by_ticker() {
        assert!(StockPrice::unknown().is_unknown());

        let zero_priced = StockPrice {
            ticker: "XYZ3.SA".to_string(),
            ..StockPrice::unknown()
        };
        assert!(!zero_priced.is_unknown());
    }

    #[test]
    fn report_flags_degraded_runs() {
        let mut report = ResearchReport {
            result: sample_result(),
            sources: vec![SourceReport {
                source: SourceKind::News,
                status: SourceStatus::Live,
                reason: None,
                elapsed_ms: 12,
            }],
            elapsed_ms: 12,
        };
        assert!(!report.is_degraded());

        report.sources.push(SourceReport {
            source: SourceKind::StockPrice,
            status: SourceStatus::Fallback,
            reason: Some("no ticker".to_string()),
            elapsed_ms: 0,
        });
        assert!(report.is_degraded());

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["sources"][1]["source"], "stock_price");
        assert_eq!(json["sources"][1]["status"], "fallback");
    }
}
