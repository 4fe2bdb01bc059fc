use std::collections::BTreeMap;
use std::sync::Arc;

use corpscope_models::research::MISSING_SECTOR;
use corpscope_models::{CompanySummary, Sourced};
use serde::Deserialize;
use tracing::{info, warn};

use crate::error::{ResearchError, SourceError};
use crate::llm::TextGenerator;
use crate::parser::extract_json;
use crate::prompts::{SummaryPrompt, SUMMARY_SYSTEM_PROMPT};

/// Reject blank company names. The only caller-facing error in a research run.
pub fn validate_company_name(company_name: &str) -> Result<(), ResearchError> {
    if company_name.trim().is_empty() {
        return Err(ResearchError::InvalidCompanyName);
    }
    Ok(())
}

/// Model output as received, with synonym keys kept apart.
#[derive(Debug, Default, Deserialize)]
struct RawSummary {
    company_name: Option<String>,
    company: Option<String>,
    sector: Option<String>,
    industry: Option<String>,
    description: Option<String>,
    summary: Option<String>,
    #[serde(flatten)]
    unrecognized: BTreeMap<String, serde_json::Value>,
}

/// First non-blank candidate, trimmed.
fn pick(primary: Option<String>, synonym: Option<String>) -> Option<String> {
    [primary, synonym]
        .into_iter()
        .flatten()
        .map(|v| v.trim().to_string())
        .find(|v| !v.is_empty())
}

/// Parse model output into a summary.
///
/// Accepts `company`, `industry` and `summary` as synonyms for the three
/// schema keys. The primary key wins when both are present.
pub fn parse_summary(raw_output: &str, company_name: &str) -> Result<CompanySummary, SourceError> {
    let json_str = extract_json(raw_output)?;
    let value: serde_json::Value = serde_json::from_str(&json_str)?;
    if !value.is_object() {
        return Err(SourceError::Parse(format!(
            "Expected a JSON object, got: {json_str}"
        )));
    }

    let raw: RawSummary = serde_json::from_value(value)
        .map_err(|e| SourceError::Parse(format!("Summary schema mismatch: {e}")))?;

    if !raw.unrecognized.is_empty() {
        let keys: Vec<&str> = raw.unrecognized.keys().map(String::as_str).collect();
        warn!(company = company_name, keys = ?keys, "Summary has unrecognized keys");
    }

    Ok(CompanySummary {
        company_name: pick(raw.company_name, raw.company)
            .unwrap_or_else(|| company_name.trim().to_string()),
        sector: pick(raw.sector, raw.industry).unwrap_or_else(|| MISSING_SECTOR.to_string()),
        description: pick(raw.description, raw.summary).unwrap_or_default(),
    })
}

/// Produces a structured company summary through a text-generation model.
pub struct SummaryProvider {
    generator: Arc<dyn TextGenerator>,
    prompt: SummaryPrompt,
}

impl SummaryProvider {
    pub fn new(generator: Arc<dyn TextGenerator>, prompt: SummaryPrompt) -> Self {
        Self { generator, prompt }
    }

    /// Fails only on a blank name. Model and parse failures return the
    /// fallback summary.
    pub async fn get_summary(
        &self,
        company_name: &str,
    ) -> Result<Sourced<CompanySummary>, ResearchError> {
        validate_company_name(company_name)?;

        let user_prompt = self.prompt.render(company_name);
        let outcome = match self
            .generator
            .complete(SUMMARY_SYSTEM_PROMPT, &user_prompt)
            .await
        {
            Ok(raw) => parse_summary(&raw, company_name),
            Err(e) => Err(e),
        };

        Ok(match outcome {
            Ok(summary) => {
                info!(
                    company = company_name,
                    backend = self.generator.name(),
                    sector = %summary.sector,
                    "Generated summary"
                );
                Sourced::Live(summary)
            }
            Err(e) => {
                warn!(company = company_name, backend = self.generator.name(), error = %e, "Summary generation failed");
                Sourced::fallback(CompanySummary::fallback(company_name, &e), e.to_string())
            }
        })
    }
}
