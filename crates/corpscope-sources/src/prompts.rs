use std::path::Path;

use tracing::debug;

/// Placeholder substituted with the company name in summary templates.
pub const COMPANY_PLACEHOLDER: &str = "{company_name}";

pub const SUMMARY_SYSTEM_PROMPT: &str =
    "You are an investment banking research assistant. You answer with a single JSON object and nothing else.";

const DEFAULT_SUMMARY_TEMPLATE: &str = "\
Given the company name: {company_name}, produce a concise, professional company summary.

Return a JSON object **only** (no additional text) with exactly the following fields:
 - company_name: full canonical company name (string)
 - sector: main sector or industry (string)
 - description: short paragraph (2-4 sentences) describing the company's activities, brief history and main products/services (string)

Example:
{\"company_name\": \"Petrobras\", \"sector\": \"Energy / Oil & Gas\", \"description\": \"Petróleo Brasileiro S.A. (Petrobras) is a state-controlled energy company...\"}

If you are not sure about a specific field, provide the best succinct answer you can.";

/// Prompt template for the company summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryPrompt {
    template: String,
}

impl SummaryPrompt {
    pub fn builtin() -> Self {
        Self {
            template: DEFAULT_SUMMARY_TEMPLATE.to_string(),
        }
    }

    pub fn from_template(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    /// Load the template file if it exists and is readable, otherwise use the
    /// built-in prompt.
    pub fn load_or_builtin(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(template) if !template.trim().is_empty() => {
                debug!(path = %path.display(), "Loaded summary prompt template");
                Self::from_template(template)
            }
            Ok(_) => {
                debug!(path = %path.display(), "Summary prompt template is empty, using built-in");
                Self::builtin()
            }
            Err(e) => {
                debug!(path = %path.display(), error = %e, "No summary prompt template, using built-in");
                Self::builtin()
            }
        }
    }

    pub fn render(&self, company_name: &str) -> String {
        self.template.replace(COMPANY_PLACEHOLDER, company_name)
    }
}

impl Default for SummaryPrompt {
    fn default() -> Self {
        Self::builtin()
    }
}

pub const TICKER_SYSTEM_PROMPT: &str =
    "You are a financial data assistant. You answer with a single exchange ticker code and nothing else.";

/// Prompt asking the model to infer a ticker for a company name.
pub fn ticker_prompt(company_name: &str) -> String {
    format!(
        "What is the main stock exchange ticker symbol for the company \"{company_name}\"?\n\n\
         Rules:\n\
         - Answer with ONLY the ticker code, exactly as Yahoo Finance lists it.\n\
         - Brazilian companies listed on B3 use the .SA suffix.\n\
         - If you do not know, or the company is not publicly traded, answer exactly: UNKNOWN\n\
         - No explanations, no punctuation, no quotes.\n\n\
         Examples:\n\
         Petrobras -> PETR4.SA\n\
         Vale -> VALE3.SA\n\
         Itaú Unibanco -> ITUB4.SA\n\
         Apple -> AAPL\n\
         Some Family Bakery -> UNKNOWN\n\n\
         {company_name} ->"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn builtin_prompt_asks_for_three_keys() {
        let rendered = SummaryPrompt::builtin().render("Ambev");
        assert!(rendered.contains("Given the company name: Ambev,"));
        assert!(rendered.contains("company_name"));
        assert!(rendered.contains("sector"));
        assert!(rendered.contains("description"));
        assert!(!rendered.contains(COMPANY_PLACEHOLDER));
    }

    #[test]
    fn template_file_overrides_builtin() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "Summarize {{company_name}} as JSON. Name: {{company_name}}").unwrap();

        let prompt = SummaryPrompt::load_or_builtin(file.path());
        assert_eq!(
            prompt.render("Vale"),
            "Summarize Vale as JSON. Name: Vale"
        );
    }

    #[test]
    fn missing_template_falls_back_silently() {
        let dir = tempfile::tempdir().unwrap();
        let prompt = SummaryPrompt::load_or_builtin(dir.path().join("absent.txt"));
        assert_eq!(prompt, SummaryPrompt::builtin());
    }

    #[test]
    fn directory_path_is_unreadable_and_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(SummaryPrompt::load_or_builtin(dir.path()), SummaryPrompt::builtin());
    }

    #[test]
    fn ticker_prompt_has_sentinel_and_examples() {
        let prompt = ticker_prompt("Minerva");
        assert!(prompt.contains("\"Minerva\""));
        assert!(prompt.contains("UNKNOWN"));
        assert!(prompt.contains("VALE3.SA"));
        assert!(prompt.ends_with("Minerva ->"));
    }
}
