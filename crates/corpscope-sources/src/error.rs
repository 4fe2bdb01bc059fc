use thiserror::Error;

/// The only error a research run surfaces to its caller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResearchError {
    #[error("company_name must be a non-empty string")]
    InvalidCompanyName,
}

/// Failure inside a single data source. Providers turn these into fallbacks.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("{0} is not set")]
    MissingCredential(&'static str),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{source_name} returned HTTP {status}: {body}")]
    Status {
        source_name: &'static str,
        status: u16,
        body: String,
    },

    #[error("Claude CLI error: {0}")]
    Cli(String),

    #[error("Timed out after {0} seconds")]
    Timeout(u64),

    #[error("Response parse error: {0}")]
    Parse(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_are_readable() {
        assert_eq!(
            SourceError::MissingCredential("BING_API_KEY").to_string(),
            "BING_API_KEY is not set"
        );
        let status = SourceError::Status {
            source_name: "bing",
            status: 429,
            body: "quota".to_string(),
        };
        assert_eq!(status.to_string(), "bing returned HTTP 429: quota");
        assert_eq!(
            ResearchError::InvalidCompanyName.to_string(),
            "company_name must be a non-empty string"
        );
    }
}
