use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single research request for one company.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResearchRequest {
    /// Log correlation only. Never part of the research output.
    pub request_id: Uuid,
    pub company_name: String,
}

impl ResearchRequest {
    pub fn new(company_name: impl Into<String>) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            company_name: company_name.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_request_gets_unique_id() {
        let a = ResearchRequest::new("Vale");
        let b = ResearchRequest::new("Vale");
        assert_ne!(a.request_id, b.request_id);
        assert_eq!(a.company_name, "Vale");
    }
}
