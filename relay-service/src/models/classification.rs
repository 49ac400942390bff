use serde::{Deserialize, Serialize};
use std::fmt;

/// Which path produced a verdict.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationMethod {
    ExternalModel,
    KeywordFallback,
}

impl fmt::Display for ClassificationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassificationMethod::ExternalModel => write!(f, "external_model"),
            ClassificationMethod::KeywordFallback => write!(f, "keyword_fallback"),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ClassificationResult {
    pub verified: bool,
    pub response: String,
    pub method: ClassificationMethod,
}

impl ClassificationResult {
    pub fn keyword(verified: bool, response: &str) -> Self {
        Self {
            verified,
            response: response.to_string(),
            method: ClassificationMethod::KeywordFallback,
        }
    }
}
