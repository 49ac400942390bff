//! E-invoicing topic classification.
//!
//! Asks the completion model first; any failure (no key, network, non-2xx,
//! unreadable body) drops to the deterministic keyword policy.

use crate::models::{ClassificationMethod, ClassificationResult};
use crate::services::providers::{CompletionParams, CompletionProvider};
use std::sync::Arc;

pub const CONTENT_PREFIX_CHARS: usize = 800;

const MODEL_PARAMS: CompletionParams = CompletionParams {
    max_new_tokens: 5,
    temperature: 0.1,
};

const STRONG_INDICATORS: &[&str] = &[
    "e-invoice",
    "einvoice",
    "e invoice",
    "e-invoicing",
    "einvoicing",
    "e invoicing",
    "electronic invoice",
    "electronic invoicing",
    "e-facturatie",
    "efacturatie",
    "e facturatie",
    "elektronische factuur",
    "elektronische facturering",
    "facturation électronique",
    "facture électronique",
    "peppol",
    "ubl invoice",
    "xml invoice",
];

/// Generic invoicing-tool phrases that are not about e-invoicing.
const EXCLUDE_TERMS: &[&str] = &[
    "invoice software",
    "invoice template",
    "invoice generator",
    "create invoice",
    "invoice app",
    "invoice management",
];

const CANONICAL_PHRASES: &[&str] = &["e-invoicing", "electronic invoicing"];

#[derive(Clone)]
pub struct TopicClassifier {
    provider: Option<Arc<dyn CompletionProvider>>,
}

impl TopicClassifier {
    pub fn new(provider: Option<Arc<dyn CompletionProvider>>) -> Self {
        Self { provider }
    }

    pub fn keyword_only() -> Self {
        Self { provider: None }
    }

    pub fn has_model(&self) -> bool {
        self.provider.is_some()
    }

    pub async fn classify(&self, title: &str, content: &str) -> ClassificationResult {
        if let Some(provider) = &self.provider {
            let prompt = build_prompt(title, content);
            match provider.complete(&prompt, &MODEL_PARAMS).await {
                Ok(reply) => {
                    let verified = reply_is_affirmative(&reply);
                    tracing::info!(verified, method = %ClassificationMethod::ExternalModel, "Classified content");
                    return ClassificationResult {
                        verified,
                        response: reply.trim().to_string(),
                        method: ClassificationMethod::ExternalModel,
                    };
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Completion API failed, using keyword fallback");
                }
            }
        }

        let result = keyword_verdict(title, content);
        tracing::info!(verified = result.verified, method = %result.method, "Classified content");
        result
    }
}

pub fn build_prompt(title: &str, content: &str) -> String {
    let prefix: String = content.chars().take(CONTENT_PREFIX_CHARS).collect();
    let content_to_verify = format!("{}\n\n{}", title, prefix);

    format!(
        "Is this content about e-invoicing, electronic invoicing, digital invoicing, or electronic billing?\n\
         \n\
         Title: {}\n\
         Content: {}\n\
         \n\
         Answer ONLY \"YES\" or \"NO\".",
        title, content_to_verify
    )
}

/// Affirmative iff the reply contains "YES" and no "NO" anywhere, ignoring case.
///
/// Substring matching: "NOT", "KNOW" or "YES, NO DOUBT" all count as negative.
pub fn reply_is_affirmative(reply: &str) -> bool {
    let upper = reply.to_uppercase();
    upper.contains("YES") && !upper.contains("NO")
}

pub fn keyword_verdict(title: &str, content: &str) -> ClassificationResult {
    let combined = format!("{} {}", title, content).to_lowercase();

    let has_strong_indicator = STRONG_INDICATORS
        .iter()
        .any(|indicator| combined.contains(indicator));

    if !has_strong_indicator {
        return ClassificationResult::keyword(false, "No strong e-invoicing indicators");
    }

    let has_canonical = CANONICAL_PHRASES
        .iter()
        .any(|phrase| combined.contains(phrase));
    let has_exclude_term = !has_canonical && EXCLUDE_TERMS.iter().any(|term| combined.contains(term));

    if has_exclude_term {
        return ClassificationResult::keyword(false, "Generic invoicing tool, not e-invoicing");
    }

    ClassificationResult::keyword(true, "Strong e-invoicing indicators found")
}
