//! Intent Classifier
//!
//! Classifies user queries as either:
//! - Financial: stocks, markets, portfolios, earnings, company news (retrieval path)
//! - General conversation: greetings, capability questions, anything else
//!
//! Any model failure or unexpected label falls through to general
//! conversation, the cheaper path with no retrieval.

use crate::llm::{PromptVariables, TextGenerator};
use crate::models::Intent;
use std::sync::Arc;
use tracing::{info, warn};

const CLASSIFY_PROMPT: &str = r#"Your task is to classify the user's query into one of two categories: 'financial_query' or 'general_conversation'.
- 'financial_query': For questions about stocks, markets, portfolios, earnings, financial news, or specific companies.
- 'general_conversation': For greetings, questions about your capabilities (e.g., "how can you help?"), or any non-financial topic.

User Query: "{query}"

Return only the category name as a single string."#;

/// Outcome of one classification call, keeping the raw model text for tracing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub intent: Intent,
    pub raw_label: Option<String>,
}

/// Intent classifier backed by a text-generation model
pub struct IntentClassifier {
    generator: Arc<dyn TextGenerator>,
}

impl IntentClassifier {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    /// Classify a user query. Never fails; `raw_label` is `None` when the
    /// model could not be reached.
    pub async fn classify(&self, query: &str) -> Classification {
        let mut vars = PromptVariables::new();
        vars.insert("query", query.to_string());

        match self.generator.complete(CLASSIFY_PROMPT, &vars).await {
            Ok(raw) => {
                let raw = raw.trim().to_string();
                let intent = Intent::from_label(&raw);
                info!(raw_label = %raw, intent = %intent, "Intent classified");
                Classification {
                    intent,
                    raw_label: Some(raw),
                }
            }
            Err(e) => {
                warn!(error = %e, "Intent classification failed, defaulting to general conversation");
                Classification {
                    intent: Intent::GeneralConversation,
                    raw_label: None,
                }
            }
        }
    }
}
