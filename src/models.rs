//! Core data models for the market brief pipeline

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

//
// ================= Portfolio =================
//

/// One holding in a portfolio snapshot.
///
/// Missing keys default instead of failing: a record without `allocation`
/// counts as a 0.0 allocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationRecord {
    #[serde(default)]
    pub allocation: f64,
    #[serde(default = "default_region")]
    pub region: String,
    #[serde(default = "default_lang")]
    pub lang: String,
}

fn default_region() -> String {
    "US".to_string()
}

fn default_lang() -> String {
    "en-US".to_string()
}

impl AllocationRecord {
    pub fn new(allocation: f64) -> Self {
        Self {
            allocation,
            region: default_region(),
            lang: default_lang(),
        }
    }

    pub fn with_locale(allocation: f64, region: &str, lang: &str) -> Self {
        Self {
            allocation,
            region: region.to_string(),
            lang: lang.to_string(),
        }
    }
}

/// Ticker symbol -> allocation record. Tickers are case-sensitive and opaque.
/// Ordered so every report over a snapshot is deterministic.
pub type PortfolioSnapshot = BTreeMap<String, AllocationRecord>;

/// A news line tagged with its ticker, by convention `"[TICKER] free text"`.
pub type Headline = String;

//
// ================= Intent =================
//

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    FinancialQuery,
    GeneralConversation,
}

impl Intent {
    pub const FINANCIAL_LABEL: &'static str = "financial_query";
    pub const GENERAL_LABEL: &'static str = "general_conversation";

    /// Interpret raw model output. Only an output containing
    /// `financial_query` selects the financial path; anything else,
    /// including empty or malformed text, is general conversation.
    pub fn from_label(raw: &str) -> Self {
        if raw.contains(Self::FINANCIAL_LABEL) {
            Intent::FinancialQuery
        } else {
            Intent::GeneralConversation
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::FinancialQuery => Self::FINANCIAL_LABEL,
            Intent::GeneralConversation => Self::GENERAL_LABEL,
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

//
// ================= Sentiment =================
//

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Sentiment::Positive => "Positive",
            Sentiment::Negative => "Negative",
        };
        write!(f, "{}", s)
    }
}

//
// ================= Analysis =================
//

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSummary {
    pub portfolio_change_analysis: Vec<String>,
    pub portfolio_sentiment_analysis: Vec<String>,
}

//
// ================= Retrieval =================
//

/// Nearest-neighbour matches, best (lowest distance) first.
/// `documents` and `scores` always have the same length.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RetrievalResult {
    pub documents: Vec<String>,
    pub scores: Vec<f32>,
}

impl RetrievalResult {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn push(&mut self, document: String, score: f32) {
        self.documents.push(document);
        self.scores.push(score);
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Distance of the closest match, if any.
    pub fn best_score(&self) -> Option<f32> {
        self.scores.first().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f32)> {
        self.documents
            .iter()
            .map(String::as_str)
            .zip(self.scores.iter().copied())
    }
}
