//! Portfolio diff analysis
//!
//! Pure functions: allocation deltas between two snapshots and keyword
//! sentiment over tagged headlines. Deterministic, no I/O.

use crate::models::{AnalysisSummary, Headline, PortfolioSnapshot, Sentiment};
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::BTreeSet;

pub const NO_PREVIOUS_DATA: &str = "No previous day data available to calculate portfolio changes.";
pub const NO_SIGNIFICANT_CHANGES: &str = "No significant allocation changes detected.";
pub const NO_STRONG_SENTIMENT: &str = "No news with strong sentiment found for the portfolio.";
pub const UNKNOWN_TICKER: &str = "Unknown";

/// Absorbs float noise so a delta sitting exactly on the threshold is excluded.
const THRESHOLD_EPSILON: f64 = 1e-9;

const POSITIVE_KEYWORDS: &[&str] = &["beat", "beats", "exceeds", "strong", "rises", "booms"];
const NEGATIVE_KEYWORDS: &[&str] = &["miss", "missed", "misses", "plunge", "weak", "falls", "glut"];

lazy_static! {
    static ref TICKER_TAG: Regex = Regex::new(r"^\s*\[([^\]]+)\]").unwrap();
}

/// Portfolio analyzer with a configurable negligible-change threshold
#[derive(Debug, Clone)]
pub struct PortfolioAnalyzer {
    negligible_change_pp: f64,
}

impl PortfolioAnalyzer {
    pub fn new(negligible_change_pp: f64) -> Self {
        Self { negligible_change_pp }
    }

    pub fn analyze(
        &self,
        current: &PortfolioSnapshot,
        previous: Option<&PortfolioSnapshot>,
        headlines: &[Headline],
    ) -> AnalysisSummary {
        let mut change_lines = match previous {
            // An empty snapshot carries no prior allocations either.
            Some(previous) if !previous.is_empty() => {
                allocation_changes(current, previous, self.negligible_change_pp)
            }
            _ => vec![NO_PREVIOUS_DATA.to_string()],
        };
        if change_lines.is_empty() {
            change_lines.push(NO_SIGNIFICANT_CHANGES.to_string());
        }

        let mut sentiment_lines: Vec<String> = headlines
            .iter()
            .filter_map(|h| headline_sentiment(h))
            .map(|(ticker, sentiment)| {
                format!("{}: {} sentiment detected in news.", ticker, sentiment)
            })
            .collect();
        if sentiment_lines.is_empty() {
            sentiment_lines.push(NO_STRONG_SENTIMENT.to_string());
        }

        AnalysisSummary {
            portfolio_change_analysis: change_lines,
            portfolio_sentiment_analysis: sentiment_lines,
        }
    }
}

impl Default for PortfolioAnalyzer {
    fn default() -> Self {
        Self::new(0.01)
    }
}

/// One line per ticker (sorted) whose allocation moved by more than
/// `threshold_pp` percentage points. Tickers missing on one side count as 0.
pub fn allocation_changes(
    current: &PortfolioSnapshot,
    previous: &PortfolioSnapshot,
    threshold_pp: f64,
) -> Vec<String> {
    let tickers: BTreeSet<&String> = current.keys().chain(previous.keys()).collect();

    tickers
        .into_iter()
        .filter_map(|ticker| {
            let current_alloc = current.get(ticker).map_or(0.0, |r| r.allocation);
            let previous_alloc = previous.get(ticker).map_or(0.0, |r| r.allocation);
            let delta_pp = (current_alloc - previous_alloc) * 100.0;

            if delta_pp.abs() > threshold_pp + THRESHOLD_EPSILON {
                Some(format!(
                    "{} allocation changed by {:+.1} percentage points (from {:.1}% to {:.1}%)",
                    ticker,
                    delta_pp,
                    previous_alloc * 100.0,
                    current_alloc * 100.0
                ))
            } else {
                None
            }
        })
        .collect()
}

/// The leading `[TICKER]` tag of a headline, or `"Unknown"`.
pub fn extract_ticker(headline: &str) -> &str {
    TICKER_TAG
        .captures(headline)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim())
        .filter(|t| !t.is_empty())
        .unwrap_or(UNKNOWN_TICKER)
}

/// Case-insensitive keyword match; positive keywords are checked first.
/// `None` for headlines matching neither set.
pub fn classify_sentiment(headline: &str) -> Option<Sentiment> {
    let lowered = headline.to_lowercase();

    if POSITIVE_KEYWORDS.iter().any(|kw| lowered.contains(kw)) {
        Some(Sentiment::Positive)
    } else if NEGATIVE_KEYWORDS.iter().any(|kw| lowered.contains(kw)) {
        Some(Sentiment::Negative)
    } else {
        None
    }
}

fn headline_sentiment(headline: &str) -> Option<(&str, Sentiment)> {
    classify_sentiment(headline).map(|sentiment| (extract_ticker(headline), sentiment))
}
