//! Narrative synthesis
//!
//! Turns the structured context of a run into the user-facing answer.
//! Model failures never escape: they come back as a string starting with
//! [`ERROR_MARKER`], which callers treat as a failed answer.

use crate::llm::{PromptVariables, TextGenerator};
use crate::models::{AnalysisSummary, PortfolioSnapshot};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

/// Every failure string produced here starts with this marker.
pub const ERROR_MARKER: &str = "Error:";

const BRIEF_PROMPT: &str = r#"You are a sharp financial analyst reporting to a portfolio manager.
Your task is to provide a concise, easy-to-read daily market brief based on the data below.
Focus on the most significant changes and their potential impact.

Here is the data for today:

---
1. CURRENT PORTFOLIO ALLOCATION:
{portfolio_data}

2. KEY ANALYSIS SUMMARY:
{analysis_summary}

3. RELEVANT NEWS SNIPPETS (Retrieved from Vector Database):
{retrieved_news}
---

INSTRUCTIONS:
- Synthesize all the information into a single, coherent paragraph.
- Start with the most important takeaway.
- Do not list the data; weave it into a narrative.
- Keep it brief and to the point."#;

const DIRECT_ANSWER_PROMPT: &str = r#"You are a sharp financial analyst answering a portfolio manager's question.

QUESTION:
{user_query}

---
1. RELEVANT NEWS SNIPPETS (primary evidence):
{retrieved_news}

2. CURRENT PORTFOLIO ALLOCATION (background):
{portfolio_data}

3. KEY ANALYSIS SUMMARY (background):
{analysis_summary}
---

INSTRUCTIONS:
- Begin with a direct answer to the question.
- Base the answer on the news snippets first; use the portfolio and analysis only as background.
- If the data does not contain enough information to answer, say so explicitly. Do not invent facts.
- Answer in one short, coherent paragraph."#;

const GENERAL_PROMPT: &str = r#"You are a helpful and friendly AI financial assistant. Answer the user's general question directly and conversationally.

User's question: "{query}""#;

/// Structured input to the synthesizer.
///
/// With `user_query` set the answer leads with a direct response to that
/// question; without it the result is a general market brief.
#[derive(Debug, Clone, Serialize)]
pub struct SynthesisContext {
    pub portfolio_data: PortfolioSnapshot,
    pub analysis_summary: AnalysisSummary,
    pub retrieved_news: Vec<String>,
    pub user_query: Option<String>,
}

pub struct NarrativeSynthesizer {
    generator: Arc<dyn TextGenerator>,
}

impl NarrativeSynthesizer {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    pub async fn synthesize(&self, context: &SynthesisContext) -> String {
        let mut vars = PromptVariables::new();
        vars.insert("portfolio_data", format_portfolio(&context.portfolio_data));
        vars.insert("analysis_summary", format_analysis(&context.analysis_summary));
        vars.insert("retrieved_news", format_news(&context.retrieved_news));

        let template = match &context.user_query {
            Some(query) => {
                vars.insert("user_query", query.clone());
                DIRECT_ANSWER_PROMPT
            }
            None => BRIEF_PROMPT,
        };

        match self.generator.complete(template, &vars).await {
            Ok(text) => {
                info!(
                    direct_answer = context.user_query.is_some(),
                    length = text.len(),
                    "Narrative generated"
                );
                text
            }
            Err(e) => {
                warn!(error = %e, "Narrative generation failed");
                format!("{} an error occurred while generating the summary: {}", ERROR_MARKER, e)
            }
        }
    }

    /// Conversational answer for non-financial queries.
    pub async fn answer_general(&self, query: &str) -> String {
        let mut vars = PromptVariables::new();
        vars.insert("query", query.to_string());

        match self.generator.complete(GENERAL_PROMPT, &vars).await {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "General conversation answer failed");
                format!("{} could not generate a response: {}", ERROR_MARKER, e)
            }
        }
    }
}

/// Whether a synthesizer output is a failure string.
pub fn is_error_response(text: &str) -> bool {
    text.starts_with(ERROR_MARKER)
}

fn format_portfolio(portfolio: &PortfolioSnapshot) -> String {
    if portfolio.is_empty() {
        return "(no holdings)".to_string();
    }

    portfolio
        .iter()
        .map(|(ticker, record)| {
            format!(
                "- {}: {:.1}% (region {}, {})",
                ticker,
                record.allocation * 100.0,
                record.region,
                record.lang
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_analysis(summary: &AnalysisSummary) -> String {
    let mut out = String::from("Allocation changes:\n");
    for line in &summary.portfolio_change_analysis {
        out.push_str(&format!("- {}\n", line));
    }
    out.push_str("News sentiment:\n");
    for line in &summary.portfolio_sentiment_analysis {
        out.push_str(&format!("- {}\n", line));
    }
    out.trim_end().to_string()
}

fn format_news(news: &[String]) -> String {
    if news.is_empty() {
        return "(no relevant news)".to_string();
    }
    news.iter()
        .map(|n| format!("- {}", n))
        .collect::<Vec<_>>()
        .join("\n")
}
