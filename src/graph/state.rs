//! Graph state threaded through a workflow run.
//!
//! Nodes never touch the state directly. Each returns a [`StateDelta`] that
//! the driver merges; merging into a field that is already set is a
//! [`OrchestrationError::StateConflict`].

use crate::error::OrchestrationError;
use crate::models::{AnalysisSummary, Headline, Intent, PortfolioSnapshot};
use crate::Result;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphState {
    pub user_query: String,
    pub intent_type: Option<Intent>,
    /// Classifier output as the model returned it.
    pub intent_label: Option<String>,
    pub portfolio_data: Option<PortfolioSnapshot>,
    /// Outer `None`: not loaded yet. `Some(None)`: loaded, nothing persisted before.
    pub previous_portfolio_data: Option<Option<PortfolioSnapshot>>,
    pub scraped_headlines: Option<Vec<Headline>>,
    pub retrieved_news: Option<Vec<String>>,
    pub retrieval_scores: Option<Vec<f32>>,
    pub analysis_summary: Option<AnalysisSummary>,
    pub final_response: Option<String>,
}

impl GraphState {
    pub fn new(user_query: impl Into<String>) -> Self {
        Self {
            user_query: user_query.into(),
            ..Default::default()
        }
    }

    /// Merge a node's output, consuming the current state.
    pub fn merge(mut self, delta: StateDelta) -> Result<Self> {
        set_once(&mut self.intent_type, delta.intent_type, "intent_type")?;
        set_once(&mut self.intent_label, delta.intent_label, "intent_label")?;
        set_once(&mut self.portfolio_data, delta.portfolio_data, "portfolio_data")?;
        set_once(
            &mut self.previous_portfolio_data,
            delta.previous_portfolio_data,
            "previous_portfolio_data",
        )?;
        set_once(&mut self.scraped_headlines, delta.scraped_headlines, "scraped_headlines")?;
        set_once(&mut self.retrieved_news, delta.retrieved_news, "retrieved_news")?;
        set_once(&mut self.retrieval_scores, delta.retrieval_scores, "retrieval_scores")?;
        set_once(&mut self.analysis_summary, delta.analysis_summary, "analysis_summary")?;
        set_once(&mut self.final_response, delta.final_response, "final_response")?;
        Ok(self)
    }

    /// Distance of the best retrieved match, if retrieval produced any.
    pub fn best_retrieval_score(&self) -> Option<f32> {
        self.retrieval_scores
            .as_ref()
            .and_then(|scores| scores.first().copied())
    }

    /// The persisted previous snapshot, flattened.
    pub fn previous_snapshot(&self) -> Option<&PortfolioSnapshot> {
        self.previous_portfolio_data.as_ref().and_then(Option::as_ref)
    }

    /// Fetch a field a previous node must have set, or fail with a graph error.
    pub fn require<'a, T>(field: &'a Option<T>, name: &'static str) -> Result<&'a T> {
        field.as_ref().ok_or_else(|| {
            OrchestrationError::GraphError(format!("state field '{}' read before it was set", name))
        })
    }
}

fn set_once<T>(slot: &mut Option<T>, value: Option<T>, field: &'static str) -> Result<()> {
    match (slot.is_some(), value) {
        (_, None) => Ok(()),
        (true, Some(_)) => Err(OrchestrationError::StateConflict { field }),
        (false, Some(value)) => {
            *slot = Some(value);
            Ok(())
        }
    }
}

/// The fields a single node writes. Built fluently; unset fields are left alone.
#[derive(Debug, Clone, Default)]
pub struct StateDelta {
    intent_type: Option<Intent>,
    intent_label: Option<String>,
    portfolio_data: Option<PortfolioSnapshot>,
    previous_portfolio_data: Option<Option<PortfolioSnapshot>>,
    scraped_headlines: Option<Vec<Headline>>,
    retrieved_news: Option<Vec<String>>,
    retrieval_scores: Option<Vec<f32>>,
    analysis_summary: Option<AnalysisSummary>,
    final_response: Option<String>,
}

impl StateDelta {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intent_type(mut self, intent: Intent) -> Self {
        self.intent_type = Some(intent);
        self
    }

    pub fn intent_label(mut self, label: impl Into<String>) -> Self {
        self.intent_label = Some(label.into());
        self
    }

    pub fn portfolio_data(mut self, portfolio: PortfolioSnapshot) -> Self {
        self.portfolio_data = Some(portfolio);
        self
    }

    pub fn previous_portfolio_data(mut self, previous: Option<PortfolioSnapshot>) -> Self {
        self.previous_portfolio_data = Some(previous);
        self
    }

    pub fn scraped_headlines(mut self, headlines: Vec<Headline>) -> Self {
        self.scraped_headlines = Some(headlines);
        self
    }

    pub fn retrieved_news(mut self, news: Vec<String>) -> Self {
        self.retrieved_news = Some(news);
        self
    }

    pub fn retrieval_scores(mut self, scores: Vec<f32>) -> Self {
        self.retrieval_scores = Some(scores);
        self
    }

    pub fn analysis_summary(mut self, summary: AnalysisSummary) -> Self {
        self.analysis_summary = Some(summary);
        self
    }

    pub fn final_response(mut self, response: impl Into<String>) -> Self {
        self.final_response = Some(response.into());
        self
    }
}
