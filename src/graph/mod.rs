//! Workflow graph engine
//!
//! START → classify_intent → (financial) load_and_scrape → retrieve_news
//!       → (confident) analyze_data → generate_response → save_log → END
//!
//! Every branch lives in [`TRANSITIONS`]; the driver loop in [`Workflow::run`]
//! executes a node, merges its delta, then takes the first transition out of
//! that node whose guard holds.

pub mod state;

pub use state::{GraphState, StateDelta};

use crate::analysis::PortfolioAnalyzer;
use crate::classifier::IntentClassifier;
use crate::config::{EmbeddingBackend, PipelineConfig, SynthesisMode};
use crate::error::OrchestrationError;
use crate::gemini::GeminiClient;
use crate::llm::TextGenerator;
use crate::models::{Intent, PortfolioSnapshot, RetrievalResult};
use crate::news::{NewsScraper, YahooRssScraper};
use crate::retrieval::{Embedder, EmbeddingIndex, HashingEmbedder};
use crate::state::{JsonFilePortfolioStore, PortfolioStore};
use crate::synthesizer::{NarrativeSynthesizer, SynthesisContext};
use crate::Result;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

pub const CLARIFICATION_MESSAGE: &str = "I couldn't find any specific information related to your query in the recent news. Could you please try rephrasing your question?";

/// Upper bound on node executions in one run.
const MAX_NODE_VISITS: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Node {
    ClassifyIntent,
    HandleGeneralConversation,
    LoadAndScrape,
    RetrieveNews,
    ClarifyQuestion,
    AnalyzeData,
    GenerateResponse,
    SaveLog,
}

impl Node {
    pub const START: Node = Node::ClassifyIntent;

    pub const ALL: [Node; 8] = [
        Node::ClassifyIntent,
        Node::HandleGeneralConversation,
        Node::LoadAndScrape,
        Node::RetrieveNews,
        Node::ClarifyQuestion,
        Node::AnalyzeData,
        Node::GenerateResponse,
        Node::SaveLog,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Node::ClassifyIntent => "classify_intent",
            Node::HandleGeneralConversation => "handle_general_conversation",
            Node::LoadAndScrape => "load_and_scrape",
            Node::RetrieveNews => "retrieve_news",
            Node::ClarifyQuestion => "clarify_question",
            Node::AnalyzeData => "analyze_data",
            Node::GenerateResponse => "generate_response",
            Node::SaveLog => "save_log",
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Node(Node),
    End,
}

/// Predicates over the accumulated state that select a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Guard {
    Always,
    FinancialIntent,
    /// No retrieval results, or the best distance is above the threshold.
    LowConfidence,
}

impl Guard {
    fn holds(self, state: &GraphState, confidence_threshold: f32) -> bool {
        match self {
            Guard::Always => true,
            Guard::FinancialIntent => state.intent_type == Some(Intent::FinancialQuery),
            Guard::LowConfidence => match state.best_retrieval_score() {
                None => true,
                // NaN distances never count as confident
                Some(best) => best.is_nan() || best > confidence_threshold,
            },
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Transition {
    pub from: Node,
    pub guard: Guard,
    pub to: Step,
}

const fn edge(from: Node, guard: Guard, to: Step) -> Transition {
    Transition { from, guard, to }
}

/// Ordered per source node; the first matching row wins.
pub const TRANSITIONS: &[Transition] = &[
    edge(Node::ClassifyIntent, Guard::FinancialIntent, Step::Node(Node::LoadAndScrape)),
    edge(Node::ClassifyIntent, Guard::Always, Step::Node(Node::HandleGeneralConversation)),
    edge(Node::HandleGeneralConversation, Guard::Always, Step::End),
    edge(Node::LoadAndScrape, Guard::Always, Step::Node(Node::RetrieveNews)),
    edge(Node::RetrieveNews, Guard::LowConfidence, Step::Node(Node::ClarifyQuestion)),
    edge(Node::RetrieveNews, Guard::Always, Step::Node(Node::AnalyzeData)),
    edge(Node::ClarifyQuestion, Guard::Always, Step::End),
    edge(Node::AnalyzeData, Guard::Always, Step::Node(Node::GenerateResponse)),
    edge(Node::GenerateResponse, Guard::Always, Step::Node(Node::SaveLog)),
    edge(Node::SaveLog, Guard::Always, Step::End),
];

/// Resolve the step after `node` against the current state.
pub fn next_step(node: Node, state: &GraphState, confidence_threshold: f32) -> Result<Step> {
    TRANSITIONS
        .iter()
        .find(|t| t.from == node && t.guard.holds(state, confidence_threshold))
        .map(|t| t.to)
        .ok_or_else(|| OrchestrationError::GraphError(format!("no transition out of '{}'", node)))
}

/// Result of one complete run.
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowOutcome {
    pub run_id: Uuid,
    pub state: GraphState,
    /// Visited nodes, in order.
    pub path: Vec<Node>,
    pub elapsed_ms: u64,
}

impl WorkflowOutcome {
    pub fn response(&self) -> &str {
        self.state.final_response.as_deref().unwrap_or_default()
    }
}

/// The query pipeline with its collaborators.
pub struct Workflow {
    classifier: IntentClassifier,
    synthesizer: NarrativeSynthesizer,
    analyzer: PortfolioAnalyzer,
    scraper: Arc<dyn NewsScraper>,
    store: Arc<dyn PortfolioStore>,
    embedder: Arc<dyn Embedder>,
    confidence_threshold: f32,
    retrieval_k: usize,
    synthesis_mode: SynthesisMode,
}

impl Workflow {
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        embedder: Arc<dyn Embedder>,
        scraper: Arc<dyn NewsScraper>,
        store: Arc<dyn PortfolioStore>,
        config: &PipelineConfig,
    ) -> Self {
        Self {
            classifier: IntentClassifier::new(generator.clone()),
            synthesizer: NarrativeSynthesizer::new(generator),
            analyzer: PortfolioAnalyzer::new(config.negligible_change_pp),
            scraper,
            store,
            embedder,
            confidence_threshold: config.confidence_threshold,
            retrieval_k: config.retrieval_k.max(1),
            synthesis_mode: config.synthesis_mode,
        }
    }

    /// Production wiring: Gemini, Yahoo RSS and JSON files on disk.
    pub fn from_config(config: &PipelineConfig) -> Result<Self> {
        if config.gemini_api_key.is_empty() {
            warn!("GEMINI_API_KEY not set; model calls will fail and degrade");
        }

        let gemini = Arc::new(GeminiClient::new(
            config.gemini_api_key.clone(),
            config.generation_model.clone(),
        )?);

        let embedder: Arc<dyn Embedder> = match config.embedding_backend {
            EmbeddingBackend::Gemini => gemini.clone(),
            EmbeddingBackend::Hashing => Arc::new(HashingEmbedder::new()),
        };

        let scraper = Arc::new(YahooRssScraper::new(config.scrape_timeout)?);
        let store = Arc::new(JsonFilePortfolioStore::new(
            config.portfolio_path.clone(),
            config.previous_portfolio_path.clone(),
        ));

        info!(
            backend = ?config.embedding_backend,
            model = %config.generation_model,
            threshold = config.confidence_threshold,
            "Workflow initialised"
        );

        Ok(Self::new(gemini, embedder, scraper, store, config))
    }

    /// Run one query from START to END.
    pub async fn run(&self, query: &str) -> Result<WorkflowOutcome> {
        let start_time = Instant::now();
        let run_id = Uuid::new_v4();
        let mut state = GraphState::new(query);
        let mut path = Vec::new();
        let mut current = Node::START;

        info!(run_id = %run_id, query = %query, "Workflow: starting run");

        loop {
            if path.len() >= MAX_NODE_VISITS {
                return Err(OrchestrationError::GraphError(format!(
                    "run {} exceeded {} node visits",
                    run_id, MAX_NODE_VISITS
                )));
            }

            info!(run_id = %run_id, node = %current, "Entering node");
            path.push(current);
            state = self.step(current, state).await?;

            match next_step(current, &state, self.confidence_threshold)? {
                Step::Node(next) => {
                    debug!(from = %current, to = %next, "Routing");
                    current = next;
                }
                Step::End => break,
            }
        }

        let elapsed_ms = start_time.elapsed().as_millis() as u64;
        info!(
            run_id = %run_id,
            terminal = %current,
            nodes = path.len(),
            elapsed_ms,
            "Workflow: run complete"
        );

        Ok(WorkflowOutcome {
            run_id,
            state,
            path,
            elapsed_ms,
        })
    }

    /// Execute one node and merge its output into `state`.
    pub async fn step(&self, node: Node, state: GraphState) -> Result<GraphState> {
        let delta = self.execute(node, &state).await?;
        state.merge(delta)
    }

    async fn execute(&self, node: Node, state: &GraphState) -> Result<StateDelta> {
        match node {
            Node::ClassifyIntent => {
                let classification = self.classifier.classify(&state.user_query).await;
                let delta = StateDelta::new().intent_type(classification.intent);
                Ok(match classification.raw_label {
                    Some(label) => delta.intent_label(label),
                    None => delta,
                })
            }

            Node::HandleGeneralConversation => {
                let answer = self.synthesizer.answer_general(&state.user_query).await;
                Ok(StateDelta::new().final_response(answer))
            }

            Node::LoadAndScrape => {
                let current = match self.store.load_current().await? {
                    Some(portfolio) => portfolio,
                    None => {
                        warn!("No portfolio configured; continuing with an empty one");
                        PortfolioSnapshot::new()
                    }
                };
                let previous = self.store.load_previous().await?;
                let headlines = self.scraper.scrape(&current).await;

                debug!(
                    tickers = current.len(),
                    has_previous = previous.is_some(),
                    headline_count = headlines.len(),
                    "Portfolio loaded and news scraped"
                );

                Ok(StateDelta::new()
                    .portfolio_data(current)
                    .previous_portfolio_data(previous)
                    .scraped_headlines(headlines))
            }

            Node::RetrieveNews => {
                let headlines = GraphState::require(&state.scraped_headlines, "scraped_headlines")?;
                let result = self.retrieve(headlines, &state.user_query).await?;

                debug!(
                    retrieved = result.len(),
                    best_score = ?result.best_score(),
                    "Retrieval complete"
                );

                Ok(StateDelta::new()
                    .retrieved_news(result.documents)
                    .retrieval_scores(result.scores))
            }

            Node::ClarifyQuestion => Ok(StateDelta::new().final_response(CLARIFICATION_MESSAGE)),

            Node::AnalyzeData => {
                let current = GraphState::require(&state.portfolio_data, "portfolio_data")?;
                let headlines = GraphState::require(&state.scraped_headlines, "scraped_headlines")?;
                let summary = self
                    .analyzer
                    .analyze(current, state.previous_snapshot(), headlines);
                Ok(StateDelta::new().analysis_summary(summary))
            }

            Node::GenerateResponse => {
                let context = SynthesisContext {
                    portfolio_data: GraphState::require(&state.portfolio_data, "portfolio_data")?
                        .clone(),
                    analysis_summary: GraphState::require(
                        &state.analysis_summary,
                        "analysis_summary",
                    )?
                    .clone(),
                    retrieved_news: GraphState::require(&state.retrieved_news, "retrieved_news")?
                        .clone(),
                    user_query: match self.synthesis_mode {
                        SynthesisMode::DirectAnswer => Some(state.user_query.clone()),
                        SynthesisMode::Brief => None,
                    },
                };
                let answer = self.synthesizer.synthesize(&context).await;
                Ok(StateDelta::new().final_response(answer))
            }

            Node::SaveLog => {
                let current = GraphState::require(&state.portfolio_data, "portfolio_data")?;
                // The answer is already produced; a failed save only costs the next diff.
                if let Err(e) = self.store.save_previous(current).await {
                    error!(error = %e, "Failed to persist previous portfolio snapshot");
                }
                Ok(StateDelta::new())
            }
        }
    }

    /// Build a fresh index over this run's headlines and query it.
    async fn retrieve(&self, headlines: &[String], query: &str) -> Result<RetrievalResult> {
        if headlines.is_empty() {
            debug!("No headlines scraped; skipping retrieval");
            return Ok(RetrievalResult::empty());
        }

        let mut index = EmbeddingIndex::new(self.embedder.clone());
        let outcome = match index.rebuild(headlines).await {
            Ok(()) => index.query(query, self.retrieval_k).await,
            Err(e) => Err(e),
        };

        match outcome {
            Ok(result) => Ok(result),
            Err(e) if e.is_collaborator_failure() => {
                warn!(error = %e, "Retrieval failed; treating as no relevant news");
                Ok(RetrievalResult::empty())
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::NO_SIGNIFICANT_CHANGES;
    use crate::llm::{PromptVariables, StaticGenerator};
    use crate::models::AllocationRecord;
    use crate::news::StaticScraper;
    use crate::state::InMemoryPortfolioStore;

    /// Two-axis embedder: anything mentioning TSMC points one way, all else the other.
    struct AxisEmbedder;

    #[async_trait::async_trait]
    impl Embedder for AxisEmbedder {
        fn dimension(&self) -> usize {
            2
        }

        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            if text.contains("TSMC") {
                Ok(vec![1.0, 0.0])
            } else {
                Ok(vec![0.0, 1.0])
            }
        }
    }

    struct BrokenEmbedder;

    #[async_trait::async_trait]
    impl Embedder for BrokenEmbedder {
        fn dimension(&self) -> usize {
            2
        }

        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Err(OrchestrationError::EmbeddingError("quota exceeded".to_string()))
        }
    }

    /// Answers classification prompts with a fixed label, everything else with `reply`.
    struct RoutingGenerator {
        label: &'static str,
        reply: &'static str,
    }

    #[async_trait::async_trait]
    impl TextGenerator for RoutingGenerator {
        async fn complete(&self, template: &str, _variables: &PromptVariables) -> Result<String> {
            if template.contains("classify the user's query") {
                Ok(self.label.to_string())
            } else {
                Ok(self.reply.to_string())
            }
        }
    }

    fn portfolio(entries: &[(&str, f64)]) -> PortfolioSnapshot {
        entries
            .iter()
            .map(|(t, a)| (t.to_string(), AllocationRecord::new(*a)))
            .collect()
    }

    fn scraper() -> Arc<StaticScraper> {
        Arc::new(
            StaticScraper::new()
                .with_titles("TSM", &["TSMC forecasts strong Q3 revenue"])
                .with_titles("BABA", &["Alibaba profit plunge"]),
        )
    }

    fn workflow_with(
        label: &'static str,
        embedder: Arc<dyn Embedder>,
        scraper: Arc<dyn NewsScraper>,
        store: Arc<InMemoryPortfolioStore>,
    ) -> Workflow {
        let generator = Arc::new(RoutingGenerator {
            label,
            reply: "TSMC guided revenue higher.",
        });
        Workflow::new(generator, embedder, scraper, store, &PipelineConfig::default())
    }

    fn seeded_store() -> Arc<InMemoryPortfolioStore> {
        Arc::new(InMemoryPortfolioStore::new(
            Some(portfolio(&[("TSM", 0.40), ("BABA", 0.30)])),
            Some(portfolio(&[("TSM", 0.38), ("BABA", 0.32)])),
        ))
    }

    #[test]
    fn test_every_node_has_an_exit() {
        let mut state = GraphState::new("q");
        state.intent_type = Some(Intent::FinancialQuery);
        state.retrieval_scores = Some(vec![0.1]);

        for node in Node::ALL {
            assert!(next_step(node, &state, 1.2).is_ok(), "no exit from {}", node);
            assert!(next_step(node, &GraphState::new("q"), 1.2).is_ok(), "no exit from {}", node);
        }
    }

    #[test]
    fn test_confidence_gate() {
        let mut state = GraphState::new("q");
        state.retrieval_scores = Some(vec![1.5, 0.2]);
        assert_eq!(next_step(Node::RetrieveNews, &state, 1.2).unwrap(), Step::Node(Node::ClarifyQuestion));

        state.retrieval_scores = Some(vec![1.2]);
        assert_eq!(next_step(Node::RetrieveNews, &state, 1.2).unwrap(), Step::Node(Node::AnalyzeData));

        state.retrieval_scores = Some(vec![]);
        assert_eq!(next_step(Node::RetrieveNews, &state, 1.2).unwrap(), Step::Node(Node::ClarifyQuestion));

        state.retrieval_scores = Some(vec![f32::NAN]);
        assert_eq!(next_step(Node::RetrieveNews, &state, 1.2).unwrap(), Step::Node(Node::ClarifyQuestion));
    }

    #[tokio::test]
    async fn test_confident_financial_run() {
        let store = seeded_store();
        let workflow = workflow_with("financial_query", Arc::new(AxisEmbedder), scraper(), store.clone());

        let outcome = workflow.run("What is the TSMC revenue outlook?").await.unwrap();

        assert_eq!(
            outcome.path,
            vec![
                Node::ClassifyIntent,
                Node::LoadAndScrape,
                Node::RetrieveNews,
                Node::AnalyzeData,
                Node::GenerateResponse,
                Node::SaveLog,
            ]
        );
        assert_eq!(outcome.response(), "TSMC guided revenue higher.");
        assert_eq!(outcome.state.best_retrieval_score(), Some(0.0));

        let summary = outcome.state.analysis_summary.as_ref().unwrap();
        assert_eq!(
            summary.portfolio_change_analysis,
            vec![
                "BABA allocation changed by -2.0 percentage points (from 32.0% to 30.0%)",
                "TSM allocation changed by +2.0 percentage points (from 38.0% to 40.0%)",
            ]
        );

        // save_log made today's portfolio the new baseline
        assert_eq!(
            store.load_previous().await.unwrap(),
            Some(portfolio(&[("TSM", 0.40), ("BABA", 0.30)]))
        );
    }

    #[tokio::test]
    async fn test_unrelated_query_asks_for_clarification() {
        let scraper = Arc::new(StaticScraper::new().with_titles("TSM", &["TSMC forecasts strong Q3 revenue"]));
        let workflow = workflow_with("financial_query", Arc::new(AxisEmbedder), scraper, seeded_store());

        // other axis: squared distance 2.0 to the only headline
        let outcome = workflow.run("How is the bond market?").await.unwrap();

        assert_eq!(*outcome.path.last().unwrap(), Node::ClarifyQuestion);
        assert_eq!(outcome.response(), CLARIFICATION_MESSAGE);
        assert_eq!(outcome.state.best_retrieval_score(), Some(2.0));
        assert!(outcome.state.analysis_summary.is_none());
    }

    #[tokio::test]
    async fn test_stop_word_query_asks_for_clarification() {
        let scraper = Arc::new(StaticScraper::new().with_titles("TSM", &["TSMC forecasts strong Q3 revenue"]));
        let workflow = workflow_with("financial_query", Arc::new(HashingEmbedder::new()), scraper, seeded_store());

        let outcome = workflow.run("What is it?").await.unwrap();

        assert_eq!(
            outcome.path,
            vec![Node::ClassifyIntent, Node::LoadAndScrape, Node::RetrieveNews, Node::ClarifyQuestion]
        );
        assert_eq!(outcome.state.retrieval_scores, Some(vec![]));
        assert_eq!(outcome.response(), CLARIFICATION_MESSAGE);
    }

    #[tokio::test]
    async fn test_no_headlines_routes_to_clarification() {
        let store = seeded_store();
        let workflow = workflow_with(
            "financial_query",
            Arc::new(AxisEmbedder),
            Arc::new(StaticScraper::new()),
            store.clone(),
        );

        let outcome = workflow.run("What is the TSMC revenue outlook?").await.unwrap();

        assert_eq!(
            outcome.path,
            vec![Node::ClassifyIntent, Node::LoadAndScrape, Node::RetrieveNews, Node::ClarifyQuestion]
        );
        assert_eq!(outcome.state.retrieved_news, Some(vec![]));
        assert_eq!(outcome.state.retrieval_scores, Some(vec![]));
        assert_eq!(outcome.response(), CLARIFICATION_MESSAGE);

        // clarification never touches the persisted snapshot
        assert_eq!(
            store.load_previous().await.unwrap(),
            Some(portfolio(&[("TSM", 0.38), ("BABA", 0.32)]))
        );
    }

    #[tokio::test]
    async fn test_embedding_failure_degrades_to_clarification() {
        let workflow = workflow_with("financial_query", Arc::new(BrokenEmbedder), scraper(), seeded_store());

        let outcome = workflow.run("What is the TSMC revenue outlook?").await.unwrap();
        assert_eq!(outcome.response(), CLARIFICATION_MESSAGE);
    }

    #[tokio::test]
    async fn test_general_conversation_path() {
        let store = seeded_store();
        let workflow = workflow_with("greeting", Arc::new(AxisEmbedder), scraper(), store.clone());

        let outcome = workflow.run("hello there").await.unwrap();

        assert_eq!(outcome.path, vec![Node::ClassifyIntent, Node::HandleGeneralConversation]);
        assert_eq!(outcome.state.intent_type, Some(Intent::GeneralConversation));
        assert_eq!(outcome.state.intent_label.as_deref(), Some("greeting"));
        assert!(outcome.state.portfolio_data.is_none());
        assert!(outcome.state.scraped_headlines.is_none());
        assert_eq!(outcome.response(), "TSMC guided revenue higher.");
    }

    #[tokio::test]
    async fn test_classifier_failure_takes_general_path() {
        let workflow = Workflow::new(
            Arc::new(StaticGenerator::failing("network down")),
            Arc::new(AxisEmbedder),
            scraper(),
            seeded_store(),
            &PipelineConfig::default(),
        );

        let outcome = workflow.run("What moved TSMC today?").await.unwrap();
        assert_eq!(outcome.path, vec![Node::ClassifyIntent, Node::HandleGeneralConversation]);
        assert!(outcome.state.intent_label.is_none());
        assert!(crate::synthesizer::is_error_response(outcome.response()));
    }

    #[tokio::test]
    async fn test_second_run_sees_no_changes() {
        let store = seeded_store();
        let workflow = workflow_with("financial_query", Arc::new(AxisEmbedder), scraper(), store.clone());

        workflow.run("TSMC revenue?").await.unwrap();
        let outcome = workflow.run("TSMC revenue?").await.unwrap();

        let summary = outcome.state.analysis_summary.unwrap();
        assert_eq!(summary.portfolio_change_analysis, vec![NO_SIGNIFICANT_CHANGES]);
    }

    #[tokio::test]
    async fn test_missing_portfolio_clarifies() {
        let store = Arc::new(InMemoryPortfolioStore::default());
        let workflow = workflow_with("financial_query", Arc::new(AxisEmbedder), scraper(), store);

        let outcome = workflow.run("TSMC revenue?").await.unwrap();
        assert_eq!(outcome.state.portfolio_data, Some(PortfolioSnapshot::new()));
        assert_eq!(outcome.response(), CLARIFICATION_MESSAGE);
    }

    #[tokio::test]
    async fn test_node_cannot_overwrite_state() {
        let workflow = workflow_with("financial_query", Arc::new(AxisEmbedder), scraper(), seeded_store());

        let state = GraphState::new("q")
            .merge(StateDelta::new().final_response("already answered"))
            .unwrap();

        let err = workflow.step(Node::ClarifyQuestion, state).await.unwrap_err();
        assert!(matches!(err, OrchestrationError::StateConflict { field: "final_response" }));
    }

    #[tokio::test]
    async fn test_out_of_order_node_is_graph_error() {
        let workflow = workflow_with("financial_query", Arc::new(AxisEmbedder), scraper(), seeded_store());

        let err = workflow.step(Node::AnalyzeData, GraphState::new("q")).await.unwrap_err();
        assert!(matches!(err, OrchestrationError::GraphError(_)));
    }

    #[tokio::test]
    async fn test_brief_mode_leaves_question_out() {
        let generator = Arc::new(StaticGenerator::new("financial_query"));
        let config = PipelineConfig {
            synthesis_mode: SynthesisMode::Brief,
            ..PipelineConfig::default()
        };
        let workflow = Workflow::new(
            generator.clone(),
            Arc::new(AxisEmbedder),
            scraper(),
            seeded_store(),
            &config,
        );

        workflow.run("TSMC revenue?").await.unwrap();

        let prompts = generator.prompts();
        let synthesis_prompt = prompts.last().unwrap();
        assert!(synthesis_prompt.contains("daily market brief"));
        assert!(!synthesis_prompt.contains("QUESTION:"));
    }
}
