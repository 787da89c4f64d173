//! Market Brief Orchestrator
//!
//! Answers natural-language questions about a stock portfolio:
//! - Classifies the query as financial or general conversation
//! - Loads the portfolio and scrapes per-ticker news headlines
//! - Retrieves the headlines closest to the query from a per-request index
//! - Refuses to answer (asks for clarification) when no match is confident
//! - Diffs allocations against yesterday's snapshot and tags headline sentiment
//! - Synthesizes a short answer and persists today's snapshot
//!
//! FLOW:
//! CLASSIFY → LOAD & SCRAPE → RETRIEVE → GATE → ANALYZE → SYNTHESIZE → SAVE

pub mod analysis;
pub mod api;
pub mod classifier;
pub mod config;
pub mod error;
pub mod gemini;
pub mod graph;
pub mod llm;
pub mod models;
pub mod news;
pub mod retrieval;
pub mod state;
pub mod synthesizer;

pub use error::Result;

// Re-export common types
pub use config::PipelineConfig;
pub use graph::{GraphState, Workflow, WorkflowOutcome};
pub use models::*;
