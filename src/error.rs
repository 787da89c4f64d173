//! Error types for the market brief orchestrator

use thiserror::Error;

/// Result type alias for orchestrator operations
pub type Result<T> = std::result::Result<T, OrchestrationError>;

#[derive(Error, Debug)]
pub enum OrchestrationError {

    // =============================
    // Retrieval Errors
    // =============================

    #[error("Empty input: {0}")]
    EmptyInput(String),

    #[error("Index not built: query issued before a successful rebuild")]
    IndexNotBuilt,

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Embedding error: {0}")]
    EmbeddingError(String),

    // =============================
    // Workflow Errors
    // =============================

    #[error("State field '{field}' was already set earlier in this run")]
    StateConflict { field: &'static str },

    #[error("Graph error: {0}")]
    GraphError(String),

    // =============================
    // Collaborator Errors
    // =============================

    #[error("Portfolio store error: {0}")]
    StateError(String),

    #[error("Scraper error: {0}")]
    ScraperError(String),

    #[error("LLM error: {0}")]
    LlmError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    // =============================
    // External Library Conversions
    // =============================

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl OrchestrationError {
    /// Failures of an external collaborator (model, embedding service, network)
    /// that the pipeline degrades around instead of aborting.
    pub fn is_collaborator_failure(&self) -> bool {
        matches!(
            self,
            OrchestrationError::EmbeddingError(_)
                | OrchestrationError::LlmError(_)
                | OrchestrationError::ScraperError(_)
                | OrchestrationError::HttpError(_)
        )
    }
}
