//! Embedding index
//!
//! Documents and their vectors are built and dropped together: an index is
//! created for one request's headlines and never outlives that request.

pub mod embedding;
pub mod index;

pub use embedding::{Embedder, HashingEmbedder, EMBEDDING_DIM};
pub use index::FlatL2Index;

use crate::error::OrchestrationError;
use crate::models::RetrievalResult;
use crate::Result;
use std::sync::Arc;
use tracing::{debug, warn};

/// Documents plus the index built from them, always the same length.
struct BuiltIndex {
    documents: Vec<String>,
    index: FlatL2Index,
}

pub struct EmbeddingIndex {
    embedder: Arc<dyn Embedder>,
    built: Option<BuiltIndex>,
}

impl EmbeddingIndex {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self {
            embedder,
            built: None,
        }
    }

    pub fn is_built(&self) -> bool {
        self.built.is_some()
    }

    /// Number of indexed documents (0 when not built).
    pub fn len(&self) -> usize {
        self.built.as_ref().map_or(0, |b| b.documents.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Replace the index with one built from `documents`.
    ///
    /// Prior state is discarded first, so a failed rebuild leaves the index
    /// unbuilt rather than pointing at an older document list.
    pub async fn rebuild(&mut self, documents: &[String]) -> Result<()> {
        self.built = None;

        if documents.is_empty() {
            warn!("No documents provided to embed");
            return Err(OrchestrationError::EmptyInput(
                "cannot build an index from zero documents".to_string(),
            ));
        }

        debug!(document_count = documents.len(), "Embedding documents");

        let vectors = self.embedder.embed_batch(documents).await?;
        if vectors.len() != documents.len() {
            return Err(OrchestrationError::EmbeddingError(format!(
                "embedder returned {} vectors for {} documents",
                vectors.len(),
                documents.len()
            )));
        }

        let mut index = FlatL2Index::new(self.embedder.dimension());
        for vector in vectors {
            index.add(vector)?;
        }

        self.built = Some(BuiltIndex {
            documents: documents.to_vec(),
            index,
        });

        Ok(())
    }

    /// Up to `min(k, len)` documents nearest to `text`, best first.
    pub async fn query(&self, text: &str, k: usize) -> Result<RetrievalResult> {
        let built = self.built.as_ref().ok_or(OrchestrationError::IndexNotBuilt)?;

        if k == 0 {
            return Err(OrchestrationError::InvalidArgument(
                "k must be greater than zero".to_string(),
            ));
        }

        let query_vector = self.embedder.embed(text).await?;
        // A zero vector is equidistant from every normalised document: no signal.
        if query_vector.iter().all(|v| *v == 0.0) {
            debug!("Query embedded to the zero vector; no usable terms");
            return Ok(RetrievalResult::empty());
        }

        let hits = built.index.search(&query_vector, k)?;

        let mut result = RetrievalResult::empty();
        for (position, distance) in hits {
            result.push(built.documents[position].clone(), distance);
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn docs(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn sample_headlines() -> Vec<String> {
        docs(&[
            "[BABA] Alibaba Beats Revenue Estimates On E-Commerce Strength, but profit margins fell.",
            "[TSM] TSMC forecasts strong Q3 revenue between $19.6 billion and $20.4 billion.",
            "[BIDU] Baidu's quarterly revenue rises as advertising rebounds.",
            "[005930.KS] Samsung Electronics flags a likely 96% plunge in Q2 profit due to a chip glut.",
            "[TSM] TSMC reports a slight miss on Q2 earnings per share.",
        ])
    }

    #[tokio::test]
    async fn test_query_before_rebuild_fails() {
        let index = EmbeddingIndex::new(Arc::new(HashingEmbedder::new()));
        let err = index.query("anything", 3).await.unwrap_err();
        assert!(matches!(err, OrchestrationError::IndexNotBuilt));
    }

    #[tokio::test]
    async fn test_rebuild_with_no_documents_is_empty_input() {
        let mut index = EmbeddingIndex::new(Arc::new(HashingEmbedder::new()));
        let err = index.rebuild(&[]).await.unwrap_err();
        assert!(matches!(err, OrchestrationError::EmptyInput(_)));
        assert!(!index.is_built());
    }

    #[tokio::test]
    async fn test_query_cardinality_and_order() {
        let mut index = EmbeddingIndex::new(Arc::new(HashingEmbedder::new()));
        let headlines = sample_headlines();
        index.rebuild(&headlines).await.unwrap();

        for k in [1, 3, 5, 8] {
            let result = index.query("What was the revenue forecast for TSMC?", k).await.unwrap();
            assert_eq!(result.len(), k.min(headlines.len()));
            assert_eq!(result.documents.len(), result.scores.len());
            assert!(result.scores.windows(2).all(|w| w[0] <= w[1]));
        }
    }

    #[tokio::test]
    async fn test_best_match_shares_vocabulary() {
        let mut index = EmbeddingIndex::new(Arc::new(HashingEmbedder::new()));
        index.rebuild(&sample_headlines()).await.unwrap();

        let result = index.query("Samsung chip glut profit plunge", 1).await.unwrap();
        assert!(result.documents[0].starts_with("[005930.KS]"));
    }

    #[tokio::test]
    async fn test_rebuild_replaces_previous_documents() {
        let mut index = EmbeddingIndex::new(Arc::new(HashingEmbedder::new()));
        index.rebuild(&sample_headlines()).await.unwrap();

        let fresh = docs(&["[NVDA] Nvidia data center sales boom", "[AMD] AMD launches new GPU"]);
        index.rebuild(&fresh).await.unwrap();
        assert_eq!(index.len(), 2);

        let result = index.query("TSMC revenue forecast", 10).await.unwrap();
        assert_eq!(result.len(), 2);
        assert!(result.documents.iter().all(|d| fresh.contains(d)));
    }

    #[tokio::test]
    async fn test_failed_rebuild_discards_previous_build() {
        let mut index = EmbeddingIndex::new(Arc::new(HashingEmbedder::new()));
        index.rebuild(&sample_headlines()).await.unwrap();

        assert!(index.rebuild(&[]).await.is_err());
        assert!(matches!(
            index.query("TSMC", 1).await.unwrap_err(),
            OrchestrationError::IndexNotBuilt
        ));
    }

    #[tokio::test]
    async fn test_query_without_usable_terms_matches_nothing() {
        let mut index = EmbeddingIndex::new(Arc::new(HashingEmbedder::new()));
        index.rebuild(&sample_headlines()).await.unwrap();

        for query in ["What is it?", "", "?!"] {
            let result = index.query(query, 5).await.unwrap();
            assert!(result.is_empty(), "query {:?} matched {:?}", query, result.documents);
        }
    }

    #[tokio::test]
    async fn test_zero_k_is_rejected() {
        let mut index = EmbeddingIndex::new(Arc::new(HashingEmbedder::new()));
        index.rebuild(&sample_headlines()).await.unwrap();
        assert!(matches!(
            index.query("TSMC", 0).await.unwrap_err(),
            OrchestrationError::InvalidArgument(_)
        ));
    }
}
