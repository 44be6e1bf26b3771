//! Retrieve candidates, re-rank them and pick the context

use std::sync::Arc;

use crate::config::RagConfig;
use crate::error::{Error, Result};
use crate::storage::VectorStore;
use crate::types::{RankedChunk, RetrievalOutcome};

use super::reranker::RelevanceScorer;
use super::scoring::{combined_confidence, normalize_distances, normalize_relevance, top_k_indices};

/// Vector search followed by cross-encoder re-ranking
pub struct RetrievalPipeline {
    store: Arc<VectorStore>,
    scorer: Arc<dyn RelevanceScorer>,
    top_k: usize,
}

impl RetrievalPipeline {
    pub fn new(store: Arc<VectorStore>, scorer: Arc<dyn RelevanceScorer>, top_k: usize) -> Self {
        Self {
            store,
            scorer,
            top_k: top_k.max(1),
        }
    }

    pub fn from_config(
        config: &RagConfig,
        store: Arc<VectorStore>,
        scorer: Arc<dyn RelevanceScorer>,
    ) -> Self {
        Self::new(store, scorer, config.retrieval.top_k)
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    pub fn store(&self) -> &Arc<VectorStore> {
        &self.store
    }

    /// Retrieve `n_results` candidates and keep the `top_k` most relevant
    pub async fn retrieve_and_rerank(
        &self,
        question: &str,
        n_results: usize,
    ) -> Result<RetrievalOutcome> {
        let matches = self.store.query(question, n_results).await?;
        if matches.is_empty() {
            tracing::debug!("No candidates for question");
            return Ok(RetrievalOutcome::empty());
        }

        let passages: Vec<String> = matches.iter().map(|m| m.text.clone()).collect();
        let raw_scores = self.scorer.score(question, &passages).await.map_err(|e| {
            tracing::error!("Re-ranking with {} failed: {}", self.scorer.name(), e);
            match e {
                Error::Rerank(_) => e,
                other => Error::Rerank(other.to_string()),
            }
        })?;

        if raw_scores.len() != matches.len() {
            tracing::error!(
                "Re-ranker returned {} scores for {} candidates",
                raw_scores.len(),
                matches.len()
            );
            return Err(Error::rerank(format!(
                "expected {} scores, got {}",
                matches.len(),
                raw_scores.len()
            )));
        }

        let distances: Vec<f32> = matches.iter().map(|m| m.distance).collect();
        let retrieval_scores = normalize_distances(&distances);
        let relevance_scores = normalize_relevance(&raw_scores);
        let picked = top_k_indices(&raw_scores, self.top_k);

        let selected: Vec<RankedChunk> = picked
            .iter()
            .map(|&idx| RankedChunk {
                text: matches[idx].text.clone(),
                original_index: idx,
                relevance_score: relevance_scores[idx],
                retrieval_score: retrieval_scores[idx],
                metadata: matches[idx].metadata.clone(),
            })
            .collect();

        let pairs: Vec<(usize, f32)> = selected
            .iter()
            .map(|c| (c.original_index, c.relevance_score))
            .collect();
        let confidence = combined_confidence(&retrieval_scores, &pairs);

        tracing::info!(
            "Selected {} of {} candidates (confidence {:.2})",
            selected.len(),
            matches.len(),
            confidence
        );

        Ok(RetrievalOutcome {
            candidates: matches.len(),
            selected,
            confidence,
        })
    }
}
