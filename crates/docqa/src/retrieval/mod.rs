//! Retrieval and re-ranking

mod pipeline;
mod reranker;
pub mod scoring;

pub use pipeline::RetrievalPipeline;
pub use reranker::{CrossEncoder, RelevanceScorer};
pub use scoring::{combined_confidence, normalize_distances, normalize_relevance, top_k_indices};
