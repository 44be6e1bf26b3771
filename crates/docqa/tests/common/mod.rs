//! In-memory fakes for the embedder, re-ranker and chat model

#![allow(dead_code)]

use async_trait::async_trait;
use futures_util::{stream, StreamExt};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use docqa::config::RagConfig;
use docqa::error::{Error, Result};
use docqa::providers::{ChatMessage, EmbeddingProvider, FragmentStream, LlmProvider};
use docqa::retrieval::RelevanceScorer;
use docqa::server::state::AppState;

pub const DIMENSIONS: usize = 64;

fn words(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.len() > 2)
        .map(|w| w.to_string())
        .collect()
}

/// Bag-of-words embedder hashing each word into a fixed-size vector
pub struct HashEmbedder {
    pub calls: AtomicUsize,
}

impl HashEmbedder {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl EmbeddingProvider for HashEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut vector = vec![0.0f32; DIMENSIONS];
        // keeps every vector non-zero
        vector[0] = 0.1;
        for word in words(text) {
            let slot = word
                .bytes()
                .fold(7usize, |h, b| h.wrapping_mul(31).wrapping_add(b as usize));
            vector[1 + slot % (DIMENSIONS - 1)] += 1.0;
        }
        Ok(vector)
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &str {
        "hash"
    }
}

/// Scores a passage by how many question words it contains
pub struct OverlapScorer {
    pub calls: AtomicUsize,
}

impl OverlapScorer {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RelevanceScorer for OverlapScorer {
    async fn score(&self, question: &str, passages: &[String]) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let question = words(question);
        Ok(passages
            .iter()
            .map(|p| {
                let passage = words(p);
                question.iter().filter(|w| passage.contains(w)).count() as f32
            })
            .collect())
    }

    fn name(&self) -> &str {
        "overlap"
    }
}

/// Chat model that answers with fixed fragments and records every request
pub struct ScriptedLlm {
    pub fragments: Vec<String>,
    /// Reply to translation requests; `None` makes translation fail
    pub translation: Option<String>,
    pub requests: Mutex<Vec<Vec<ChatMessage>>>,
}

impl ScriptedLlm {
    pub fn new(fragments: &[&str]) -> Self {
        Self {
            fragments: fragments.iter().map(|f| f.to_string()).collect(),
            translation: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_translation(mut self, reply: &str) -> Self {
        self.translation = Some(reply.to_string());
        self
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }
}

#[async_trait]
impl LlmProvider for ScriptedLlm {
    async fn chat_stream(&self, messages: Vec<ChatMessage>) -> Result<FragmentStream> {
        let is_translation = messages
            .first()
            .map(|m| m.content.contains("professional translator"))
            .unwrap_or(false);
        self.requests.lock().push(messages);

        if is_translation {
            return match &self.translation {
                Some(reply) => Ok(stream::iter(vec![Ok(reply.clone())]).boxed()),
                None => Err(Error::generation("translation model offline")),
            };
        }

        let items: Vec<Result<String>> = self.fragments.iter().cloned().map(Ok).collect();
        Ok(stream::iter(items).boxed())
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &str {
        "scripted"
    }

    fn model(&self) -> &str {
        "scripted-model"
    }
}

/// Config with small chunks so short test documents still split
pub fn test_config() -> RagConfig {
    let mut config = RagConfig::default();
    config.chunk_size = 200;
    config.chunk_overlap = 20;
    config.retrieval.top_k = 2;
    config
}

pub struct Harness {
    pub state: AppState,
    pub embedder: Arc<HashEmbedder>,
    pub scorer: Arc<OverlapScorer>,
    pub llm: Arc<ScriptedLlm>,
}

pub fn harness_with(llm: ScriptedLlm) -> Harness {
    let embedder = Arc::new(HashEmbedder::new());
    let scorer = Arc::new(OverlapScorer::new());
    let llm = Arc::new(llm);
    let state = AppState::from_components(
        test_config(),
        embedder.clone(),
        scorer.clone(),
        llm.clone(),
    )
    .unwrap();
    Harness {
        state,
        embedder,
        scorer,
        llm,
    }
}

pub fn harness() -> Harness {
    harness_with(ScriptedLlm::new(&["Refunds ", "take ", "30 days."]))
}
