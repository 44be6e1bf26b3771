//! Application state for the QA server

use parking_lot::RwLock;
use std::sync::Arc;

use crate::config::RagConfig;
use crate::error::Result;
use crate::generation::{AnswerGenerator, LlmTranslator, Translator};
use crate::ingestion::DocumentIngestor;
use crate::providers::{ollama_providers, EmbeddingProvider, LlmProvider};
use crate::retrieval::{CrossEncoder, RelevanceScorer, RetrievalPipeline};
use crate::storage::VectorStore;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: RagConfig,
    /// Chunk collection
    store: Arc<VectorStore>,
    ingestor: Arc<DocumentIngestor>,
    pipeline: RetrievalPipeline,
    generator: AnswerGenerator,
    translator: Arc<dyn Translator>,
    /// Chat model, also used for the model list
    llm: Arc<dyn LlmProvider>,
    ready: RwLock<bool>,
}

impl AppState {
    /// Create state backed by Ollama, the on-disk store and the cross-encoder
    pub async fn new(config: RagConfig) -> Result<Self> {
        tracing::info!("Initializing application state...");
        config.validate()?;

        let (embedder, llm) = ollama_providers(&config)?;
        tracing::info!(
            "Ollama providers ready (embeddings: {}, chat: {})",
            config.embedding_model,
            config.llm_model
        );

        let scorer = Arc::new(CrossEncoder::new(&config));
        tracing::info!("Re-ranker configured: {}", scorer.model_name());

        let store = Arc::new(VectorStore::open(&config, Arc::new(embedder))?);
        Ok(Self::assemble(config, store, scorer, Arc::new(llm)))
    }

    /// Create state from explicit components with an in-memory store
    pub fn from_components(
        config: RagConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        scorer: Arc<dyn RelevanceScorer>,
        llm: Arc<dyn LlmProvider>,
    ) -> Result<Self> {
        config.validate()?;
        let store = Arc::new(VectorStore::in_memory(embedder)?);
        Ok(Self::assemble(config, store, scorer, llm))
    }

    fn assemble(
        config: RagConfig,
        store: Arc<VectorStore>,
        scorer: Arc<dyn RelevanceScorer>,
        llm: Arc<dyn LlmProvider>,
    ) -> Self {
        let ingestor = Arc::new(DocumentIngestor::from_config(&config));
        let pipeline = RetrievalPipeline::from_config(&config, Arc::clone(&store), scorer);
        let generator = AnswerGenerator::new(Arc::clone(&llm));
        let translator: Arc<dyn Translator> = Arc::new(LlmTranslator::new(Arc::clone(&llm)));

        Self {
            inner: Arc::new(AppStateInner {
                config,
                store,
                ingestor,
                pipeline,
                generator,
                translator,
                llm,
                ready: RwLock::new(true),
            }),
        }
    }

    pub fn config(&self) -> &RagConfig {
        &self.inner.config
    }

    pub fn store(&self) -> &Arc<VectorStore> {
        &self.inner.store
    }

    pub fn ingestor(&self) -> &Arc<DocumentIngestor> {
        &self.inner.ingestor
    }

    pub fn pipeline(&self) -> &RetrievalPipeline {
        &self.inner.pipeline
    }

    pub fn generator(&self) -> &AnswerGenerator {
        &self.inner.generator
    }

    pub fn translator(&self) -> &Arc<dyn Translator> {
        &self.inner.translator
    }

    pub fn llm(&self) -> &Arc<dyn LlmProvider> {
        &self.inner.llm
    }

    /// Check if the server is ready
    pub fn is_ready(&self) -> bool {
        *self.inner.ready.read()
    }

    /// Set ready state
    pub fn set_ready(&self, ready: bool) {
        *self.inner.ready.write() = ready;
    }
}
