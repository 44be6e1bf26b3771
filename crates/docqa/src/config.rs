//! Configuration for the document Q&A system

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Name of the single collection every document is indexed into
pub const COLLECTION_NAME: &str = "rag_app";

/// Main configuration, built once at startup and handed to every component
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    /// Target chunk size in characters
    pub chunk_size: usize,
    /// Overlap between consecutive chunks in characters
    pub chunk_overlap: usize,
    /// Ollama embedding model name
    pub embedding_model: String,
    /// Ollama base URL
    pub ollama_url: String,
    /// Ollama chat model name
    pub llm_model: String,
    /// Directory holding the persistent vector collection
    pub vector_store_path: PathBuf,
    /// Upstream request timeout in seconds
    pub request_timeout_secs: u64,
    /// Server configuration
    pub server: ServerConfig,
    /// Retrieval and re-ranking configuration
    pub retrieval: RetrievalConfig,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 100,
            embedding_model: "nomic-embed-text".to_string(),
            ollama_url: "http://localhost:11434".to_string(),
            llm_model: "llama3.2:3b".to_string(),
            vector_store_path: PathBuf::from("./vector_store"),
            request_timeout_secs: 120,
            server: ServerConfig::default(),
            retrieval: RetrievalConfig::default(),
        }
    }
}

impl RagConfig {
    /// Load and validate a TOML configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml(&raw)
    }

    /// Load the file if it exists, otherwise fall back to defaults
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            tracing::info!("No config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Parse and validate configuration from a TOML string
    pub fn from_toml(raw: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(raw).map_err(|e| Error::Config(format!("Invalid config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the splitter cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(Error::Config("chunk_size must be greater than 0".to_string()));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(Error::Config(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        if self.retrieval.top_k == 0 {
            return Err(Error::Config("retrieval.top_k must be greater than 0".to_string()));
        }
        Ok(())
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address
    pub host: String,
    /// Port number
    pub port: u16,
    /// Enable CORS
    pub enable_cors: bool,
    /// Maximum upload size in bytes (default: 100MB)
    pub max_upload_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            enable_cors: true,
            max_upload_size: 100 * 1024 * 1024, // 100MB
        }
    }
}

/// Retrieval and re-ranking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Candidates fetched from the vector store per question
    pub n_results: usize,
    /// Chunks kept after re-ranking
    pub top_k: usize,
    /// Hugging Face id of the cross-encoder
    pub reranker_model: String,
    /// Cache directory for downloaded model files
    pub reranker_cache_dir: PathBuf,
    /// Maximum token length of a (question, passage) pair
    pub max_length: usize,
    /// Pairs scored per ONNX run
    pub batch_size: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            n_results: 10,
            top_k: 3,
            reranker_model: "cross-encoder/ms-marco-MiniLM-L-6-v2".to_string(),
            reranker_cache_dir: dirs::cache_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("docqa")
                .join("models"),
            max_length: 512,
            batch_size: 16,
        }
    }
}
