//! Provider abstractions for embeddings and chat
//!
//! The vector store, answer generator and translator depend on these traits
//! rather than on Ollama directly, so tests can substitute in-memory fakes.

pub mod embedding;
pub mod llm;
pub mod ollama;

pub use embedding::EmbeddingProvider;
pub use llm::{ChatMessage, FragmentStream, LlmProvider};
pub use ollama::{ollama_providers, OllamaEmbedder, OllamaLlm};
