//! docqa: question answering over uploaded documents
//!
//! Documents are split into overlapping chunks and embedded into a persistent
//! cosine-space collection. Questions retrieve candidate chunks, a cross-encoder
//! re-ranks them, and the best chunks are streamed to a chat model that answers
//! from that context only.

pub mod config;
pub mod error;
pub mod generation;
pub mod ingestion;
pub mod providers;
pub mod retrieval;
pub mod server;
pub mod storage;
pub mod types;

pub use config::RagConfig;
pub use error::{Error, Result};
pub use types::{
    document::{Chunk, ChunkMetadata, FileType},
    query::{Language, QueryRequest},
    response::{Citation, ConfidenceLevel, QueryResponse, RetrievalOutcome},
};
