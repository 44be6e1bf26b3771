//! Core types for the document Q&A system

pub mod document;
pub mod query;
pub mod response;

pub use document::{entry_id, parse_entry_id, Chunk, ChunkMetadata, FileType};
pub use query::{IngestOptions, Language, QueryRequest};
pub use response::{
    Citation, ConfidenceLevel, DeleteResponse, DocumentListResponse, DocumentSummary, FileError,
    IngestResponse, QueryMatch, QueryResponse, RankedChunk, RetrievalOutcome,
};
