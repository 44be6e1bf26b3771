//! Response types for retrieval, queries and ingestion

use serde::{Deserialize, Serialize};

use super::document::ChunkMetadata;
use super::query::Language;

/// One nearest-neighbour hit from the vector store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryMatch {
    /// Entry id (`<source_file>_<index>`)
    pub entry_id: String,
    /// Chunk text
    pub text: String,
    /// Stored metadata
    pub metadata: ChunkMetadata,
    /// Cosine distance to the query (lower is closer)
    pub distance: f32,
}

/// A candidate chunk after re-ranking
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedChunk {
    /// Chunk text
    pub text: String,
    /// Position in the retrieval candidate list
    pub original_index: usize,
    /// Normalised cross-encoder score (0.0-1.0)
    pub relevance_score: f32,
    /// Normalised retrieval score (0.0-1.0, 1.0 = closest)
    pub retrieval_score: f32,
    /// Source metadata
    pub metadata: ChunkMetadata,
}

impl RankedChunk {
    pub fn citation(&self) -> Citation {
        Citation {
            source_file: self.metadata.source_file.clone(),
            chunk_index: self.metadata.chunk_index,
            relevance_score: self.relevance_score,
        }
    }
}

/// Result of retrieve-and-rerank for one question
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RetrievalOutcome {
    /// Number of candidates returned by the vector store
    pub candidates: usize,
    /// Selected chunks, best first
    pub selected: Vec<RankedChunk>,
    /// Combined confidence (0.0-1.0)
    pub confidence: f32,
}

impl RetrievalOutcome {
    /// Outcome for a question with no candidates
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// Selected texts joined by single spaces, as sent to the chat model
    pub fn context_text(&self) -> String {
        self.texts().join(" ")
    }

    pub fn texts(&self) -> Vec<&str> {
        self.selected.iter().map(|c| c.text.as_str()).collect()
    }

    /// Positions of the selected chunks in the candidate list
    pub fn indices(&self) -> Vec<usize> {
        self.selected.iter().map(|c| c.original_index).collect()
    }

    pub fn relevance_scores(&self) -> Vec<f32> {
        self.selected.iter().map(|c| c.relevance_score).collect()
    }

    pub fn citations(&self) -> Vec<Citation> {
        self.selected.iter().map(RankedChunk::citation).collect()
    }

    pub fn confidence_level(&self) -> ConfidenceLevel {
        ConfidenceLevel::from_score(self.confidence)
    }
}

/// Coarse confidence banding shown next to an answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceLevel {
    High,
    Medium,
    Low,
}

impl ConfidenceLevel {
    pub fn from_score(score: f32) -> Self {
        if score > 0.75 {
            Self::High
        } else if score > 0.5 {
            Self::Medium
        } else {
            Self::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

/// Source reference for a chunk that was used in an answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Citation {
    /// Source filename
    pub source_file: String,
    /// Zero-based chunk position within the file
    pub chunk_index: u32,
    /// Normalised relevance score (0.0-1.0)
    pub relevance_score: f32,
}

impl Citation {
    /// Format as `<file> (Chunk N)`
    pub fn label(&self) -> String {
        format!("{} (Chunk {})", self.source_file, self.chunk_index)
    }
}

/// Response from a question
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    /// Generated (and possibly translated) answer
    pub answer: String,
    /// Language of `answer`
    pub language: Language,
    /// Combined confidence score (0.0-1.0)
    pub confidence: f32,
    /// Banded confidence
    pub confidence_level: ConfidenceLevel,
    /// Chunks the answer was generated from
    pub citations: Vec<Citation>,
    /// Candidates returned by the vector store
    pub chunks_retrieved: usize,
    /// Non-fatal problems (failed translation, interrupted stream)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notices: Vec<String>,
    /// Processing time in milliseconds
    pub processing_time_ms: u64,
}

impl QueryResponse {
    /// Answer returned when retrieval found nothing
    pub const NOT_FOUND: &'static str = "No relevant documents found.";

    pub fn not_found(processing_time_ms: u64) -> Self {
        Self {
            answer: Self::NOT_FOUND.to_string(),
            language: Language::En,
            confidence: 0.0,
            confidence_level: ConfidenceLevel::Low,
            citations: Vec::new(),
            chunks_retrieved: 0,
            notices: Vec::new(),
            processing_time_ms,
        }
    }
}

/// A file that could not be ingested
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileError {
    pub file_name: String,
    pub error: String,
}

/// Summary of an ingested document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentSummary {
    pub file_name: String,
    pub chunks: usize,
}

/// Response from document ingestion
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IngestResponse {
    /// Files indexed by this request
    pub documents: Vec<DocumentSummary>,
    /// Files skipped because they were already indexed
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<String>,
    /// Per-file failures
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<FileError>,
    /// Total chunks written
    pub total_chunks: usize,
    /// Processing time in milliseconds
    pub processing_time_ms: u64,
}

/// Indexed document names
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentListResponse {
    pub documents: Vec<String>,
    pub total: usize,
}

/// Result of deleting a document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub file_name: String,
    pub deleted_entries: usize,
}
