//! Document ingestion: text extraction and recursive chunking

mod chunker;
mod parser;
mod processor;

pub use chunker::{RecursiveTextSplitter, DEFAULT_SEPARATORS};
pub use parser::{normalize_text, FileParser};
pub use processor::{DocumentIngestor, IngestedFile, UploadedFile};
