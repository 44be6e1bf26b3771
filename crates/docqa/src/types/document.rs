//! Document and chunk types with source tracking for citations

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Error, Result};

/// Supported file types
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    /// PDF document
    Pdf,
    /// Microsoft Word document (.docx)
    Docx,
    /// Plain text file
    Txt,
    /// HTML document
    Html,
}

impl FileType {
    /// Detect file type from a (case-insensitive) extension
    pub fn from_extension(ext: &str) -> Result<Self> {
        match ext.to_lowercase().as_str() {
            "pdf" => Ok(Self::Pdf),
            "docx" => Ok(Self::Docx),
            "txt" => Ok(Self::Txt),
            "html" => Ok(Self::Html),
            other => Err(Error::UnsupportedFormat(other.to_string())),
        }
    }

    /// Detect file type from an uploaded file name
    pub fn from_file_name(file_name: &str) -> Result<Self> {
        let ext = Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("");
        Self::from_extension(ext)
    }

    /// Get display name
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Pdf => "PDF",
            Self::Docx => "Word Document (.docx)",
            Self::Txt => "Text File",
            Self::Html => "HTML",
        }
    }
}

/// A contiguous slice of a document's text, the unit of indexing and retrieval
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Chunk text
    pub text: String,
    /// Name of the file the chunk came from
    pub source_file: String,
    /// Zero-based position within the document
    pub chunk_index: u32,
}

impl Chunk {
    pub fn new(text: impl Into<String>, source_file: impl Into<String>, chunk_index: u32) -> Self {
        Self {
            text: text.into(),
            source_file: source_file.into(),
            chunk_index,
        }
    }
}

/// Metadata attached to every indexed entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub source_file: String,
    pub chunk_index: u32,
}

/// Build the entry id `<source_file>_<index>`
pub fn entry_id(source_file: &str, index: u32) -> String {
    format!("{}_{}", source_file, index)
}

/// Split an entry id back into `(source_file, index)`
///
/// Returns `None` when the id has no `_<digits>` suffix.
pub fn parse_entry_id(id: &str) -> Option<(&str, u32)> {
    let (name, index) = id.rsplit_once('_')?;
    if index.is_empty() || !index.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some((name, index.parse().ok()?))
}
