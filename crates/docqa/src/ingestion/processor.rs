//! Document ingestor: file bytes to ordered chunks

use crate::config::RagConfig;
use crate::error::Result;
use crate::types::Chunk;

use super::chunker::RecursiveTextSplitter;
use super::parser::FileParser;

/// An uploaded file, as handed over by the presentation layer
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub data: Vec<u8>,
}

impl UploadedFile {
    pub fn new(file_name: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: file_name.into(),
            data: data.into(),
        }
    }
}

/// Outcome of ingesting one file in a batch
#[derive(Debug)]
pub struct IngestedFile {
    pub file_name: String,
    pub outcome: Result<Vec<Chunk>>,
}

impl IngestedFile {
    /// Chunks of the file, empty when ingestion failed
    pub fn chunks(&self) -> &[Chunk] {
        self.outcome.as_deref().unwrap_or(&[])
    }

    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Turns uploaded files into chunks ready for indexing
#[derive(Debug, Clone)]
pub struct DocumentIngestor {
    splitter: RecursiveTextSplitter,
}

impl DocumentIngestor {
    /// Create an ingestor with explicit chunking parameters
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            splitter: RecursiveTextSplitter::new(chunk_size, chunk_overlap),
        }
    }

    pub fn from_config(config: &RagConfig) -> Self {
        Self::new(config.chunk_size, config.chunk_overlap)
    }

    /// Extract and split one file
    ///
    /// Unsupported extensions and extractor failures are returned as errors;
    /// a file without text yields an empty list.
    pub fn ingest(&self, file_name: &str, data: &[u8]) -> Result<Vec<Chunk>> {
        let text = FileParser::extract(file_name, data).map_err(|e| {
            tracing::warn!("Failed to extract {}: {}", file_name, e);
            e
        })?;

        let chunks: Vec<Chunk> = self
            .splitter
            .split_text(&text)
            .into_iter()
            .enumerate()
            .map(|(index, text)| Chunk::new(text, file_name, index as u32))
            .collect();

        tracing::info!("Split '{}' into {} chunks", file_name, chunks.len());
        Ok(chunks)
    }

    /// Ingest a batch; one file failing never affects the others
    pub fn ingest_all(&self, files: &[UploadedFile]) -> Vec<IngestedFile> {
        files
            .iter()
            .map(|file| IngestedFile {
                file_name: file.file_name.clone(),
                outcome: self.ingest(&file.file_name, &file.data),
            })
            .collect()
    }
}

impl Default for DocumentIngestor {
    fn default() -> Self {
        Self::from_config(&RagConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_ingest_txt() {
        let ingestor = DocumentIngestor::new(50, 10);
        let text = "The warranty covers parts. The warranty covers labour. Returns take thirty days.";
        let chunks = ingestor.ingest("policy.txt", text.as_bytes()).unwrap();

        assert!(chunks.len() >= 2);
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.source_file, "policy.txt");
            assert_eq!(chunk.chunk_index, i as u32);
            assert!(chunk.text.chars().count() <= 50);
        }
    }

    #[test]
    fn test_empty_file_yields_no_chunks() {
        let chunks = DocumentIngestor::default().ingest("empty.txt", b"   \n").unwrap();
        assert!(chunks.is_empty());
    }

    #[test]
    fn test_batch_isolates_failures() {
        let ingestor = DocumentIngestor::default();
        let files = vec![
            UploadedFile::new("a.txt", "first document"),
            UploadedFile::new("b.xlsx", vec![1u8, 2, 3]),
            UploadedFile::new("c.html", "<p>third document</p>"),
        ];

        let results = ingestor.ingest_all(&files);
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].chunks()[0].text, "first document");
        assert!(matches!(results[1].outcome, Err(Error::UnsupportedFormat(_))));
        assert!(results[1].chunks().is_empty());
        assert_eq!(results[2].chunks()[0].text, "third document");
    }
}
