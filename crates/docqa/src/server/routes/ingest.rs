//! Document ingestion endpoint

use axum::{
    extract::{Multipart, State},
    Json,
};
use std::sync::Arc;
use std::time::Instant;

use crate::error::{Error, Result};
use crate::ingestion::{IngestedFile, UploadedFile};
use crate::server::state::AppState;
use crate::types::{Chunk, DocumentSummary, FileError, IngestOptions, IngestResponse};

/// POST /api/ingest - Upload and index files
///
/// Files are parsed as one batch once the whole form is read, so `options`
/// may come before or after them. A failing file is reported in `errors` and
/// never aborts the batch.
pub async fn ingest_files(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<IngestResponse>> {
    let start = Instant::now();
    let mut response = IngestResponse::default();
    let mut options = IngestOptions::default();
    let mut uploads = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::BadRequest(format!("Failed to read multipart field: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();

        if name == "options" {
            let data = field
                .bytes()
                .await
                .map_err(|e| Error::BadRequest(format!("Failed to read options: {}", e)))?;
            options = serde_json::from_slice(&data)
                .map_err(|e| Error::BadRequest(format!("Invalid options: {}", e)))?;
            continue;
        }

        let Some(file_name) = field.file_name().map(|s| s.to_string()) else {
            tracing::debug!("Ignoring multipart field '{}' without a file name", name);
            continue;
        };

        match field.bytes().await {
            Ok(data) => {
                tracing::info!("Received file: {} ({} bytes)", file_name, data.len());
                uploads.push(UploadedFile::new(file_name, data.to_vec()));
            }
            Err(e) => response.errors.push(FileError {
                file_name,
                error: format!("Failed to read file: {}", e),
            }),
        }
    }

    let ingestor = Arc::clone(state.ingestor());
    let ingested = tokio::task::spawn_blocking(move || ingestor.ingest_all(&uploads)).await?;

    for file in ingested {
        let IngestedFile { file_name, outcome } = file;

        match index_file(&state, &file_name, outcome, &options).await {
            Ok(Some(chunks)) => {
                response.total_chunks += chunks;
                response.documents.push(DocumentSummary { file_name, chunks });
            }
            Ok(None) => {
                tracing::info!("Skipped already indexed file: {}", file_name);
                response.skipped.push(file_name);
            }
            Err(e) => {
                tracing::error!("Failed to ingest {}: {}", file_name, e);
                response.errors.push(FileError {
                    file_name,
                    error: e.to_string(),
                });
            }
        }
    }

    response.processing_time_ms = start.elapsed().as_millis() as u64;
    tracing::info!(
        "Ingest finished: {} indexed, {} skipped, {} failed, {} chunks in {}ms",
        response.documents.len(),
        response.skipped.len(),
        response.errors.len(),
        response.total_chunks,
        response.processing_time_ms
    );

    Ok(Json(response))
}

/// Write the chunks of one parsed file; `None` when it was skipped
///
/// A reprocessed file replaces its old entries only once the new ones are
/// embedded, so a failure leaves the previous version searchable.
async fn index_file(
    state: &AppState,
    file_name: &str,
    outcome: Result<Vec<Chunk>>,
    options: &IngestOptions,
) -> Result<Option<usize>> {
    let store = state.store();
    let indexed = store.contains_document(file_name).await?;

    if indexed && !options.reprocess {
        return Ok(None);
    }

    let chunks = outcome?;
    if chunks.is_empty() {
        tracing::warn!("No text extracted from {}", file_name);
        return Ok(Some(0));
    }

    let written = if indexed {
        store.replace(&chunks, file_name).await?
    } else {
        store.upsert(&chunks, file_name).await?
    };
    Ok(Some(written))
}
