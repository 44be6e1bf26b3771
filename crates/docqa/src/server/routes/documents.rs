//! Document management endpoints

use axum::{
    extract::{Path, State},
    Json,
};

use crate::error::{Error, Result};
use crate::server::state::AppState;
use crate::types::{DeleteResponse, DocumentListResponse};

/// GET /api/documents - List indexed file names
pub async fn list_documents(State(state): State<AppState>) -> Result<Json<DocumentListResponse>> {
    let documents = state.store().list_documents().await?;
    Ok(Json(DocumentListResponse {
        total: documents.len(),
        documents,
    }))
}

/// DELETE /api/documents/:name - Remove every chunk of one file
pub async fn delete_document(
    State(state): State<AppState>,
    Path(file_name): Path<String>,
) -> Result<Json<DeleteResponse>> {
    if file_name.trim().is_empty() {
        return Err(Error::BadRequest("File name must not be empty".to_string()));
    }

    let deleted_entries = state.store().delete(&file_name).await?;
    Ok(Json(DeleteResponse {
        file_name,
        deleted_entries,
    }))
}
