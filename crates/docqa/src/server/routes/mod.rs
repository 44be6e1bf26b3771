//! API routes for the QA server

pub mod documents;
pub mod ingest;
pub mod models;
pub mod query;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};

use crate::server::state::AppState;

/// Build all API routes
pub fn api_routes(max_upload_size: usize) -> Router<AppState> {
    Router::new()
        // Document management
        .route("/documents", get(documents::list_documents))
        .route("/documents/:name", delete(documents::delete_document))
        // Ingestion - with larger body limit for file uploads
        .route(
            "/ingest",
            post(ingest::ingest_files).layer(DefaultBodyLimit::max(max_upload_size)),
        )
        // Questions
        .route("/query", post(query::query_documents))
        .route("/query/stream", post(query::query_stream))
        .route("/query/export", post(query::export_answer))
        .route("/models", get(models::list_models))
        .route("/info", get(info))
}

/// API info endpoint
async fn info() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "name": "docqa",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Question answering over uploaded documents with re-ranked retrieval",
        "formats": ["pdf", "docx", "txt", "html"],
        "languages": crate::types::Language::ALL.iter().map(|l| l.code()).collect::<Vec<_>>(),
        "endpoints": {
            "POST /api/ingest": "Upload and index documents",
            "GET /api/documents": "List indexed documents",
            "DELETE /api/documents/:name": "Remove a document",
            "POST /api/query": "Answer a question with citations",
            "POST /api/query/stream": "Answer a question as streamed text",
            "POST /api/query/export": "Download an answer report",
            "GET /api/models": "List available chat models"
        }
    }))
}
