//! Chat model listing

use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::error::Result;
use crate::server::state::AppState;

/// GET /api/models - Chat models available upstream
pub async fn list_models(State(state): State<AppState>) -> Result<Json<Value>> {
    let llm = state.llm();
    let models = llm.list_models().await?;
    Ok(Json(json!({
        "provider": llm.name(),
        "current": llm.model(),
        "models": models,
    })))
}
