//! Question answering endpoints

use axum::{
    body::Body,
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use futures_util::StreamExt;
use std::time::Instant;

use crate::error::{Error, Result};
use crate::generation::AnswerReport;
use crate::server::state::AppState;
use crate::types::{Language, QueryRequest, QueryResponse, RetrievalOutcome};

const TEXT_PLAIN: &str = "text/plain; charset=utf-8";

/// POST /api/query - Answer a question from the indexed documents
pub async fn query_documents(
    State(state): State<AppState>,
    Json(request): Json<QueryRequest>,
) -> Result<Json<QueryResponse>> {
    let response = answer_question(&state, &request).await?;
    Ok(Json(response))
}

/// POST /api/query/stream - Answer as a plain-text stream
///
/// English answers are streamed fragment by fragment; other languages are
/// translated once the answer is complete and sent in one piece.
pub async fn query_stream(
    State(state): State<AppState>,
    Json(request): Json<QueryRequest>,
) -> Result<Response> {
    validate(&request)?;
    let outcome = retrieve(&state, &request).await?;

    if outcome.is_empty() {
        return Ok(plain_text(Body::from(QueryResponse::NOT_FOUND)));
    }

    let stream = state
        .generator()
        .generate(&outcome.context_text(), &request.question)
        .await?;

    if !request.language.needs_translation() {
        let body = Body::from_stream(stream.map(Ok::<_, std::io::Error>));
        return Ok(plain_text(body));
    }

    let answer = stream.collect_text().await;
    let text = match state.translator().translate(&answer, request.language).await {
        Ok(translated) => translated,
        Err(e) => {
            tracing::warn!("Sending untranslated answer: {}", e);
            answer
        }
    };
    Ok(plain_text(Body::from(text)))
}

/// POST /api/query/export - Answer as a downloadable text file
pub async fn export_answer(
    State(state): State<AppState>,
    Json(request): Json<QueryRequest>,
) -> Result<Response> {
    let response = answer_question(&state, &request).await?;
    let report = AnswerReport::new(
        request.question.trim(),
        response.answer,
        response.confidence,
        response.citations,
    );

    let disposition = format!("attachment; filename=\"{}\"", report.file_name());
    Ok((
        [
            (header::CONTENT_TYPE, TEXT_PLAIN.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        report.render(),
    )
        .into_response())
}

/// Retrieve, re-rank, generate and (if requested) translate
async fn answer_question(state: &AppState, request: &QueryRequest) -> Result<QueryResponse> {
    let start = Instant::now();
    validate(request)?;

    tracing::info!("Query: \"{}\" ({})", request.question, request.language);

    let outcome = retrieve(state, request).await?;
    if outcome.is_empty() {
        return Ok(QueryResponse::not_found(start.elapsed().as_millis() as u64));
    }

    let answer = state
        .generator()
        .generate(&outcome.context_text(), &request.question)
        .await?
        .collect_text()
        .await;

    let mut notices = Vec::new();
    let (answer, language) = if request.language.needs_translation() {
        match state.translator().translate(&answer, request.language).await {
            Ok(translated) => (translated, request.language),
            Err(e) => {
                notices.push(format!(
                    "Translation to {} failed; showing the English answer. ({})",
                    request.language.name(),
                    e
                ));
                (answer, Language::En)
            }
        }
    } else {
        (answer, Language::En)
    };

    let processing_time_ms = start.elapsed().as_millis() as u64;
    tracing::info!(
        "Query completed in {}ms, {} citations, confidence {:.2}",
        processing_time_ms,
        outcome.selected.len(),
        outcome.confidence
    );

    Ok(QueryResponse {
        answer,
        language,
        confidence: outcome.confidence,
        confidence_level: outcome.confidence_level(),
        citations: outcome.citations(),
        chunks_retrieved: outcome.candidates,
        notices,
        processing_time_ms,
    })
}

async fn retrieve(state: &AppState, request: &QueryRequest) -> Result<RetrievalOutcome> {
    let n_results = request.effective_n_results(state.config().retrieval.n_results);
    state
        .pipeline()
        .retrieve_and_rerank(request.question.trim(), n_results)
        .await
}

fn validate(request: &QueryRequest) -> Result<()> {
    if request.question.trim().is_empty() {
        return Err(Error::BadRequest("Question must not be empty".to_string()));
    }
    Ok(())
}

fn plain_text(body: Body) -> Response {
    ([(header::CONTENT_TYPE, TEXT_PLAIN)], body).into_response()
}
