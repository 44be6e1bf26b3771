//! Ingest → retrieve → re-rank → generate, with in-memory fakes

mod common;

use futures_util::StreamExt;
use std::sync::Arc;

use common::{HashEmbedder, OverlapScorer, ScriptedLlm};
use docqa::generation::{AnswerGenerator, AnswerReport};
use docqa::ingestion::{DocumentIngestor, UploadedFile};
use docqa::retrieval::RetrievalPipeline;
use docqa::storage::VectorStore;
use docqa::ConfidenceLevel;

const POLICY: &str = "Refund policy.\n\n\
Customers may return any item within thirty days of delivery. \
Refunds are paid to the original payment method within five business days.\n\n\
Shipping policy.\n\n\
Orders above fifty euros ship for free. Express shipping costs nine euros.";

const HANDBOOK: &str = "<html><body><h1>Office handbook</h1>\
<p>The office opens at eight and closes at six.</p>\
<script>var tracking = 1;</script>\
<p>Visitors must sign in at the front desk.</p></body></html>";

async fn indexed_store() -> Arc<VectorStore> {
    let store = Arc::new(VectorStore::in_memory(Arc::new(HashEmbedder::new())).unwrap());
    let ingestor = DocumentIngestor::new(120, 20);

    let files = vec![
        UploadedFile::new("policy.txt", POLICY.as_bytes()),
        UploadedFile::new("handbook.html", HANDBOOK.as_bytes()),
        UploadedFile::new("data.csv", "a,b,c".as_bytes()),
    ];
    for file in ingestor.ingest_all(&files) {
        if file.is_ok() {
            store.upsert(file.chunks(), &file.file_name).await.unwrap();
        }
    }
    store
}

#[tokio::test]
async fn empty_collection_never_calls_reranker() {
    let store = Arc::new(VectorStore::in_memory(Arc::new(HashEmbedder::new())).unwrap());
    let scorer = Arc::new(OverlapScorer::new());
    let pipeline = RetrievalPipeline::new(store, scorer.clone(), 3);

    let outcome = pipeline.retrieve_and_rerank("How long do refunds take?", 10).await.unwrap();

    assert!(outcome.is_empty());
    assert_eq!(outcome.candidates, 0);
    assert_eq!(outcome.confidence, 0.0);
    assert_eq!(scorer.call_count(), 0);
}

#[tokio::test]
async fn unsupported_files_are_not_indexed() {
    let store = indexed_store().await;
    let documents = store.list_documents().await.unwrap();
    assert_eq!(documents, vec!["handbook.html".to_string(), "policy.txt".to_string()]);
}

#[tokio::test]
async fn question_is_answered_from_reranked_context() {
    let store = indexed_store().await;
    let scorer = Arc::new(OverlapScorer::new());
    let pipeline = RetrievalPipeline::new(store, scorer.clone(), 2);

    let outcome = pipeline
        .retrieve_and_rerank("Within how many days are refunds paid to the payment method?", 10)
        .await
        .unwrap();

    assert_eq!(scorer.call_count(), 1);
    assert_eq!(outcome.selected.len(), 2);
    assert!(outcome.selected[0].text.contains("Refunds are paid"));
    assert_eq!(outcome.selected[0].relevance_score, 1.0);
    assert!(outcome.citations()[0].source_file == "policy.txt");
    assert!((0.0..=1.0).contains(&outcome.confidence));

    let llm = Arc::new(ScriptedLlm::new(&["Within five ", "business days."]));
    let generator = AnswerGenerator::new(llm.clone());
    let stream = generator
        .generate(&outcome.context_text(), "Within how many days are refunds paid?")
        .await
        .unwrap();
    let fragments: Vec<String> = stream.collect().await;
    assert_eq!(fragments, vec!["Within five ".to_string(), "business days.".to_string()]);

    // context and question reach the model in one user turn
    let requests = llm.requests.lock();
    let user = &requests[0][1].content;
    assert!(user.starts_with("Context: "));
    assert!(user.contains("Refunds are paid"));
    assert!(user.ends_with("\nQuestion: Within how many days are refunds paid?"));
}

#[tokio::test]
async fn report_cites_selected_chunks() {
    let store = indexed_store().await;
    let pipeline = RetrievalPipeline::new(store, Arc::new(OverlapScorer::new()), 1);

    let outcome = pipeline
        .retrieve_and_rerank("When do visitors sign in at the front desk?", 10)
        .await
        .unwrap();
    assert_eq!(outcome.selected.len(), 1);

    let citation = &outcome.citations()[0];
    assert_eq!(citation.source_file, "handbook.html");

    let report = AnswerReport::new(
        "When do visitors sign in?",
        "At the front desk.",
        outcome.confidence,
        outcome.citations(),
    );
    let text = report.render();
    assert!(text.contains(&format!("- handbook.html (Chunk {})", citation.chunk_index)));
    assert!(text.contains(ConfidenceLevel::from_score(outcome.confidence).as_str()));
    assert!(!text.contains("tracking"));
}
