//! Cross-encoder relevance scoring
//!
//! Uses `cross-encoder/ms-marco-MiniLM-L-6-v2` (or any compatible model with an
//! `onnx/model.onnx` export) to score `(question, passage)` pairs. The model is
//! downloaded into the cache directory once and loaded on first use.

use async_trait::async_trait;
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Tensor;
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokenizers::{Tokenizer, TruncationParams};
use tokio::sync::OnceCell;

use crate::config::RagConfig;
use crate::error::{Error, Result};

/// Scores passages against a question; higher means more relevant
#[async_trait]
pub trait RelevanceScorer: Send + Sync {
    /// One raw score per passage, in passage order
    async fn score(&self, question: &str, passages: &[String]) -> Result<Vec<f32>>;

    fn name(&self) -> &str;
}

/// Loaded ONNX session and tokenizer
struct CrossEncoderModel {
    session: Mutex<Session>,
    tokenizer: Tokenizer,
}

/// ONNX cross-encoder, loaded lazily
pub struct CrossEncoder {
    model_name: String,
    cache_dir: PathBuf,
    max_length: usize,
    batch_size: usize,
    model: OnceCell<Arc<CrossEncoderModel>>,
}

impl CrossEncoder {
    pub fn new(config: &RagConfig) -> Self {
        let retrieval = &config.retrieval;
        Self {
            model_name: retrieval.reranker_model.clone(),
            cache_dir: retrieval.reranker_cache_dir.join(model_slug(&retrieval.reranker_model)),
            max_length: retrieval.max_length.max(8),
            batch_size: retrieval.batch_size.max(1),
            model: OnceCell::new(),
        }
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// Whether the model has been loaded yet
    pub fn is_loaded(&self) -> bool {
        self.model.initialized()
    }

    async fn model(&self) -> Result<Arc<CrossEncoderModel>> {
        self.model
            .get_or_try_init(|| async {
                let model = self.load().await?;
                Ok::<_, Error>(Arc::new(model))
            })
            .await
            .cloned()
    }

    async fn load(&self) -> Result<CrossEncoderModel> {
        tracing::info!("Loading cross-encoder: {}", self.model_name);

        tokio::fs::create_dir_all(&self.cache_dir).await.map_err(|e| {
            Error::rerank(format!(
                "Failed to create cache directory {}: {}",
                self.cache_dir.display(),
                e
            ))
        })?;

        let model_path = self.cache_dir.join("model.onnx");
        let tokenizer_path = self.cache_dir.join("tokenizer.json");

        if !model_path.exists() {
            let url = format!(
                "https://huggingface.co/{}/resolve/main/onnx/model.onnx",
                self.model_name
            );
            download_file(&url, &model_path).await?;
        }
        if !tokenizer_path.exists() {
            let url = format!(
                "https://huggingface.co/{}/resolve/main/tokenizer.json",
                self.model_name
            );
            download_file(&url, &tokenizer_path).await?;
        }

        let max_length = self.max_length;
        let model = tokio::task::spawn_blocking(move || {
            load_model(&model_path, &tokenizer_path, max_length)
        })
        .await??;

        tracing::info!("Cross-encoder ready");
        Ok(model)
    }
}

#[async_trait]
impl RelevanceScorer for CrossEncoder {
    async fn score(&self, question: &str, passages: &[String]) -> Result<Vec<f32>> {
        if passages.is_empty() {
            return Ok(Vec::new());
        }

        let model = self.model().await?;
        let question = question.to_string();
        let passages = passages.to_vec();
        let batch_size = self.batch_size;

        tokio::task::spawn_blocking(move || {
            let mut scores = Vec::with_capacity(passages.len());
            for batch in passages.chunks(batch_size) {
                scores.extend(model.score_batch(&question, batch)?);
            }
            Ok(scores)
        })
        .await?
    }

    fn name(&self) -> &str {
        "cross-encoder"
    }
}

impl CrossEncoderModel {
    fn score_batch(&self, question: &str, passages: &[String]) -> Result<Vec<f32>> {
        let batch_size = passages.len();
        let pairs: Vec<(&str, &str)> = passages.iter().map(|p| (question, p.as_str())).collect();

        let encodings = self
            .tokenizer
            .encode_batch(pairs, true)
            .map_err(|e| Error::rerank(format!("Tokenization failed: {}", e)))?;

        let seq_len = encodings
            .iter()
            .map(|e| e.get_ids().len())
            .max()
            .unwrap_or(0)
            .max(1);

        let mut input_ids = vec![0i64; batch_size * seq_len];
        let mut attention_mask = vec![0i64; batch_size * seq_len];
        let mut token_type_ids = vec![0i64; batch_size * seq_len];

        for (i, encoding) in encodings.iter().enumerate() {
            let row = i * seq_len;
            let ids = encoding.get_ids();
            let mask = encoding.get_attention_mask();
            let types = encoding.get_type_ids();
            for j in 0..ids.len().min(seq_len) {
                input_ids[row + j] = ids[j] as i64;
                attention_mask[row + j] = mask[j] as i64;
                token_type_ids[row + j] = types[j] as i64;
            }
        }

        let shape = vec![batch_size, seq_len];
        let input_ids = Tensor::from_array((shape.clone(), input_ids.into_boxed_slice()))
            .map_err(|e| Error::rerank(format!("Input tensor creation failed: {}", e)))?;
        let attention_mask = Tensor::from_array((shape.clone(), attention_mask.into_boxed_slice()))
            .map_err(|e| Error::rerank(format!("Attention mask tensor creation failed: {}", e)))?;
        let token_type_ids = Tensor::from_array((shape, token_type_ids.into_boxed_slice()))
            .map_err(|e| Error::rerank(format!("Token type tensor creation failed: {}", e)))?;

        let inputs = vec![
            ("input_ids", input_ids.into_dyn()),
            ("attention_mask", attention_mask.into_dyn()),
            ("token_type_ids", token_type_ids.into_dyn()),
        ];

        let mut session = self.session.lock();
        let outputs = session
            .run(inputs)
            .map_err(|e| Error::rerank(format!("Inference failed: {}", e)))?;

        let output_iter: Vec<_> = outputs.iter().collect();
        let logits = output_iter
            .iter()
            .find(|(name, _)| *name == "logits")
            .or_else(|| output_iter.first())
            .map(|(_, v)| v)
            .ok_or_else(|| Error::rerank("No output tensor"))?;

        let (_shape, data) = logits
            .try_extract_tensor::<f32>()
            .map_err(|e| Error::rerank(format!("Failed to extract logits: {}", e)))?;

        // [batch, labels]; the first label is the relevance logit
        let labels = data.len() / batch_size.max(1);
        if labels == 0 {
            return Err(Error::rerank(format!(
                "Expected {} logits, got {}",
                batch_size,
                data.len()
            )));
        }
        Ok((0..batch_size).map(|i| data[i * labels]).collect())
    }
}

fn load_model(model_path: &Path, tokenizer_path: &Path, max_length: usize) -> Result<CrossEncoderModel> {
    let session = Session::builder()
        .map_err(|e| Error::rerank(format!("Failed to create session builder: {}", e)))?
        .with_optimization_level(GraphOptimizationLevel::Level3)
        .map_err(|e| Error::rerank(format!("Failed to set optimization level: {}", e)))?
        .with_intra_threads(4)
        .map_err(|e| Error::rerank(format!("Failed to set threads: {}", e)))?
        .commit_from_file(model_path)
        .map_err(|e| Error::rerank(format!("Failed to load model: {}", e)))?;

    let mut tokenizer = Tokenizer::from_file(tokenizer_path)
        .map_err(|e| Error::rerank(format!("Failed to load tokenizer: {}", e)))?;
    tokenizer
        .with_truncation(Some(TruncationParams {
            max_length,
            ..Default::default()
        }))
        .map_err(|e| Error::rerank(format!("Failed to configure truncation: {}", e)))?;
    tokenizer.with_padding(None);

    Ok(CrossEncoderModel {
        session: Mutex::new(session),
        tokenizer,
    })
}

async fn download_file(url: &str, path: &Path) -> Result<()> {
    tracing::info!("Downloading {}", url);

    let response = reqwest::get(url)
        .await
        .map_err(|e| Error::rerank(format!("Failed to download {}: {}", url, e)))?;

    if !response.status().is_success() {
        return Err(Error::rerank(format!(
            "Download of {} failed: HTTP {}",
            url,
            response.status()
        )));
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| Error::rerank(format!("Failed to read {}: {}", url, e)))?;

    // only a complete download is renamed into place
    let partial = path.with_extension("part");
    tokio::fs::write(&partial, &bytes).await?;
    tokio::fs::rename(&partial, path).await?;

    tracing::info!("Saved {} ({} bytes)", path.display(), bytes.len());
    Ok(())
}

/// Directory name for a model id such as `cross-encoder/ms-marco-MiniLM-L-6-v2`
fn model_slug(model: &str) -> String {
    model.replace('/', "--")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_slug() {
        assert_eq!(
            model_slug("cross-encoder/ms-marco-MiniLM-L-6-v2"),
            "cross-encoder--ms-marco-MiniLM-L-6-v2"
        );
    }

    #[test]
    fn test_cross_encoder_is_lazy() {
        let mut config = RagConfig::default();
        config.retrieval.reranker_cache_dir = PathBuf::from("/nonexistent/cache");
        let encoder = CrossEncoder::new(&config);

        assert!(!encoder.is_loaded());
        assert_eq!(encoder.model_name(), "cross-encoder/ms-marco-MiniLM-L-6-v2");
        assert!(encoder.cache_dir.ends_with("cross-encoder--ms-marco-MiniLM-L-6-v2"));
    }

    #[tokio::test]
    async fn test_no_passages_skips_loading() {
        let mut config = RagConfig::default();
        config.retrieval.reranker_cache_dir = PathBuf::from("/nonexistent/cache");
        let encoder = CrossEncoder::new(&config);

        let scores = encoder.score("question", &[]).await.unwrap();
        assert!(scores.is_empty());
        assert!(!encoder.is_loaded());
    }
}
