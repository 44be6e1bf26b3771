//! Query and ingestion request types

use serde::{Deserialize, Serialize};

/// Smallest accepted `n_results`
pub const MIN_N_RESULTS: usize = 1;
/// Largest accepted `n_results`
pub const MAX_N_RESULTS: usize = 20;

/// Answer language
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    De,
    Fr,
    Es,
}

impl Language {
    /// All supported languages
    pub const ALL: [Language; 4] = [Language::En, Language::De, Language::Fr, Language::Es];

    /// ISO 639-1 code
    pub fn code(&self) -> &'static str {
        match self {
            Self::En => "en",
            Self::De => "de",
            Self::Fr => "fr",
            Self::Es => "es",
        }
    }

    /// English name, used in translation prompts
    pub fn name(&self) -> &'static str {
        match self {
            Self::En => "English",
            Self::De => "German",
            Self::Fr => "French",
            Self::Es => "Spanish",
        }
    }

    /// Answers are generated in English; anything else needs a translation step
    pub fn needs_translation(&self) -> bool {
        *self != Self::En
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Question submitted to the query endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
    /// The question to answer
    pub question: String,

    /// Candidates to retrieve before re-ranking (clamped to 1..=20)
    #[serde(default)]
    pub n_results: Option<usize>,

    /// Language of the final answer
    #[serde(default)]
    pub language: Language,
}

impl QueryRequest {
    /// Create a new query
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            n_results: None,
            language: Language::En,
        }
    }

    /// Set the candidate count
    pub fn with_n_results(mut self, n: usize) -> Self {
        self.n_results = Some(n);
        self
    }

    /// Set the answer language
    pub fn with_language(mut self, language: Language) -> Self {
        self.language = language;
        self
    }

    /// Candidate count, falling back to `default` and clamped to the accepted range
    pub fn effective_n_results(&self, default: usize) -> usize {
        self.n_results
            .unwrap_or(default)
            .clamp(MIN_N_RESULTS, MAX_N_RESULTS)
    }
}

/// Options accepted alongside an upload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IngestOptions {
    /// Re-index files whose name is already in the collection
    #[serde(default)]
    pub reprocess: bool,
}
