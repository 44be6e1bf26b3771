//! Answer generation: prompts, streamed chat, translation and reports

pub mod answer;
pub mod ollama;
pub mod prompt;
pub mod report;
pub mod stream;
pub mod translate;

pub use answer::{AnswerGenerator, AnswerStream};
pub use ollama::OllamaClient;
pub use prompt::{PromptBuilder, REFUSAL, SYSTEM_PROMPT};
pub use report::AnswerReport;
pub use stream::ChatChunkDecoder;
pub use translate::{LlmTranslator, Translator};
