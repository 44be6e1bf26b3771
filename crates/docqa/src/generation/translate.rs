//! Answer translation

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::providers::llm::LlmProvider;
use crate::types::Language;

use super::prompt::PromptBuilder;

/// Translates a finished English answer into the requested language
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, text: &str, target: Language) -> Result<String>;

    fn name(&self) -> &str;
}

/// Translation through the chat model
pub struct LlmTranslator {
    llm: Arc<dyn LlmProvider>,
}

impl LlmTranslator {
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl Translator for LlmTranslator {
    async fn translate(&self, text: &str, target: Language) -> Result<String> {
        if !target.needs_translation() || text.trim().is_empty() {
            return Ok(text.to_string());
        }

        let messages = PromptBuilder::build_translation_messages(text, target);
        let translated = self.llm.chat(messages).await.map_err(|e| {
            tracing::warn!("Translation to {} failed: {}", target, e);
            Error::Translation(e.to_string())
        })?;

        let translated = translated.trim();
        if translated.is_empty() {
            return Err(Error::Translation(format!(
                "model returned an empty {} translation",
                target.name()
            )));
        }
        Ok(translated.to_string())
    }

    fn name(&self) -> &str {
        "llm"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::llm::{ChatMessage, FragmentStream};
    use futures_util::{stream, StreamExt};

    struct EchoLlm {
        reply: Option<&'static str>,
    }

    #[async_trait]
    impl LlmProvider for EchoLlm {
        async fn chat_stream(&self, _messages: Vec<ChatMessage>) -> Result<FragmentStream> {
            match self.reply {
                Some(reply) => Ok(stream::iter(vec![Ok(reply.to_string())]).boxed()),
                None => Err(Error::generation("offline")),
            }
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(self.reply.is_some())
        }

        fn name(&self) -> &str {
            "echo"
        }

        fn model(&self) -> &str {
            "echo"
        }
    }

    #[tokio::test]
    async fn test_english_is_passthrough() {
        let translator = LlmTranslator::new(Arc::new(EchoLlm { reply: None }));
        let text = translator.translate("Hello", Language::En).await.unwrap();
        assert_eq!(text, "Hello");
    }

    #[tokio::test]
    async fn test_translation_uses_model_reply() {
        let translator = LlmTranslator::new(Arc::new(EchoLlm { reply: Some("  Hallo  ") }));
        let text = translator.translate("Hello", Language::De).await.unwrap();
        assert_eq!(text, "Hallo");
    }

    #[tokio::test]
    async fn test_translation_failure_is_typed() {
        let translator = LlmTranslator::new(Arc::new(EchoLlm { reply: None }));
        let err = translator.translate("Hello", Language::Es).await.unwrap_err();
        assert!(matches!(err, Error::Translation(_)));
    }
}
