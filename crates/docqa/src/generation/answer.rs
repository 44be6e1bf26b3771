//! Streaming answer generation

use futures_util::{stream, Stream, StreamExt};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use crate::error::Result;
use crate::providers::llm::{FragmentStream, LlmProvider};

use super::prompt::PromptBuilder;

/// Finite, non-restartable stream of answer fragments
///
/// A broken upstream stream is logged and simply ends this one; fragments
/// already yielded stay valid. Dropping it stops further network reads.
pub struct AnswerStream {
    inner: stream::BoxStream<'static, String>,
}

impl AnswerStream {
    pub fn new(fragments: FragmentStream) -> Self {
        let inner = stream::unfold(Some(fragments), |state| async move {
            let mut fragments = state?;
            match fragments.next().await {
                Some(Ok(text)) => Some((text, Some(fragments))),
                Some(Err(e)) => {
                    tracing::error!("Answer stream interrupted: {}", e);
                    None
                }
                None => None,
            }
        });
        Self {
            inner: inner.boxed(),
        }
    }

    /// Drain the stream into one string
    pub async fn collect_text(self) -> String {
        self.inner.collect::<Vec<_>>().await.concat()
    }
}

impl Stream for AnswerStream {
    type Item = String;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<String>> {
        self.inner.as_mut().poll_next(cx)
    }
}

/// Sends context and question to the chat model under the fixed system instruction
#[derive(Clone)]
pub struct AnswerGenerator {
    llm: Arc<dyn LlmProvider>,
}

impl AnswerGenerator {
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self { llm }
    }

    /// Open an answer stream
    ///
    /// Failing to reach the chat endpoint is an `Error::Generation`.
    pub async fn generate(&self, context: &str, question: &str) -> Result<AnswerStream> {
        let messages = PromptBuilder::build_messages(context, question);

        tracing::info!(
            "Generating answer with {} ({} context chars)",
            self.llm.model(),
            context.chars().count()
        );

        let fragments = self.llm.chat_stream(messages).await.map_err(|e| {
            tracing::error!("Failed to open answer stream: {}", e);
            e
        })?;

        Ok(AnswerStream::new(fragments))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::providers::llm::ChatMessage;
    use async_trait::async_trait;
    use parking_lot::Mutex;

    struct ScriptedLlm {
        items: Vec<std::result::Result<&'static str, &'static str>>,
        seen: Mutex<Vec<ChatMessage>>,
    }

    #[async_trait]
    impl LlmProvider for ScriptedLlm {
        async fn chat_stream(&self, messages: Vec<ChatMessage>) -> Result<FragmentStream> {
            *self.seen.lock() = messages;
            let items: Vec<Result<String>> = self
                .items
                .iter()
                .map(|item| match item {
                    Ok(text) => Ok(text.to_string()),
                    Err(msg) => Err(Error::generation(*msg)),
                })
                .collect();
            Ok(stream::iter(items).boxed())
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(true)
        }

        fn name(&self) -> &str {
            "scripted"
        }

        fn model(&self) -> &str {
            "scripted-model"
        }
    }

    #[tokio::test]
    async fn test_fragments_in_order() {
        let llm = Arc::new(ScriptedLlm {
            items: vec![Ok("Refunds "), Ok("take "), Ok("30 days.")],
            seen: Mutex::new(Vec::new()),
        });
        let generator = AnswerGenerator::new(llm.clone());

        let stream = generator.generate("ctx", "How long?").await.unwrap();
        let fragments: Vec<String> = stream.collect().await;

        assert_eq!(fragments, vec!["Refunds ", "take ", "30 days."]);
        assert_eq!(llm.seen.lock()[1].content, "Context: ctx\nQuestion: How long?");
    }

    #[tokio::test]
    async fn test_mid_stream_error_keeps_prefix() {
        let llm = Arc::new(ScriptedLlm {
            items: vec![Ok("partial "), Err("connection reset"), Ok("never")],
            seen: Mutex::new(Vec::new()),
        });
        let generator = AnswerGenerator::new(llm);

        let text = generator.generate("ctx", "q").await.unwrap().collect_text().await;
        assert_eq!(text, "partial ");
    }

    #[test]
    fn test_stream_is_finite_without_runtime() {
        let fragments: FragmentStream =
            stream::iter(vec![Ok("one ".to_string()), Ok("two".to_string())]).boxed();
        let text = tokio_test::block_on(AnswerStream::new(fragments).collect_text());
        assert_eq!(text, "one two");
    }
}
