//! Prompt templates for grounded answer generation

use crate::providers::llm::ChatMessage;
use crate::types::Language;

/// Reply the model is told to give when the context is insufficient
pub const REFUSAL: &str =
    "The context does not provide enough information to answer this question.";

/// System instruction sent with every question
pub const SYSTEM_PROMPT: &str = r#"You are an AI assistant that provides detailed answers based solely on the given context.

Instructions:

- Use **only** the information in the "Context" to answer the "Question".
- Do **not** include any external knowledge or assumptions.
- If the context doesn't contain sufficient information to answer the question, respond: "The context does not provide enough information to answer this question."

Formatting Guidelines:

- Use clear and concise language.
- Organize your answer into paragraphs for readability.
- Use bullet points or numbered lists to break down complex information when appropriate.
- Include headings or subheadings if relevant.
- Ensure proper grammar, punctuation, and spelling.

Remember: Base your entire response solely on the information provided in the context."#;

/// Prompt builder for chat requests
pub struct PromptBuilder;

impl PromptBuilder {
    /// User turn carrying context and question
    pub fn build_user_message(context: &str, question: &str) -> String {
        format!("Context: {}\nQuestion: {}", context, question)
    }

    /// Full conversation for a grounded answer
    pub fn build_messages(context: &str, question: &str) -> Vec<ChatMessage> {
        vec![
            ChatMessage::system(SYSTEM_PROMPT),
            ChatMessage::user(Self::build_user_message(context, question)),
        ]
    }

    /// Conversation asking for a translation and nothing else
    pub fn build_translation_messages(text: &str, target: Language) -> Vec<ChatMessage> {
        vec![
            ChatMessage::system(format!(
                "You are a professional translator. Translate the user's text from English to {}. \
                 Keep the formatting (paragraphs, lists, headings). \
                 Reply with the translation only, without notes or explanations.",
                target.name()
            )),
            ChatMessage::user(text),
        ]
    }
}
