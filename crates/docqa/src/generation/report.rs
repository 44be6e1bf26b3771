//! Downloadable plain-text answer report

use chrono::{DateTime, Utc};

use crate::types::{Citation, ConfidenceLevel};

/// Question, answer and sources, rendered as a plain-text file
#[derive(Debug, Clone)]
pub struct AnswerReport {
    pub question: String,
    pub answer: String,
    pub confidence: f32,
    pub citations: Vec<Citation>,
    pub generated_at: DateTime<Utc>,
}

impl AnswerReport {
    pub fn new(
        question: impl Into<String>,
        answer: impl Into<String>,
        confidence: f32,
        citations: Vec<Citation>,
    ) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
            confidence,
            citations,
            generated_at: Utc::now(),
        }
    }

    /// Suggested download name
    pub fn file_name(&self) -> &'static str {
        "answer.txt"
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("Question: {}\n\n", self.question));
        out.push_str(&format!("Answer:\n{}\n\n", self.answer.trim_end()));
        out.push_str(&format!(
            "Confidence: {:.2} ({})\n",
            self.confidence,
            ConfidenceLevel::from_score(self.confidence).as_str()
        ));

        if !self.citations.is_empty() {
            out.push_str("\nSources:\n");
            for citation in &self.citations {
                out.push_str(&format!("- {}\n", citation.label()));
            }
        }

        out.push_str(&format!(
            "\nGenerated: {}\n",
            self.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
        ));
        out
    }
}
