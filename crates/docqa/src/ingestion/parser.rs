//! Multi-format text extraction

use once_cell::sync::Lazy;
use regex::Regex;
use std::io::Write;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::process::Command;

use crate::error::{Error, Result};
use crate::types::FileType;

static TRAILING_SPACES: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t]+\n").unwrap());
static BLANK_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

/// HTML elements whose text never reaches the index
const SKIPPED_HTML_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

/// Stateless text extractor keyed on file extension
pub struct FileParser;

impl FileParser {
    /// Extract the plain text of an uploaded file
    pub fn extract(file_name: &str, data: &[u8]) -> Result<String> {
        let file_type = FileType::from_file_name(file_name)?;

        let raw = match file_type {
            FileType::Pdf => Self::extract_pdf(file_name, data)?,
            FileType::Docx => Self::extract_docx(file_name, data)?,
            FileType::Txt => Self::extract_txt(file_name, data)?,
            FileType::Html => Self::extract_html(data),
        };

        let text = normalize_text(&raw);
        tracing::debug!(
            "Extracted {} characters from {} ({})",
            text.chars().count(),
            file_name,
            file_type.display_name()
        );
        Ok(text)
    }

    /// PDF via pdf-extract, falling back to `pdftotext` when available
    fn extract_pdf(file_name: &str, data: &[u8]) -> Result<String> {
        // pdf-extract panics on some malformed fonts
        let primary = catch_unwind(AssertUnwindSafe(|| pdf_extract::extract_text_from_mem(data)));

        let failure = match primary {
            Ok(Ok(text)) if !text.trim().is_empty() => {
                return Ok(text.replace('\0', ""));
            }
            Ok(Ok(_)) => "no text content could be extracted".to_string(),
            Ok(Err(e)) => e.to_string(),
            Err(_) => "pdf extractor panicked".to_string(),
        };

        if !Self::has_pdftotext() {
            tracing::warn!("pdf-extract failed for {}: {}", file_name, failure);
            return Err(Error::extraction(file_name, failure));
        }

        tracing::warn!(
            "pdf-extract failed for {}: {}, trying pdftotext",
            file_name,
            failure
        );
        Self::extract_pdf_with_pdftotext(file_name, data)
    }

    /// Run `pdftotext` on a temporary copy of the bytes
    ///
    /// The temporary file is removed when `input` drops, on every return path.
    fn extract_pdf_with_pdftotext(file_name: &str, data: &[u8]) -> Result<String> {
        let mut input = tempfile::Builder::new()
            .prefix("docqa-")
            .suffix(".pdf")
            .tempfile()?;
        input.write_all(data)?;
        input.flush()?;

        let output = Command::new("pdftotext")
            .args(["-layout", "-enc", "UTF-8"])
            .arg(input.path())
            .arg("-")
            .output()
            .map_err(|e| Error::extraction(file_name, format!("pdftotext failed: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::extraction(
                file_name,
                format!("pdftotext error: {}", stderr.trim()),
            ));
        }

        let text = String::from_utf8_lossy(&output.stdout).replace('\0', "");
        if text.trim().is_empty() {
            return Err(Error::extraction(
                file_name,
                "PDF appears to be image-based or has no extractable text",
            ));
        }
        Ok(text)
    }

    /// Check if pdftotext is available
    pub fn has_pdftotext() -> bool {
        Command::new("pdftotext")
            .arg("-v")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    /// DOCX paragraphs, one per line
    fn extract_docx(file_name: &str, data: &[u8]) -> Result<String> {
        let doc = docx_rs::read_docx(data).map_err(|e| Error::extraction(file_name, e.to_string()))?;

        let mut content = String::new();
        for child in doc.document.children {
            if let docx_rs::DocumentChild::Paragraph(p) = child {
                for child in p.children {
                    if let docx_rs::ParagraphChild::Run(run) = child {
                        for child in run.children {
                            if let docx_rs::RunChild::Text(t) = child {
                                content.push_str(&t.text);
                            }
                        }
                    }
                }
                content.push('\n');
            }
        }
        Ok(content)
    }

    /// Strict UTF-8, leading BOM dropped
    fn extract_txt(file_name: &str, data: &[u8]) -> Result<String> {
        let data = data.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(data);
        std::str::from_utf8(data)
            .map(str::to_string)
            .map_err(|e| Error::extraction(file_name, format!("invalid UTF-8: {}", e)))
    }

    /// Visible text nodes, one trimmed fragment per line
    fn extract_html(data: &[u8]) -> String {
        let html = String::from_utf8_lossy(data);
        let document = scraper::Html::parse_document(&html);

        let mut fragments = Vec::new();
        for node in document.root_element().descendants() {
            let Some(text) = node.value().as_text() else {
                continue;
            };
            let hidden = node.ancestors().any(|ancestor| {
                ancestor
                    .value()
                    .as_element()
                    .is_some_and(|el| SKIPPED_HTML_ELEMENTS.contains(&el.name()))
            });
            if hidden {
                continue;
            }
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                fragments.push(trimmed);
            }
        }
        fragments.join("\n")
    }
}

/// Remove trailing spaces before newlines and collapse 3+ newlines into one blank line
pub fn normalize_text(text: &str) -> String {
    let text = text.replace("\r\n", "\n");
    let text = TRAILING_SPACES.replace_all(&text, "\n");
    BLANK_RUNS.replace_all(&text, "\n\n").into_owned()
}
