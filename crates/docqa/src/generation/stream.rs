//! NDJSON decoding for streamed chat responses

use bytes::Bytes;
use futures_util::{stream::BoxStream, StreamExt};
use serde::Deserialize;

use crate::error::{Error, Result};

/// Incremental line splitter for newline-delimited JSON
///
/// Network frames can end in the middle of a line; the unfinished tail is kept
/// until the next push.
#[derive(Debug, Default)]
pub struct ChatChunkDecoder {
    buffer: Vec<u8>,
}

impl ChatChunkDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a frame and return every complete, non-blank line
    pub fn push(&mut self, frame: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(frame);

        let mut lines = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&line).trim().to_string();
            if !line.is_empty() {
                lines.push(line);
            }
        }
        lines
    }

    /// Flush the unterminated tail once the body has ended
    pub fn finish(&mut self) -> Option<String> {
        let rest = std::mem::take(&mut self.buffer);
        let line = String::from_utf8_lossy(&rest).trim().to_string();
        (!line.is_empty()).then_some(line)
    }
}

/// One line of an Ollama `/api/chat` stream
#[derive(Debug, Deserialize)]
pub struct ChatStreamLine {
    #[serde(default)]
    pub message: Option<ChatLineMessage>,
    #[serde(default)]
    pub done: bool,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChatLineMessage {
    #[serde(default)]
    pub content: String,
}

/// What a decoded line means for the fragment stream
#[derive(Debug, PartialEq)]
pub enum LineEvent {
    Fragment(String),
    Done,
}

/// Interpret one NDJSON line
pub fn parse_line(line: &str) -> Result<LineEvent> {
    let parsed: ChatStreamLine = serde_json::from_str(line)
        .map_err(|e| Error::generation(format!("Malformed stream line: {}", e)))?;

    if let Some(error) = parsed.error {
        return Err(Error::generation(error));
    }
    if parsed.done {
        return Ok(LineEvent::Done);
    }
    Ok(LineEvent::Fragment(
        parsed.message.map(|m| m.content).unwrap_or_default(),
    ))
}

type ByteStream = BoxStream<'static, std::result::Result<Bytes, reqwest::Error>>;

/// State threaded through `stream::unfold`
pub struct FragmentState {
    body: ByteStream,
    decoder: ChatChunkDecoder,
    pending: std::collections::VecDeque<String>,
    finished: bool,
}

impl FragmentState {
    pub fn new(body: ByteStream) -> Self {
        Self {
            body,
            decoder: ChatChunkDecoder::new(),
            pending: std::collections::VecDeque::new(),
            finished: false,
        }
    }

    /// Next non-empty fragment; `None` once the stream has ended
    ///
    /// An error is yielded at most once and terminates the stream.
    pub async fn next_item(&mut self) -> Option<Result<String>> {
        loop {
            if self.finished {
                return None;
            }

            while let Some(line) = self.pending.pop_front() {
                match parse_line(&line) {
                    Ok(LineEvent::Fragment(text)) if text.is_empty() => continue,
                    Ok(LineEvent::Fragment(text)) => return Some(Ok(text)),
                    Ok(LineEvent::Done) => {
                        self.finished = true;
                        return None;
                    }
                    Err(e) => {
                        self.finished = true;
                        return Some(Err(e));
                    }
                }
            }

            match self.body.next().await {
                Some(Ok(frame)) => {
                    self.pending.extend(self.decoder.push(&frame));
                }
                Some(Err(e)) => {
                    self.finished = true;
                    return Some(Err(Error::generation(format!("Stream error: {}", e))));
                }
                None => match self.decoder.finish() {
                    Some(line) => self.pending.push_back(line),
                    None => {
                        self.finished = true;
                        return None;
                    }
                },
            }
        }
    }
}
