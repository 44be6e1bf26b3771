//! Recursive character text splitting with overlap

use std::collections::VecDeque;

/// Separators tried in order, coarsest first; `""` splits into characters
pub const DEFAULT_SEPARATORS: &[&str] = &["\n\n", "\n", ". ", "! ", "? ", "; ", ", ", " ", ""];

/// Splits text into overlapping chunks of bounded size
///
/// Text is cut at the coarsest separator it contains. Pieces that fit are merged
/// greedily into windows of at most `chunk_size` characters, each new window
/// starting with the tail of the previous one (at most `chunk_overlap`
/// characters). Pieces that do not fit are split again with the finer
/// separators. Lengths are counted in `char`s.
#[derive(Debug, Clone)]
pub struct RecursiveTextSplitter {
    /// Maximum chunk size in characters
    chunk_size: usize,
    /// Maximum overlap between consecutive chunks
    chunk_overlap: usize,
}

impl RecursiveTextSplitter {
    /// Create a new splitter; `chunk_overlap` is clamped below `chunk_size`
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self {
            chunk_size,
            chunk_overlap: chunk_overlap.min(chunk_size - 1),
        }
    }

    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    /// Split text into trimmed, non-empty chunks in document order
    pub fn split_text(&self, text: &str) -> Vec<String> {
        self.split_recursive(text, DEFAULT_SEPARATORS)
    }

    fn split_recursive(&self, text: &str, separators: &[&str]) -> Vec<String> {
        let position = separators
            .iter()
            .position(|sep| sep.is_empty() || text.contains(sep))
            .unwrap_or(separators.len().saturating_sub(1));
        let separator = separators.get(position).copied().unwrap_or("");
        let finer = separators.get(position + 1..).unwrap_or(&[]);

        let pieces = if separator.is_empty() {
            split_chars(text)
        } else {
            split_keeping_separator(text, separator)
        };

        let mut chunks = Vec::new();
        let mut fitting: Vec<&str> = Vec::new();

        for piece in pieces {
            if char_len(piece) <= self.chunk_size {
                fitting.push(piece);
                continue;
            }

            if !fitting.is_empty() {
                chunks.extend(self.merge_pieces(&fitting));
                fitting.clear();
            }

            if finer.is_empty() {
                push_trimmed(&mut chunks, piece);
            } else {
                chunks.extend(self.split_recursive(piece, finer));
            }
        }

        if !fitting.is_empty() {
            chunks.extend(self.merge_pieces(&fitting));
        }

        chunks
    }

    /// Greedily merge pieces into windows, carrying an overlap tail forward
    fn merge_pieces(&self, pieces: &[&str]) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut window: VecDeque<(&str, usize)> = VecDeque::new();
        let mut total = 0usize;

        for &piece in pieces {
            let len = char_len(piece);

            if total + len > self.chunk_size && !window.is_empty() {
                push_trimmed(&mut chunks, &concat(&window));

                // Keep at most `chunk_overlap` characters, and make room for the next piece
                while total > self.chunk_overlap || (total + len > self.chunk_size && total > 0) {
                    match window.pop_front() {
                        Some((_, front_len)) => total -= front_len,
                        None => break,
                    }
                }
            }

            window.push_back((piece, len));
            total += len;
        }

        if !window.is_empty() {
            push_trimmed(&mut chunks, &concat(&window));
        }

        chunks
    }
}

impl Default for RecursiveTextSplitter {
    fn default() -> Self {
        Self::new(1000, 100)
    }
}

/// Split text at a separator while keeping the separator attached to the preceding piece
fn split_keeping_separator<'a>(text: &'a str, separator: &str) -> Vec<&'a str> {
    let mut pieces = Vec::new();
    let mut start = 0;

    while let Some(pos) = text[start..].find(separator) {
        let end = start + pos + separator.len();
        pieces.push(&text[start..end]);
        start = end;
    }

    if start < text.len() {
        pieces.push(&text[start..]);
    }

    pieces
}

fn split_chars(text: &str) -> Vec<&str> {
    text.char_indices()
        .map(|(i, c)| &text[i..i + c.len_utf8()])
        .collect()
}

fn concat(window: &VecDeque<(&str, usize)>) -> String {
    window.iter().map(|(piece, _)| *piece).collect()
}

fn push_trimmed(chunks: &mut Vec<String>, text: &str) {
    let trimmed = text.trim();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_string());
    }
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sentences(count: usize) -> String {
        (0..count)
            .map(|i| format!("This is sentence number {:03} in the test. ", i))
            .collect()
    }

    /// Longest suffix of `prev` (at most `max` chars) that `next` starts with
    fn overlap_len(prev: &str, next: &str, max: usize) -> usize {
        let chars: Vec<char> = prev.chars().collect();
        (1..=max.min(chars.len()))
            .rev()
            .find(|&k| {
                let suffix: String = chars[chars.len() - k..].iter().collect();
                next.starts_with(&suffix)
            })
            .unwrap_or(0)
    }

    #[test]
    fn test_short_text_single_chunk() {
        let splitter = RecursiveTextSplitter::new(1000, 100);
        let chunks = splitter.split_text("  A short note.\n\nWith two paragraphs.  ");
        assert_eq!(chunks, vec!["A short note.\n\nWith two paragraphs."]);
    }

    #[test]
    fn test_empty_and_whitespace() {
        let splitter = RecursiveTextSplitter::default();
        assert!(splitter.split_text("").is_empty());
        assert!(splitter.split_text(" \n\n \t ").is_empty());
    }

    #[test]
    fn test_three_thousand_chars() {
        let text = sentences(73);
        assert!(text.chars().count() >= 2990);

        let splitter = RecursiveTextSplitter::new(1000, 100);
        let chunks = splitter.split_text(&text);

        assert!((3..=4).contains(&chunks.len()), "got {} chunks", chunks.len());
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 1000);
            assert!(text.contains(chunk.as_str()));
        }
        for pair in chunks.windows(2) {
            let overlap = overlap_len(&pair[0], &pair[1], 100);
            assert!(overlap > 0, "chunk does not start with the previous tail");
            assert!(overlap <= 100);
        }
        assert!(chunks[0].starts_with("This is sentence number 000"));
        assert!(chunks.last().unwrap().ends_with("sentence number 072 in the test."));
    }

    #[test]
    fn test_paragraphs_preferred_over_sentences() {
        let para = "Alpha beta gamma. ".repeat(3);
        let text = format!("{}\n\n{}\n\n{}", para, para, para);
        let splitter = RecursiveTextSplitter::new(60, 0);
        let chunks = splitter.split_text(&text);

        assert_eq!(chunks.len(), 3);
        assert!(chunks.iter().all(|c| c == para.trim()));
    }

    #[test]
    fn test_long_word_split_into_characters() {
        let splitter = RecursiveTextSplitter::new(10, 2);
        let text = "abcdefghijklmnopqrstuvwxyz";
        let chunks = splitter.split_text(text);

        assert!(chunks.len() >= 3);
        assert!(chunks.iter().all(|c| c.chars().count() <= 10));
        assert_eq!(chunks[0], "abcdefghij");
        assert!(chunks[1].starts_with("ij"));
    }

    #[test]
    fn test_multibyte_lengths_in_chars() {
        let splitter = RecursiveTextSplitter::new(5, 0);
        let chunks = splitter.split_text("äöüßé äöüßé");
        assert_eq!(chunks, vec!["äöüßé", "äöüßé"]);
    }

    #[test]
    fn test_overlap_clamped() {
        let splitter = RecursiveTextSplitter::new(10, 50);
        assert_eq!(splitter.chunk_overlap(), 9);
        assert!(splitter
            .split_text("one two three four five six seven")
            .iter()
            .all(|c| c.chars().count() <= 10));
    }

    proptest! {
        #[test]
        fn prop_chunks_bounded_and_contiguous(
            words in prop::collection::vec("[a-z]{1,12}", 1..200),
            seps in prop::collection::vec(prop::sample::select(vec![" ", ". ", "\n", "\n\n", ", "]), 200),
            chunk_size in 20usize..300,
            overlap_pct in 0usize..50,
        ) {
            let mut text = String::new();
            for (i, word) in words.iter().enumerate() {
                text.push_str(word);
                text.push_str(seps[i]);
            }
            let overlap = chunk_size * overlap_pct / 100;
            let chunks = RecursiveTextSplitter::new(chunk_size, overlap).split_text(&text);

            // (start, end) byte span of the previous chunk in `text`
            let mut prev: Option<(usize, usize)> = None;
            for chunk in &chunks {
                prop_assert!(chunk.chars().count() <= chunk_size);
                prop_assert!(!chunk.is_empty());

                let from = prev.map_or(0, |(start, _)| start + 1);
                let found = text[from..].find(chunk.as_str());
                prop_assert!(found.is_some(), "chunk {:?} not found after byte {}", chunk, from);
                let start = from + found.unwrap_or(0);

                // starts inside the previous chunk or after whitespace only
                let covered = prev.map_or(0, |(_, end)| end);
                if start > covered {
                    prop_assert!(text[covered..start].trim().is_empty());
                }
                prev = Some((start, start + chunk.len()));
            }
            let end = prev.map_or(0, |(_, end)| end);
            prop_assert!(text[end..].trim().is_empty());

            for word in &words {
                prop_assert!(chunks.iter().any(|c| c.contains(word.as_str())));
            }
        }
    }
}
