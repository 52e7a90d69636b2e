use serde::{Deserialize, Serialize};

use super::types::{Document, PageChunks};

/// Chunk sizing in characters.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct SplitterConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub sentence_aware: bool,
}

impl Default for SplitterConfig {
    fn default() -> Self {
        Self {
            chunk_size: 800,
            chunk_overlap: 80,
            sentence_aware: true,
        }
    }
}

pub struct TextSplitter {
    config: SplitterConfig,
}

impl TextSplitter {
    #[must_use]
    pub fn new(config: SplitterConfig) -> Self {
        Self { config }
    }

    /// Split one page into overlapping chunks of at most `chunk_size` characters.
    #[must_use]
    pub fn split(&self, document: &Document) -> PageChunks {
        PageChunks {
            metadata: document.metadata.clone(),
            chunks: self.split_text(&document.content),
        }
    }

    #[must_use]
    pub fn split_all(&self, documents: &[Document]) -> Vec<PageChunks> {
        documents.iter().map(|d| self.split(d)).collect()
    }

    fn split_text(&self, text: &str) -> Vec<String> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        let chunk_size = self.config.chunk_size.max(1);
        let overlap = self.config.chunk_overlap;

        if !self.config.sentence_aware {
            return split_chars(text, chunk_size, overlap);
        }

        let pieces: Vec<String> = split_sentences(text)
            .into_iter()
            .flat_map(|s| {
                if char_len(&s) > chunk_size {
                    split_chars(&s, chunk_size, overlap)
                } else {
                    vec![s]
                }
            })
            .collect();

        merge_sentences(&pieces, chunk_size, overlap)
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();

    let chars: Vec<char> = text.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        current.push(chars[i]);

        // Split on paragraph breaks
        if chars[i] == '\n' && i + 1 < chars.len() && chars[i + 1] == '\n' {
            current.push(chars[i + 1]);
            i += 1;
            if !current.trim().is_empty() {
                sentences.push(std::mem::take(&mut current));
            }
        }
        // Split on sentence endings followed by space
        else if (chars[i] == '.' || chars[i] == '?' || chars[i] == '!')
            && i + 1 < chars.len()
            && chars[i + 1] == ' '
            && !current.trim().is_empty()
        {
            sentences.push(std::mem::take(&mut current));
        }

        i += 1;
    }

    if !current.trim().is_empty() {
        sentences.push(current);
    }

    sentences
}

/// Merge pieces (each at most `chunk_size` chars) into chunks of at most
/// `chunk_size` chars, carrying up to `chunk_overlap` chars of trailing pieces
/// into the next chunk.
fn merge_sentences(pieces: &[String], chunk_size: usize, chunk_overlap: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;
    // Sliding window: track only the piece indices contributing to the current chunk.
    let mut window_start = 0;

    for (idx, piece) in pieces.iter().enumerate() {
        let piece_len = char_len(piece);
        if !current.is_empty() && current_len + piece_len > chunk_size {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;

            // Overlap never pushes the next chunk past chunk_size.
            let budget = chunk_overlap.min(chunk_size.saturating_sub(piece_len));
            let mut overlap_len = 0;
            let mut overlap_start = idx;
            for i in (window_start..idx).rev() {
                let len = char_len(&pieces[i]);
                if overlap_len + len > budget {
                    break;
                }
                overlap_len += len;
                overlap_start = i;
            }
            for s in &pieces[overlap_start..idx] {
                current.push_str(s);
            }
            current_len = overlap_len;
            window_start = overlap_start;
        }

        current.push_str(piece);
        current_len += piece_len;
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}

fn split_chars(text: &str, chunk_size: usize, overlap: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let chars: Vec<char> = text.chars().collect();
    let step = chunk_size.saturating_sub(overlap).max(1);
    let mut start = 0;

    while start < chars.len() {
        let end = (start + chunk_size).min(chars.len());
        chunks.push(chars[start..end].iter().collect());
        if end == chars.len() {
            break;
        }
        start += step;
    }

    chunks
}
