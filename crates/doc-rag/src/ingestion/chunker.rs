//! Recursive character chunking with page tracking
//!
//! Text is split on the first separator present (paragraph, line, word), the
//! separator staying at the start of the following piece. Pieces shorter than
//! the chunk size are merged into windows that carry up to `overlap`
//! characters of the previous window; longer pieces are split again with the
//! remaining separators. The empty separator cuts between grapheme clusters.
//!
//! Windows are byte spans of the input, so dropping each window's overlap and
//! concatenating the rest gives back the original text.

use std::collections::VecDeque;
use std::ops::Range;
use unicode_segmentation::UnicodeSegmentation;

use crate::config::ChunkingConfig;
use crate::error::{Error, Result};
use crate::types::{Chunk, PageRecord};

/// Text chunker with configurable size, overlap and separators
#[derive(Debug, Clone)]
pub struct TextChunker {
    /// Maximum chunk size in characters
    chunk_size: usize,
    /// Overlap between consecutive chunks in characters
    overlap: usize,
    /// Break points in priority order
    separators: Vec<String>,
}

impl TextChunker {
    /// Create a chunker with the default paragraph/line/word/character separators
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self> {
        Self::with_separators(chunk_size, overlap, ChunkingConfig::default().separators)
    }

    /// Create a chunker with custom separators
    pub fn with_separators(
        chunk_size: usize,
        overlap: usize,
        separators: Vec<String>,
    ) -> Result<Self> {
        if chunk_size == 0 {
            return Err(Error::Config("chunk size must be greater than 0".into()));
        }
        if overlap >= chunk_size {
            return Err(Error::Config(format!(
                "chunk overlap ({}) must be smaller than chunk size ({})",
                overlap, chunk_size
            )));
        }
        if separators.is_empty() {
            return Err(Error::Config("at least one separator is required".into()));
        }

        Ok(Self {
            chunk_size,
            overlap,
            separators,
        })
    }

    /// Create from configuration
    pub fn from_config(config: &ChunkingConfig) -> Result<Self> {
        Self::with_separators(
            config.chunk_size,
            config.chunk_overlap,
            config.separators.clone(),
        )
    }

    /// Chunk pages in order; `chunk_index` restarts at 0 on every page
    pub fn chunk_pages(&self, pages: &[PageRecord]) -> Vec<Chunk> {
        let mut chunks = Vec::new();

        for page in pages {
            let mut chunk_index = 0u32;
            for span in self.split_spans(&page.text) {
                let content = page.text[span].trim();
                if content.is_empty() {
                    continue;
                }
                chunks.push(Chunk::new(
                    content.to_string(),
                    &page.source,
                    page.page,
                    chunk_index,
                ));
                chunk_index += 1;
            }
        }

        chunks
    }

    /// Split text into window strings
    pub fn split_text(&self, text: &str) -> Vec<String> {
        self.split_spans(text)
            .into_iter()
            .map(|span| text[span].to_string())
            .collect()
    }

    /// Split text into window byte spans, in order
    pub fn split_spans(&self, text: &str) -> Vec<Range<usize>> {
        let mut spans = Vec::new();
        if !text.is_empty() {
            self.split_recursive(text, 0..text.len(), &self.separators, &mut spans);
        }
        spans
    }

    fn split_recursive(
        &self,
        text: &str,
        range: Range<usize>,
        separators: &[String],
        out: &mut Vec<Range<usize>>,
    ) {
        let Some(last) = separators.last() else {
            out.push(range);
            return;
        };

        let segment = &text[range.clone()];

        // First separator present in the segment; the empty one always applies
        let (separator, remaining): (&str, &[String]) = separators
            .iter()
            .enumerate()
            .find(|(_, s)| s.is_empty() || segment.contains(s.as_str()))
            .map(|(i, s)| {
                if s.is_empty() {
                    (s.as_str(), &[][..])
                } else {
                    (s.as_str(), &separators[i + 1..])
                }
            })
            .unwrap_or((last.as_str(), &[][..]));

        let pieces = split_keep_separator(segment, range.start, separator);

        let mut short_pieces: Vec<Range<usize>> = Vec::new();
        for piece in pieces {
            if char_len(text, &piece) < self.chunk_size {
                short_pieces.push(piece);
                continue;
            }

            if !short_pieces.is_empty() {
                self.merge(text, &short_pieces, out);
                short_pieces.clear();
            }

            if remaining.is_empty() {
                out.push(piece);
            } else {
                self.split_recursive(text, piece, remaining, out);
            }
        }

        if !short_pieces.is_empty() {
            self.merge(text, &short_pieces, out);
        }
    }

    /// Merge consecutive short pieces into windows of at most `chunk_size` characters
    fn merge(&self, text: &str, pieces: &[Range<usize>], out: &mut Vec<Range<usize>>) {
        let mut window: VecDeque<(Range<usize>, usize)> = VecDeque::new();
        let mut total = 0usize;

        for piece in pieces {
            let len = char_len(text, piece);

            if total + len > self.chunk_size && !window.is_empty() {
                out.push(window_span(&window));

                // Keep at most `overlap` characters as the start of the next window
                while total > self.overlap || (total + len > self.chunk_size && total > 0) {
                    match window.pop_front() {
                        Some((_, dropped)) => total -= dropped,
                        None => break,
                    }
                }
            }

            window.push_back((piece.clone(), len));
            total += len;
        }

        if !window.is_empty() {
            out.push(window_span(&window));
        }
    }
}

impl Default for TextChunker {
    fn default() -> Self {
        let config = ChunkingConfig::default();
        Self {
            chunk_size: config.chunk_size,
            overlap: config.chunk_overlap,
            separators: config.separators,
        }
    }
}

/// Split `segment` (starting at byte `base` of the full text) before every
/// occurrence of `separator`; the empty separator yields grapheme clusters
fn split_keep_separator(segment: &str, base: usize, separator: &str) -> Vec<Range<usize>> {
    if separator.is_empty() {
        return segment
            .grapheme_indices(true)
            .map(|(i, g)| base + i..base + i + g.len())
            .collect();
    }

    let mut pieces = Vec::new();
    let mut start = 0usize;
    for (idx, _) in segment.match_indices(separator) {
        if idx > start {
            pieces.push(base + start..base + idx);
            start = idx;
        }
    }
    if start < segment.len() {
        pieces.push(base + start..base + segment.len());
    }
    pieces
}

fn char_len(text: &str, span: &Range<usize>) -> usize {
    text[span.clone()].chars().count()
}

fn window_span(window: &VecDeque<(Range<usize>, usize)>) -> Range<usize> {
    let start = window.front().map(|(r, _)| r.start).unwrap_or(0);
    let end = window.back().map(|(r, _)| r.end).unwrap_or(start);
    start..end
}
