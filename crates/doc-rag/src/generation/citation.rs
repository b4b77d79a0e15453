//! Citation building and citation markers in answers

use once_cell::sync::Lazy;
use regex::Regex;

use crate::types::response::Citation;
use crate::types::ScoredChunk;

/// Characters of chunk text kept in a citation preview
pub const PREVIEW_CHARS: usize = 200;

static CITATION_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\[Source:\s*([^,\]]+?)\s*,\s*Page:?\s*(\d+)\s*\]").expect("Invalid regex")
});

/// One citation per distinct (source, page), in first-seen order
pub fn build_citations(results: &[ScoredChunk]) -> Vec<Citation> {
    let mut citations: Vec<Citation> = Vec::new();

    for result in results {
        let chunk = &result.chunk;
        if citations
            .iter()
            .any(|c| c.source == chunk.source && c.page == chunk.page)
        {
            continue;
        }
        citations.push(Citation {
            source: chunk.source.clone(),
            page: chunk.page,
            content_preview: preview(&chunk.content),
        });
    }

    citations
}

/// First [`PREVIEW_CHARS`] characters followed by "..."
pub fn preview(content: &str) -> String {
    let mut out: String = content.chars().take(PREVIEW_CHARS).collect();
    out.push_str("...");
    out
}

/// `(source, page)` pairs the answer cites with `[Source: x, Page: n]`
pub fn cited_pages(answer: &str) -> Vec<(String, u32)> {
    let mut cited = Vec::new();
    for cap in CITATION_MARKER.captures_iter(answer) {
        let source = cap.get(1).map(|m| m.as_str().trim()).unwrap_or("");
        let page = cap.get(2).and_then(|m| m.as_str().parse::<u32>().ok());
        if let Some(page) = page {
            let entry = (source.to_string(), page);
            if !cited.contains(&entry) {
                cited.push(entry);
            }
        }
    }
    cited
}
