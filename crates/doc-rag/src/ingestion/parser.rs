//! PDF text extraction, one record per page

use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

use crate::error::{Error, Result};
use crate::types::document::source_label;
use crate::types::PageRecord;

static TRAILING_WHITESPACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)[ \t]+$").expect("Invalid regex"));
static EXCESS_LINE_BREAKS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n{3,}").expect("Invalid regex"));

/// Clean up PDF text: ligatures and typographic glyphs to ASCII, no null bytes,
/// no trailing whitespace, at most one blank line between paragraphs
pub fn cleanup_pdf_text(text: &str) -> String {
    let text = text
        .replace('\0', "")
        .replace("\r\n", "\n")
        .replace('\r', "\n")
        .replace('\u{00A0}', " ")  // Non-breaking space -> space
        .replace('\u{2010}', "-")  // Hyphen -> regular hyphen
        .replace('\u{2011}', "-")  // Non-breaking hyphen -> hyphen
        .replace('\u{2013}', "-")  // En dash -> hyphen
        .replace('\u{2014}', "--") // Em dash -> double hyphen
        .replace('\u{2018}', "'")
        .replace('\u{2019}', "'")
        .replace('\u{201C}', "\"")
        .replace('\u{201D}', "\"")
        .replace('\u{2022}', "* ")
        .replace('\u{2026}', "...")
        .replace('\u{FB00}', "ff")
        .replace('\u{FB01}', "fi")
        .replace('\u{FB02}', "fl")
        .replace('\u{FB03}', "ffi")
        .replace('\u{FB04}', "ffl");

    let text = TRAILING_WHITESPACE.replace_all(&text, "");
    EXCESS_LINE_BREAKS.replace_all(&text, "\n\n").into_owned()
}

/// Page-aware PDF text extractor
pub struct PdfExtractor;

impl PdfExtractor {
    /// Read and extract a PDF from disk
    pub fn extract(path: &Path) -> Result<Vec<PageRecord>> {
        let data = std::fs::read(path)?;
        Self::extract_bytes(&data, path)
    }

    /// Extract a PDF held in memory; `path` labels the resulting pages
    pub fn extract_bytes(data: &[u8], path: &Path) -> Result<Vec<PageRecord>> {
        let filename = source_label(path);

        let doc = lopdf::Document::load_mem(data)
            .map_err(|e| Error::extraction(&filename, format!("not a readable PDF: {}", e)))?;

        if doc.is_encrypted() {
            return Err(Error::extraction(&filename, "document is encrypted"));
        }

        let pages = doc.get_pages();
        if pages.is_empty() {
            return Err(Error::extraction(&filename, "document has no pages"));
        }

        let mut records = Vec::new();
        let mut failed_pages = 0usize;

        for &page_number in pages.keys() {
            match doc.extract_text(&[page_number]) {
                Ok(raw) => {
                    let text = cleanup_pdf_text(&raw);
                    if text.trim().is_empty() {
                        // Scanned page or blank page without a text layer
                        tracing::debug!("Skipping page {} of {}: no text", page_number, filename);
                        continue;
                    }
                    records.push(PageRecord {
                        text,
                        page: page_number,
                        source: path.to_path_buf(),
                    });
                }
                Err(e) => {
                    failed_pages += 1;
                    tracing::warn!(
                        "Text extraction failed on page {} of {}: {}",
                        page_number,
                        filename,
                        e
                    );
                }
            }
        }

        if failed_pages == pages.len() {
            return Err(Error::extraction(
                &filename,
                "text extraction failed on every page",
            ));
        }

        tracing::info!(
            "Extracted {} of {} pages with text from {}",
            records.len(),
            pages.len(),
            filename
        );

        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::build_pdf;
    use std::path::PathBuf;

    #[test]
    fn test_cleanup_pdf_text() {
        let cleaned =
            cleanup_pdf_text("e\u{FB03}cient\u{00A0}design  \n\n\n\n\u{201C}quoted\u{201D}\0");
        assert_eq!(cleaned, "efficient design\n\n\"quoted\"");
    }

    #[test]
    fn test_extract_skips_blank_pages() {
        let data = build_pdf(&["First page text", "", "Third page text"]);
        let pages = PdfExtractor::extract_bytes(&data, Path::new("/tmp/three.pdf")).unwrap();

        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].page, 1);
        assert!(pages[0].text.contains("First page text"));
        assert_eq!(pages[1].page, 3);
        assert!(pages[1].text.contains("Third page text"));
        assert_eq!(pages[1].source, PathBuf::from("/tmp/three.pdf"));
    }

    #[test]
    fn test_extract_rejects_garbage() {
        let result = PdfExtractor::extract_bytes(b"definitely not a pdf", Path::new("bad.pdf"));
        match result {
            Err(Error::Extraction { filename, .. }) => assert_eq!(filename, "bad.pdf"),
            other => panic!("expected extraction error, got {:?}", other),
        }
    }

    #[test]
    fn test_extract_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.pdf");
        std::fs::write(&path, build_pdf(&["Disk page"])).unwrap();

        let pages = PdfExtractor::extract(&path).unwrap();
        assert_eq!(pages.len(), 1);
        assert!(pages[0].text.contains("Disk page"));
    }
}
