//! Page-aware PDF text extraction

use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::types::Page;

/// Typographic characters PDF fonts commonly emit, with ASCII replacements
const GLYPH_REPLACEMENTS: &[(char, &str)] = &[
    ('\u{2010}', "-"),   // Hyphen
    ('\u{2011}', "-"),   // Non-breaking hyphen
    ('\u{2013}', "-"),   // En dash
    ('\u{2014}', "--"),  // Em dash
    ('\u{2018}', "'"),   // Left single quote
    ('\u{2019}', "'"),   // Right single quote (apostrophe)
    ('\u{201C}', "\""),  // Left double quote
    ('\u{201D}', "\""),  // Right double quote
    ('\u{2022}', "* "),  // Bullet
    ('\u{2026}', "..."), // Ellipsis
    ('\u{00A0}', " "),   // Non-breaking space
    ('\u{FB00}', "ff"),  // ff ligature
    ('\u{FB01}', "fi"),  // fi ligature
    ('\u{FB02}', "fl"),  // fl ligature
    ('\u{FB03}', "ffi"), // ffi ligature
    ('\u{FB04}', "ffl"), // ffl ligature
];

/// Replace typographic glyphs with plain ASCII equivalents
fn normalize_glyphs(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    for c in text.chars() {
        match GLYPH_REPLACEMENTS.iter().find(|(glyph, _)| *glyph == c) {
            Some((_, replacement)) => result.push_str(replacement),
            None => result.push(c),
        }
    }
    result
}

/// Clean raw page text: drop NULs, collapse whitespace within lines, drop empty lines
pub fn clean_page_text(raw: &str) -> String {
    normalize_glyphs(&raw.replace('\0', ""))
        .lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// PDF parser producing one cleaned [`Page`] per PDF page
#[derive(Debug, Clone)]
pub struct PdfParser {
    /// Wait limit for the primary extractor
    timeout: Duration,
}

impl Default for PdfParser {
    fn default() -> Self {
        Self::new(Duration::from_secs(60))
    }
}

impl PdfParser {
    /// Create a parser with the given extraction wait limit
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Extract every page of a PDF.
    ///
    /// Pages without text are returned with empty text; the caller decides
    /// whether a document without any text is usable.
    pub fn parse(&self, filename: &str, data: &[u8]) -> Result<Vec<Page>> {
        let raw_pages = match self.extract_pages_with_timeout(data) {
            Ok(pages) if pages.iter().any(|p| !p.trim().is_empty()) => pages,
            Ok(pages) => {
                tracing::debug!(
                    "pdf-extract found no text in '{}' ({} pages), trying lopdf",
                    filename,
                    pages.len()
                );
                // An image-only PDF still has a known page count
                Self::extract_pages_fallback(data).unwrap_or(pages)
            }
            Err(message) => {
                tracing::warn!("pdf-extract failed on '{}': {}, trying fallback", filename, message);
                Self::extract_pages_fallback(data)
                    .map_err(|fallback| Error::file_parse(filename, format!("{}; {}", message, fallback)))?
            }
        };

        if raw_pages.is_empty() {
            return Err(Error::file_parse(filename, "PDF contains no pages"));
        }

        Ok(raw_pages
            .iter()
            .enumerate()
            .map(|(i, raw)| Page::new(i as u32 + 1, clean_page_text(raw)))
            .collect())
    }

    /// Primary extraction on a separate thread so a pathological font cannot hang the caller
    fn extract_pages_with_timeout(&self, data: &[u8]) -> std::result::Result<Vec<String>, String> {
        let data_vec = data.to_vec();
        let (tx, rx) = mpsc::channel();

        let handle = thread::spawn(move || {
            let result = pdf_extract::extract_text_from_mem_by_pages(&data_vec);
            let _ = tx.send(result.map_err(|e| e.to_string()));
        });

        match rx.recv_timeout(self.timeout) {
            Ok(result) => {
                let _ = handle.join();
                result
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {
                // The thread cannot be killed; it is left to finish on its own
                tracing::error!("PDF extraction timeout after {:?}", self.timeout);
                Err(format!("extraction timed out after {}s", self.timeout.as_secs()))
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                tracing::error!("PDF extraction thread crashed");
                Err("extraction thread crashed".to_string())
            }
        }
    }

    /// Fallback extraction using lopdf's per-page text extraction
    fn extract_pages_fallback(data: &[u8]) -> std::result::Result<Vec<String>, String> {
        let doc = lopdf::Document::load_mem(data).map_err(|e| format!("failed to load PDF: {}", e))?;

        let pages = doc.get_pages();
        if pages.is_empty() {
            return Err("PDF contains no pages".to_string());
        }

        Ok(pages
            .keys()
            .map(|&page_number| match doc.extract_text(&[page_number]) {
                Ok(text) => text,
                Err(e) => {
                    tracing::debug!("Could not extract text from page {}: {}", page_number, e);
                    String::new()
                }
            })
            .collect())
    }
}
