// src/content/sufficiency.rs
// =============================================================================
// Decides whether a fetched page is worth expanding.
//
// Low-value pages waste crawl budget twice: once to fetch them, and again
// for every link we'd follow from them. We skip link extraction when:
// - there is no content at all
// - the content is tiny (error/placeholder pages are typically ~512 bytes)
// - there are too few visible words
// - the visible words are a tiny fraction of the bytes (mostly markup)
// =============================================================================

use super::{tokenize, visible_text};
use crate::crawl::FetchedPage;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContentThresholds {
    /// Content at or below this many bytes is insufficient
    pub min_bytes: usize,
    /// Minimum number of visible words
    pub min_words: usize,
    /// Minimum visible words per content byte
    pub min_ratio: f64,
}

impl Default for ContentThresholds {
    fn default() -> Self {
        Self {
            min_bytes: 512,
            min_words: 100,
            min_ratio: 0.02,
        }
    }
}

// Returns true if the page carries enough visible text to expand
pub fn has_sufficient_content(page: &FetchedPage, thresholds: &ContentThresholds) -> bool {
    let content = match page.content.as_deref() {
        Some(content) if !content.is_empty() => content,
        _ => return false,
    };

    if content.len() <= thresholds.min_bytes {
        return false;
    }

    let word_count = tokenize(&visible_text(content)).len();
    let ratio = word_count as f64 / content.len() as f64;

    word_count >= thresholds.min_words && ratio >= thresholds.min_ratio
}
