// src/content/mod.rs
// =============================================================================
// This module looks inside fetched pages.
//
// Submodules:
// - html: anchor hrefs, visible text and link resolution
// - tokenize: text -> lower-case words
// - sufficiency: is this page worth following links from?
// =============================================================================

mod html;
mod sufficiency;
mod tokenize;

pub use html::{extract_anchor_hrefs, resolve_link, visible_text};
pub use sufficiency::{has_sufficient_content, ContentThresholds};
pub use tokenize::tokenize;
