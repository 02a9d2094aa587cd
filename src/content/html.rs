// src/content/html.rs
// =============================================================================
// This module pulls the two things the crawler needs out of raw HTML:
// - the href of every <a> tag (candidate links)
// - the text a reader would actually see (for the content gate)
//
// We use the `scraper` crate which:
// - Parses HTML into a DOM (Document Object Model)
// - Supports CSS selectors for finding elements
// - Is built on html5ever, so broken markup still parses
//
// Raw content arrives as bytes. Pages that aren't valid UTF-8 are decoded
// lossily (bad bytes become U+FFFD) rather than rejected.
// =============================================================================

use once_cell::sync::Lazy;
use scraper::node::{Element, Node};
use scraper::{Html, Selector};
use url::Url;

// "a[href]" means "all <a> tags that have an href attribute"
// The selector is a constant and known to be valid
static ANCHOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a[href]").expect("anchor selector is valid"));

// Elements whose contents never reach the reader
const INVISIBLE_TAGS: &[&str] = &["script", "style", "noscript", "template"];

// Returns every href value in document order, exactly as written
//
// Example:
//   "<a href='/docs'>Docs</a><a href='#top'>Top</a>"  ->  ["/docs", "#top"]
pub fn extract_anchor_hrefs(raw: &[u8]) -> Vec<String> {
    let html = String::from_utf8_lossy(raw);
    let document = Html::parse_document(&html);

    document
        .select(&ANCHOR)
        .filter_map(|element| element.value().attr("href"))
        .map(|href| href.trim().to_string())
        .collect()
}

// Returns the visible text of a page, one space between text nodes
//
// Skips script/style/noscript/template and anything marked hidden.
// We walk the tree with our own stack (instead of recursion) so that
// absurdly deep markup can't overflow the thread's stack.
pub fn visible_text(raw: &[u8]) -> String {
    let html = String::from_utf8_lossy(raw);
    let document = Html::parse_document(&html);

    let mut text = String::new();
    let mut stack = vec![*document.root_element()];

    while let Some(node) = stack.pop() {
        match node.value() {
            Node::Text(chunk) => {
                text.push_str(chunk);
                text.push(' ');
            }
            Node::Element(element) if is_hidden(element) => {}
            _ => {
                // Push in reverse so children pop off in document order
                let children: Vec<_> = node.children().collect();
                stack.extend(children.into_iter().rev());
            }
        }
    }

    text
}

fn is_hidden(element: &Element) -> bool {
    if INVISIBLE_TAGS.contains(&element.name()) || element.attr("hidden").is_some() {
        return true;
    }

    // Inline "display: none" is the other common way to hide a block
    element
        .attr("style")
        .map(|style| style.replace(' ', "").to_ascii_lowercase().contains("display:none"))
        .unwrap_or(false)
}

// Resolves an href against the page it was found on
//
// Parameters:
//   base: the page's final URL (after redirects)
//   href: the raw attribute value (relative or absolute)
//
// Returns: Some(absolute URL without fragment), or None for in-page anchors,
// non-web schemes and hrefs that can't be joined
//
// Examples:
//   base = "https://ics.uci.edu/about/"
//   href = "staff#list"     -> Some("https://ics.uci.edu/about/staff")
//   href = "#top"           -> None
//   href = "mailto:a@b.edu" -> None
pub fn resolve_link(base: &Url, href: &str) -> Option<Url> {
    if href.is_empty()
        || href.starts_with('#')
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("javascript:")
    {
        return None;
    }

    let mut url = base.join(href).ok()?;
    url.set_fragment(None);
    Some(url)
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why String::from_utf8_lossy?
//    - Servers send bytes, and not every page is valid UTF-8
//    - from_utf8_lossy never fails; it swaps bad bytes for a placeholder
//    - It returns a Cow<str>: borrowed if the bytes were already valid,
//      owned only if something had to be replaced
//
// 2. What does *document.root_element() do?
//    - root_element() returns an ElementRef (a handle to the <html> tag)
//    - ElementRef derefs to a NodeRef, which is Copy
//    - The * copies that NodeRef out so we can keep it on our stack
//
// 3. What is a match guard (the `if` inside a match arm)?
//    - Node::Element(element) if is_hidden(element) => {}
//    - The arm only matches when the pattern fits AND the condition is true
//    - Visible elements fall through to the `_` arm and get walked
// -----------------------------------------------------------------------------
