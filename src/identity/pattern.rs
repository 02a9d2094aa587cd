// src/identity/pattern.rs
// =============================================================================
// Pattern key: "is this one more page from the same template?"
//
// Crawler traps (calendars, paginated listings, session-tagged links) produce
// an endless stream of *distinct* URLs, so exact dedup never stops them.
// Instead we replace every path segment and query value with its shape:
//
//   /event/2024-01-15/42      -> /=event/DATE/INT
//   /post/3f2a9c1d77e0        -> /=post/HEX
//   /news/new-lab-opens       -> /=news/SLUG
//   ?page=7&utm_source=feed   -> ?page=INT
//
// and hash the result. Everything built from one template shares a key, and
// the rate limiter caps how many links per key we admit.
//
// Literal text is written with a leading "=" so a segment that happens to
// read "INT" can never look like a number. Query keys and literal values
// are percent-encoded again, so a value containing "&" or "=" can't pose
// as an extra pair.
// =============================================================================

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use url::form_urlencoded::byte_serialize;
use url::Url;

use super::{authority_key, digest, query::is_tracking_key};

static UUID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}$")
        .expect("UUID pattern is valid")
});
static DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{4}(-\d{2}-\d{2}|/\d{2}/\d{2})$").expect("DATE pattern is valid")
});
static INT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+$").expect("INT pattern is valid"));
static HEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^[0-9a-f]{8,}$").expect("HEX pattern is valid"));
static SLUG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9]+(-[A-Za-z0-9]+)+$").expect("SLUG pattern is valid")
});

// The structural category of one path segment or query value
//
// The order of the variants is the order they are tried in.
// "12345678" is all digits *and* 8 hex characters; it is INT because INT
// comes first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentClass<'a> {
    /// 8-4-4-4-12 hex groups
    Uuid,
    /// YYYY-MM-DD or YYYY/MM/DD
    Date,
    /// Only digits
    Int,
    /// 8 or more hex characters
    Hex,
    /// Two or more alphanumeric words joined by hyphens
    Slug,
    /// Anything else, kept as written
    Literal(&'a str),
}

impl<'a> SegmentClass<'a> {
    // Classifies a segment; the first matching category wins
    pub fn classify(segment: &'a str) -> Self {
        if UUID.is_match(segment) {
            SegmentClass::Uuid
        } else if DATE.is_match(segment) {
            SegmentClass::Date
        } else if INT.is_match(segment) {
            SegmentClass::Int
        } else if HEX.is_match(segment) {
            SegmentClass::Hex
        } else if SLUG.is_match(segment) {
            SegmentClass::Slug
        } else {
            SegmentClass::Literal(segment)
        }
    }

    // The text that replaces the segment in the generalized URL
    pub fn label(&self) -> &'a str {
        match self {
            SegmentClass::Uuid => "UUID",
            SegmentClass::Date => "DATE",
            SegmentClass::Int => "INT",
            SegmentClass::Hex => "HEX",
            SegmentClass::Slug => "SLUG",
            SegmentClass::Literal(text) => *text,
        }
    }

    // How the class is written into a generalized URL: categories as their
    // label, literals behind a "=" marker
    fn template_part(&self) -> String {
        match self {
            SegmentClass::Literal(text) => format!("={}", text),
            category => category.label().to_string(),
        }
    }
}

impl fmt::Display for SegmentClass<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// Computes the pattern key (SHA-256 hex) of a URL
pub fn pattern_key(url: &Url) -> String {
    digest(&generalize(url))
}

// Returns the generalized template string that pattern_key hashes
//
// Example:
//   "https://www.ics.uci.edu/events/2024/01/15?b=x&page=3&sid=9"
//     -> "ics.uci.edu/=events/DATE?b==x&page=INT"
pub fn generalize(url: &Url) -> String {
    let host = authority_key(url).unwrap_or_default();
    format!(
        "{}{}?{}",
        host,
        generalize_path(url.path()),
        generalize_query(url)
    )
}

// Replaces each "/"-separated segment with its category
//
// A date written with slashes spans three segments, so we look for
// "dddd/dd/dd" windows before classifying segments one at a time.
fn generalize_path(path: &str) -> String {
    // "/events/2024/01/15" splits into ["", "events", "2024", "01", "15"]
    let segments: Vec<&str> = path.split('/').collect();
    let mut generalized = Vec::with_capacity(segments.len());

    let mut i = 0;
    while i < segments.len() {
        // Three segments shaped like YYYY/MM/DD become a single DATE
        if i + 3 <= segments.len() && is_split_date(&segments[i..i + 3]) {
            generalized.push(SegmentClass::Date.template_part());
            i += 3;
            continue;
        }

        // Empty segments (the leading one, a trailing slash) stay empty
        // so the slashes survive
        let segment = segments[i];
        if segment.is_empty() {
            generalized.push(String::new());
        } else {
            generalized.push(SegmentClass::classify(segment).template_part());
        }
        i += 1;
    }

    generalized.join("/")
}

fn is_split_date(window: &[&str]) -> bool {
    let joined = window.join("/");
    matches!(SegmentClass::classify(&joined), SegmentClass::Date)
}

// Drops tracking keys, classifies values and sorts by key so that
// "?a=1&b=2" and "?b=2&a=1" generalize the same way
fn generalize_query(url: &Url) -> String {
    // query_pairs() hands back decoded keys and values
    let mut pairs: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| !is_tracking_key(key))
        .map(|(key, value)| {
            let class = SegmentClass::classify(&value);
            // Re-encode literals so "&" and "=" inside them stay escaped
            let part = match class {
                SegmentClass::Literal(text) => format!("={}", encode(text)),
                category => category.template_part(),
            };
            (encode(&key), part)
        })
        .collect();

    // Sorting by key (then part) makes parameter order irrelevant
    pairs.sort();

    pairs
        .iter()
        .map(|(key, part)| format!("{}={}", key, part))
        .collect::<Vec<_>>()
        .join("&")
}

// Form-encodes text the way a query string would carry it
fn encode(text: &str) -> String {
    byte_serialize(text.as_bytes()).collect()
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. What is Lazy<Regex>?
//    - Compiling a regex is slow compared to running it
//    - once_cell::sync::Lazy compiles it the first time it's used, then
//      every later call reuses the same compiled regex
//    - It's thread-safe, so every worker shares the compiled patterns
//
// 2. Why does SegmentClass have a lifetime ('a)?
//    - The Literal variant borrows the original segment text instead of
//      copying it into a new String
//    - The compiler makes sure the enum never outlives that text
//
// 3. Why sort the query pairs?
//    - Links on the web list the same parameters in any order
//    - Sorting gives one stable string per template
// -----------------------------------------------------------------------------
