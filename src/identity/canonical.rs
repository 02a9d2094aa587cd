// src/identity/canonical.rs
// =============================================================================
// Canonical identity: "is this the same page we've already seen?"
//
// How it works:
// 1. Drop the scheme (http and https serve the same page)
// 2. Drop the fragment (#section is only a position inside the page)
// 3. Normalize the host (lower-case, no leading "www.", non-default port kept)
// 4. Drop tracking query parameters (see query.rs)
// 5. Hash "host[:port] + path ? query" with SHA-256
//
// The query keeps its original order. Reordered parameters *might* be the
// same page, but only the pattern key (pattern.rs) treats them as equal.
// =============================================================================

use url::Url;

use super::{authority_key, digest, query::strip_tracking};

// Computes the canonical identity of a URL
//
// Parameters:
//   url: an already-parsed URL (the policy gate has rejected anything
//        that doesn't parse, so there is no error case here)
//
// Returns: 64-character hex SHA-256 digest
//
// Example:
//   canonicalize("http://www.cs.uci.edu/a#top")
//     == canonicalize("https://cs.uci.edu/a?utm_source=feed")
pub fn canonicalize(url: &Url) -> String {
    digest(&identity_string(url))
}

// The string that gets hashed, e.g. "cs.uci.edu/a?x=1"
fn identity_string(url: &Url) -> String {
    let host = authority_key(url).unwrap_or_default();
    let query = url.query().map(strip_tracking).unwrap_or_default();

    // No "?" at all when nothing is left of the query
    if query.is_empty() {
        format!("{}{}", host, url.path())
    } else {
        format!("{}{}?{}", host, url.path(), query)
    }
}
