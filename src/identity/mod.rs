// src/identity/mod.rs
// =============================================================================
// This module turns URLs into identity strings.
//
// Submodules:
// - canonical: exact identity, used to skip pages we've already queued
// - pattern: template identity, used to spot crawler traps
// - query: which query parameters are tracking noise
//
// Both identities are SHA-256 hex digests, so they have a fixed length no
// matter how long the URL was.
//
// Rust concepts:
// - Modules: Organize code into namespaces
// - pub use: Re-export items to simplify imports for users of this module
// =============================================================================

mod canonical;
mod pattern;
mod query;

pub use canonical::canonicalize;
pub use pattern::{generalize, pattern_key};

use sha2::{Digest, Sha256};
use url::Url;

// Returns the host we compare on: lower-cased, with a leading "www." removed
//
// Example:
//   "https://WWW.ics.uci.edu/about" -> Some("ics.uci.edu")
//   "mailto:someone@uci.edu"        -> None (no host)
pub fn host_key(url: &Url) -> Option<String> {
    let host = url.host_str()?.to_ascii_lowercase();
    match host.strip_prefix("www.") {
        Some(stripped) => Some(stripped.to_string()),
        None => Some(host),
    }
}

// Returns the host_key plus the port, when the URL names a non-default one
//
// Both identities and the per-subdomain limit use this, because a
// different port is a different server.
//
// Example:
//   "http://ics.uci.edu:8080/app" -> Some("ics.uci.edu:8080")
//   "https://ics.uci.edu:443/app" -> Some("ics.uci.edu")  (443 is https's default)
pub fn authority_key(url: &Url) -> Option<String> {
    let host = host_key(url)?;
    // url.port() is None for a missing port AND for the scheme's default port
    match url.port() {
        Some(port) => Some(format!("{}:{}", host, port)),
        None => Some(host),
    }
}

// SHA-256 of a UTF-8 string, as 64 lowercase hex characters
fn digest(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_key_strips_www() {
        let url = Url::parse("https://www.ics.uci.edu/about").unwrap();
        assert_eq!(host_key(&url), Some("ics.uci.edu".to_string()));
    }

    #[test]
    fn test_host_key_keeps_other_subdomains() {
        let url = Url::parse("https://vision.ics.uci.edu/").unwrap();
        assert_eq!(host_key(&url), Some("vision.ics.uci.edu".to_string()));
    }

    #[test]
    fn test_host_key_none_without_host() {
        let url = Url::parse("mailto:someone@uci.edu").unwrap();
        assert_eq!(host_key(&url), None);
    }

    #[test]
    fn test_authority_key_keeps_explicit_port() {
        let url = Url::parse("http://www.ics.uci.edu:8080/app").unwrap();
        assert_eq!(authority_key(&url), Some("ics.uci.edu:8080".to_string()));
    }

    #[test]
    fn test_authority_key_drops_default_ports() {
        let http = Url::parse("http://ics.uci.edu:80/app").unwrap();
        let https = Url::parse("https://ics.uci.edu:443/app").unwrap();
        assert_eq!(authority_key(&http), Some("ics.uci.edu".to_string()));
        assert_eq!(authority_key(&https), Some("ics.uci.edu".to_string()));
    }

    #[test]
    fn test_digest_is_fixed_length_hex() {
        let short = digest("a");
        let long = digest(&"a".repeat(10_000));
        assert_eq!(short.len(), 64);
        assert_eq!(long.len(), 64);
        assert!(short.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
