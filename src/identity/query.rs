// src/identity/query.rs
// =============================================================================
// Tracking and session query parameters.
//
// Links often carry parameters that say *how* someone got to a page
// (utm_source, gclid, a session id) rather than *which* page it is.
// Two links that differ only in those parameters point at the same content,
// so both identities drop them before hashing.
// =============================================================================

use url::form_urlencoded;

// Analytics click/visitor ids, matched exactly (after lower-casing)
const ANALYTICS_KEYS: &[&str] = &[
    "gclid", "fbclid", "msclkid", "dclid", "yclid", "igshid", "_ga", "_gl", "mc_cid", "mc_eid",
];

// Returns true if a query key should be ignored for identity purposes
//
// Rules (all case-insensitive):
//   - starts with "utm_"
//   - is a known analytics id
//   - contains "session" anywhere (jsessionid, session_id, phpsessid...)
//   - is exactly "sid"
pub fn is_tracking_key(key: &str) -> bool {
    let key = key.to_ascii_lowercase();

    key.starts_with("utm_")
        || key.contains("session")
        || key == "sid"
        || ANALYTICS_KEYS.contains(&key.as_str())
}

// Returns the raw query string with tracking pairs removed
//
// Everything else stays exactly as it was written: same order, same
// percent-encoding, same values. Empty pairs ("a=1&&b=2") are dropped.
pub fn strip_tracking(raw_query: &str) -> String {
    raw_query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .filter(|pair| !is_tracking_key(&decoded_key(pair)))
        .collect::<Vec<_>>()
        .join("&")
}

// Decodes the key half of a single "key=value" pair
fn decoded_key(pair: &str) -> String {
    form_urlencoded::parse(pair.as_bytes())
        .next()
        .map(|(key, _)| key.into_owned())
        .unwrap_or_default()
}
