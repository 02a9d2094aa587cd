// src/admission/policy.rs
// =============================================================================
// The policy gate: static rules every candidate link must pass.
//
// Rules (all must pass):
// 1. Scheme is http or https
// 2. Host (without "www.") is one of the allowed hosts
// 3. The host's robots exclusions don't forbid the path
// 4. The path doesn't end in a binary/media/archive extension
//
// A link that doesn't even parse is simply rejected. Nothing in here can
// fail in a way that stops a worker.
//
// The gate is read-only after construction, so all workers can share one
// copy behind an Arc.
// =============================================================================

use std::collections::HashSet;
use std::fmt;
use url::Url;

use crate::config::{CrawlerConfig, PathRule};
use crate::identity::host_key;

// Why the policy gate rejected a link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyViolation {
    /// The link isn't a valid absolute URL
    Malformed,
    /// Not http/https (ftp:, mailto:, data:, ...)
    Scheme,
    /// Host outside the allowed set
    Host,
    /// Path excluded by the host's robots rules
    Robots,
    /// Path ends in a non-HTML extension
    Extension,
}

impl PolicyViolation {
    pub fn as_str(&self) -> &'static str {
        match self {
            PolicyViolation::Malformed => "malformed",
            PolicyViolation::Scheme => "scheme",
            PolicyViolation::Host => "host",
            PolicyViolation::Robots => "robots",
            PolicyViolation::Extension => "extension",
        }
    }
}

impl fmt::Display for PolicyViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct PolicyGate {
    allowed_hosts: HashSet<String>,
    include_subdomains: bool,
    robots: Vec<(String, Vec<PathRule>)>,
    blocked_extensions: HashSet<String>,
}

impl PolicyGate {
    // Builds the gate from config, normalizing hosts and extensions the same
    // way candidate URLs are normalized (lower-case, no "www.", no ".")
    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self {
            allowed_hosts: config
                .allowed_hosts
                .iter()
                .map(|h| normalize_host(h))
                .filter(|h| !h.is_empty())
                .collect(),
            include_subdomains: config.include_subdomains,
            robots: config
                .robots
                .iter()
                .map(|(host, rules)| (normalize_host(host), rules.clone()))
                .collect(),
            blocked_extensions: config
                .blocked_extensions
                .iter()
                .map(|e| e.trim_start_matches('.').to_ascii_lowercase())
                .collect(),
        }
    }

    // Returns true if the raw link passes every rule
    pub fn is_admissible(&self, raw: &str) -> bool {
        self.check_str(raw).is_ok()
    }

    // Parses and checks a raw link, handing back the parsed URL on success
    pub fn check_str(&self, raw: &str) -> Result<Url, PolicyViolation> {
        let url = Url::parse(raw).map_err(|_| PolicyViolation::Malformed)?;
        self.check(&url)?;
        Ok(url)
    }

    // Checks an already-parsed URL
    pub fn check(&self, url: &Url) -> Result<(), PolicyViolation> {
        // Rule 1: only web pages
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(PolicyViolation::Scheme);
        }

        // Rule 2: an http(s) URL always has a host, but be safe
        let host = host_key(url).ok_or(PolicyViolation::Malformed)?;
        if !self.host_allowed(&host) {
            return Err(PolicyViolation::Host);
        }

        // Rules 3 and 4 only look at the path (the query can't hide a .pdf)
        let path = url.path();
        if !self.robots_allow(&host, path) {
            return Err(PolicyViolation::Robots);
        }

        if self.has_blocked_extension(path) {
            return Err(PolicyViolation::Extension);
        }

        Ok(())
    }

    fn host_allowed(&self, host: &str) -> bool {
        if self.allowed_hosts.contains(host) {
            return true;
        }

        self.include_subdomains
            && self
                .allowed_hosts
                .iter()
                .any(|allowed| is_subdomain_of(host, allowed))
    }

    fn robots_allow(&self, host: &str, path: &str) -> bool {
        self.robots
            .iter()
            .filter(|(rule_host, _)| host == rule_host || is_subdomain_of(host, rule_host))
            .flat_map(|(_, rules)| rules.iter())
            .all(|rule| !forbids(rule, path))
    }

    // Looks at the extension of the last path segment only, so a
    // directory like "/v1.2/docs" is not mistaken for a file
    fn has_blocked_extension(&self, path: &str) -> bool {
        let last_segment = path.rsplit('/').next().unwrap_or("");

        match last_segment.rsplit_once('.') {
            Some((_, extension)) => self
                .blocked_extensions
                .contains(&extension.to_ascii_lowercase()),
            None => false,
        }
    }
}

// A path is forbidden if it is under the rule's prefix and not under any
// of its exceptions
fn forbids(rule: &PathRule, path: &str) -> bool {
    path.starts_with(&rule.forbidden)
        && !rule.exceptions.iter().any(|exception| path.starts_with(exception))
}

// "vision.ics.uci.edu" is a subdomain of "ics.uci.edu"; "physics.uci.edu" is not
fn is_subdomain_of(host: &str, parent: &str) -> bool {
    host.len() > parent.len()
        && host.ends_with(parent)
        && host.as_bytes()[host.len() - parent.len() - 1] == b'.'
}

fn normalize_host(host: &str) -> String {
    let host = host.trim().to_ascii_lowercase();
    match host.strip_prefix("www.") {
        Some(stripped) => stripped.to_string(),
        None => host,
    }
}
