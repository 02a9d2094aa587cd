// src/config.rs
// =============================================================================
// This file holds every tunable knob of the crawler.
//
// Where values come from (later sources win):
// 1. Built-in defaults (the Default impl below)
// 2. An optional JSON config file (--config crawler.json)
// 3. Command-line flags (--workers, --politeness-ms, ...)
//
// A config file only needs the fields it wants to change:
//
//   {
//     "allowed_hosts": ["example.org"],
//     "min_ratio": 0.001,
//     "robots": { "example.org": [ { "forbidden": "/private" } ] }
//   }
//
// Rust concepts:
// - #[serde(default)]: missing fields fall back to Default::default()
// - BTreeMap: a sorted map, so printed configs are always in the same order
// =============================================================================

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use crate::admission::HitLimits;
use crate::content::ContentThresholds;

// One robots exclusion: a forbidden path prefix and the narrow prefixes
// under it that are still allowed
//
// Example: { "forbidden": "/wp-admin/", "exceptions": ["/wp-admin/admin-ajax.php"] }
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathRule {
    /// Paths starting with this are rejected...
    pub forbidden: String,
    /// ...unless they also start with one of these
    #[serde(default)]
    pub exceptions: Vec<String>,
}

impl PathRule {
    fn new(forbidden: &str, exceptions: &[&str]) -> Self {
        Self {
            forbidden: forbidden.to_string(),
            exceptions: exceptions.iter().map(|e| e.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Hosts we are allowed to crawl (compared without "www.")
    pub allowed_hosts: Vec<String>,
    /// Also allow any subdomain of an allowed host
    pub include_subdomains: bool,
    /// Per-host robots exclusions; a host's rules also cover its subdomains
    pub robots: BTreeMap<String, Vec<PathRule>>,
    /// File extensions that are never HTML
    pub blocked_extensions: Vec<String>,
    /// Pause after every fetch cycle, per worker
    pub politeness_ms: u64,
    /// Number of concurrent workers
    pub workers: usize,
    /// Pages this size or smaller are treated as error/placeholder pages
    pub min_content_bytes: usize,
    /// Minimum visible words for a page to be expanded
    pub min_words: usize,
    /// Minimum visible words per content byte
    pub min_ratio: f64,
    /// Links admitted per URL template before the template is capped
    pub max_pattern_hits: u32,
    /// Links admitted per subdomain before the subdomain is capped
    pub max_subdomain_hits: u32,
    /// Sent with every request
    pub user_agent: String,
    /// Per-request timeout
    pub fetch_timeout_secs: u64,
    /// Bodies are cut off after this many bytes
    pub max_body_bytes: usize,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        let people_and_events = vec![PathRule::new("/people", &[]), PathRule::new("/happening", &[])];

        let mut robots = BTreeMap::new();
        robots.insert(
            "informatics.uci.edu".to_string(),
            vec![
                PathRule::new(
                    "/research",
                    &[
                        "/research/labs-centers/",
                        "/research/areas-of-expertise/",
                        "/research/example-research-projects/",
                        "/research/phd-research/",
                        "/research/past-dissertations/",
                        "/research/masters-research/",
                        "/research/undergraduate-research/",
                        "/research/gifts-grants/",
                    ],
                ),
                PathRule::new("/wp-admin/", &["/wp-admin/admin-ajax.php"]),
            ],
        );
        robots.insert("ics.uci.edu".to_string(), people_and_events.clone());
        robots.insert("cs.uci.edu".to_string(), people_and_events.clone());
        robots.insert("stat.uci.edu".to_string(), people_and_events);

        Self {
            allowed_hosts: ["ics.uci.edu", "cs.uci.edu", "informatics.uci.edu", "stat.uci.edu"]
                .iter()
                .map(|h| h.to_string())
                .collect(),
            include_subdomains: false,
            robots,
            blocked_extensions: DEFAULT_BLOCKED_EXTENSIONS
                .iter()
                .map(|e| e.to_string())
                .collect(),
            politeness_ms: 500,
            workers: 4,
            min_content_bytes: 512,
            min_words: 100,
            min_ratio: 0.02,
            max_pattern_hits: 250,
            max_subdomain_hits: 2000,
            user_agent: format!("trap-guard/{}", env!("CARGO_PKG_VERSION")),
            fetch_timeout_secs: 10,
            max_body_bytes: 5 * 1024 * 1024,
        }
    }
}

const DEFAULT_BLOCKED_EXTENSIONS: &[&str] = &[
    "css", "js", "bmp", "gif", "jpg", "jpeg", "ico", "png", "tif", "tiff", "mid", "mp2", "mp3",
    "mp4", "wav", "avi", "mov", "mpeg", "ram", "m4v", "mkv", "ogg", "ogv", "pdf", "ps", "eps",
    "tex", "ppt", "pptx", "doc", "docx", "xls", "xlsx", "names", "data", "dat", "exe", "bz2",
    "tar", "msi", "bin", "7z", "psd", "dmg", "iso", "epub", "dll", "cnf", "tgz", "sha1", "thmx",
    "mso", "arff", "rtf", "jar", "csv", "rm", "smil", "wmv", "swf", "wma", "zip", "rar", "gz",
];

impl CrawlerConfig {
    // Loads the config file if one was given, otherwise the defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        Self::from_json(&text).with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        Ok(config)
    }

    // Catches settings that would make the crawl meaningless
    // Must be called before any worker starts
    pub fn validate(&self) -> Result<()> {
        if self.allowed_hosts.iter().all(|h| h.trim().is_empty()) {
            return Err(anyhow!("allowed_hosts must name at least one host"));
        }
        if self.workers == 0 {
            return Err(anyhow!("workers must be at least 1"));
        }
        if !self.min_ratio.is_finite() || self.min_ratio < 0.0 {
            return Err(anyhow!("min_ratio must be a non-negative number, got {}", self.min_ratio));
        }
        if self.max_pattern_hits == 0 || self.max_subdomain_hits == 0 {
            return Err(anyhow!("max_pattern_hits and max_subdomain_hits must be at least 1"));
        }
        // A cap at or below min_content_bytes would make every page "too small"
        if self.max_body_bytes <= self.min_content_bytes {
            return Err(anyhow!(
                "max_body_bytes ({}) must be larger than min_content_bytes ({})",
                self.max_body_bytes,
                self.min_content_bytes
            ));
        }
        Ok(())
    }

    pub fn politeness(&self) -> Duration {
        Duration::from_millis(self.politeness_ms)
    }

    pub fn content_thresholds(&self) -> ContentThresholds {
        ContentThresholds {
            min_bytes: self.min_content_bytes,
            min_words: self.min_words,
            min_ratio: self.min_ratio,
        }
    }

    pub fn hit_limits(&self) -> HitLimits {
        HitLimits {
            max_pattern_hits: self.max_pattern_hits,
            max_subdomain_hits: self.max_subdomain_hits,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(CrawlerConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = CrawlerConfig::from_json(r#"{ "min_ratio": 0.001, "workers": 2 }"#).unwrap();
        assert_eq!(config.min_ratio, 0.001);
        assert_eq!(config.workers, 2);
        assert_eq!(config.min_words, 100);
        assert_eq!(config.allowed_hosts.len(), 4);
    }

    #[test]
    fn test_robots_rules_from_json() {
        let config = CrawlerConfig::from_json(
            r#"{ "robots": { "example.org": [ { "forbidden": "/private" } ] } }"#,
        )
        .unwrap();
        assert_eq!(config.robots.len(), 1);
        assert_eq!(config.robots["example.org"], vec![PathRule::new("/private", &[])]);
    }

    #[test]
    fn test_empty_allowed_hosts_rejected() {
        let config = CrawlerConfig {
            allowed_hosts: vec![],
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_workers_rejected() {
        let config = CrawlerConfig {
            workers: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_nan_ratio_rejected() {
        let config = CrawlerConfig {
            min_ratio: f64::NAN,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_body_cap_below_content_floor_rejected() {
        let config = CrawlerConfig {
            max_body_bytes: 256,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = CrawlerConfig::from_json(r#"{ "max_body_bytes": 65536 }"#).unwrap();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let result = CrawlerConfig::load(Some(Path::new("/definitely/not/here.json")));
        assert!(result.is_err());
    }
}
