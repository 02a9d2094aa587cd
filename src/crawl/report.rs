// src/crawl/report.rs
// =============================================================================
// Crawl statistics.
//
// Every worker counts what happened to its pages and links in its own
// WorkerReport (no sharing, no atomics). When the crawl ends the reports
// are added up into one CrawlReport, which main.rs prints as a table or
// serializes to JSON.
// =============================================================================

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

use crate::admission::Rejection;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkerReport {
    /// URLs pulled from the frontier
    pub urls_processed: u64,
    /// Fetches that returned 200
    pub pages_fetched: u64,
    /// Fetches that returned any other status
    pub bad_status: u64,
    /// Fetches that produced no response at all
    pub fetch_errors: u64,
    /// 200 pages whose final URL (after redirects) is outside the policy
    pub offsite_redirects: u64,
    /// 200 pages rejected by the content gate
    pub insufficient_pages: u64,
    /// Resolved links found on sufficient pages
    pub links_discovered: u64,
    /// Links handed to the frontier
    pub links_admitted: u64,
    /// Rejected links, by reason
    pub rejections: BTreeMap<String, u64>,
    /// URL templates seen
    pub distinct_patterns: u64,
    /// URL templates that hit the pattern limit
    pub capped_patterns: u64,
}

impl WorkerReport {
    pub fn record_rejection(&mut self, rejection: Rejection) {
        *self.rejections.entry(rejection.as_str().to_string()).or_insert(0) += 1;
    }

    pub fn links_rejected(&self) -> u64 {
        self.rejections.values().sum()
    }

    // Adds another worker's counts into this one
    pub fn merge(&mut self, other: &WorkerReport) {
        self.urls_processed += other.urls_processed;
        self.pages_fetched += other.pages_fetched;
        self.bad_status += other.bad_status;
        self.fetch_errors += other.fetch_errors;
        self.offsite_redirects += other.offsite_redirects;
        self.insufficient_pages += other.insufficient_pages;
        self.links_discovered += other.links_discovered;
        self.links_admitted += other.links_admitted;
        self.distinct_patterns += other.distinct_patterns;
        self.capped_patterns += other.capped_patterns;

        for (reason, count) in &other.rejections {
            *self.rejections.entry(reason.clone()).or_insert(0) += count;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlReport {
    pub workers: usize,
    pub elapsed_secs: f64,
    /// Sum over all workers. Pattern counts are per worker, so a template
    /// capped by two workers counts twice.
    #[serde(flatten)]
    pub totals: WorkerReport,
}

impl CrawlReport {
    pub fn from_workers(reports: &[WorkerReport], elapsed: Duration) -> Self {
        let mut totals = WorkerReport::default();
        for report in reports {
            totals.merge(report);
        }

        Self {
            workers: reports.len(),
            elapsed_secs: elapsed.as_secs_f64(),
            totals,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_rejection() {
        let mut report = WorkerReport::default();
        report.record_rejection(Rejection::Duplicate);
        report.record_rejection(Rejection::Duplicate);
        report.record_rejection(Rejection::PatternLimit);
        assert_eq!(report.rejections["duplicate"], 2);
        assert_eq!(report.rejections["pattern_limit"], 1);
        assert_eq!(report.links_rejected(), 3);
    }

    #[test]
    fn test_merge_workers() {
        let mut first = WorkerReport {
            pages_fetched: 3,
            links_admitted: 10,
            ..Default::default()
        };
        first.record_rejection(Rejection::Duplicate);

        let mut second = WorkerReport {
            pages_fetched: 2,
            fetch_errors: 1,
            ..Default::default()
        };
        second.record_rejection(Rejection::Duplicate);
        second.record_rejection(Rejection::SubdomainLimit);

        let report = CrawlReport::from_workers(&[first, second], Duration::from_millis(1500));
        assert_eq!(report.workers, 2);
        assert_eq!(report.elapsed_secs, 1.5);
        assert_eq!(report.totals.pages_fetched, 5);
        assert_eq!(report.totals.fetch_errors, 1);
        assert_eq!(report.totals.links_admitted, 10);
        assert_eq!(report.totals.rejections["duplicate"], 2);
        assert_eq!(report.totals.rejections["subdomain_limit"], 1);
    }

    #[test]
    fn test_json_is_flat() {
        let report = CrawlReport::from_workers(&[WorkerReport::default()], Duration::ZERO);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["workers"], 1);
        assert_eq!(json["pages_fetched"], 0);
    }
}
