// src/crawl/worker.rs
// =============================================================================
// The worker loop: one unit of crawl concurrency.
//
// Each cycle:
//   FETCHING    pull the next URL from the frontier (none left -> STOPPED)
//               and download it
//   EXTRACTING  if the page is a sufficient 200, collect its anchor links,
//               resolved against the final URL, fragments dropped
//   ADMITTING   run every link through the admission pipeline; accepted
//               links go into the frontier
//   COMPLETING  mark the URL complete, pause for politeness, loop
//
// Nothing a page can do stops a worker. Fetch errors and bad statuses just
// mean "this page has no links". The only way out of the loop is an
// exhausted frontier.
//
// A worker owns its admission pipeline (dedup cache + hit counters). Two
// workers can therefore both admit the same link; the frontier's own
// dedup is what stops the second copy.
// =============================================================================

use std::sync::Arc;
use std::time::Duration;
use url::Url;

use super::fetch::{FetchedPage, Fetcher};
use super::frontier::Frontier;
use super::report::WorkerReport;
use crate::admission::{Admission, AdmissionPipeline, PolicyGate};
use crate::config::CrawlerConfig;
use crate::content::{extract_anchor_hrefs, has_sufficient_content, resolve_link, ContentThresholds};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Fetching,
    Extracting,
    Admitting,
    Completing,
    Stopped,
}

pub struct Worker<F: ?Sized, D: ?Sized> {
    id: usize,
    frontier: Arc<F>,
    fetcher: Arc<D>,
    policy: Arc<PolicyGate>,
    pipeline: AdmissionPipeline,
    thresholds: ContentThresholds,
    politeness: Duration,
    state: WorkerState,
    report: WorkerReport,
}

impl<F, D> Worker<F, D>
where
    F: Frontier + ?Sized,
    D: Fetcher + ?Sized,
{
    pub fn new(
        id: usize,
        frontier: Arc<F>,
        fetcher: Arc<D>,
        policy: Arc<PolicyGate>,
        config: &CrawlerConfig,
    ) -> Self {
        Self {
            id,
            frontier,
            fetcher,
            pipeline: AdmissionPipeline::new(Arc::clone(&policy), config.hit_limits()),
            policy,
            thresholds: config.content_thresholds(),
            politeness: config.politeness(),
            state: WorkerState::Fetching,
            report: WorkerReport::default(),
        }
    }

    #[cfg(test)]
    pub fn state(&self) -> WorkerState {
        self.state
    }

    // Runs cycles until the frontier is exhausted, then returns the counts
    pub async fn run(&mut self) -> WorkerReport {
        tracing::info!(worker = self.id, "worker started");

        while self.step().await {}

        self.report.distinct_patterns = self.pipeline.distinct_patterns() as u64;
        self.report.capped_patterns = self.pipeline.exhausted_patterns() as u64;

        tracing::info!(
            worker = self.id,
            processed = self.report.urls_processed,
            admitted = self.report.links_admitted,
            unique = self.pipeline.seen_count(),
            "frontier is empty, worker stopped"
        );

        self.report.clone()
    }

    // One full cycle; returns false once the worker has stopped
    pub async fn step(&mut self) -> bool {
        self.state = WorkerState::Fetching;

        // An empty frontier is the only way a worker ever stops
        let Some(url) = self.frontier.get_next_url().await else {
            self.state = WorkerState::Stopped;
            return false;
        };
        self.report.urls_processed += 1;

        match self.fetcher.fetch(&url).await {
            // A 200: look for links, then decide which ones to keep
            Ok(page) if page.is_ok() => {
                self.report.pages_fetched += 1;
                tracing::debug!(worker = self.id, url = %url, final_url = %page.final_url, "downloaded");

                self.state = WorkerState::Extracting;
                let links = self.extract_links(&page);

                self.state = WorkerState::Admitting;
                self.admit_links(links).await;
            }
            // Any other status: the server answered, but there's nothing to expand
            Ok(page) => {
                self.report.bad_status += 1;
                tracing::debug!(worker = self.id, url = %url, status = page.status, "skipping page");
            }
            // No response at all; logged and otherwise ignored (no retries)
            Err(error) => {
                self.report.fetch_errors += 1;
                tracing::warn!(worker = self.id, url = %url, "fetch failed: {:#}", error);
            }
        }

        // Whatever happened above, the URL is done
        self.state = WorkerState::Completing;
        self.frontier.mark_complete(&url).await;

        // Be polite: give the servers a break before the next fetch
        if !self.politeness.is_zero() {
            tokio::time::sleep(self.politeness).await;
        }

        true
    }

    // Candidate links of a page, or nothing if the page isn't worth expanding
    fn extract_links(&mut self, page: &FetchedPage) -> Vec<Url> {
        // A redirect can land us somewhere we'd never have admitted
        if let Err(violation) = self.policy.check(&page.final_url) {
            self.report.offsite_redirects += 1;
            tracing::debug!(worker = self.id, final_url = %page.final_url, %violation, "redirected outside policy");
            return Vec::new();
        }

        if !has_sufficient_content(page, &self.thresholds) {
            self.report.insufficient_pages += 1;
            tracing::debug!(worker = self.id, url = %page.final_url, "not enough content to expand");
            return Vec::new();
        }

        // Relative links are relative to where we ended up, not where we asked
        let content = page.content.as_deref().unwrap_or_default();
        extract_anchor_hrefs(content)
            .iter()
            .filter_map(|href| resolve_link(&page.final_url, href))
            .collect()
    }

    async fn admit_links(&mut self, links: Vec<Url>) {
        for link in links {
            self.report.links_discovered += 1;

            match self.pipeline.admit_url(link) {
                Admission::Accepted(url) => {
                    self.report.links_admitted += 1;
                    self.frontier.add_url(url).await;
                }
                Admission::Rejected(rejection) => {
                    tracing::trace!(worker = self.id, %rejection, "link rejected");
                    self.report.record_rejection(rejection);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawl::testing::{rich_page, thin_page, RecordingFrontier, ScriptedFetcher};

    fn url(raw: &str) -> Url {
        Url::parse(raw).unwrap()
    }

    fn config() -> CrawlerConfig {
        CrawlerConfig {
            politeness_ms: 0,
            ..Default::default()
        }
    }

    fn worker(
        frontier: &Arc<RecordingFrontier>,
        fetcher: &Arc<ScriptedFetcher>,
        config: &CrawlerConfig,
    ) -> Worker<RecordingFrontier, ScriptedFetcher> {
        let policy = Arc::new(PolicyGate::from_config(config));
        Worker::new(0, Arc::clone(frontier), Arc::clone(fetcher), policy, config)
    }

    #[tokio::test]
    async fn test_exhausted_frontier_stops_without_side_effects() {
        let frontier = Arc::new(RecordingFrontier::new(vec![]));
        let fetcher = Arc::new(ScriptedFetcher::new());
        let mut worker = worker(&frontier, &fetcher, &config());

        let report = worker.run().await;

        assert_eq!(worker.state(), WorkerState::Stopped);
        assert_eq!(frontier.get_calls(), 1);
        assert_eq!(fetcher.calls(), 0);
        assert!(frontier.completed().is_empty());
        assert_eq!(report, WorkerReport::default());
    }

    #[tokio::test]
    async fn test_fetch_error_is_absorbed() {
        let start = url("https://ics.uci.edu/");
        let frontier = Arc::new(RecordingFrontier::new(vec![start.clone()]));
        let fetcher = Arc::new(ScriptedFetcher::new().fail(start.as_str()));
        let mut worker = worker(&frontier, &fetcher, &config());

        let report = worker.run().await;

        assert_eq!(worker.state(), WorkerState::Stopped);
        assert_eq!(frontier.completed(), vec![start]);
        assert!(frontier.added().is_empty());
        assert_eq!(report.fetch_errors, 1);
    }

    #[tokio::test]
    async fn test_bad_status_yields_no_links() {
        let start = url("https://ics.uci.edu/");
        let frontier = Arc::new(RecordingFrontier::new(vec![start.clone()]));
        let fetcher = Arc::new(ScriptedFetcher::new().page_with_status(
            start.as_str(),
            500,
            rich_page(&["/about", "/contact"]),
        ));
        let mut worker = worker(&frontier, &fetcher, &config());

        let report = worker.run().await;

        assert!(frontier.added().is_empty());
        assert_eq!(frontier.completed(), vec![start]);
        assert_eq!(report.bad_status, 1);
    }

    #[tokio::test]
    async fn test_thin_page_yields_no_links() {
        let start = url("https://ics.uci.edu/");
        let frontier = Arc::new(RecordingFrontier::new(vec![start.clone()]));
        // 30 visible words in 2000 bytes, with plenty of anchors
        let fetcher = Arc::new(ScriptedFetcher::new().page(start.as_str(), thin_page(30, 2000)));
        let mut worker = worker(&frontier, &fetcher, &config());

        let report = worker.run().await;

        assert!(frontier.added().is_empty());
        assert_eq!(frontier.completed(), vec![start]);
        assert_eq!(report.insufficient_pages, 1);
        assert_eq!(report.links_discovered, 0);
    }

    #[tokio::test]
    async fn test_admits_new_links_only() {
        let start = url("https://ics.uci.edu/");
        let frontier = Arc::new(RecordingFrontier::new(vec![start.clone()]));
        let fetcher = Arc::new(ScriptedFetcher::new().page(
            start.as_str(),
            rich_page(&[
                "/about#team",
                "https://www.ics.uci.edu/about",
                "/people/someone",
                "https://example.com/",
                "/poster.pdf",
                "#top",
                "mailto:help@ics.uci.edu",
                "http://cs.uci.edu/a?utm_source=x",
                "https://cs.uci.edu/a",
            ]),
        ));
        let mut worker = worker(&frontier, &fetcher, &config());

        let report = worker.run().await;

        assert_eq!(
            frontier.added(),
            vec![url("https://ics.uci.edu/about"), url("http://cs.uci.edu/a?utm_source=x")]
        );
        assert_eq!(frontier.completed(), vec![start]);
        assert_eq!(report.links_discovered, 7);
        assert_eq!(report.links_admitted, 2);
        assert_eq!(report.rejections["duplicate"], 2);
        assert_eq!(report.rejections["policy/robots"], 1);
        assert_eq!(report.rejections["policy/host"], 1);
        assert_eq!(report.rejections["policy/extension"], 1);
    }

    #[tokio::test]
    async fn test_links_resolve_against_final_url() {
        let start = url("https://ics.uci.edu/old");
        let frontier = Arc::new(RecordingFrontier::new(vec![start.clone()]));
        let fetcher = Arc::new(ScriptedFetcher::new().redirected_page(
            start.as_str(),
            "https://ics.uci.edu/new/home/",
            rich_page(&["child"]),
        ));
        let mut worker = worker(&frontier, &fetcher, &config());

        worker.run().await;

        assert_eq!(frontier.added(), vec![url("https://ics.uci.edu/new/home/child")]);
    }

    #[tokio::test]
    async fn test_offsite_redirect_yields_no_links() {
        let start = url("https://ics.uci.edu/go");
        let frontier = Arc::new(RecordingFrontier::new(vec![start.clone()]));
        let fetcher = Arc::new(ScriptedFetcher::new().redirected_page(
            start.as_str(),
            "https://example.com/landing",
            rich_page(&["https://ics.uci.edu/about"]),
        ));
        let mut worker = worker(&frontier, &fetcher, &config());

        let report = worker.run().await;

        assert!(frontier.added().is_empty());
        assert_eq!(report.offsite_redirects, 1);
    }

    #[tokio::test]
    async fn test_pattern_limit_holds_across_pages() {
        let first = url("https://ics.uci.edu/calendar");
        let second = url("https://stat.uci.edu/calendar");
        let frontier = Arc::new(RecordingFrontier::new(vec![first.clone(), second.clone()]));
        let fetcher = Arc::new(
            ScriptedFetcher::new()
                .page(
                    first.as_str(),
                    rich_page(&["/events/2024-01-01", "/events/2024-01-02"]),
                )
                .page(
                    second.as_str(),
                    rich_page(&["https://ics.uci.edu/events/2024-01-03", "/events/2024-01-04"]),
                ),
        );
        let config = CrawlerConfig {
            politeness_ms: 0,
            max_pattern_hits: 2,
            ..Default::default()
        };
        let mut worker = worker(&frontier, &fetcher, &config);

        let report = worker.run().await;

        // ics.uci.edu/=events/DATE is capped after two links; the stat.uci.edu
        // template is a different key
        assert_eq!(
            frontier.added(),
            vec![
                url("https://ics.uci.edu/events/2024-01-01"),
                url("https://ics.uci.edu/events/2024-01-02"),
                url("https://stat.uci.edu/events/2024-01-04"),
            ]
        );
        assert_eq!(report.rejections["pattern_limit"], 1);
        assert_eq!(report.capped_patterns, 1);
        assert_eq!(frontier.completed(), vec![first, second]);
    }

    #[tokio::test]
    async fn test_seed_outside_policy_yields_no_links() {
        let start = url("https://example.com/");
        let frontier = Arc::new(RecordingFrontier::new(vec![start.clone()]));
        let fetcher = Arc::new(
            ScriptedFetcher::new().page(start.as_str(), rich_page(&["https://ics.uci.edu/about"])),
        );
        let mut worker = worker(&frontier, &fetcher, &config());

        let report = worker.run().await;

        // Fetched and completed, but nothing followed from it
        assert_eq!(fetcher.calls(), 1);
        assert_eq!(frontier.completed(), vec![start]);
        assert!(frontier.added().is_empty());
        assert_eq!(report.offsite_redirects, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_politeness_pause_after_completing() {
        let start = url("https://ics.uci.edu/");
        let frontier = Arc::new(RecordingFrontier::new(vec![start.clone()]));
        let fetcher = Arc::new(ScriptedFetcher::new().page(start.as_str(), rich_page(&[])));
        let config = CrawlerConfig {
            politeness_ms: 500,
            ..Default::default()
        };
        let mut worker = worker(&frontier, &fetcher, &config);

        // The clock is paused, so the sleep advances virtual time only
        let started = tokio::time::Instant::now();
        assert!(worker.step().await);

        assert_eq!(worker.state(), WorkerState::Completing);
        assert_eq!(frontier.completed(), vec![start]);
        assert!(started.elapsed() >= Duration::from_millis(500));
        assert!(started.elapsed() < Duration::from_millis(600));
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_pause_once_stopped() {
        let frontier = Arc::new(RecordingFrontier::new(vec![]));
        let fetcher = Arc::new(ScriptedFetcher::new());
        let config = CrawlerConfig {
            politeness_ms: 500,
            ..Default::default()
        };
        let mut worker = worker(&frontier, &fetcher, &config);

        let started = tokio::time::Instant::now();
        assert!(!worker.step().await);
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test]
    async fn test_step_reports_stopped() {
        let frontier = Arc::new(RecordingFrontier::new(vec![url("https://ics.uci.edu/")]));
        let fetcher = Arc::new(ScriptedFetcher::new());
        let mut worker = worker(&frontier, &fetcher, &config());

        assert!(worker.step().await);
        assert_eq!(worker.state(), WorkerState::Completing);
        assert!(!worker.step().await);
        assert_eq!(worker.state(), WorkerState::Stopped);
    }
}
