// src/crawl/mod.rs
// =============================================================================
// This module runs the crawl.
//
// Features:
// - Several workers crawling concurrently, one tokio task each
// - Each worker owns its own dedup cache and rate limiters (no locks on
//   the hot path)
// - A shared frontier that knows when the crawl is really over
// - Polite crawling with a pause after every page
//
// Submodules:
// - frontier: the shared URL queue
// - fetch: downloading pages
// - worker: the fetch -> extract -> admit -> complete loop
// - report: per-worker counters and the final summary
// =============================================================================

mod fetch;
mod frontier;
mod report;
#[cfg(test)]
mod testing;
mod worker;

pub use fetch::{FetchedPage, Fetcher, HttpFetcher};
pub use frontier::{Frontier, MemoryFrontier};
pub use report::{CrawlReport, WorkerReport};
pub use worker::Worker;

use anyhow::Result;
use futures::future::join_all;
use std::sync::Arc;
use std::time::{Duration, Instant};
use url::Url;

use crate::admission::PolicyGate;
use crate::config::CrawlerConfig;

// Crawls the web from the given seeds until the frontier runs dry
//
// Parameters:
//   seeds: starting URLs (queued as-is, even if the policy would reject them)
//   config: a validated configuration
//
// Returns: the summed statistics of every worker
pub async fn crawl(seeds: Vec<Url>, config: &CrawlerConfig) -> Result<CrawlReport> {
    let fetcher = Arc::new(HttpFetcher::new(
        &config.user_agent,
        Duration::from_secs(config.fetch_timeout_secs),
        config.max_body_bytes,
    )?);

    // A seed outside the policy is still fetched, but the worker treats its
    // page like an offsite redirect: no links are followed from it
    let policy = PolicyGate::from_config(config);
    for seed in &seeds {
        if !policy.is_admissible(seed.as_str()) {
            tracing::warn!(seed = %seed, "seed is outside the crawl policy, its links won't be followed");
        }
    }

    let frontier = Arc::new(MemoryFrontier::with_seeds(seeds));
    let report = run_workers(Arc::clone(&frontier), fetcher, config).await;

    tracing::info!(
        completed = frontier.completed(),
        pending = frontier.pending(),
        "crawl finished"
    );
    Ok(report)
}

// Spawns `config.workers` workers over the given collaborators and waits
// for all of them to stop
pub async fn run_workers<F, D>(frontier: Arc<F>, fetcher: Arc<D>, config: &CrawlerConfig) -> CrawlReport
where
    F: Frontier + 'static,
    D: Fetcher + 'static,
{
    let policy = Arc::new(PolicyGate::from_config(config));
    let started = Instant::now();

    tracing::info!(workers = config.workers, "starting crawl");

    let handles: Vec<_> = (0..config.workers)
        .map(|id| {
            let mut worker = Worker::new(
                id,
                Arc::clone(&frontier),
                Arc::clone(&fetcher),
                Arc::clone(&policy),
                config,
            );
            tokio::spawn(async move { worker.run().await })
        })
        .collect();

    let reports: Vec<WorkerReport> = join_all(handles)
        .await
        .into_iter()
        .filter_map(|result| match result {
            Ok(report) => Some(report),
            Err(error) => {
                tracing::error!("worker task failed: {}", error);
                None
            }
        })
        .collect();

    CrawlReport::from_workers(&reports, started.elapsed())
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why tokio::spawn for each worker?
//    - spawn starts the worker as an independent task
//    - Tasks run concurrently; while one waits on the network, others work
//    - The `move` closure hands ownership of the worker to its task, so no
//      other task can ever touch its dedup cache or counters
//
// 2. What does join_all do?
//    - Takes many futures and waits until every one of them has finished
//    - Returns their outputs in the same order
//    - A JoinHandle resolves to Err if the task panicked
//
// 3. Why generic <F, D> instead of concrete types?
//    - The real crawl uses MemoryFrontier + HttpFetcher
//    - Tests use in-memory doubles without any network
//    - Generics let the same worker code run against both
// -----------------------------------------------------------------------------
