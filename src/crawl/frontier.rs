// src/crawl/frontier.rs
// =============================================================================
// The frontier: the shared queue of URLs waiting to be fetched.
//
// Workers talk to it through three calls:
// - get_next_url: hand me something to fetch (None = crawl is over)
// - add_url: here's a link worth fetching later
// - mark_complete: I'm done with the URL you gave me
//
// MemoryFrontier is an in-process implementation. Its one subtle job is
// deciding when the crawl is over: an empty queue is NOT enough, because a
// worker that is still fetching may be about to add new links. So
// get_next_url waits while anything is in flight, and only returns None
// once the queue is empty AND every handed-out URL has been completed.
// =============================================================================

use async_trait::async_trait;
use std::collections::{HashSet, VecDeque};
use std::sync::{Mutex, MutexGuard};
use tokio::sync::Notify;
use url::Url;

#[async_trait]
pub trait Frontier: Send + Sync {
    async fn get_next_url(&self) -> Option<Url>;
    async fn add_url(&self, url: Url);
    async fn mark_complete(&self, url: &Url);
}

#[derive(Default)]
struct FrontierState {
    queue: VecDeque<Url>,
    // Every URL string ever queued, so exact re-submissions are dropped
    queued: HashSet<String>,
    in_flight: usize,
    completed: usize,
}

#[derive(Default)]
pub struct MemoryFrontier {
    state: Mutex<FrontierState>,
    changed: Notify,
}

impl MemoryFrontier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_seeds(seeds: impl IntoIterator<Item = Url>) -> Self {
        let frontier = Self::new();
        {
            let mut state = frontier.lock();
            for seed in seeds {
                push(&mut state, seed);
            }
        }
        frontier
    }

    // URLs marked complete so far
    pub fn completed(&self) -> usize {
        self.lock().completed
    }

    // URLs still waiting in the queue
    pub fn pending(&self) -> usize {
        self.lock().queue.len()
    }

    // A worker that panicked mid-update can't leave the queue half-changed
    // (every update is a single push/pop/counter bump), so a poisoned lock
    // is still safe to use
    fn lock(&self) -> MutexGuard<'_, FrontierState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn push(state: &mut FrontierState, url: Url) -> bool {
    if state.queued.insert(url.as_str().to_string()) {
        state.queue.push_back(url);
        true
    } else {
        false
    }
}

#[async_trait]
impl Frontier for MemoryFrontier {
    async fn get_next_url(&self) -> Option<Url> {
        loop {
            // Register for wake-ups *before* looking at the queue, so an
            // add_url between our check and our wait isn't missed
            let notified = self.changed.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            {
                let mut state = self.lock();
                // Work available: hand it out and remember it's in flight
                if let Some(url) = state.queue.pop_front() {
                    state.in_flight += 1;
                    return Some(url);
                }
                // Nothing queued and nobody still working: the crawl is over
                if state.in_flight == 0 {
                    return None;
                }
            } // lock released here, before we wait

            // Someone is still fetching and may add links; sleep until an
            // add_url or mark_complete, then look again
            notified.await;
        }
    }

    async fn add_url(&self, url: Url) {
        // Duplicates are dropped quietly and wake nobody
        let added = push(&mut self.lock(), url);
        if added {
            self.changed.notify_waiters();
        }
    }

    async fn mark_complete(&self, _url: &Url) {
        {
            let mut state = self.lock();
            state.in_flight = state.in_flight.saturating_sub(1);
            state.completed += 1;
        }
        self.changed.notify_waiters();
    }
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why std::sync::Mutex in async code?
//    - We only hold the lock for a push or a pop, never across an .await
//    - For short critical sections like that, the std Mutex is the usual
//      choice; tokio's Mutex is for locks held across awaits
//
// 2. What is Notify?
//    - A tokio primitive for "wake up whoever is waiting"
//    - notify_waiters() wakes every task currently waiting on notified()
//    - enable() registers us as a waiter right away, before we await
//
// 3. What does tokio::pin! do?
//    - enable() needs a pinned future (one that can't move in memory)
//    - pin! pins it on the stack without a heap allocation
// -----------------------------------------------------------------------------
