// src/crawl/testing.rs
// =============================================================================
// Test doubles for the crawl module: a frontier that records every call and
// a fetcher that serves canned pages. No network, no timing.
// =============================================================================

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use url::Url;

use super::fetch::{FetchedPage, Fetcher};
use super::frontier::Frontier;

// A page with 150 visible words plus one anchor per href
pub fn rich_page(hrefs: &[&str]) -> Vec<u8> {
    let words = vec!["campus"; 150].join(" ");
    let anchors: String = hrefs
        .iter()
        .map(|href| format!(r#"<a href="{}">link</a>"#, href))
        .collect();
    format!("<html><body><p>{}</p>{}</body></html>", words, anchors).into_bytes()
}

// A page with `words` visible words, ten textless anchors, padded to
// exactly `bytes` bytes
pub fn thin_page(words: usize, bytes: usize) -> Vec<u8> {
    let text = vec!["word"; words].join(" ");
    let anchors: String = (0..10)
        .map(|i| format!(r#"<a href="/page/{}"></a>"#, i))
        .collect();
    let mut html = format!("<html><body><p>{}</p>{}<!--", text, anchors);
    let tail = "--></body></html>";
    let padding = bytes - html.len() - tail.len();
    html.push_str(&"x".repeat(padding));
    html.push_str(tail);
    html.into_bytes()
}

// Serves pages from a fixed queue and remembers what workers did
pub struct RecordingFrontier {
    queue: Mutex<VecDeque<Url>>,
    added: Mutex<Vec<Url>>,
    completed: Mutex<Vec<Url>>,
    gets: AtomicUsize,
}

impl RecordingFrontier {
    pub fn new(urls: Vec<Url>) -> Self {
        Self {
            queue: Mutex::new(urls.into()),
            added: Mutex::new(Vec::new()),
            completed: Mutex::new(Vec::new()),
            gets: AtomicUsize::new(0),
        }
    }

    pub fn get_calls(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn added(&self) -> Vec<Url> {
        self.added.lock().unwrap().clone()
    }

    pub fn completed(&self) -> Vec<Url> {
        self.completed.lock().unwrap().clone()
    }
}

#[async_trait]
impl Frontier for RecordingFrontier {
    async fn get_next_url(&self) -> Option<Url> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.queue.lock().unwrap().pop_front()
    }

    async fn add_url(&self, url: Url) {
        self.added.lock().unwrap().push(url);
    }

    async fn mark_complete(&self, url: &Url) {
        self.completed.lock().unwrap().push(url.clone());
    }
}

// Unknown URLs come back as 404s
#[derive(Default)]
pub struct ScriptedFetcher {
    responses: HashMap<String, Option<FetchedPage>>,
    calls: AtomicUsize,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(self, url: &str, body: Vec<u8>) -> Self {
        self.redirected_page(url, url, body)
    }

    pub fn redirected_page(self, url: &str, final_url: &str, body: Vec<u8>) -> Self {
        self.respond(url, final_url, 200, body)
    }

    pub fn page_with_status(self, url: &str, status: u16, body: Vec<u8>) -> Self {
        self.respond(url, url, status, body)
    }

    // Makes the fetch of `url` fail outright
    pub fn fail(mut self, url: &str) -> Self {
        self.responses.insert(Url::parse(url).unwrap().to_string(), None);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn respond(mut self, url: &str, final_url: &str, status: u16, body: Vec<u8>) -> Self {
        let page = FetchedPage {
            status,
            final_url: Url::parse(final_url).unwrap(),
            content: Some(body),
        };
        self.responses.insert(Url::parse(url).unwrap().to_string(), Some(page));
        self
    }
}

#[async_trait]
impl Fetcher for ScriptedFetcher {
    async fn fetch(&self, url: &Url) -> Result<FetchedPage> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        match self.responses.get(url.as_str()) {
            Some(Some(page)) => Ok(page.clone()),
            Some(None) => Err(anyhow!("connection refused")),
            None => Ok(FetchedPage {
                status: 404,
                final_url: url.clone(),
                content: None,
            }),
        }
    }
}
