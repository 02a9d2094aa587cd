// src/crawl/fetch.rs
// =============================================================================
// Downloading pages.
//
// The worker only knows the Fetcher trait: "give me a URL, I give you back
// a status, the final URL (after redirects) and the bytes". HttpFetcher is
// the real implementation on top of reqwest; tests plug in scripted ones.
//
// A non-200 status is NOT an error here. It comes back as a normal
// FetchedPage and the worker decides what to do with it. Errors are for
// requests that produced no response at all (DNS, timeout, TLS, ...).
//
// Bodies are read chunk by chunk and cut off at max_body_bytes, so one
// enormous page can't eat the crawler's memory. A truncated page is still
// parsed; the HTML parser copes with a missing tail.
// =============================================================================

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Response};
use std::time::Duration;
use url::Url;

// What a fetch produced
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedPage {
    /// HTTP status code
    pub status: u16,
    /// Where we ended up after following redirects
    pub final_url: Url,
    /// Raw body; None when the server sent nothing worth reading
    pub content: Option<Vec<u8>>,
}

impl FetchedPage {
    // Only a plain 200 counts as a page we can extract links from
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<FetchedPage>;
}

pub struct HttpFetcher {
    client: Client,
    max_body_bytes: usize,
}

impl HttpFetcher {
    pub fn new(user_agent: &str, timeout: Duration, max_body_bytes: usize) -> Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            max_body_bytes,
        })
    }
}

// Reads the body until it ends or reaches `cap` bytes
async fn read_capped(mut response: Response, cap: usize) -> Result<Vec<u8>> {
    let mut body = Vec::new();

    // chunk() yields pieces as they arrive; None means the body is done
    while let Some(chunk) = response.chunk().await? {
        if !append_capped(&mut body, &chunk, cap) {
            tracing::debug!(url = %response.url(), cap, "body truncated");
            break;
        }
    }

    Ok(body)
}

// Appends as much of `chunk` as fits under `cap`
// Returns false once the body is full (the caller stops reading)
fn append_capped(body: &mut Vec<u8>, chunk: &[u8], cap: usize) -> bool {
    let room = cap.saturating_sub(body.len());
    let take = room.min(chunk.len());
    body.extend_from_slice(&chunk[..take]);

    take == chunk.len() && body.len() < cap
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<FetchedPage> {
        let response = self.client.get(url.clone()).send().await?;

        let status = response.status().as_u16();
        let final_url = response.url().clone();

        // Error pages aren't expanded, so don't bother downloading them
        let content = if status == 200 {
            Some(read_capped(response, self.max_body_bytes).await?)
        } else {
            None
        };

        Ok(FetchedPage {
            status,
            final_url,
            content,
        })
    }
}
