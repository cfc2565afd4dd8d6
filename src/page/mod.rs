pub mod extractor;


use anyhow::{Context, Result, anyhow};
use std::time::Duration;
use tracing::{debug, info, warn};
use ureq::Agent;
use url::Url;

use self::extractor::extract_paragraphs;
use crate::config::SourceConfig;

const USER_AGENT: &str = concat!("page-qa/", env!("CARGO_PKG_VERSION"));

/// Single-shot page fetcher. No retries, no rate limiting, no link following.
#[derive(Debug, Clone)]
pub struct PageFetcher {
    agent: Agent,
    min_paragraph_chars: usize,
}

impl PageFetcher {
    #[inline]
    pub fn new(config: &SourceConfig) -> Self {
        let agent = Agent::config_builder()
            .timeout_global(Some(config.timeout()))
            .user_agent(USER_AGENT)
            .build()
            .into();

        Self {
            agent,
            min_paragraph_chars: config.min_paragraph_chars,
        }
    }

    #[inline]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.agent = Agent::config_builder()
            .timeout_global(Some(timeout))
            .user_agent(USER_AGENT)
            .build()
            .into();
        self
    }

    /// Fetch the page and return its paragraphs.
    ///
    /// Network failures (timeouts, refused connections, non-2xx statuses) are
    /// logged and produce an empty list rather than an error.
    #[inline]
    pub fn fetch_paragraphs(&self, url: &str) -> Vec<String> {
        let html = match self.fetch_html(url) {
            Ok(html) => html,
            Err(e) => {
                warn!("Could not fetch {}: {:#}", url, e);
                return Vec::new();
            }
        };

        match extract_paragraphs(&html, self.min_paragraph_chars) {
            Ok(paragraphs) => {
                info!("Extracted {} paragraphs from {}", paragraphs.len(), url);
                paragraphs
            }
            Err(e) => {
                warn!("Could not extract paragraphs from {}: {:#}", url, e);
                Vec::new()
            }
        }
    }

    /// Perform one HTTP GET and return the body
    #[inline]
    pub fn fetch_html(&self, url: &str) -> Result<String> {
        debug!("Making HTTP GET request to: {}", url);

        match self.agent.get(url).call() {
            Ok(mut response) => {
                let text = response
                    .body_mut()
                    .read_to_string()
                    .with_context(|| format!("Failed to read response body from {}", url))?;
                debug!("Successfully read {} bytes from {}", text.len(), url);
                Ok(text)
            }
            Err(ureq::Error::StatusCode(status)) => {
                debug!("HTTP request failed with status {}: {}", status, url);
                Err(anyhow!("HTTP error {}", status))
            }
            Err(e) => Err(anyhow::Error::from(e))
                .with_context(|| format!("Failed to make HTTP request to {}", url)),
        }
    }
}

/// Validate that a URL is absolute http(s) with a host
#[inline]
pub fn validate_url(url_str: &str) -> Result<Url> {
    let url = Url::parse(url_str).with_context(|| format!("Invalid URL format: {}", url_str))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(anyhow!("URL must use HTTP or HTTPS scheme: {}", url_str));
    }

    if url.host_str().is_none() {
        return Err(anyhow!("URL must have a valid host: {}", url_str));
    }

    Ok(url)
}
