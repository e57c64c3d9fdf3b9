//! Single acquisition attempts.
//!
//! A [`FeedFetcher`] performs one GET per [`Tier`], decodes and parses the
//! body, and records everything in a [`FetchAttempt`]. Every failure mode
//! (transport, oversize body, upstream error page, parse error) ends up as
//! a value on the attempt.

use std::time::Duration;

use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::Client;
use serde::Serialize;

use crate::config::FetchConfig;
use crate::encoding::decode_feed;
use crate::error::Result;
use crate::feed::{is_upstream_error_page, parse_feed, FeedItem, NormalizedFeed, ParseMode};
use crate::route::tiers::Tier;

/// Characters of decoded body kept for diagnostics.
pub const SNIPPET_CHARS: usize = 200;

/// Record of one acquisition try.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FetchAttempt {
    /// Tier label.
    pub tier: String,
    /// Requested URL.
    pub url: String,
    /// HTTP status, absent on transport failure.
    pub status: Option<u16>,
    /// Response `Content-Type` header (empty when absent).
    pub content_type: String,
    /// Response body length in bytes.
    pub bytes: usize,
    /// Encoding label used to decode the body.
    pub encoding: String,
    /// Schema the body was normalized with.
    pub mode: ParseMode,
    /// Normalized items.
    #[serde(skip)]
    pub items: Vec<FeedItem>,
    /// Failure description, if any.
    pub error: Option<String>,
    /// Leading characters of the decoded body.
    pub xml_snippet: String,
}

impl FetchAttempt {
    fn failed(tier: &Tier, error: impl Into<String>) -> Self {
        Self {
            tier: tier.label.clone(),
            url: tier.url.clone(),
            error: Some(error.into()),
            ..Default::default()
        }
    }

    /// Whether this attempt satisfies the route success predicate:
    /// a 2xx status and at least one normalized item.
    pub fn is_success(&self) -> bool {
        matches!(self.status, Some(s) if (200..300).contains(&s)) && !self.items.is_empty()
    }
}

/// HTTP feed fetcher.
#[derive(Debug, Clone)]
pub struct FeedFetcher {
    client: Client,
    accept: String,
    max_body_bytes: u64,
    error_page_marker: String,
}

impl FeedFetcher {
    /// Create a fetcher from configuration.
    ///
    /// `error_page_marker` is the origin domain fragment used to recognize
    /// upstream error pages served with a success status.
    pub fn new(config: &FetchConfig, error_page_marker: &str) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.timeout_secs))
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .user_agent(config.user_agent.as_str())
            .build()?;

        Ok(Self {
            client,
            accept: config.accept.clone(),
            max_body_bytes: config.max_body_bytes,
            error_page_marker: error_page_marker.to_string(),
        })
    }

    /// The underlying HTTP client.
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Perform one acquisition attempt for a tier.
    pub async fn attempt(&self, tier: &Tier) -> FetchAttempt {
        let response = match self
            .client
            .get(&tier.url)
            .header(ACCEPT, self.accept.as_str())
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) if e.is_timeout() => return FetchAttempt::failed(tier, "request timed out"),
            Err(e) => return FetchAttempt::failed(tier, format!("request failed: {e}")),
        };

        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();

        let mut attempt = FetchAttempt {
            tier: tier.label.clone(),
            url: tier.url.clone(),
            status: Some(status.as_u16()),
            content_type,
            ..Default::default()
        };

        if let Some(length) = response.content_length() {
            if length > self.max_body_bytes {
                attempt.error = Some(format!(
                    "feed too large: {} bytes (max {} bytes)",
                    length, self.max_body_bytes
                ));
                return attempt;
            }
        }

        let body = match self.read_capped(response).await {
            Ok(body) => body,
            Err(BodyError::TooLarge(read)) => {
                attempt.bytes = read;
                attempt.error = Some(format!(
                    "feed too large: exceeds {} bytes",
                    self.max_body_bytes
                ));
                return attempt;
            }
            Err(BodyError::Read(e)) => {
                attempt.error = Some(format!("failed to read response: {e}"));
                return attempt;
            }
        };
        attempt.bytes = body.len();

        let content_type =
            (!attempt.content_type.is_empty()).then_some(attempt.content_type.as_str());
        let decoded = decode_feed(&body, content_type);
        attempt.encoding = decoded.encoding;
        attempt.xml_snippet = decoded.text.chars().take(SNIPPET_CHARS).collect();

        let normalized = if is_upstream_error_page(&decoded.text, &self.error_page_marker) {
            NormalizedFeed::failed("upstream error page")
        } else {
            parse_feed(&decoded.text)
        };

        attempt.mode = normalized.mode;
        attempt.items = normalized.items;
        attempt.error = if status.is_success() {
            normalized.error
        } else {
            Some(format!("HTTP error: {status}"))
        };

        attempt
    }

    /// Read the body chunk by chunk, giving up once it passes the size cap.
    async fn read_capped(
        &self,
        mut response: reqwest::Response,
    ) -> std::result::Result<Vec<u8>, BodyError> {
        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(BodyError::Read)? {
            body.extend_from_slice(&chunk);
            if body.len() as u64 > self.max_body_bytes {
                return Err(BodyError::TooLarge(body.len()));
            }
        }
        Ok(body)
    }
}

/// Why a response body could not be read.
#[derive(Debug)]
enum BodyError {
    /// More bytes than allowed were received (count read so far).
    TooLarge(usize),
    Read(reqwest::Error),
}
