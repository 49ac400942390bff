//! Page fetch relay.
//!
//! Fetches arbitrary pages server-side with browser-like headers so the
//! dashboard can read sites that would be blocked by CORS in the browser.

use crate::config::ScrapeConfig;
use crate::models::FetchResult;
use reqwest::{
    header::{self, HeaderMap, HeaderValue},
    redirect, Client, StatusCode,
};
use thiserror::Error;

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";
const MAX_REDIRECTS: usize = 10;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Failed to build HTTP client: {0}")]
    Client(String),

    /// Upstream answered with a non-success status other than 404.
    #[error("HTTP {status}: {reason} for url {url}")]
    Status {
        status: u16,
        reason: String,
        url: String,
    },

    #[error("{0}")]
    Request(String),
}

/// Relays GET requests to third-party pages.
#[derive(Clone)]
pub struct PageFetcher {
    client: Client,
}

impl PageFetcher {
    pub fn new(config: &ScrapeConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .default_headers(browser_headers())
            .timeout(config.timeout())
            .redirect(redirect::Policy::limited(MAX_REDIRECTS))
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;

        Ok(Self { client })
    }

    pub async fn fetch(&self, url: &str) -> Result<FetchResult, FetchError> {
        tracing::info!(url = %url, "Proxying request");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Request(describe_request_error(&e)))?;

        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            tracing::info!(url = %url, "Page not found (404)");
            return Ok(FetchResult::not_found(url));
        }

        if !status.is_success() {
            tracing::warn!(url = %url, status = status.as_u16(), "Upstream returned error status");
            return Err(FetchError::Status {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
                url: url.to_string(),
            });
        }

        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();

        let html = response
            .text()
            .await
            .map_err(|e| FetchError::Request(describe_request_error(&e)))?;

        tracing::debug!(url = %url, bytes = html.len(), "Fetched page");

        Ok(FetchResult {
            html,
            url: url.to_string(),
            status: status.as_u16(),
            content_type,
        })
    }
}

fn browser_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(header::USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
    headers.insert(
        header::ACCEPT,
        HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
    );
    headers.insert(header::ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
    headers.insert(header::UPGRADE_INSECURE_REQUESTS, HeaderValue::from_static("1"));
    headers.insert(header::REFERER, HeaderValue::from_static("https://www.google.com/"));
    headers
}

fn describe_request_error(err: &reqwest::Error) -> String {
    if err.is_timeout() {
        format!("Request timed out: {}", err)
    } else if err.is_builder() {
        format!("Invalid URL: {}", err)
    } else {
        err.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn browser_headers_mimic_chrome() {
        let headers = browser_headers();
        assert!(headers[header::USER_AGENT]
            .to_str()
            .unwrap()
            .contains("Chrome/"));
        assert_eq!(headers[header::REFERER], "https://www.google.com/");
        assert!(headers.get(header::ACCEPT_ENCODING).is_none());
    }

    #[test]
    fn status_error_names_code_and_url() {
        let err = FetchError::Status {
            status: 503,
            reason: "Service Unavailable".to_string(),
            url: "https://example.com/news".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "HTTP 503: Service Unavailable for url https://example.com/news"
        );
    }
}
