//! Native transport over reqwest
//!
//! Requires the `native-fetch` feature.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::redirect::Policy;

use crate::error::{FetchError, FetchResult};
use crate::fetcher::{BROWSER_HEADERS, FETCH_TIMEOUT, Fetcher, MAX_REDIRECTS, RemoteResponse};
use crate::validator::FetchTarget;

/// [`Fetcher`] backed by a reqwest client with the browser header profile.
#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    client: reqwest::Client,
}

impl ReqwestFetcher {
    pub fn new() -> FetchResult<Self> {
        Self::with_timeout(FETCH_TIMEOUT)
    }

    pub(crate) fn with_timeout(timeout: Duration) -> FetchResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .no_proxy()
            .redirect(Policy::limited(MAX_REDIRECTS))
            .build()
            .map_err(|e| FetchError::Other {
                url: String::new(),
                details: format!("failed to build HTTP client: {}", e),
            })?;

        Ok(Self { client })
    }
}

#[async_trait(?Send)]
impl Fetcher for ReqwestFetcher {
    async fn fetch(&self, target: &FetchTarget) -> FetchResult<RemoteResponse> {
        let url = target.url();

        let mut request = self.client.get(url);
        for (name, value) in BROWSER_HEADERS {
            request = request.header(*name, *value);
        }

        let response = request
            .send()
            .await
            .map_err(|e| classify_error(url, e))?;

        let status = response.status();
        let headers: Vec<(String, String)> = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();

        let body = response.text().await.map_err(|e| classify_error(url, e))?;

        Ok(RemoteResponse::new(
            status.as_u16(),
            status.canonical_reason().unwrap_or_default(),
            headers,
            body,
        ))
    }
}

fn classify_error(url: &str, error: reqwest::Error) -> FetchError {
    let url = url.to_string();
    let details = error.to_string();
    if error.is_timeout() {
        FetchError::Timeout { url, details }
    } else if error.is_connect() || error.is_request() || error.is_redirect() {
        FetchError::Network { url, details }
    } else {
        FetchError::Other { url, details }
    }
}
