//! Outbound fetch contract
//!
//! The transport itself lives behind [`Fetcher`]: the worker drives the Workers
//! `fetch` API, native binaries use [`crate::native::ReqwestFetcher`]. Status and
//! content-type gating is shared here so both transports classify responses the
//! same way.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{FetchError, FetchResult};
use crate::validator::FetchTarget;

/// Wall-clock limit for one outbound request, body included.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(15);

/// Redirect hops the transport follows before giving up.
pub const MAX_REDIRECTS: usize = 10;

/// Request headers sent on every fetch. Mimics a desktop Chrome.
pub const BROWSER_HEADERS: &[(&str, &str)] = &[
    (
        "User-Agent",
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    ),
    (
        "Accept",
        "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
    ),
    ("Accept-Language", "en-US,en;q=0.9"),
    ("Accept-Encoding", "gzip, deflate, br"),
    ("Cache-Control", "no-cache"),
    ("DNT", "1"),
    ("Upgrade-Insecure-Requests", "1"),
];

/// Content types relayed to the caller.
pub const SUPPORTED_CONTENT_TYPES: &[&str] = &["text/html", "text/plain", "application/json"];

/// Classification of an accepted response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Html,
    PlainText,
    Json,
}

impl ContentKind {
    /// Classify a `Content-Type` header value by substring.
    pub fn classify(content_type: &str) -> Option<Self> {
        let content_type = content_type.to_ascii_lowercase();
        if content_type.contains("text/html") {
            Some(ContentKind::Html)
        } else if content_type.contains("text/plain") {
            Some(ContentKind::PlainText)
        } else if content_type.contains("application/json") {
            Some(ContentKind::Json)
        } else {
            None
        }
    }

    pub fn is_html(self) -> bool {
        self == ContentKind::Html
    }
}

/// A fully received upstream response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteResponse {
    pub status: u16,
    pub reason: String,
    /// Lower-cased header names; repeated headers joined with `", "`.
    pub headers: BTreeMap<String, String>,
    /// `Content-Type` header value, empty when absent.
    pub content_type: String,
    pub body: String,
}

impl RemoteResponse {
    pub fn new<I, K, V>(status: u16, reason: impl Into<String>, headers: I, body: String) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut merged: BTreeMap<String, String> = BTreeMap::new();
        for (name, value) in headers {
            let name = name.as_ref().to_ascii_lowercase();
            let value = value.as_ref();
            merged
                .entry(name)
                .and_modify(|existing| {
                    existing.push_str(", ");
                    existing.push_str(value);
                })
                .or_insert_with(|| value.to_string());
        }

        let content_type = merged.get("content-type").cloned().unwrap_or_default();

        Self {
            status,
            reason: reason.into(),
            headers: merged,
            content_type,
            body,
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Canonical reason phrase for a status code, empty when unknown.
pub fn canonical_reason(status: u16) -> String {
    http::StatusCode::from_u16(status)
        .ok()
        .and_then(|code| code.canonical_reason())
        .unwrap_or_default()
        .to_string()
}

/// Transport performing a single GET for a validated target.
///
/// Implementations send [`BROWSER_HEADERS`], follow redirects, stop after
/// [`FETCH_TIMEOUT`] with [`FetchError::Timeout`], and return non-2xx responses
/// as `Ok` so that [`fetch_checked`] decides how to report them. No retries.
#[async_trait(?Send)]
pub trait Fetcher {
    async fn fetch(&self, target: &FetchTarget) -> FetchResult<RemoteResponse>;
}

/// Fetch `target` and gate the response on status and content type.
pub async fn fetch_checked<F>(
    fetcher: &F,
    target: &FetchTarget,
) -> FetchResult<(RemoteResponse, ContentKind)>
where
    F: Fetcher + ?Sized,
{
    tracing::debug!(url = target.url(), "fetching");

    let response = match fetcher.fetch(target).await {
        Ok(response) => response,
        Err(err) => {
            tracing::warn!(url = target.url(), error = %err, "fetch failed");
            return Err(err);
        }
    };

    tracing::info!(
        url = target.url(),
        status = response.status,
        content_type = %response.content_type,
        bytes = response.body.len(),
        "fetched"
    );

    check_response(target, response)
}

/// Apply the status and content-type gates to a received response.
pub fn check_response(
    target: &FetchTarget,
    response: RemoteResponse,
) -> FetchResult<(RemoteResponse, ContentKind)> {
    if !response.is_success() {
        return Err(FetchError::UpstreamHttp {
            url: target.url().to_string(),
            status: response.status,
            reason: response.reason,
        });
    }

    match ContentKind::classify(&response.content_type) {
        Some(kind) => Ok((response, kind)),
        None => Err(FetchError::UnsupportedContentType {
            url: target.url().to_string(),
            content_type: response.content_type,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validator::validate_target;

    fn response(status: u16, content_type: Option<&str>) -> RemoteResponse {
        let headers: Vec<(&str, &str)> = content_type
            .map(|ct| vec![("Content-Type", ct)])
            .unwrap_or_default();
        RemoteResponse::new(status, canonical_reason(status), headers, "body".into())
    }

    #[test]
    fn classifies_supported_types() {
        assert_eq!(
            ContentKind::classify("text/html; charset=utf-8"),
            Some(ContentKind::Html)
        );
        assert_eq!(ContentKind::classify("TEXT/HTML"), Some(ContentKind::Html));
        assert_eq!(
            ContentKind::classify("text/plain"),
            Some(ContentKind::PlainText)
        );
        assert_eq!(
            ContentKind::classify("application/json; charset=utf-8"),
            Some(ContentKind::Json)
        );
        assert_eq!(ContentKind::classify("image/png"), None);
        assert_eq!(ContentKind::classify(""), None);
    }

    #[test]
    fn headers_are_lowercased_and_merged() {
        let response = RemoteResponse::new(
            200,
            "OK",
            [
                ("Set-Cookie", "a=1"),
                ("set-cookie", "b=2"),
                ("Content-Type", "text/html"),
            ],
            String::new(),
        );
        assert_eq!(response.headers["set-cookie"], "a=1, b=2");
        assert_eq!(response.content_type, "text/html");
    }

    #[test]
    fn non_success_is_reported_with_reason() {
        let target = validate_target("https://example.com/missing").unwrap();
        let err = check_response(&target, response(404, Some("text/html"))).unwrap_err();
        match err {
            FetchError::UpstreamHttp { status, reason, .. } => {
                assert_eq!(status, 404);
                assert_eq!(reason, "Not Found");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn status_gate_runs_before_content_type_gate() {
        let target = validate_target("https://example.com/").unwrap();
        let err = check_response(&target, response(500, Some("image/png"))).unwrap_err();
        assert_eq!(err.status(), 500);
        assert!(matches!(err, FetchError::UpstreamHttp { .. }));
    }

    #[test]
    fn unsupported_or_missing_content_type_is_rejected() {
        let target = validate_target("https://example.com/logo.png").unwrap();
        for content_type in [Some("image/png"), None] {
            let err = check_response(&target, response(200, content_type)).unwrap_err();
            assert_eq!(err.status(), 415);
        }
    }

    #[test]
    fn unknown_status_has_empty_reason() {
        assert_eq!(canonical_reason(200), "OK");
        assert_eq!(canonical_reason(599), "");
    }
}
