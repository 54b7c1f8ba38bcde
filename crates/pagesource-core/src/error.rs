//! Typed errors for the fetch-and-analyze pipeline.
//!
//! Every variant maps to exactly one HTTP status and one JSON error body, so the
//! worker and the CLI report failures identically.

use serde_json::{Value as JsonValue, json};
use thiserror::Error;

use crate::fetcher::{FETCH_TIMEOUT, SUPPORTED_CONTENT_TYPES};

/// Why a caller-supplied URL was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InvalidUrlReason {
    /// Not an absolute URL with a host
    #[error("malformed URL")]
    Malformed,

    /// Scheme outside http/https (file, ftp, ws, wss, data, javascript, ...)
    #[error("unsupported protocol")]
    UnsupportedProtocol,

    /// Host is an IP literal inside a loopback or private range
    #[error("cannot access local/private IP addresses")]
    PrivateAddress,
}

/// Failures of a single fetch-and-analyze request.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Caller input rejected by the validator
    #[error("invalid URL: {reason}")]
    InvalidUrl { url: String, reason: InvalidUrlReason },

    /// Upstream answered with a content type we do not relay
    #[error("content type not supported: {content_type}")]
    UnsupportedContentType { url: String, content_type: String },

    /// Upstream answered with a non-2xx status
    #[error("HTTP {status}: {reason}")]
    UpstreamHttp {
        url: String,
        status: u16,
        reason: String,
    },

    /// Upstream did not answer within the fetch timeout
    #[error("timeout fetching {url}")]
    Timeout { url: String, details: String },

    /// Connection, DNS or TLS failure
    #[error("network error fetching {url}: {details}")]
    Network { url: String, details: String },

    /// Anything else (body decoding, client construction)
    #[error("failed to fetch {url}: {details}")]
    Other { url: String, details: String },
}

impl FetchError {
    /// Status code returned to the caller.
    pub fn status(&self) -> u16 {
        match self {
            FetchError::InvalidUrl { .. } => 400,
            FetchError::UnsupportedContentType { .. } => 415,
            FetchError::UpstreamHttp { status, .. } => *status,
            FetchError::Timeout { .. } => 408,
            FetchError::Network { .. } => 502,
            FetchError::Other { .. } => 500,
        }
    }

    /// JSON error body returned to the caller.
    pub fn to_body(&self) -> JsonValue {
        match self {
            FetchError::InvalidUrl { reason, .. } => json!({
                "error": format!("Invalid URL: {}", reason),
                "tip": "URL must include http:// or https://",
            }),
            FetchError::UnsupportedContentType { url, content_type } => json!({
                "error": format!("Content type not supported: {}", content_type),
                "url": url,
                "supportedTypes": SUPPORTED_CONTENT_TYPES,
            }),
            FetchError::UpstreamHttp {
                url,
                status,
                reason,
            } => json!({
                "error": format!("HTTP {}: {}", status, reason),
                "url": url,
            }),
            FetchError::Timeout { url, details } => json!({
                "error": format!("Request timeout ({} seconds)", FETCH_TIMEOUT.as_secs()),
                "details": details,
                "url": url,
            }),
            FetchError::Network { url, details } => json!({
                "error": "Network error or URL blocked",
                "details": details,
                "url": url,
            }),
            FetchError::Other { url, details } => json!({
                "error": "Failed to fetch URL",
                "details": details,
                "url": url,
            }),
        }
    }
}

/// Result type alias for pipeline operations.
pub type FetchResult<T> = std::result::Result<T, FetchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_follow_taxonomy() {
        let url = "https://example.com".to_string();
        let cases = [
            (
                FetchError::InvalidUrl {
                    url: url.clone(),
                    reason: InvalidUrlReason::Malformed,
                },
                400,
            ),
            (
                FetchError::UnsupportedContentType {
                    url: url.clone(),
                    content_type: "image/png".into(),
                },
                415,
            ),
            (
                FetchError::UpstreamHttp {
                    url: url.clone(),
                    status: 503,
                    reason: "Service Unavailable".into(),
                },
                503,
            ),
            (
                FetchError::Timeout {
                    url: url.clone(),
                    details: String::new(),
                },
                408,
            ),
            (
                FetchError::Network {
                    url: url.clone(),
                    details: String::new(),
                },
                502,
            ),
            (
                FetchError::Other {
                    url,
                    details: String::new(),
                },
                500,
            ),
        ];

        for (error, status) in cases {
            assert_eq!(error.status(), status, "{error}");
        }
    }

    #[test]
    fn invalid_url_body_carries_tip() {
        let error = FetchError::InvalidUrl {
            url: "ftp://example.com".into(),
            reason: InvalidUrlReason::UnsupportedProtocol,
        };
        let body = error.to_body();
        assert_eq!(body["error"], "Invalid URL: unsupported protocol");
        assert_eq!(body["tip"], "URL must include http:// or https://");
    }

    #[test]
    fn timeout_body_names_the_limit() {
        let error = FetchError::Timeout {
            url: "https://slow.example".into(),
            details: "deadline elapsed".into(),
        };
        let body = error.to_body();
        assert_eq!(body["error"], "Request timeout (15 seconds)");
        assert_eq!(body["url"], "https://slow.example");
    }

    #[test]
    fn unsupported_content_type_lists_supported() {
        let error = FetchError::UnsupportedContentType {
            url: "https://example.com/logo.png".into(),
            content_type: "image/png".into(),
        };
        let body = error.to_body();
        assert_eq!(body["error"], "Content type not supported: image/png");
        assert_eq!(body["supportedTypes"].as_array().unwrap().len(), 3);
    }
}
