//! Request routing shared by every front end
//!
//! Front ends translate their native request into an [`ApiRequest`], call
//! [`handle_request`] with a [`Fetcher`], and write the returned [`ApiReply`]
//! back out unchanged.

use chrono::Utc;
use serde_json::{Value as JsonValue, json};

use crate::config::ServiceConfig;
use crate::envelope::assemble_envelope;
use crate::error::FetchError;
use crate::fetcher::{Fetcher, fetch_checked};
use crate::types::format_timestamp;
use crate::validator::validate_target;

/// Routes that serve the fetch-and-analyze pipeline.
pub const FETCH_PATHS: &[&str] = &["/api/fetch", "/fetch"];

/// Routes that serve the liveness check.
pub const HEALTH_PATHS: &[&str] = &["/health", "/api/health"];

/// Transport-neutral view of an incoming request.
#[derive(Debug, Clone, Copy)]
pub struct ApiRequest<'a> {
    pub method: &'a str,
    pub path: &'a str,
    /// Raw query string without the leading `?`
    pub query: Option<&'a str>,
}

/// Transport-neutral response. `body` is `None` only for CORS preflight.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiReply {
    pub status: u16,
    pub headers: Vec<(&'static str, String)>,
    pub body: Option<JsonValue>,
}

impl ApiReply {
    fn json(status: u16, body: JsonValue) -> Self {
        Self {
            status,
            headers: vec![
                ("Content-Type", "application/json".to_string()),
                ("Access-Control-Allow-Origin", "*".to_string()),
            ],
            body: Some(body),
        }
    }

    fn preflight() -> Self {
        Self {
            status: 200,
            headers: vec![
                ("Access-Control-Allow-Origin", "*".to_string()),
                ("Access-Control-Allow-Methods", "GET, POST, OPTIONS".to_string()),
                ("Access-Control-Allow-Headers", "Content-Type".to_string()),
            ],
            body: None,
        }
    }

    fn error(err: &FetchError) -> Self {
        Self::json(err.status(), err.to_body())
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Serialized body, empty for preflight.
    pub fn body_string(&self) -> String {
        self.body
            .as_ref()
            .map(JsonValue::to_string)
            .unwrap_or_default()
    }
}

/// Query parameters of the fetch route.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchParams {
    pub url: Option<String>,
    /// Only the literal `true` enables console capture
    pub execute_js: bool,
}

impl FetchParams {
    pub fn from_query(query: Option<&str>) -> Self {
        let mut params = Self::default();
        let Some(query) = query else {
            return params;
        };

        // First occurrence of each key wins.
        let mut seen_url = false;
        let mut seen_execute_js = false;
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            match &*key {
                "url" if !seen_url => {
                    seen_url = true;
                    params.url = Some(value.into_owned()).filter(|v| !v.is_empty());
                }
                "executeJs" if !seen_execute_js => {
                    seen_execute_js = true;
                    params.execute_js = value == "true";
                }
                _ => {}
            }
        }

        params
    }
}

/// Dispatch one request.
pub async fn handle_request<F>(request: &ApiRequest<'_>, fetcher: &F, config: &ServiceConfig) -> ApiReply
where
    F: Fetcher + ?Sized,
{
    if request.method.eq_ignore_ascii_case("OPTIONS") {
        return ApiReply::preflight();
    }

    let path = request.path;
    if FETCH_PATHS.contains(&path) {
        let params = FetchParams::from_query(request.query);
        return handle_fetch(&params, fetcher, config).await;
    }

    if HEALTH_PATHS.contains(&path) {
        return health(config);
    }

    if path == "/" {
        return descriptor(config);
    }

    not_found(path)
}

/// Validate, fetch, analyze and wrap one target.
pub async fn handle_fetch<F>(params: &FetchParams, fetcher: &F, config: &ServiceConfig) -> ApiReply
where
    F: Fetcher + ?Sized,
{
    let Some(url) = params.url.as_deref() else {
        return ApiReply::json(
            400,
            json!({
                "error": "No URL provided. Use ?url=https://example.com",
                "example": "/api/fetch?url=https://example.com",
            }),
        );
    };

    let target = match validate_target(url) {
        Ok(target) => target,
        Err(err) => return ApiReply::error(&err),
    };

    let (response, kind) = match fetch_checked(fetcher, &target).await {
        Ok(checked) => checked,
        Err(err) => return ApiReply::error(&err),
    };

    let envelope = assemble_envelope(&target, response, kind, params.execute_js, Utc::now());
    for error in &envelope.javascript.errors {
        tracing::warn!(url = target.url(), message = %error.message, "script analysis degraded");
    }

    let body = match serde_json::to_value(&envelope) {
        Ok(body) => body,
        Err(err) => {
            return ApiReply::error(&FetchError::Other {
                url: target.url().to_string(),
                details: err.to_string(),
            });
        }
    };

    let mut reply = ApiReply::json(200, body);
    reply.headers.push((
        "Cache-Control",
        format!("public, max-age={}", config.cache_max_age),
    ));
    reply.headers.push(("X-Robots-Tag", "noindex".to_string()));
    reply
}

fn health(config: &ServiceConfig) -> ApiReply {
    ApiReply::json(
        200,
        json!({
            "status": "ok",
            "timestamp": format_timestamp(&Utc::now()),
            "service": config.service_name,
        }),
    )
}

fn descriptor(config: &ServiceConfig) -> ApiReply {
    ApiReply::json(
        200,
        json!({
            "name": config.service_name,
            "version": config.version,
            "endpoints": {
                "fetch": "/api/fetch?url=WEBSITE_URL&executeJs=true",
                "health": "/api/health",
            },
            "description": "Fetch website HTML source and analyze its scripts",
            "documentation": "See the repository README for details",
        }),
    )
}

fn not_found(path: &str) -> ApiReply {
    ApiReply::json(
        404,
        json!({
            "error": "Not found",
            "path": path,
            "available_endpoints": ["/api/fetch", "/health"],
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_fetch_params() {
        let params = FetchParams::from_query(Some(
            "url=https%3A%2F%2Fexample.com%2Fa%3Fb%3Dc&executeJs=true",
        ));
        assert_eq!(params.url.as_deref(), Some("https://example.com/a?b=c"));
        assert!(params.execute_js);
    }

    #[test]
    fn execute_js_requires_literal_true() {
        for query in ["executeJs=TRUE", "executeJs=1", "executeJs=", "executeJs"] {
            assert!(!FetchParams::from_query(Some(query)).execute_js, "{query}");
        }
    }

    #[test]
    fn empty_or_missing_url_is_none() {
        assert_eq!(FetchParams::from_query(None), FetchParams::default());
        assert_eq!(FetchParams::from_query(Some("url=")).url, None);
        assert_eq!(FetchParams::from_query(Some("other=1")).url, None);
    }

    #[test]
    fn first_url_param_wins() {
        let params = FetchParams::from_query(Some("url=https://a.example&url=https://b.example"));
        assert_eq!(params.url.as_deref(), Some("https://a.example"));
    }

    #[test]
    fn first_execute_js_param_wins() {
        assert!(FetchParams::from_query(Some("executeJs=true&executeJs=false")).execute_js);
        assert!(!FetchParams::from_query(Some("executeJs=false&executeJs=true")).execute_js);
    }

    #[test]
    fn reply_header_lookup_ignores_case() {
        let reply = ApiReply::json(200, json!({}));
        assert_eq!(reply.header("content-type"), Some("application/json"));
        assert_eq!(reply.header("ACCESS-CONTROL-ALLOW-ORIGIN"), Some("*"));
        assert_eq!(reply.header("x-missing"), None);
    }
}
