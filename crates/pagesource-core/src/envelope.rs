//! Response assembly

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::console::capture_console;
use crate::fetcher::{ContentKind, RemoteResponse};
use crate::parser::extract_page_info;
use crate::types::{JavascriptReport, PageSummary, ResultEnvelope};
use crate::validator::FetchTarget;

/// Upstream headers echoed back to the caller. Everything else is dropped.
pub const SAFE_HEADERS: &[&str] = &[
    "content-type",
    "content-length",
    "last-modified",
    "etag",
    "cache-control",
    "expires",
    "date",
    "server",
    "x-powered-by",
];

/// Keep only [`SAFE_HEADERS`], matched case-insensitively.
pub fn filter_headers(headers: &BTreeMap<String, String>) -> BTreeMap<String, String> {
    headers
        .iter()
        .filter(|(name, _)| {
            SAFE_HEADERS
                .iter()
                .any(|safe| safe.eq_ignore_ascii_case(name))
        })
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect()
}

/// Run the extractors over an accepted response and build the envelope.
///
/// Page metadata is derived only for HTML. Console capture runs only when
/// `execute_js` is set and the content is HTML.
pub fn assemble_envelope(
    target: &FetchTarget,
    response: RemoteResponse,
    kind: ContentKind,
    execute_js: bool,
    now: DateTime<Utc>,
) -> ResultEnvelope {
    let is_html = kind.is_html();
    let source = response.body;

    let page_info = if is_html {
        PageSummary::Html(extract_page_info(&source))
    } else {
        PageSummary::NotHtml {}
    };

    let run_console = execute_js && is_html;
    let capture = capture_console(&source, run_console, now);

    ResultEnvelope {
        success: true,
        url: target.url().to_string(),
        headers: filter_headers(&response.headers),
        content_type: response.content_type,
        status: response.status,
        page_info,
        javascript: JavascriptReport {
            executed: run_console,
            console_logs: capture.logs,
            errors: capture.errors,
            has_console_capture: execute_js,
        },
        fetched_at: now,
        size: source.chars().count(),
        size_bytes: source.len(),
        source,
    }
}
