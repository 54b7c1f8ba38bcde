//! Common types used across pagesource

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Serialize, Serializer};

/// Console method a captured call used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsoleKind {
    Log,
    Warn,
    Error,
    Info,
    Debug,
}

impl ConsoleKind {
    /// Parse a method name, ignoring case.
    pub fn from_method(method: &str) -> Option<Self> {
        match method.to_ascii_lowercase().as_str() {
            "log" => Some(ConsoleKind::Log),
            "warn" => Some(ConsoleKind::Warn),
            "error" => Some(ConsoleKind::Error),
            "info" => Some(ConsoleKind::Info),
            "debug" => Some(ConsoleKind::Debug),
            _ => None,
        }
    }
}

/// Where a console entry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogSource {
    /// Matched inside a `<script>` region
    Script,
    /// Summary added by the extractor
    System,
}

/// A pseudo console entry recovered from page source text.
///
/// Entries are ordered by position in the source, which is not the order a
/// browser would print them in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConsoleLogEntry {
    #[serde(rename = "type")]
    pub kind: ConsoleKind,
    #[serde(serialize_with = "iso_millis")]
    pub timestamp: DateTime<Utc>,
    /// Raw, unevaluated argument text
    pub args: Vec<String>,
    pub source: LogSource,
}

/// Script analysis failure, reported as data rather than as a request error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalysisError {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub message: String,
    #[serde(serialize_with = "iso_millis")]
    pub timestamp: DateTime<Utc>,
}

impl AnalysisError {
    pub fn new(message: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            kind: "analysis_error",
            message: message.into(),
            timestamp,
        }
    }
}

/// Output of the script/console extractor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConsoleCapture {
    pub logs: Vec<ConsoleLogEntry>,
    pub errors: Vec<AnalysisError>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScriptCounts {
    pub total: usize,
    pub inline: usize,
    pub external: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ElementCounts {
    pub div: usize,
    pub img: usize,
    pub link: usize,
    pub script: usize,
    pub console: usize,
}

/// Lexically derived summary of an HTML document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub title: Option<String>,
    pub description: Option<String>,
    pub has_doctype: bool,
    pub scripts: ScriptCounts,
    pub element_count: ElementCounts,
}

/// `pageInfo` field: populated for HTML, `{}` otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum PageSummary {
    Html(PageInfo),
    NotHtml {},
}

impl PageSummary {
    pub fn page_info(&self) -> Option<&PageInfo> {
        match self {
            PageSummary::Html(info) => Some(info),
            PageSummary::NotHtml {} => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JavascriptReport {
    /// Whether the console extractor ran: the caller asked for it and the body
    /// is HTML. A JSON or plain-text fetch with `executeJs=true` reports
    /// `false` here and `true` in `has_console_capture`.
    pub executed: bool,
    pub console_logs: Vec<ConsoleLogEntry>,
    pub errors: Vec<AnalysisError>,
    /// Whether the caller asked for console capture
    pub has_console_capture: bool,
}

/// Successful fetch-and-analyze result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultEnvelope {
    pub success: bool,
    pub url: String,
    pub source: String,
    pub headers: BTreeMap<String, String>,
    pub content_type: String,
    pub status: u16,
    pub page_info: PageSummary,
    pub javascript: JavascriptReport,
    #[serde(serialize_with = "iso_millis")]
    pub fetched_at: DateTime<Utc>,
    /// Character count of `source`
    pub size: usize,
    /// UTF-8 byte length of `source`
    pub size_bytes: usize,
}

/// RFC 3339 with millisecond precision and a `Z` suffix.
pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn iso_millis<S: Serializer>(timestamp: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format_timestamp(timestamp))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn console_entry_serializes_with_wire_names() {
        let entry = ConsoleLogEntry {
            kind: ConsoleKind::Warn,
            timestamp: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
            args: vec!["'careful'".to_string()],
            source: LogSource::Script,
        };

        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["type"], "warn");
        assert_eq!(value["timestamp"], "2024-05-01T12:00:00.000Z");
        assert_eq!(value["args"][0], "'careful'");
        assert_eq!(value["source"], "script");
    }

    #[test]
    fn page_info_uses_camel_case() {
        let info = PageInfo {
            title: Some("T".into()),
            ..PageInfo::default()
        };
        let value = serde_json::to_value(PageSummary::Html(info)).unwrap();
        assert_eq!(value["title"], "T");
        assert_eq!(value["description"], serde_json::Value::Null);
        assert_eq!(value["hasDoctype"], false);
        assert_eq!(value["elementCount"]["div"], 0);
    }

    #[test]
    fn non_html_summary_is_an_empty_object() {
        let value = serde_json::to_value(PageSummary::NotHtml {}).unwrap();
        assert_eq!(value, serde_json::json!({}));
    }

    #[test]
    fn analysis_error_serializes_into_report() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let report = JavascriptReport {
            executed: true,
            console_logs: vec![],
            errors: vec![AnalysisError::new("regex parse error", at)],
            has_console_capture: true,
        };

        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(
            value["errors"],
            serde_json::json!([{
                "type": "analysis_error",
                "message": "regex parse error",
                "timestamp": "2024-05-01T12:00:00.000Z",
            }])
        );
        assert_eq!(value["consoleLogs"], serde_json::json!([]));
        assert_eq!(value["hasConsoleCapture"], true);
    }

    #[test]
    fn console_kind_ignores_case() {
        assert_eq!(ConsoleKind::from_method("LOG"), Some(ConsoleKind::Log));
        assert_eq!(ConsoleKind::from_method("Debug"), Some(ConsoleKind::Debug));
        assert_eq!(ConsoleKind::from_method("table"), None);
    }
}
