//! Console call recovery from `<script>` bodies
//!
//! Nothing is executed. Calls are matched as `console.<method>(<args>)` with the
//! argument text running to the first `)`, so nested parentheses truncate the
//! capture and calls built at runtime are missed.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::parser::count_console_references;
use crate::types::{AnalysisError, ConsoleCapture, ConsoleKind, ConsoleLogEntry, LogSource};

struct ScriptScanner {
    script_block: Regex,
    console_call: Regex,
}

impl ScriptScanner {
    fn compile() -> Result<Self, regex::Error> {
        Ok(Self {
            script_block: Regex::new(r"(?is)<script\b[^>]*>(.*?)</script>")?,
            console_call: Regex::new(r"(?i)console\.(log|warn|error|info|debug)\(([^)]+)\)")?,
        })
    }
}

static SCANNER: Lazy<Result<ScriptScanner, regex::Error>> = Lazy::new(ScriptScanner::compile);

/// Scan `html` for console calls inside script regions.
///
/// Returns an empty capture when `enabled` is false. Otherwise returns one
/// `script` entry per matched call in source order followed by one `system`
/// entry counting every `console.` reference in the document. A scanner that
/// cannot be built is reported in [`ConsoleCapture::errors`].
pub fn capture_console(html: &str, enabled: bool, now: DateTime<Utc>) -> ConsoleCapture {
    let mut capture = ConsoleCapture::default();
    if !enabled {
        return capture;
    }

    let scanner = match SCANNER.as_ref() {
        Ok(scanner) => scanner,
        Err(err) => {
            tracing::warn!(error = %err, "script scanner unavailable");
            capture
                .errors
                .push(AnalysisError::new(err.to_string(), now));
            return capture;
        }
    };

    for block in scanner.script_block.captures_iter(html) {
        let Some(body) = block.get(1) else {
            continue;
        };

        for call in scanner.console_call.captures_iter(body.as_str()) {
            let Some(kind) = ConsoleKind::from_method(&call[1]) else {
                continue;
            };
            capture.logs.push(ConsoleLogEntry {
                kind,
                timestamp: now,
                args: vec![call[2].trim().to_string()],
                source: LogSource::Script,
            });
        }
    }

    let references = count_console_references(html);
    capture.logs.push(ConsoleLogEntry {
        kind: ConsoleKind::Info,
        timestamp: now,
        args: vec![format!(
            "Script analysis only, no JavaScript was executed. Found {} console references.",
            references
        )],
        source: LogSource::System,
    });

    capture
}
