//! Page metadata extraction
//!
//! Everything here is lexical: patterns run over the raw text, so markup inside
//! comments or string literals is counted like any other.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::types::{ElementCounts, PageInfo, ScriptCounts};

static RE_TITLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<title>(.*?)</title>").expect("invalid title regex"));
static RE_DESCRIPTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)<meta\s+name="description"\s+content="(.*?)""#)
        .expect("invalid description regex")
});
static RE_DIV: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<div").expect("invalid div regex"));
static RE_IMG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<img").expect("invalid img regex"));
static RE_ANCHOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<a\s+").expect("invalid anchor regex"));
static RE_SCRIPT_OPEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<script\b[^>]*>").expect("invalid script tag regex"));
static RE_CONSOLE_REF: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)console\.").expect("invalid console regex"));

/// Derive a [`PageInfo`] from raw HTML. Never fails.
pub fn extract_page_info(html: &str) -> PageInfo {
    let scripts = classify_scripts(html);

    PageInfo {
        title: extract_title(html),
        description: extract_description(html),
        has_doctype: html.contains("<!DOCTYPE"),
        scripts,
        element_count: ElementCounts {
            div: RE_DIV.find_iter(html).count(),
            img: RE_IMG.find_iter(html).count(),
            link: RE_ANCHOR.find_iter(html).count(),
            script: scripts.total,
            console: count_console_references(html),
        },
    }
}

/// First `<title>` text, trimmed.
pub fn extract_title(html: &str) -> Option<String> {
    RE_TITLE
        .captures(html)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
}

/// First `<meta name="description" content="...">` value, trimmed.
pub fn extract_description(html: &str) -> Option<String> {
    RE_DESCRIPTION
        .captures(html)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
}

/// Count case-insensitive `console.` occurrences anywhere in the text.
pub fn count_console_references(text: &str) -> usize {
    RE_CONSOLE_REF.find_iter(text).count()
}

/// An opening script tag is inline unless it carries `src=`, ` defer` or ` async`.
fn classify_scripts(html: &str) -> ScriptCounts {
    let mut total = 0;
    let mut inline = 0;

    for tag in RE_SCRIPT_OPEN.find_iter(html) {
        total += 1;
        let tag = tag.as_str();
        if !tag.contains("src=") && !tag.contains(" defer") && !tag.contains(" async") {
            inline += 1;
        }
    }

    ScriptCounts {
        total,
        inline,
        external: total - inline,
    }
}
