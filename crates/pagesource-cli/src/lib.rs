//! Command-line front end for pagesource
//!
//! Runs the same fetch pipeline as the `/api/fetch` endpoint once and renders the
//! JSON body it would return.

use anyhow::{Context, Result, anyhow};
use pagesource_core::{FetchParams, Fetcher, ServiceConfig, handle_fetch};
use serde_json::Value as JsonValue;

pub const APP_NAME: &str = "pagesource";
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// The full result envelope or error body
    Envelope,
    /// Only `pageInfo` of a successful envelope
    PageInfoOnly,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliOptions {
    pub url: String,
    pub execute_js: bool,
    pub compact: bool,
    pub mode: OutputMode,
}

#[derive(Debug, PartialEq, Eq)]
pub enum CliCommand {
    Run(CliOptions),
    Help,
    Version,
}

/// Rendered output and the process exit code for one run.
#[derive(Debug)]
pub struct Outcome {
    pub exit_code: u8,
    pub output: String,
}

pub fn parse_arguments(args: &[String]) -> Result<CliCommand> {
    if args.is_empty() {
        return Ok(CliCommand::Help);
    }

    let mut url: Option<String> = None;
    let mut execute_js = false;
    let mut compact = false;
    let mut mode = OutputMode::Envelope;

    for arg in args {
        match arg.as_str() {
            "-h" | "--help" => return Ok(CliCommand::Help),
            "-v" | "--version" => return Ok(CliCommand::Version),
            "-j" | "--execute-js" => execute_js = true,
            "-c" | "--compact" => compact = true,
            "-i" | "--page-info" => mode = OutputMode::PageInfoOnly,
            flag if flag.starts_with('-') => return Err(anyhow!("unknown flag: {flag}")),
            value => {
                if url.is_some() {
                    return Err(anyhow!("unexpected additional argument: {}", value));
                }
                url = Some(value.to_string());
            }
        }
    }

    let url = url.ok_or_else(|| anyhow!("missing <url> argument"))?;

    Ok(CliCommand::Run(CliOptions {
        url,
        execute_js,
        compact,
        mode,
    }))
}

pub fn help_text() -> String {
    format!(
        "{APP_NAME} - fetch a page's source and metadata as JSON\n\
         Usage: {APP_NAME} [OPTIONS] <URL>\n\n\
         Options:\n  \
         -j, --execute-js    Scan inline scripts for console calls\n  \
         -i, --page-info     Print only the pageInfo object\n  \
         -c, --compact       Print single-line JSON\n  \
         -v, --version       Show version information\n  \
         -h, --help          Show this help message"
    )
}

pub fn print_help() {
    println!("{}", help_text());
}

pub fn print_version() {
    println!("{APP_NAME} {VERSION}");
}

/// Fetch and analyze `options.url`, rendering whatever body the endpoint would.
///
/// Failures of the pipeline itself (blocked URL, upstream error, timeout) are not
/// errors here: their JSON body is rendered and the exit code is 1.
pub async fn run<F>(options: &CliOptions, fetcher: &F) -> Result<Outcome>
where
    F: Fetcher + ?Sized,
{
    let params = FetchParams {
        url: Some(options.url.clone()).filter(|url| !url.is_empty()),
        execute_js: options.execute_js,
    };

    let reply = handle_fetch(&params, fetcher, &ServiceConfig::default()).await;
    let success = reply.is_success();
    tracing::debug!(url = %options.url, status = reply.status, "pipeline finished");

    let mut body = reply.body.context("fetch reply carried no body")?;
    if success && options.mode == OutputMode::PageInfoOnly {
        body = body
            .get_mut("pageInfo")
            .map(JsonValue::take)
            .context("result envelope has no pageInfo")?;
    }

    let output = if options.compact {
        serde_json::to_string(&body)?
    } else {
        serde_json::to_string_pretty(&body)?
    };

    Ok(Outcome {
        exit_code: if success { 0 } else { 1 },
        output,
    })
}
