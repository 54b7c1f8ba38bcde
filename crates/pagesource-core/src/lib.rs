//! # pagesource-core
//!
//! Core library for fetching a remote page server-side and describing it.
//!
//! This library provides:
//! - URL validation with a private-address guard against SSRF
//! - A transport-neutral fetch contract with status and content-type gating
//! - Lexical page metadata and console-call extraction (no DOM, no JS engine)
//! - The JSON envelope and the request router shared by all front ends
//!
//! ## Features
//!
//! - `default`: everything except a concrete transport
//! - `native-fetch`: [`ReqwestFetcher`] for native binaries
//!
//! ## Example
//!
//! ```
//! use pagesource_core::{extract_page_info, validate_target};
//!
//! let target = validate_target("https://example.com").unwrap();
//! assert_eq!(target.host(), "example.com");
//! assert!(validate_target("http://192.168.0.1/").is_err());
//!
//! let info = extract_page_info("<title>Hello</title><div></div>");
//! assert_eq!(info.title.as_deref(), Some("Hello"));
//! assert_eq!(info.element_count.div, 1);
//! ```

pub mod api;
pub mod config;
pub mod console;
pub mod envelope;
pub mod error;
pub mod fetcher;
pub mod parser;
pub mod types;
pub mod validator;

#[cfg(feature = "native-fetch")]
pub mod native;

// Re-export commonly used types
pub use api::{ApiReply, ApiRequest, FetchParams, handle_fetch, handle_request};
pub use config::ServiceConfig;
pub use error::{FetchError, FetchResult, InvalidUrlReason};
pub use fetcher::{ContentKind, Fetcher, RemoteResponse, fetch_checked};
pub use types::{ConsoleLogEntry, PageInfo, ResultEnvelope};
pub use validator::{FetchTarget, validate_target};

pub use console::capture_console;
pub use envelope::assemble_envelope;
pub use parser::extract_page_info;

#[cfg(feature = "native-fetch")]
pub use native::ReqwestFetcher;
