//! Cloudflare Worker for pagesource
//!
//! Translates Workers requests into `pagesource_core` calls. Outbound requests go
//! through the Workers `fetch` API raced against a timer; routing, validation and
//! analysis all live in the core crate.

use async_trait::async_trait;
use futures::future::{Either, select};
use pagesource_core::fetcher::{BROWSER_HEADERS, FETCH_TIMEOUT, canonical_reason};
use pagesource_core::{
    ApiReply, ApiRequest, FetchError, FetchResult, FetchTarget, Fetcher, RemoteResponse,
    ServiceConfig, handle_request,
};
use worker::*;

#[cfg(test)]
mod tests;

/// [`Fetcher`] over the Workers runtime `fetch`.
struct WorkerFetcher {
    /// Edge cache TTL in seconds, kept equal to the `Cache-Control` max-age
    cache_ttl: u32,
}

#[async_trait(?Send)]
impl Fetcher for WorkerFetcher {
    async fn fetch(&self, target: &FetchTarget) -> FetchResult<RemoteResponse> {
        let url = target.url();
        let request = build_request(url, self.cache_ttl).map_err(|e| FetchError::Other {
            url: url.to_string(),
            details: e.to_string(),
        })?;

        let controller = AbortController::default();
        let signal = controller.signal();

        let exchange = async {
            let mut response = Fetch::Request(request)
                .send_with_signal(&signal)
                .await
                .map_err(|e| FetchError::Network {
                    url: url.to_string(),
                    details: e.to_string(),
                })?;

            let status = response.status_code();
            let headers: Vec<(String, String)> = response.headers().entries().collect();
            let body = response.text().await.map_err(|e| FetchError::Other {
                url: url.to_string(),
                details: e.to_string(),
            })?;

            Ok(RemoteResponse::new(
                status,
                canonical_reason(status),
                headers,
                body,
            ))
        };

        // The timer covers headers and body together.
        match select(Box::pin(exchange), Box::pin(Delay::from(FETCH_TIMEOUT))).await {
            Either::Left((result, _)) => result,
            Either::Right(_) => {
                controller.abort();
                Err(FetchError::Timeout {
                    url: url.to_string(),
                    details: format!("no response within {} ms", FETCH_TIMEOUT.as_millis()),
                })
            }
        }
    }
}

fn build_request(url: &str, cache_ttl: u32) -> Result<Request> {
    let headers = Headers::new();
    for (name, value) in BROWSER_HEADERS {
        headers.set(name, value)?;
    }

    let mut init = RequestInit::new();
    init.with_method(Method::Get)
        .with_headers(headers)
        .with_redirect(RequestRedirect::Follow)
        .with_cf_properties(edge_cache_properties(cache_ttl));

    Request::new_with_init(url, &init)
}

/// Cloudflare `cf` options for outbound fetches: cache every response at the
/// edge for `cache_ttl` seconds, without Scrape Shield rewriting.
fn edge_cache_properties(cache_ttl: u32) -> CfProperties {
    CfProperties {
        cache_ttl: Some(cache_ttl),
        cache_everything: Some(true),
        scrape_shield: Some(false),
        polish: Some(PolishConfig::Lossy),
        ..CfProperties::default()
    }
}

/// Configuration from Worker vars (`SERVICE_NAME`, `CACHE_MAX_AGE`).
fn service_config(env: &Env) -> ServiceConfig {
    ServiceConfig::from_lookup(|key| env.var(key).ok().map(|var| var.to_string()))
}

/// One-line summary of a failed reply for the Workers log.
fn failure_summary(reply: &ApiReply) -> Option<String> {
    if reply.is_success() {
        return None;
    }

    let message = reply
        .body
        .as_ref()
        .and_then(|body| body.get("error"))
        .and_then(|error| error.as_str())
        .unwrap_or("no error message");

    Some(format!("{} {}", reply.status, message))
}

fn into_response(reply: ApiReply) -> Result<Response> {
    let headers = Headers::new();
    for (name, value) in &reply.headers {
        headers.set(name, value)?;
    }

    let response = if reply.body.is_some() {
        Response::ok(reply.body_string())?
    } else {
        Response::empty()?
    };

    Ok(response.with_headers(headers).with_status(reply.status))
}

#[event(fetch)]
async fn main(req: Request, env: Env, _ctx: Context) -> Result<Response> {
    console_error_panic_hook::set_once();

    let url = req.url()?;
    let method = req.method().to_string();
    console_log!("[Worker] {} {}", method, url.path());

    let config = service_config(&env);
    let request = ApiRequest {
        method: &method,
        path: url.path(),
        query: url.query(),
    };

    let fetcher = WorkerFetcher {
        cache_ttl: config.cache_max_age,
    };
    let reply = handle_request(&request, &fetcher, &config).await;
    if let Some(summary) = failure_summary(&reply) {
        console_error!("[Worker] {} -> {}", url.path(), summary);
    }

    into_response(reply)
}
