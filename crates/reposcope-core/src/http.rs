//! A shared, cache-and-retry-configured HTTP client builder.
//!
//! Every external registry client (GitHub, Go module proxy, OSV, crates.io,
//! npm, Maven Central, NuGet, PyPI) is built from this one helper:
//! `reqwest`'s built-in retry classifier for 5xx/transport errors (terminal
//! on 4xx), wrapped with `http-cache-reqwest` response caching.

use camino::Utf8Path;
use http_cache_reqwest::{CACacheManager, Cache, CacheMode, CacheOptions, HttpCache, HttpCacheOptions};
use reqwest::retry;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};

pub const REPOSCOPE_AGENT: &str = concat!("reposcope/", env!("CARGO_PKG_VERSION"));

/// Builds an HTTP client that retries transient (5xx/transport) failures up
/// to `max_retries` times and caches responses under `cache_dir`.
///
/// `host` scopes the retry policy the way `reqwest::retry::for_host` wants
/// it; pass the bare hostname being called (e.g. `"api.github.com"`).
pub fn build_client(
    host: &str,
    cache_dir: &Utf8Path,
    max_retries: u32,
    default_headers: reqwest::header::HeaderMap,
) -> ClientWithMiddleware {
    let inner = reqwest::Client::builder()
        .user_agent(REPOSCOPE_AGENT)
        .default_headers(default_headers)
        .retry(
            retry::for_host(host.to_string())
                .max_retries_per_request(max_retries)
                .no_budget()
                .classify_fn(|req_rep| match req_rep.status() {
                    Some(status) if status.is_client_error() => req_rep.success(),
                    Some(status) if status.is_server_error() => req_rep.retryable(),
                    Some(_) => req_rep.success(),
                    // Transport-level failures (no status at all) are retried.
                    None => req_rep.retryable(),
                }),
        )
        .build()
        .expect("couldn't build HTTP client");

    ClientBuilder::new(inner)
        .with(Cache(HttpCache {
            mode: CacheMode::Default,
            manager: CACacheManager {
                path: cache_dir.into(),
            },
            options: HttpCacheOptions {
                cache_options: Some(CacheOptions {
                    shared: false,
                    ..Default::default()
                }),
                ..Default::default()
            },
        }))
        .build()
}

/// A client-side cap on distinct external targets a single ecosystem check
/// may contact in one run (the per-ecosystem call cap).
pub struct TargetCap {
    remaining: std::sync::atomic::AtomicUsize,
}

impl TargetCap {
    pub fn new(limit: usize) -> Self {
        Self {
            remaining: std::sync::atomic::AtomicUsize::new(limit),
        }
    }

    /// Attempts to consume one unit of the cap. Returns `false` once
    /// exhausted; callers should stop issuing new requests for this
    /// ecosystem when that happens, recording that the cap was hit in
    /// their metrics document.
    pub fn try_consume(&self) -> bool {
        self.remaining
            .fetch_update(
                std::sync::atomic::Ordering::SeqCst,
                std::sync::atomic::Ordering::SeqCst,
                |n| n.checked_sub(1),
            )
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_cap_exhausts() {
        let cap = TargetCap::new(2);
        assert!(cap.try_consume());
        assert!(cap.try_consume());
        assert!(!cap.try_consume());
    }
}
