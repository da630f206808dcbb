//! Request routing for the service worker.
//!
//! Everything here except [`browser`] is plain Rust over the [`Network`] and
//! [`cache::CacheStore`] traits, so the routing policy runs in unit tests
//! without a browser.

pub mod browser;
pub mod cache;
pub mod lifecycle;
pub mod strategy;

use crate::config::OFFLINE_ERROR_MESSAGE;
use crate::error::NetworkError;
use futures::future::LocalBoxFuture;
use url::Url;

/// Resolves relative request URLs when deriving cache keys.
const KEY_BASE: &str = "http://localhost/";

/// What the page intends to do with a fetched resource.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Destination {
    Document,
    Font,
    Style,
    Script,
    Image,
    #[default]
    Other,
}

impl Destination {
    /// Static asset types that are always served cache-first.
    pub fn is_static_asset(self) -> bool {
        matches!(
            self,
            Destination::Font | Destination::Style | Destination::Script | Destination::Image
        )
    }
}

/// An intercepted request, reduced to what routing needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerRequest {
    /// As the page asked for it: absolute, or a path for precache requests.
    pub url: String,
    pub path: String,
    pub destination: Destination,
    /// The browser's own request, when there is one. The network refetches it
    /// as-is so its headers, mode, credentials and redirect mode survive.
    pub handle: Option<web_sys::Request>,
}

impl WorkerRequest {
    pub fn new(url: impl Into<String>, path: impl Into<String>, destination: Destination) -> Self {
        Self {
            url: url.into(),
            path: path.into(),
            destination,
            handle: None,
        }
    }

    /// Same-origin request for `path`.
    pub fn for_path(path: &str) -> Self {
        Self::new(path, path, Destination::Other)
    }

    pub fn with_handle(mut self, handle: web_sys::Request) -> Self {
        self.handle = Some(handle);
        self
    }

    /// Path plus query. Every cache store keys entries by this, so a
    /// precached path and the absolute URL of the same page share an entry.
    /// Only same-origin requests reach the cache, so the origin is dropped.
    pub fn cache_key(&self) -> String {
        match Url::parse(KEY_BASE).and_then(|base| base.join(&self.url)) {
            Ok(resolved) => match resolved.query() {
                Some(query) => format!("{}?{}", resolved.path(), query),
                None => resolved.path().to_string(),
            },
            Err(_) => self.url.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkerResponse {
    pub status: u16,
    pub status_text: String,
    pub content_type: Option<String>,
    /// Only filled for responses built in Rust. A browser response keeps its
    /// body inside `handle`.
    pub body: Vec<u8>,
    /// The browser's own response; handed back to the page unchanged.
    pub handle: Option<web_sys::Response>,
}

impl WorkerResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// The 503 JSON answer for an API request that is neither reachable nor
    /// cached.
    pub fn offline_error() -> Self {
        let body = serde_json::json!({ "error": OFFLINE_ERROR_MESSAGE }).to_string();
        Self {
            status: 503,
            status_text: OFFLINE_ERROR_MESSAGE.to_string(),
            content_type: Some("application/json".to_string()),
            body: body.into_bytes(),
            handle: None,
        }
    }
}

/// The worker's view of `fetch`.
pub trait Network {
    fn fetch<'a>(
        &'a self,
        request: &'a WorkerRequest,
    ) -> LocalBoxFuture<'a, Result<WorkerResponse, NetworkError>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_key_ignores_the_origin() {
        let relative = WorkerRequest::for_path("/settings");
        let absolute =
            WorkerRequest::new("https://prayer.example/settings", "/settings", Destination::Document);
        assert_eq!(relative.cache_key(), "/settings");
        assert_eq!(absolute.cache_key(), relative.cache_key());

        let api = WorkerRequest::new(
            "https://prayer.example/api/live_data?time_format=12h",
            "/api/live_data",
            Destination::Other,
        );
        assert_eq!(api.cache_key(), "/api/live_data?time_format=12h");
        assert_eq!(
            WorkerRequest::for_path("/api/live_data?time_format=24h").cache_key(),
            "/api/live_data?time_format=24h"
        );
    }
}
