//! Page-side transport to the time service.

use crate::error::{describe_js, FetchError};
use futures::future::LocalBoxFuture;
use serde::de::DeserializeOwned;
use url::form_urlencoded;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;

/// Status and body of a completed HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Decode a success body; a non-success status is an error even when the
    /// body is valid JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, FetchError> {
        if !self.is_success() {
            return Err(FetchError::Status(self.status));
        }
        Ok(serde_json::from_str(&self.body)?)
    }
}

/// Issues GET requests. A rejected request is an `Err`; any response that
/// arrives, whatever its status, is an `Ok`.
pub trait HttpClient {
    fn get<'a>(&'a self, url: &'a str) -> LocalBoxFuture<'a, Result<HttpResponse, FetchError>>;
}

/// `window.fetch`, routed through the service worker when one is active.
#[derive(Debug, Default, Clone, Copy)]
pub struct BrowserFetch;

impl BrowserFetch {
    async fn fetch_text(url: &str) -> Result<HttpResponse, FetchError> {
        let window = web_sys::window()
            .ok_or_else(|| FetchError::Network("no window available".into()))?;
        let response = JsFuture::from(window.fetch_with_str(url))
            .await
            .map_err(|e| FetchError::Network(describe_js(&e)))?;
        let response: web_sys::Response = response
            .dyn_into()
            .map_err(|e| FetchError::Network(describe_js(&e)))?;
        let text_promise = response
            .text()
            .map_err(|e| FetchError::Network(describe_js(&e)))?;
        let body = JsFuture::from(text_promise)
            .await
            .map_err(|e| FetchError::Network(describe_js(&e)))?
            .as_string()
            .unwrap_or_default();
        Ok(HttpResponse {
            status: response.status(),
            body,
        })
    }
}

impl HttpClient for BrowserFetch {
    fn get<'a>(&'a self, url: &'a str) -> LocalBoxFuture<'a, Result<HttpResponse, FetchError>> {
        Box::pin(Self::fetch_text(url))
    }
}

/// Append `key=value` pairs to `path` as a query string.
pub fn with_query(path: &str, params: &[(&str, String)]) -> String {
    if params.is_empty() {
        return path.to_string();
    }
    let query = form_urlencoded::Serializer::new(String::new())
        .extend_pairs(params.iter().map(|(k, v)| (*k, v.as_str())))
        .finish();
    format!("{}?{}", path, query)
}
