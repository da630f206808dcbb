//! Error types shared by the page engine and the service worker.
//!
//! Browser failures arrive as `JsValue`; they are flattened to strings at the
//! boundary so every error here is plain Rust data and usable in native tests.

use thiserror::Error;
use wasm_bindgen::JsValue;

/// Failure talking to the time service.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("network request failed: {0}")]
    Network(String),
    #[error("server responded with status {0}")]
    Status(u16),
    #[error("malformed response body: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("{0}")]
    Service(String),
}

/// Failure reading or writing the durable preference store.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("local storage is not available")]
    Unavailable,
    #[error("storage operation failed: {0}")]
    Js(String),
    #[error("could not encode preferences: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Failure inside the worker's cache storage.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache storage is not available")]
    Unavailable,
    #[error("cache operation failed: {0}")]
    Js(String),
}

/// A fetch issued by the worker was rejected before any response arrived.
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("fetch rejected: {0}")]
    Rejected(String),
}

/// Failure playing the jamaat cue.
#[derive(Debug, Error)]
pub enum CueError {
    #[error("audio element is not ready to play")]
    NotReady,
    #[error("audio playback failed: {0}")]
    Js(String),
}

/// Failure obtaining the device position. The messages are shown to the user
/// as they are.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LocationError {
    #[error("Geolocation is not supported by your browser.")]
    Unsupported,
    #[error("Error detecting location: {0}. Please enter manually.")]
    Failed(String),
}

/// Render a `JsValue` error for logs and error variants.
pub fn describe_js(value: &JsValue) -> String {
    value
        .as_string()
        .or_else(|| {
            js_sys::JSON::stringify(value)
                .ok()
                .and_then(|s| s.as_string())
        })
        .unwrap_or_else(|| format!("{:?}", value))
}
