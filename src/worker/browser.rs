//! `web-sys` bindings for the service worker: `fetch`, `CacheStorage`, and
//! the install/activate/fetch event listeners.

use super::cache::CacheStore;
use super::lifecycle::{precache, purge_stale_generations};
use super::strategy::StrategyTable;
use super::{Destination, Network, WorkerRequest, WorkerResponse};
use crate::config::SHELL_ASSETS;
use crate::error::{describe_js, CacheError, NetworkError};
use futures::future::LocalBoxFuture;
use js_sys::{Array, Uint8Array};
use log::{debug, error, info, warn};
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::{future_to_promise, JsFuture};
use web_sys::{
    Cache, CacheStorage, ExtendableEvent, FetchEvent, Headers, Request, RequestDestination,
    Response, ResponseInit, ServiceWorkerGlobalScope, Url,
};

fn js_cache_error(e: JsValue) -> CacheError {
    CacheError::Js(describe_js(&e))
}

fn js_network_error(e: JsValue) -> NetworkError {
    NetworkError::Rejected(describe_js(&e))
}

fn to_js_error(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

fn destination_of(request: &Request) -> Destination {
    match request.destination() {
        RequestDestination::Document => Destination::Document,
        RequestDestination::Font => Destination::Font,
        RequestDestination::Style => Destination::Style,
        RequestDestination::Script => Destination::Script,
        RequestDestination::Image => Destination::Image,
        _ => Destination::Other,
    }
}

/// Reduce a same-origin GET to a [`WorkerRequest`]. Anything else is left
/// to the browser.
fn to_worker_request(request: &Request, origin: &str) -> Option<WorkerRequest> {
    if request.method() != "GET" {
        return None;
    }
    let url = request.url();
    let parsed = Url::new(&url).ok()?;
    if parsed.origin() != origin {
        return None;
    }
    Some(
        WorkerRequest::new(url, parsed.pathname(), destination_of(request))
            .with_handle(Clone::clone(request)),
    )
}

/// Wrap a browser response without reading its body.
fn from_web_response(response: Response) -> WorkerResponse {
    WorkerResponse {
        status: response.status(),
        status_text: response.status_text(),
        content_type: response.headers().get("content-type").ok().flatten(),
        body: Vec::new(),
        handle: Some(response),
    }
}

/// The browser response behind `response`, or a new one built from its parts.
fn to_web_response(response: WorkerResponse) -> Result<Response, JsValue> {
    if let Some(handle) = response.handle {
        return Ok(handle);
    }
    let init = ResponseInit::new();
    init.set_status(response.status);
    init.set_status_text(&response.status_text);
    let headers = Headers::new()?;
    if let Some(content_type) = &response.content_type {
        headers.set("content-type", content_type)?;
    }
    init.set_headers(&JsValue::from(headers));
    // Null-body statuses (204, 304, ...) reject any body, even an empty one.
    if response.body.is_empty() {
        return Response::new_with_opt_buffer_source_and_init(None, &init);
    }
    let body = Uint8Array::from(response.body.as_slice());
    let body: &js_sys::Object = &body;
    Response::new_with_opt_buffer_source_and_init(Some(body), &init)
}

/// `fetch` from the worker's global scope.
pub struct BrowserNetwork {
    scope: ServiceWorkerGlobalScope,
}

impl BrowserNetwork {
    pub fn new(scope: ServiceWorkerGlobalScope) -> Self {
        Self { scope }
    }
}

impl Network for BrowserNetwork {
    fn fetch<'a>(
        &'a self,
        request: &'a WorkerRequest,
    ) -> LocalBoxFuture<'a, Result<WorkerResponse, NetworkError>> {
        Box::pin(async move {
            let promise = match &request.handle {
                Some(handle) => self.scope.fetch_with_request(handle),
                None => self.scope.fetch_with_str(&request.url),
            };
            let response = JsFuture::from(promise).await.map_err(js_network_error)?;
            let response: Response = response.dyn_into().map_err(js_network_error)?;
            Ok(from_web_response(response))
        })
    }
}

/// The worker's `CacheStorage`.
pub struct BrowserCache {
    storage: CacheStorage,
}

impl BrowserCache {
    pub fn new(scope: &ServiceWorkerGlobalScope) -> Result<Self, CacheError> {
        let storage = scope.caches().map_err(|_| CacheError::Unavailable)?;
        Ok(Self { storage })
    }

    async fn open(&self, generation: &str) -> Result<Cache, CacheError> {
        JsFuture::from(self.storage.open(generation))
            .await
            .map_err(js_cache_error)?
            .dyn_into::<Cache>()
            .map_err(js_cache_error)
    }
}

impl CacheStore for BrowserCache {
    fn lookup<'a>(
        &'a self,
        generation: &'a str,
        request: &'a WorkerRequest,
    ) -> LocalBoxFuture<'a, Result<Option<WorkerResponse>, CacheError>> {
        Box::pin(async move {
            let cache = self.open(generation).await?;
            let hit = JsFuture::from(cache.match_with_str(&request.cache_key()))
                .await
                .map_err(js_cache_error)?;
            if hit.is_undefined() || hit.is_null() {
                return Ok(None);
            }
            let response: Response = hit.dyn_into().map_err(js_cache_error)?;
            Ok(Some(from_web_response(response)))
        })
    }

    fn put<'a>(
        &'a self,
        generation: &'a str,
        request: &'a WorkerRequest,
        response: &'a WorkerResponse,
    ) -> LocalBoxFuture<'a, Result<(), CacheError>> {
        Box::pin(async move {
            let cache = self.open(generation).await?;
            // The cache takes a copy; the original body still goes to the page.
            let web_response = match &response.handle {
                Some(handle) => Response::clone(handle),
                None => to_web_response(response.clone()),
            }
            .map_err(js_cache_error)?;
            JsFuture::from(cache.put_with_str(&request.cache_key(), &web_response))
                .await
                .map_err(js_cache_error)?;
            Ok(())
        })
    }

    fn generations(&self) -> LocalBoxFuture<'_, Result<Vec<String>, CacheError>> {
        Box::pin(async move {
            let keys = JsFuture::from(self.storage.keys())
                .await
                .map_err(js_cache_error)?;
            Ok(Array::from(&keys)
                .iter()
                .filter_map(|name| name.as_string())
                .collect())
        })
    }

    fn delete<'a>(&'a self, generation: &'a str) -> LocalBoxFuture<'a, Result<bool, CacheError>> {
        Box::pin(async move {
            let deleted = JsFuture::from(self.storage.delete(generation))
                .await
                .map_err(js_cache_error)?;
            Ok(deleted.as_bool().unwrap_or(false))
        })
    }
}

fn global_scope() -> Result<ServiceWorkerGlobalScope, JsValue> {
    js_sys::global()
        .dyn_into::<ServiceWorkerGlobalScope>()
        .map_err(JsValue::from)
}

/// Attach the install, activate and fetch listeners to the worker scope.
pub fn register() -> Result<(), JsValue> {
    let scope = global_scope()?;
    let origin = scope.location().origin();
    let network = Rc::new(BrowserNetwork::new(scope.clone()));
    let cache = Rc::new(BrowserCache::new(&scope).map_err(to_js_error)?);
    let table = StrategyTable::default();

    let on_install = {
        let scope = scope.clone();
        let network = network.clone();
        let cache = cache.clone();
        Closure::<dyn FnMut(ExtendableEvent)>::new(move |event: ExtendableEvent| {
            info!("[Service Worker] Install event");
            let network = network.clone();
            let cache = cache.clone();
            let work = future_to_promise(async move {
                let report = precache(SHELL_ASSETS, table.shell_generation, &*network, &*cache)
                    .await
                    .map_err(to_js_error)?;
                info!(
                    "[Service Worker] Precached {} shell assets ({} failed)",
                    report.cached.len(),
                    report.failed.len()
                );
                Ok(JsValue::UNDEFINED)
            });
            if let Err(e) = event.wait_until(&work) {
                error!("[Service Worker] install waitUntil failed: {}", describe_js(&e));
            }
            if let Err(e) = scope.skip_waiting() {
                warn!("[Service Worker] skipWaiting failed: {}", describe_js(&e));
            }
        })
    };

    let on_activate = {
        let scope = scope.clone();
        let cache = cache.clone();
        Closure::<dyn FnMut(ExtendableEvent)>::new(move |event: ExtendableEvent| {
            info!("[Service Worker] Activate event");
            let scope = scope.clone();
            let cache = cache.clone();
            let work = future_to_promise(async move {
                let deleted = purge_stale_generations(&table.live_generations(), &*cache)
                    .await
                    .map_err(to_js_error)?;
                debug!("[Service Worker] Removed {} stale caches", deleted.len());
                JsFuture::from(scope.clients().claim()).await?;
                Ok(JsValue::UNDEFINED)
            });
            if let Err(e) = event.wait_until(&work) {
                error!("[Service Worker] activate waitUntil failed: {}", describe_js(&e));
            }
        })
    };

    let on_fetch = Closure::<dyn FnMut(FetchEvent)>::new(move |event: FetchEvent| {
        let Some(request) = to_worker_request(&event.request(), &origin) else {
            return;
        };
        let Some(strategy) = table.route(&request) else {
            return;
        };
        let network = network.clone();
        let cache = cache.clone();
        let response = future_to_promise(async move {
            match strategy.execute(&request, &*network, &*cache).await {
                Ok(response) => to_web_response(response).map(JsValue::from),
                Err(_) => Ok(Response::error().into()),
            }
        });
        if let Err(e) = event.respond_with(&response) {
            error!("[Service Worker] respondWith failed: {}", describe_js(&e));
        }
    });

    scope.add_event_listener_with_callback("install", on_install.as_ref().unchecked_ref())?;
    scope.add_event_listener_with_callback("activate", on_activate.as_ref().unchecked_ref())?;
    scope.add_event_listener_with_callback("fetch", on_fetch.as_ref().unchecked_ref())?;
    // The listeners live as long as the worker.
    on_install.forget();
    on_activate.forget();
    on_fetch.forget();
    Ok(())
}
