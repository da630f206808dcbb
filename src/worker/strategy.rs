//! Request classification and the per-class caching strategies.

use super::cache::CacheStore;
use super::{Network, WorkerRequest, WorkerResponse};
use crate::config::{API_CACHE_NAME, API_PATH_PREFIX, SHELL_ASSETS, SHELL_CACHE_NAME};
use crate::error::NetworkError;
use log::{debug, error, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestClass {
    Api,
    Shell,
    /// Left to the browser; the worker does not respond.
    Passthrough,
}

pub fn classify(request: &WorkerRequest) -> RequestClass {
    if request.path.starts_with(API_PATH_PREFIX) {
        RequestClass::Api
    } else if SHELL_ASSETS.contains(&request.path.as_str())
        || request.destination.is_static_asset()
    {
        RequestClass::Shell
    } else {
        RequestClass::Passthrough
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    NetworkFirst { generation: &'static str },
    CacheFirst { generation: &'static str },
    Passthrough,
}

/// Maps each request class to a strategy and its cache generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StrategyTable {
    pub shell_generation: &'static str,
    pub api_generation: &'static str,
}

impl Default for StrategyTable {
    fn default() -> Self {
        Self {
            shell_generation: SHELL_CACHE_NAME,
            api_generation: API_CACHE_NAME,
        }
    }
}

impl StrategyTable {
    pub fn strategy_for(&self, class: RequestClass) -> Strategy {
        match class {
            RequestClass::Api => Strategy::NetworkFirst {
                generation: self.api_generation,
            },
            RequestClass::Shell => Strategy::CacheFirst {
                generation: self.shell_generation,
            },
            RequestClass::Passthrough => Strategy::Passthrough,
        }
    }

    /// Strategy for an intercepted request, or `None` when the worker should
    /// not respond at all.
    pub fn route(&self, request: &WorkerRequest) -> Option<Strategy> {
        match self.strategy_for(classify(request)) {
            Strategy::Passthrough => None,
            strategy => Some(strategy),
        }
    }

    /// The generation names that survive activation.
    pub fn live_generations(&self) -> [&'static str; 2] {
        [self.shell_generation, self.api_generation]
    }
}

impl Strategy {
    pub async fn execute(
        self,
        request: &WorkerRequest,
        network: &dyn Network,
        cache: &dyn CacheStore,
    ) -> Result<WorkerResponse, NetworkError> {
        match self {
            Strategy::NetworkFirst { generation } => {
                Ok(network_first(request, generation, network, cache).await)
            }
            Strategy::CacheFirst { generation } => {
                cache_first(request, generation, network, cache).await
            }
            Strategy::Passthrough => network.fetch(request).await,
        }
    }
}

/// Live response when reachable (successes are copied into `generation`),
/// else the cached copy, else a synthesized 503.
pub async fn network_first(
    request: &WorkerRequest,
    generation: &str,
    network: &dyn Network,
    cache: &dyn CacheStore,
) -> WorkerResponse {
    match network.fetch(request).await {
        Ok(response) => {
            if response.is_success() {
                debug!("Caching API response for: {}", request.url);
                if let Err(e) = cache.put(generation, request, &response).await {
                    warn!("Could not cache API response for {}: {}", request.url, e);
                }
            }
            response
        }
        Err(e) => {
            debug!("Network failed for API ({}), trying cache for: {}", e, request.url);
            match cache.lookup(generation, request).await {
                Ok(Some(cached)) => cached,
                Ok(None) => {
                    warn!("API request not in cache and network failed: {}", request.url);
                    WorkerResponse::offline_error()
                }
                Err(e) => {
                    error!("API cache lookup failed for {}: {}", request.url, e);
                    WorkerResponse::offline_error()
                }
            }
        }
    }
}

/// Cached copy when present; otherwise the network response, which is not
/// added to the cache.
pub async fn cache_first(
    request: &WorkerRequest,
    generation: &str,
    network: &dyn Network,
    cache: &dyn CacheStore,
) -> Result<WorkerResponse, NetworkError> {
    match cache.lookup(generation, request).await {
        Ok(Some(cached)) => return Ok(cached),
        Ok(None) => {}
        Err(e) => warn!("Shell cache lookup failed for {}: {}", request.url, e),
    }
    network.fetch(request).await.map_err(|e| {
        error!("Error fetching shell asset {}: {}", request.url, e);
        e
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::worker::Destination;

    #[test]
    fn classification_by_path_and_destination() {
        let api = WorkerRequest::new("https://x/api/live_data?x=1", "/api/live_data", Destination::Other);
        let shell = WorkerRequest::new("https://x/settings", "/settings", Destination::Document);
        let font = WorkerRequest::new("https://x/f.woff", "/f.woff", Destination::Font);
        let other = WorkerRequest::new("https://x/about", "/about", Destination::Document);

        assert_eq!(classify(&api), RequestClass::Api);
        assert_eq!(classify(&shell), RequestClass::Shell);
        assert_eq!(classify(&font), RequestClass::Shell);
        assert_eq!(classify(&other), RequestClass::Passthrough);
    }

    #[test]
    fn api_prefix_wins_over_destination() {
        let request = WorkerRequest::new("https://x/api/img", "/api/img", Destination::Image);
        assert_eq!(classify(&request), RequestClass::Api);
    }

    #[test]
    fn table_routes_classes() {
        let table = StrategyTable::default();
        assert_eq!(
            table.strategy_for(RequestClass::Api),
            Strategy::NetworkFirst { generation: "prayer-times-api-cache-v1" }
        );
        assert_eq!(
            table.strategy_for(RequestClass::Shell),
            Strategy::CacheFirst { generation: "prayer-times-global-cache-v1" }
        );
        assert_eq!(table.route(&WorkerRequest::for_path("/about")), None);
    }

    #[test]
    fn offline_error_carries_json_error_field() {
        let response = WorkerResponse::offline_error();
        assert_eq!(response.status, 503);
        let body: serde_json::Value = serde_json::from_slice(&response.body).unwrap();
        assert_eq!(body["error"], "Offline and data not in cache");
    }
}
