//! Install and activate steps of the worker lifecycle.

use super::cache::CacheStore;
use super::{Network, WorkerRequest};
use crate::error::CacheError;
use log::{error, info, warn};

/// Which shell assets made it into the cache during install.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PrecacheReport {
    pub cached: Vec<String>,
    pub failed: Vec<(String, String)>,
}

impl PrecacheReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Fetch every asset into `generation`, one at a time. A single bad asset is
/// logged and skipped; only a failing cache store aborts the install.
pub async fn precache(
    assets: &[&str],
    generation: &str,
    network: &dyn Network,
    cache: &dyn CacheStore,
) -> Result<PrecacheReport, CacheError> {
    info!("Precaching app shell: {:?}", assets);
    let mut report = PrecacheReport::default();
    for &path in assets {
        let request = WorkerRequest::for_path(path);
        match network.fetch(&request).await {
            Ok(response) if response.is_success() => {
                cache.put(generation, &request, &response).await?;
                report.cached.push(path.to_string());
            }
            Ok(response) => {
                warn!("Shell asset {} answered {}", path, response.status);
                report
                    .failed
                    .push((path.to_string(), format!("status {}", response.status)));
            }
            Err(e) => {
                warn!("Failed to fetch shell asset {}: {}", path, e);
                report.failed.push((path.to_string(), e.to_string()));
            }
        }
    }
    if !report.is_complete() {
        error!(
            "Precached {} of {} shell assets",
            report.cached.len(),
            assets.len()
        );
    }
    Ok(report)
}

/// Delete every generation not named in `keep`. Returns what was deleted.
/// Safe to run again: a generation already gone is simply skipped.
pub async fn purge_stale_generations(
    keep: &[&str],
    cache: &dyn CacheStore,
) -> Result<Vec<String>, CacheError> {
    let mut deleted = Vec::new();
    for name in cache.generations().await? {
        if keep.contains(&name.as_str()) {
            continue;
        }
        info!("Deleting old cache: {}", name);
        if cache.delete(&name).await? {
            deleted.push(name);
        }
    }
    Ok(deleted)
}
