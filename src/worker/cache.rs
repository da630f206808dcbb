//! Named cache generations.
//!
//! A generation is one named bucket of request→response pairs, keyed by
//! [`WorkerRequest::cache_key`]. Opening a generation that does not exist
//! yet creates it, the same as `caches.open` does.

use super::{WorkerRequest, WorkerResponse};
use crate::error::CacheError;
use futures::future::LocalBoxFuture;
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};

pub trait CacheStore {
    /// Look `request` up in one generation only.
    fn lookup<'a>(
        &'a self,
        generation: &'a str,
        request: &'a WorkerRequest,
    ) -> LocalBoxFuture<'a, Result<Option<WorkerResponse>, CacheError>>;

    fn put<'a>(
        &'a self,
        generation: &'a str,
        request: &'a WorkerRequest,
        response: &'a WorkerResponse,
    ) -> LocalBoxFuture<'a, Result<(), CacheError>>;

    /// Names of all existing generations.
    fn generations(&self) -> LocalBoxFuture<'_, Result<Vec<String>, CacheError>>;

    /// Drop a generation. Returns `false` when it did not exist.
    fn delete<'a>(&'a self, generation: &'a str) -> LocalBoxFuture<'a, Result<bool, CacheError>>;
}

/// In-process cache storage, used by tests.
#[derive(Debug, Default)]
pub struct MemoryCache {
    generations: RefCell<BTreeMap<String, HashMap<String, WorkerResponse>>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries held by `generation`, if it exists.
    pub fn len_of(&self, generation: &str) -> Option<usize> {
        self.generations.borrow().get(generation).map(HashMap::len)
    }
}

impl CacheStore for MemoryCache {
    fn lookup<'a>(
        &'a self,
        generation: &'a str,
        request: &'a WorkerRequest,
    ) -> LocalBoxFuture<'a, Result<Option<WorkerResponse>, CacheError>> {
        let hit = self
            .generations
            .borrow()
            .get(generation)
            .and_then(|entries| entries.get(&request.cache_key()).cloned());
        Box::pin(async move { Ok(hit) })
    }

    fn put<'a>(
        &'a self,
        generation: &'a str,
        request: &'a WorkerRequest,
        response: &'a WorkerResponse,
    ) -> LocalBoxFuture<'a, Result<(), CacheError>> {
        self.generations
            .borrow_mut()
            .entry(generation.to_string())
            .or_default()
            .insert(request.cache_key(), response.clone());
        Box::pin(async { Ok(()) })
    }

    fn generations(&self) -> LocalBoxFuture<'_, Result<Vec<String>, CacheError>> {
        let names = self.generations.borrow().keys().cloned().collect();
        Box::pin(async move { Ok(names) })
    }

    fn delete<'a>(&'a self, generation: &'a str) -> LocalBoxFuture<'a, Result<bool, CacheError>> {
        let existed = self.generations.borrow_mut().remove(generation).is_some();
        Box::pin(async move { Ok(existed) })
    }
}
