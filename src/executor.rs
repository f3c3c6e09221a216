//! Fallback Executor
//!
//! Resolves a cache key by serving a fresh cache entry, running the upstream
//! fetch, or synthesizing data when the fetch fails. The executor never
//! returns an error.
//!
//! Concurrent misses for the same key can be coalesced so that only one
//! upstream fetch is in flight per key.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tokio::sync::{watch, RwLock};
use tracing::{debug, error, warn};

use crate::cache::{CacheKey, CacheStore, Source};
use crate::error::Result;

/// Shared handle to the cache store.
pub type SharedStore = Arc<RwLock<CacheStore>>;

type Published = Option<(Value, Source)>;
type Registry = Arc<Mutex<HashMap<CacheKey, watch::Receiver<Published>>>>;

// == Resolved ==
/// A resolved value together with where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved<T> {
    pub value: T,
    pub source: Source,
}

// == Fallback Executor ==
#[derive(Debug, Clone)]
pub struct FallbackExecutor {
    store: SharedStore,
    in_flight: Registry,
    coalesce: bool,
}

enum Flight {
    Leader(FlightGuard),
    Follower(watch::Receiver<Published>),
}

/// Registration of an in-flight fetch. Dropping it unregisters the key;
/// waiters that never saw a published value then resolve on their own.
struct FlightGuard {
    key: CacheKey,
    registry: Registry,
    tx: watch::Sender<Published>,
}

impl FlightGuard {
    fn publish(self, value: Value, source: Source) {
        self.tx.send_replace(Some((value, source)));
    }
}

impl Drop for FlightGuard {
    fn drop(&mut self) {
        self.registry
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.key);
    }
}

impl FallbackExecutor {
    // == Constructor ==
    /// Creates an executor over `store`.
    ///
    /// With `coalesce` off, every concurrent miss runs its own upstream fetch.
    pub fn new(store: SharedStore, coalesce: bool) -> Self {
        Self {
            store,
            in_flight: Arc::new(Mutex::new(HashMap::new())),
            coalesce,
        }
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    // == Execute ==
    /// Resolves `key`, returning only the value.
    pub async fn execute<T, P, Fut, F>(&self, key: CacheKey, primary: P, fallback: F) -> T
    where
        T: Serialize + DeserializeOwned,
        P: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
        F: FnOnce() -> T,
    {
        self.execute_traced(key, primary, fallback).await.value
    }

    // == Execute Traced ==
    /// Resolves `key` and reports the value's provenance.
    ///
    /// 1. A fresh cache entry is returned without calling either producer.
    /// 2. Otherwise `primary` runs; its value is stored and returned.
    /// 3. If `primary` fails, `fallback` runs; its value is stored and returned.
    pub async fn execute_traced<T, P, Fut, F>(
        &self,
        key: CacheKey,
        primary: P,
        fallback: F,
    ) -> Resolved<T>
    where
        T: Serialize + DeserializeOwned,
        P: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
        F: FnOnce() -> T,
    {
        if let Some(value) = self.cached::<T>(&key).await {
            debug!(key = %key, "Cache hit");
            return Resolved {
                value,
                source: Source::Cache,
            };
        }

        let leader = if self.coalesce {
            match self.join_or_lead(&key) {
                Flight::Leader(guard) => Some(guard),
                Flight::Follower(rx) => {
                    if let Some(resolved) = self.wait_for_leader::<T>(&key, rx).await {
                        return resolved;
                    }
                    None
                }
            }
        } else {
            None
        };

        let (value, source) = match primary().await {
            Ok(value) => (value, Source::Primary),
            Err(e) if e.is_upstream() => {
                warn!(key = %key, error = %e, "Upstream call failed, using fallback data");
                (fallback(), Source::Fallback)
            }
            Err(e) => {
                error!(key = %key, error = %e, "Unexpected fetch error, using fallback data");
                (fallback(), Source::Fallback)
            }
        };

        match serde_json::to_value(&value) {
            Ok(json) => {
                self.store.write().await.put(key, json.clone(), source);
                if let Some(guard) = leader {
                    guard.publish(json, source);
                }
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Resolved value is not serializable, not caching");
            }
        }

        Resolved { value, source }
    }

    // == Cache Lookup ==
    async fn cached<T: DeserializeOwned>(&self, key: &CacheKey) -> Option<T> {
        let value = self.store.write().await.get(key)?;
        match serde_json::from_value(value) {
            Ok(decoded) => Some(decoded),
            Err(e) => {
                warn!(key = %key, error = %e, "Cached value has an unexpected shape, refetching");
                None
            }
        }
    }

    // == Single Flight ==
    fn join_or_lead(&self, key: &CacheKey) -> Flight {
        let mut registry = self
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if let Some(rx) = registry.get(key) {
            return Flight::Follower(rx.clone());
        }

        let (tx, rx) = watch::channel(None);
        registry.insert(key.clone(), rx);
        Flight::Leader(FlightGuard {
            key: key.clone(),
            registry: self.in_flight.clone(),
            tx,
        })
    }

    /// Waits for the in-flight fetch of `key`. Returns `None` if the leader
    /// went away without publishing or published an undecodable value.
    async fn wait_for_leader<T: DeserializeOwned>(
        &self,
        key: &CacheKey,
        mut rx: watch::Receiver<Published>,
    ) -> Option<Resolved<T>> {
        let published = rx.wait_for(Option::is_some).await.ok()?.clone();
        let (json, source) = published?;

        self.store.write().await.record_coalesced();
        debug!(key = %key, "Joined in-flight fetch");

        serde_json::from_value(json)
            .ok()
            .map(|value| Resolved { value, source })
    }
}
