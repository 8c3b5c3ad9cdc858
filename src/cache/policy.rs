use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::key::CacheKey;
use super::store::CacheStore;
use crate::error::Result;
use crate::util::human;

/// Whether a call may be answered from the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheMode {
    #[default]
    Use,
    /// Always run the producer; the fresh result still replaces the entry.
    Bypass,
}

impl CacheMode {
    pub fn from_no_cache(no_cache: bool) -> Self {
        if no_cache {
            CacheMode::Bypass
        } else {
            CacheMode::Use
        }
    }
}

/// What a producer handed back.
#[derive(Debug, Clone, PartialEq)]
pub enum Produced<T> {
    /// Built from upstream data; worth caching.
    Live(T),
    /// Built from fallback data; returned to the caller but never cached.
    Degraded(T),
}

impl<T> Produced<T> {
    pub fn into_inner(self) -> T {
        match self {
            Produced::Live(value) | Produced::Degraded(value) => value,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Produced::Degraded(_))
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct PolicyStats {
    pub hits: u64,
    pub misses: u64,
    pub writes: u64,
}

#[derive(Debug, Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    writes: AtomicU64,
}

/// A caller's share of a key's lock. Dropping it, on completion or on
/// cancellation, removes the lock once nobody else holds it.
struct InFlight<'a> {
    locks: &'a DashMap<String, Arc<Mutex<()>>>,
    key: &'a str,
    lock: Option<Arc<Mutex<()>>>,
}

impl<'a> InFlight<'a> {
    fn join(locks: &'a DashMap<String, Arc<Mutex<()>>>, key: &'a str) -> Self {
        let lock = locks.entry(key.to_string()).or_default().clone();
        Self {
            locks,
            key,
            lock: Some(lock),
        }
    }

    async fn lock(&self) -> Option<tokio::sync::MutexGuard<'_, ()>> {
        match &self.lock {
            Some(lock) => Some(lock.lock().await),
            None => None,
        }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        drop(self.lock.take());
        self.locks
            .remove_if(self.key, |_, lock| Arc::strong_count(lock) == 1);
    }
}

/// Answers a call from the cache or runs its producer and stores the
/// result. Every cached catalog operation goes through [`CachePolicy::invoke`]
/// or [`CachePolicy::invoke_outcome`].
///
/// Concurrent misses on one key are serialized: the first caller runs the
/// producer, the others wait and then read what it stored.
#[derive(Debug)]
pub struct CachePolicy {
    store: CacheStore,
    locks: DashMap<String, Arc<Mutex<()>>>,
    counters: Counters,
}

impl CachePolicy {
    pub fn new(store: CacheStore) -> Self {
        Self {
            store,
            locks: DashMap::new(),
            counters: Counters::default(),
        }
    }

    pub fn store(&self) -> &CacheStore {
        &self.store
    }

    pub fn stats(&self) -> PolicyStats {
        PolicyStats {
            hits: self.counters.hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            writes: self.counters.writes.load(Ordering::Relaxed),
        }
    }

    /// Cached call whose producer either succeeds with live data or fails.
    /// Errors propagate and leave the cache untouched.
    pub async fn invoke<T, F, Fut>(
        &self,
        key: &CacheKey,
        ttl: Duration,
        mode: CacheMode,
        producer: F,
    ) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        self.invoke_outcome(key, ttl, mode, || async move {
            producer().await.map(Produced::Live)
        })
        .await
        .map(Produced::into_inner)
    }

    /// Cached call whose producer may report a degraded result. Degraded
    /// results are returned as such and not stored; a hit is reported as
    /// [`Produced::Live`].
    pub async fn invoke_outcome<T, F, Fut>(
        &self,
        key: &CacheKey,
        ttl: Duration,
        mode: CacheMode,
        producer: F,
    ) -> Result<Produced<T>>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Produced<T>>>,
    {
        let key = key.to_string();

        if mode == CacheMode::Use {
            if let Some(value) = self.lookup(&key).await {
                return Ok(Produced::Live(value));
            }
        }

        let in_flight = InFlight::join(&self.locks, &key);
        let _guard = in_flight.lock().await;
        self.produce(&key, ttl, mode, producer).await
    }

    async fn produce<T, F, Fut>(
        &self,
        key: &str,
        ttl: Duration,
        mode: CacheMode,
        producer: F,
    ) -> Result<Produced<T>>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Produced<T>>>,
    {
        // Someone may have filled the entry while we waited for the lock.
        if mode == CacheMode::Use {
            if let Some(value) = self.lookup(key).await {
                return Ok(Produced::Live(value));
            }
        }

        self.counters.misses.fetch_add(1, Ordering::Relaxed);
        match producer().await? {
            Produced::Live(value) => {
                self.persist(key, &value, ttl).await;
                Ok(Produced::Live(value))
            }
            Produced::Degraded(value) => {
                debug!("Resultado degradado para {}, no se guarda en caché", key);
                Ok(Produced::Degraded(value))
            }
        }
    }

    async fn lookup<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let payload = self.store.get(key).await?;
        match serde_json::from_value(payload) {
            Ok(value) => {
                self.counters.hits.fetch_add(1, Ordering::Relaxed);
                info!("💾 Cache hit: {}", key);
                Some(value)
            }
            Err(e) => {
                warn!("Entrada de caché con forma inesperada para {}: {}", key, e);
                if let Err(e) = self.store.invalidate(key).await {
                    warn!("No se pudo invalidar {}: {}", key, e);
                }
                None
            }
        }
    }

    async fn persist<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) {
        let payload = match serde_json::to_value(value) {
            Ok(payload) => payload,
            Err(e) => {
                warn!("No se pudo serializar {} para caché: {}", key, e);
                return;
            }
        };
        match self.store.put(key, payload, ttl).await {
            Ok(()) => {
                self.counters.writes.fetch_add(1, Ordering::Relaxed);
                debug!("Guardado {} (ttl {})", key, human(ttl));
            }
            Err(e) => warn!("⚠️ Error guardando caché para {}: {}", key, e),
        }
    }
}
