//! # Catalog Service
//!
//! The operations callers actually use. Each one composes the same pieces:
//!
//! 1. a [`CacheKey`](crate::cache::CacheKey) built from its parameters
//! 2. [`CachePolicy`] to answer from disk or run the producer
//! 3. the upstream through [`CatalogUpstream`], tried via a
//!    [`FallbackChain`](crate::strategy::FallbackChain) where alternatives exist
//! 4. the normalizers in [`crate::normalize`]
//! 5. [`FallbackProvider`] when the upstream fails or returns nothing
//!
//! Results built from fallback data are returned as degraded and never
//! cached, so the next call tries the upstream again.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use freevibes_catalog::cache::{CachePolicy, CacheStore};
//! use freevibes_catalog::catalog::{CatalogService, CatalogSettings, SearchRequest};
//! use freevibes_catalog::fallback::FallbackProvider;
//! use freevibes_catalog::upstream::InvidiousUpstream;
//!
//! # async fn example() -> freevibes_catalog::error::Result<()> {
//! let upstream = InvidiousUpstream::new(Vec::new(), Duration::from_secs(15))?;
//! let store = CacheStore::open("cache", Duration::from_secs(3600)).await?;
//! let service = CatalogService::new(
//!     Arc::new(upstream),
//!     CachePolicy::new(store),
//!     FallbackProvider::default(),
//!     CatalogSettings::default(),
//! );
//!
//! let results = service.search(&SearchRequest::new("bad bunny")).await?;
//! println!("{} resultados", results.items.len());
//! # Ok(())
//! # }
//! ```

mod artists;
mod discovery;
mod search;

pub use search::SearchRequest;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use crate::cache::CachePolicy;
use crate::config::Config;
use crate::error::Result;
use crate::fallback::FallbackProvider;
use crate::model::ServiceStatus;
use crate::upstream::{supported_language, CatalogUpstream};

/// Language used when the requested one is not supported.
pub const FALLBACK_LANGUAGE: &str = "en";

/// TTLs and retry knobs of the catalog operations.
#[derive(Debug, Clone)]
pub struct CatalogSettings {
    pub default_ttl: Duration,
    pub search_ttl: Duration,
    pub find_track_ttl: Duration,
    pub artist_ttl: Duration,
    pub artist_stale_max_age: Duration,
    pub recommendations_ttl: Duration,
    pub genre_recommendations_ttl: Duration,
    pub top_artists_ttl: Duration,
    pub artists_by_genre_ttl: Duration,
    pub artist_retries: u32,
    pub artist_retry_backoff: Duration,
    pub default_region: String,
    pub default_language: String,
}

impl From<&Config> for CatalogSettings {
    fn from(config: &Config) -> Self {
        Self {
            default_ttl: config.cache_ttl,
            search_ttl: config.search_cache_ttl,
            find_track_ttl: config.find_track_cache_ttl,
            artist_ttl: config.artist_cache_ttl,
            artist_stale_max_age: config.artist_stale_max_age,
            recommendations_ttl: config.recommendations_cache_ttl,
            genre_recommendations_ttl: config.genre_recommendations_cache_ttl,
            top_artists_ttl: config.top_artists_cache_ttl,
            artists_by_genre_ttl: config.artists_by_genre_cache_ttl,
            artist_retries: config.artist_retries,
            artist_retry_backoff: config.artist_retry_backoff,
            default_region: config.default_region.clone(),
            default_language: config.default_language.clone(),
        }
    }
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

#[derive(Debug, Default)]
struct ServiceState {
    last_success: Option<DateTime<Utc>>,
}

pub struct CatalogService {
    upstream: Arc<dyn CatalogUpstream>,
    policy: CachePolicy,
    fallback: FallbackProvider,
    settings: CatalogSettings,
    state: Mutex<ServiceState>,
}

impl CatalogService {
    pub fn new(
        upstream: Arc<dyn CatalogUpstream>,
        policy: CachePolicy,
        fallback: FallbackProvider,
        settings: CatalogSettings,
    ) -> Self {
        Self {
            upstream,
            policy,
            fallback,
            settings,
            state: Mutex::new(ServiceState::default()),
        }
    }

    pub fn policy(&self) -> &CachePolicy {
        &self.policy
    }

    /// Checks the upstream and reports cache and service health.
    pub async fn status(&self) -> Result<ServiceStatus> {
        let started = Instant::now();
        let check = self.upstream.get_explore().await;
        let elapsed = started.elapsed();

        let (upstream_available, upstream_error) = match check {
            Ok(_) => {
                self.mark_success();
                (true, None)
            }
            Err(e) => {
                warn!("⚠️ Prueba de estado del upstream falló: {}", e);
                (false, Some(e.to_string()))
            }
        };

        let status = ServiceStatus {
            status: if upstream_available { "ok" } else { "degraded" },
            upstream_available,
            latency_ms: upstream_available.then(|| elapsed.as_millis()),
            upstream_error,
            last_successful_operation: self.state.lock().last_success,
            checked_at: Utc::now(),
            cache: self.policy.store().stats().await?,
            policy: self.policy.stats(),
            version: env!("CARGO_PKG_VERSION"),
        };
        info!("🩺 Estado: {} ({:?})", status.status, elapsed);
        Ok(status)
    }

    fn mark_success(&self) {
        self.state.lock().last_success = Some(Utc::now());
    }

    /// The supported language for `language`, or [`FALLBACK_LANGUAGE`].
    fn resolve_language(language: &str) -> &'static str {
        supported_language(language).unwrap_or_else(|| {
            warn!(
                "Idioma '{}' no soportado. Usando '{}' como fallback.",
                language, FALLBACK_LANGUAGE
            );
            FALLBACK_LANGUAGE
        })
    }
}

#[cfg(test)]
mod testing {
    use super::*;
    use crate::cache::CacheStore;
    use crate::upstream::MockCatalogUpstream;
    use tempfile::TempDir;

    pub(super) async fn service(mock: MockCatalogUpstream) -> (TempDir, CatalogService) {
        let dir = TempDir::new().unwrap();
        let store = CacheStore::open(dir.path(), Duration::from_secs(3600))
            .await
            .unwrap();
        let settings = CatalogSettings {
            artist_retry_backoff: Duration::ZERO,
            ..CatalogSettings::default()
        };
        let service = CatalogService::new(
            Arc::new(mock),
            CachePolicy::new(store),
            FallbackProvider::new(Some(1)),
            settings,
        );
        (dir, service)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CatalogError;
    use crate::upstream::MockCatalogUpstream;
    use serde_json::json;

    #[tokio::test]
    async fn test_status_reports_upstream_and_cache() {
        let mut mock = MockCatalogUpstream::new();
        mock.expect_get_explore()
            .times(1)
            .returning(|| Ok(json!({"sections": []})));
        let (_dir, service) = testing::service(mock).await;

        let status = service.status().await.unwrap();
        assert_eq!(status.status, "ok");
        assert!(status.upstream_available);
        assert!(status.last_successful_operation.is_some());
        assert_eq!(status.cache.entries, 0);
    }

    #[tokio::test]
    async fn test_status_degraded_when_upstream_fails() {
        let mut mock = MockCatalogUpstream::new();
        mock.expect_get_explore()
            .returning(|| Err(CatalogError::upstream("get_explore", "timeout")));
        let (_dir, service) = testing::service(mock).await;

        let status = service.status().await.unwrap();
        assert_eq!(status.status, "degraded");
        assert_eq!(status.latency_ms, None);
        assert!(status.upstream_error.unwrap().contains("timeout"));
        assert!(status.last_successful_operation.is_none());
    }

    #[test]
    fn test_resolve_language() {
        assert_eq!(CatalogService::resolve_language("es"), "es");
        assert_eq!(CatalogService::resolve_language("xx"), "en");
    }
}
