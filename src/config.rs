use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::upstream::invidious::DEFAULT_INSTANCES;
use crate::util::human;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    // Caché
    pub cache_dir: PathBuf,
    pub cache_ttl: Duration,
    pub search_cache_ttl: Duration,
    pub find_track_cache_ttl: Duration,
    pub artist_cache_ttl: Duration,
    pub artist_stale_max_age: Duration,
    pub recommendations_cache_ttl: Duration,
    pub genre_recommendations_cache_ttl: Duration,
    pub top_artists_cache_ttl: Duration,
    pub artists_by_genre_cache_ttl: Duration,

    // Upstream
    pub upstream_instances: Vec<String>,
    pub upstream_timeout: Duration,
    pub artist_retries: u32,
    pub artist_retry_backoff: Duration,

    // Peticiones
    pub default_region: String,
    pub default_language: String,
    pub fallback_seed: Option<u64>,

    // Rendimiento
    pub worker_threads: usize,
}

fn var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn duration_var(name: &str, default: Duration) -> Result<Duration> {
    match var(name) {
        Some(value) => humantime::parse_duration(value.trim())
            .with_context(|| format!("{} no es una duración válida: {}", name, value)),
        None => Ok(default),
    }
}

const HOUR: u64 = 3600;

impl Config {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        let defaults = Self::default();

        let config = Self {
            // Caché
            cache_dir: var("CACHE_DIR").map(PathBuf::from).unwrap_or(defaults.cache_dir),
            cache_ttl: duration_var("CACHE_TTL", defaults.cache_ttl)?,
            search_cache_ttl: duration_var("SEARCH_CACHE_TTL", defaults.search_cache_ttl)?,
            find_track_cache_ttl: duration_var(
                "FIND_TRACK_CACHE_TTL",
                defaults.find_track_cache_ttl,
            )?,
            artist_cache_ttl: duration_var("ARTIST_CACHE_TTL", defaults.artist_cache_ttl)?,
            artist_stale_max_age: duration_var(
                "ARTIST_STALE_MAX_AGE",
                defaults.artist_stale_max_age,
            )?,
            recommendations_cache_ttl: duration_var(
                "RECOMMENDATIONS_CACHE_TTL",
                defaults.recommendations_cache_ttl,
            )?,
            genre_recommendations_cache_ttl: duration_var(
                "GENRE_RECOMMENDATIONS_CACHE_TTL",
                defaults.genre_recommendations_cache_ttl,
            )?,
            top_artists_cache_ttl: duration_var(
                "TOP_ARTISTS_CACHE_TTL",
                defaults.top_artists_cache_ttl,
            )?,
            artists_by_genre_cache_ttl: duration_var(
                "ARTISTS_BY_GENRE_CACHE_TTL",
                defaults.artists_by_genre_cache_ttl,
            )?,

            // Upstream
            upstream_instances: match var("UPSTREAM_INSTANCES") {
                Some(list) => list
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect(),
                None => defaults.upstream_instances,
            },
            upstream_timeout: duration_var("UPSTREAM_TIMEOUT", defaults.upstream_timeout)?,
            artist_retries: match var("ARTIST_RETRIES") {
                Some(val) => val.trim().parse().context("ARTIST_RETRIES inválido")?,
                None => defaults.artist_retries,
            },
            artist_retry_backoff: duration_var(
                "ARTIST_RETRY_BACKOFF",
                defaults.artist_retry_backoff,
            )?,

            // Peticiones
            default_region: var("DEFAULT_REGION").unwrap_or(defaults.default_region),
            default_language: var("DEFAULT_LANGUAGE").unwrap_or(defaults.default_language),
            fallback_seed: var("FALLBACK_SEED")
                .map(|s| s.trim().parse())
                .transpose()
                .context("FALLBACK_SEED inválido")?,

            // Rendimiento
            worker_threads: match var("WORKER_THREADS") {
                Some(val) => val.trim().parse().context("WORKER_THREADS inválido")?,
                None => num_cpus::get(),
            },
        };

        std::fs::create_dir_all(&config.cache_dir)
            .with_context(|| format!("no se pudo crear {}", config.cache_dir.display()))?;

        config.validate()?;

        Ok(config)
    }

    /// Sanity checks on the loaded values.
    ///
    /// - every TTL is greater than zero
    /// - the stale artist bound is at least the artist TTL
    /// - artist detail is attempted at least once
    /// - at least one upstream instance is an absolute URL
    pub fn validate(&self) -> Result<()> {
        let ttls = [
            ("CACHE_TTL", self.cache_ttl),
            ("SEARCH_CACHE_TTL", self.search_cache_ttl),
            ("FIND_TRACK_CACHE_TTL", self.find_track_cache_ttl),
            ("ARTIST_CACHE_TTL", self.artist_cache_ttl),
            ("RECOMMENDATIONS_CACHE_TTL", self.recommendations_cache_ttl),
            ("GENRE_RECOMMENDATIONS_CACHE_TTL", self.genre_recommendations_cache_ttl),
            ("TOP_ARTISTS_CACHE_TTL", self.top_artists_cache_ttl),
            ("ARTISTS_BY_GENRE_CACHE_TTL", self.artists_by_genre_cache_ttl),
        ];
        for (name, ttl) in ttls {
            if ttl.is_zero() {
                anyhow::bail!("{} must be greater than 0", name);
            }
        }

        if self.artist_stale_max_age < self.artist_cache_ttl {
            anyhow::bail!(
                "ARTIST_STALE_MAX_AGE ({}) must not be shorter than ARTIST_CACHE_TTL ({})",
                human(self.artist_stale_max_age),
                human(self.artist_cache_ttl)
            );
        }

        if self.artist_retries == 0 {
            anyhow::bail!("ARTIST_RETRIES must be at least 1");
        }

        if self.worker_threads == 0 {
            anyhow::bail!("WORKER_THREADS must be greater than 0");
        }

        if !self
            .upstream_instances
            .iter()
            .any(|instance| url::Url::parse(instance).is_ok())
        {
            anyhow::bail!("UPSTREAM_INSTANCES has no valid URL");
        }

        Ok(())
    }

    /// Returns a summary of the current configuration for logging.
    pub fn summary(&self) -> String {
        format!(
            "Config Summary:\n  \
            Cache: {} (default {}, search {}, artist {} / stale {})\n  \
            Upstream: {} instances, timeout {}, {} artist attempts every {}\n  \
            Defaults: region {}, language {}, seed {}\n  \
            Runtime: {} workers",
            self.cache_dir.display(),
            human(self.cache_ttl),
            human(self.search_cache_ttl),
            human(self.artist_cache_ttl),
            human(self.artist_stale_max_age),
            self.upstream_instances.len(),
            human(self.upstream_timeout),
            self.artist_retries,
            human(self.artist_retry_backoff),
            self.default_region,
            self.default_language,
            self.fallback_seed.map_or("none".to_string(), |s| s.to_string()),
            self.worker_threads
        )
    }
}

/// Default configuration values.
///
/// Used as fallbacks when environment variables are not provided.
impl Default for Config {
    fn default() -> Self {
        Self {
            cache_dir: "cache".into(),
            cache_ttl: Duration::from_secs(HOUR),
            search_cache_ttl: Duration::from_secs(HOUR),
            find_track_cache_ttl: Duration::from_secs(7 * 24 * HOUR),
            artist_cache_ttl: Duration::from_secs(24 * HOUR),
            artist_stale_max_age: Duration::from_secs(72 * HOUR),
            recommendations_cache_ttl: Duration::from_secs(6 * HOUR),
            genre_recommendations_cache_ttl: Duration::from_secs(4 * HOUR),
            top_artists_cache_ttl: Duration::from_secs(24 * HOUR),
            artists_by_genre_cache_ttl: Duration::from_secs(HOUR),

            upstream_instances: DEFAULT_INSTANCES.iter().map(|s| s.to_string()).collect(),
            upstream_timeout: Duration::from_secs(15),
            artist_retries: 3,
            artist_retry_backoff: Duration::from_secs(1),

            default_region: "US".to_string(),
            default_language: "en".to_string(),
            fallback_seed: None,

            worker_threads: num_cpus::get(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.find_track_cache_ttl, humantime::parse_duration("1week").unwrap());
        assert_eq!(config.artist_stale_max_age, Duration::from_secs(72 * 3600));
        assert!(config.summary().contains("region US"));
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = Config::default();
        config.search_cache_ttl = Duration::ZERO;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.artist_stale_max_age = Duration::from_secs(60);
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.artist_retries = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.upstream_instances = vec!["not a url".to_string()];
        assert!(config.validate().is_err());
    }
}
