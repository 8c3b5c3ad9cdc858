use serde_json::Value;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tracing::{debug, info, warn};

use super::entry::CacheEntry;
use super::key::sanitize;
use crate::error::Result;

/// File-backed cache: one JSON document per key under a directory.
///
/// Reads never fail. A missing, expired, foreign or undecodable document
/// is reported as absent; undecodable ones are deleted on the way out.
/// Writes go to a temporary file in the same directory which is then
/// renamed over the target, so readers see the old or the new document,
/// never a torn one.
#[derive(Debug, Clone)]
pub struct CacheStore {
    dir: PathBuf,
    default_ttl: Duration,
}

impl CacheStore {
    /// Opens (and creates if needed) the cache directory. `default_ttl`
    /// applies to legacy documents that did not record their own TTL.
    pub async fn open(dir: impl Into<PathBuf>, default_ttl: Duration) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).await?;
        info!("📁 Caché inicializado en: {}", dir.display());
        Ok(Self { dir, default_ttl })
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", sanitize(key)))
    }

    /// Returns the payload if the entry exists and is younger than the TTL
    /// it was written with.
    pub async fn get(&self, key: &str) -> Option<Value> {
        let entry = self.read_entry(key).await?;
        if entry.is_expired_at(chrono::Utc::now()) {
            debug!("Cache expirado para {}", key);
            return None;
        }
        debug!("Cache hit para {}", key);
        Some(entry.payload)
    }

    /// Returns the payload if the entry is younger than `max_age`,
    /// whatever TTL it was written with. Used for stale fallbacks.
    pub async fn get_with_max_age(&self, key: &str, max_age: Duration) -> Option<Value> {
        let entry = self.read_entry(key).await?;
        if entry.age_at(chrono::Utc::now()) >= max_age {
            return None;
        }
        Some(entry.payload)
    }

    /// Replaces whatever is stored under `key`.
    pub async fn put(&self, key: &str, payload: Value, ttl: Duration) -> Result<()> {
        let entry = CacheEntry::new(key, payload, ttl);
        let bytes = entry.encode()?;
        let dir = self.dir.clone();
        let path = self.path_for(key);

        tokio::task::spawn_blocking(move || write_atomically(&dir, &path, &bytes))
            .await
            .map_err(io::Error::other)??;

        debug!("Datos guardados en caché: {}", key);
        Ok(())
    }

    /// Removes the entry. Removing an absent entry is not an error.
    pub async fn invalidate(&self, key: &str) -> Result<()> {
        match fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Deletes every expired or undecodable document and returns how many
    /// were removed.
    pub async fn purge_expired(&self) -> Result<usize> {
        let now = chrono::Utc::now();
        let mut removed = 0;
        let mut files = fs::read_dir(&self.dir).await?;

        while let Some(dir_entry) = files.next_entry().await? {
            let path = dir_entry.path();
            if !is_cache_document(&path) {
                continue;
            }
            let stale = match fs::read(&path).await {
                Ok(bytes) => CacheEntry::decode(&bytes, "", self.default_ttl)
                    .map(|entry| entry.is_expired_at(now))
                    .unwrap_or(true),
                Err(e) => {
                    warn!("No se pudo leer {}: {}", path.display(), e);
                    false
                }
            };
            if stale {
                match fs::remove_file(&path).await {
                    Ok(()) => removed += 1,
                    Err(e) => warn!("Error eliminando {}: {}", path.display(), e),
                }
            }
        }

        if removed > 0 {
            info!("🧹 Cache cleanup: removed {} expired entries", removed);
        }
        Ok(removed)
    }

    pub async fn stats(&self) -> Result<CacheStats> {
        let now = chrono::Utc::now();
        let mut stats = CacheStats {
            entries: 0,
            expired: 0,
            total_size_bytes: 0,
            dir: self.dir.clone(),
        };
        let mut files = fs::read_dir(&self.dir).await?;

        while let Some(dir_entry) = files.next_entry().await? {
            let path = dir_entry.path();
            if !is_cache_document(&path) {
                continue;
            }
            stats.entries += 1;
            if let Ok(metadata) = dir_entry.metadata().await {
                stats.total_size_bytes += metadata.len();
            }
            if let Ok(bytes) = fs::read(&path).await {
                let expired = CacheEntry::decode(&bytes, "", self.default_ttl)
                    .map(|entry| entry.is_expired_at(now))
                    .unwrap_or(true);
                if expired {
                    stats.expired += 1;
                }
            }
        }
        Ok(stats)
    }

    async fn read_entry(&self, key: &str) -> Option<CacheEntry> {
        let path = self.path_for(key);
        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!("Error leyendo caché para {}: {}", key, e);
                return None;
            }
        };

        match CacheEntry::decode(&bytes, key, self.default_ttl) {
            Ok(entry) if entry.key == key => Some(entry),
            Ok(entry) => {
                debug!("Colisión de clave en {}: contiene {}", path.display(), entry.key);
                None
            }
            Err(e) => {
                warn!("Archivo de caché dañado eliminado: {} ({})", path.display(), e);
                if let Err(e) = fs::remove_file(&path).await {
                    if e.kind() != io::ErrorKind::NotFound {
                        warn!("No se pudo eliminar {}: {}", path.display(), e);
                    }
                }
                None
            }
        }
    }
}

fn is_cache_document(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "json")
}

fn write_atomically(dir: &Path, path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut tmp = tempfile::Builder::new()
        .prefix(".")
        .suffix(".partial")
        .tempfile_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Snapshot of the cache directory.
#[derive(Debug, Clone, serde::Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub expired: usize,
    pub total_size_bytes: u64,
    pub dir: PathBuf,
}

impl std::fmt::Display for CacheStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "📊 Cache Stats:\n\
             📁 Directory: {}\n\
             📝 Entries: {} ({} expired)\n\
             📦 Total Size: {} bytes ({:.2} KB)",
            self.dir.display(),
            self.entries,
            self.expired,
            self.total_size_bytes,
            self.total_size_bytes as f64 / 1024.0
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use tempfile::TempDir;

    const HOUR: Duration = Duration::from_secs(3600);

    async fn store() -> (TempDir, CacheStore) {
        let dir = TempDir::new().unwrap();
        let store = CacheStore::open(dir.path().join("cache"), HOUR).await.unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn test_put_then_get_returns_identical_payload() {
        let (_dir, store) = store().await;
        let payload = json!({
            "singles": [{"videoId": "abc1234567", "title": "Señorita", "rank": 1}],
            "nested": {"empty": [], "flag": true, "ratio": 0.25, "nothing": null}
        });

        store.put("charts?region=US", payload.clone(), HOUR).await.unwrap();
        assert_eq!(store.get("charts?region=US").await, Some(payload));
    }

    #[tokio::test]
    async fn test_null_payload_round_trips() {
        let (_dir, store) = store().await;
        store.put("k", Value::Null, HOUR).await.unwrap();

        assert_eq!(store.get("k").await, Some(Value::Null));
        assert!(store.path_for("k").exists());
    }

    #[tokio::test]
    async fn test_missing_key_is_absent() {
        let (_dir, store) = store().await;
        assert_eq!(store.get("nope").await, None);
    }

    #[tokio::test]
    async fn test_expired_entry_is_absent_and_not_resurrected() {
        let (_dir, store) = store().await;
        store.put("k", json!([1, 2]), Duration::ZERO).await.unwrap();

        assert_eq!(store.get("k").await, None);
        assert_eq!(store.get("k").await, None);
        // Still on disk for an explicit stale read.
        assert_eq!(store.get_with_max_age("k", HOUR).await, Some(json!([1, 2])));
    }

    #[tokio::test]
    async fn test_stored_ttl_wins_over_reader() {
        let (_dir, store) = store().await;
        store.put("artist", json!({"name": "Aitana"}), HOUR * 24).await.unwrap();

        assert!(store.get("artist").await.is_some());
        assert_eq!(store.get_with_max_age("artist", Duration::ZERO).await, None);
    }

    #[tokio::test]
    async fn test_corrupted_file_is_removed() {
        let (_dir, store) = store().await;
        let path = store.path_for("broken");
        std::fs::write(&path, b"\xff\xfe{{ not json").unwrap();

        assert_eq!(store.get("broken").await, None);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_legacy_documents_are_readable() {
        let (_dir, store) = store().await;
        let now = chrono::Utc::now().timestamp();
        std::fs::write(
            store.path_for("US_charts.json"),
            format!(r#"{{"timestamp": {}, "data": {{"singles": []}}}}"#, now),
        )
        .unwrap();

        assert_eq!(store.get("US_charts.json").await, Some(json!({"singles": []})));
    }

    #[tokio::test]
    async fn test_colliding_keys_do_not_leak_payloads() {
        let (_dir, store) = store().await;
        store.put("a/b", json!("first"), HOUR).await.unwrap();

        assert_eq!(store.path_for("a/b"), store.path_for("a?b"));
        assert_eq!(store.get("a?b").await, None);
        assert_eq!(store.get("a/b").await, Some(json!("first")));
    }

    #[tokio::test]
    async fn test_put_overwrites_and_invalidate_removes() {
        let (_dir, store) = store().await;
        store.put("k", json!(1), HOUR).await.unwrap();
        store.put("k", json!(2), HOUR).await.unwrap();
        assert_eq!(store.get("k").await, Some(json!(2)));

        store.invalidate("k").await.unwrap();
        assert_eq!(store.get("k").await, None);
        store.invalidate("k").await.unwrap();
    }

    #[tokio::test]
    async fn test_purge_and_stats() {
        let (_dir, store) = store().await;
        store.put("fresh", json!(1), HOUR).await.unwrap();
        store.put("old", json!(2), Duration::ZERO).await.unwrap();
        std::fs::write(store.path_for("junk"), b"[]").unwrap();

        let stats = store.stats().await.unwrap();
        assert_eq!(stats.entries, 3);
        assert_eq!(stats.expired, 2);

        assert_eq!(store.purge_expired().await.unwrap(), 2);
        let stats = store.stats().await.unwrap();
        assert_eq!(stats.entries, 1);
        assert_eq!(stats.expired, 0);
    }
}
