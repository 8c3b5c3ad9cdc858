use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// A cached payload as written to disk.
///
/// Canonical document:
///
/// ```json
/// {"key": "charts?limit=20&region=US", "timestamp": "2025-05-01T10:00:00Z", "ttl": 3600, "data": {}}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheEntry {
    pub key: String,
    #[serde(rename = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "ttl")]
    pub ttl_secs: u64,
    #[serde(rename = "data")]
    pub payload: Value,
}

/// Why a document on disk could not be turned into a [`CacheEntry`].
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("invalid cache document: {0}")]
    Json(#[from] serde_json::Error),
    #[error("cache document has no payload")]
    MissingPayload,
    #[error("unreadable timestamp '{0}'")]
    BadTimestamp(String),
}

/// Lenient reader for both the canonical document and the two legacy
/// layouts (`timestamp` as epoch seconds with `data`, or as a naive
/// ISO-8601 string with `content`). Legacy documents carry no `ttl`.
#[derive(Debug, Deserialize)]
struct StoredDocument {
    #[serde(default)]
    key: Option<String>,
    timestamp: StoredTimestamp,
    #[serde(default)]
    ttl: Option<u64>,
    #[serde(default, alias = "content", deserialize_with = "present")]
    data: Option<Value>,
}

/// `Some` for any field that is present, `null` included.
fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StoredTimestamp {
    Epoch(f64),
    Text(String),
}

impl StoredTimestamp {
    fn to_utc(&self) -> Result<DateTime<Utc>, DecodeError> {
        match self {
            StoredTimestamp::Epoch(secs) => {
                if !secs.is_finite() || *secs < 0.0 {
                    return Err(DecodeError::BadTimestamp(secs.to_string()));
                }
                let whole = secs.trunc() as i64;
                let nanos = (secs.fract() * 1e9) as u32;
                DateTime::from_timestamp(whole, nanos)
                    .ok_or_else(|| DecodeError::BadTimestamp(secs.to_string()))
            }
            StoredTimestamp::Text(text) => {
                if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
                    return Ok(dt.with_timezone(&Utc));
                }
                // Naive timestamps were written in the host's local time.
                let naive = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
                    .map_err(|_| DecodeError::BadTimestamp(text.clone()))?;
                Ok(Local
                    .from_local_datetime(&naive)
                    .earliest()
                    .map(|dt| dt.with_timezone(&Utc))
                    .unwrap_or_else(|| Utc.from_utc_datetime(&naive)))
            }
        }
    }
}

impl CacheEntry {
    pub fn new(key: impl Into<String>, payload: Value, ttl: Duration) -> Self {
        Self {
            key: key.into(),
            created_at: Utc::now(),
            ttl_secs: ttl.as_secs(),
            payload,
        }
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    /// Age at `now`; timestamps in the future count as age zero.
    pub fn age_at(&self, now: DateTime<Utc>) -> Duration {
        (now - self.created_at).to_std().unwrap_or(Duration::ZERO)
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.age_at(now) >= self.ttl()
    }

    pub fn encode(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    /// Decodes a document read from disk. `key` fills in legacy documents
    /// that did not record it, `default_ttl` those that did not record a TTL.
    /// A `null` payload is kept; only a missing `data`/`content` field is
    /// rejected.
    pub fn decode(bytes: &[u8], key: &str, default_ttl: Duration) -> Result<Self, DecodeError> {
        let doc: StoredDocument = serde_json::from_slice(bytes)?;
        let payload = doc.data.ok_or(DecodeError::MissingPayload)?;
        Ok(Self {
            key: doc.key.unwrap_or_else(|| key.to_string()),
            created_at: doc.timestamp.to_utc()?,
            ttl_secs: doc.ttl.unwrap_or(default_ttl.as_secs()),
            payload,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    const HOUR: Duration = Duration::from_secs(3600);

    #[test]
    fn test_canonical_document_shape() {
        let entry = CacheEntry::new("charts?region=US", json!({"singles": []}), HOUR);
        let doc: Value = serde_json::from_slice(&entry.encode().unwrap()).unwrap();

        assert_eq!(doc["key"], json!("charts?region=US"));
        assert_eq!(doc["ttl"], json!(3600));
        assert_eq!(doc["data"], json!({"singles": []}));
        assert!(doc["timestamp"].as_str().unwrap().ends_with('Z'));
        assert!(doc.get("content").is_none());
    }

    #[test]
    fn test_decode_roundtrip_keeps_ttl() {
        let entry = CacheEntry::new("k", json!([1, "two", {"three": 3.5}]), HOUR * 6);
        let decoded = CacheEntry::decode(&entry.encode().unwrap(), "other", HOUR).unwrap();
        assert_eq!(decoded, entry);
    }

    #[test]
    fn test_decode_legacy_epoch_data_document() {
        let raw = br#"{"timestamp": 1714557600.25, "data": [{"id": "x"}]}"#;
        let entry = CacheEntry::decode(raw, "US_charts.json", HOUR).unwrap();

        assert_eq!(entry.key, "US_charts.json");
        assert_eq!(entry.ttl(), HOUR);
        assert_eq!(entry.created_at.timestamp(), 1714557600);
        assert_eq!(entry.payload, json!([{"id": "x"}]));
    }

    #[test]
    fn test_decode_legacy_iso_content_document() {
        let raw = br#"{"timestamp": "2025-03-01T12:30:00.123456", "content": {"name": "Drake"}}"#;
        let entry = CacheEntry::decode(raw, "artist_detail_x_es", HOUR * 24).unwrap();

        assert_eq!(entry.payload, json!({"name": "Drake"}));
        assert_eq!(entry.ttl_secs, 24 * 3600);
    }

    #[test]
    fn test_null_payload_is_not_a_missing_payload() {
        let entry = CacheEntry::new("k", Value::Null, HOUR);
        let decoded = CacheEntry::decode(&entry.encode().unwrap(), "k", HOUR).unwrap();
        assert_eq!(decoded.payload, Value::Null);

        let legacy = CacheEntry::decode(br#"{"timestamp": 1, "content": null}"#, "k", HOUR).unwrap();
        assert_eq!(legacy.payload, Value::Null);
    }

    #[test]
    fn test_decode_rejects_broken_documents() {
        assert!(matches!(
            CacheEntry::decode(b"{not json", "k", HOUR),
            Err(DecodeError::Json(_))
        ));
        assert!(matches!(
            CacheEntry::decode(br#"{"timestamp": 1}"#, "k", HOUR),
            Err(DecodeError::MissingPayload)
        ));
        assert!(matches!(
            CacheEntry::decode(br#"{"timestamp": "yesterday", "data": 1}"#, "k", HOUR),
            Err(DecodeError::BadTimestamp(_))
        ));
    }

    #[test]
    fn test_expiry_boundary() {
        let mut entry = CacheEntry::new("k", json!(1), HOUR);
        let now = entry.created_at;

        assert!(!entry.is_expired_at(now));
        assert!(!entry.is_expired_at(now + chrono::Duration::seconds(3599)));
        assert!(entry.is_expired_at(now + chrono::Duration::seconds(3600)));

        entry.created_at = now + chrono::Duration::seconds(30);
        assert_eq!(entry.age_at(now), Duration::ZERO);
    }
}
