use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use super::rules::{first_match, ALBUM_RULES, ALTERNATE_THUMBNAIL_RULES, ARTIST_RULES, ID_RULES};
use super::thumbnail::{self, canonical_https, video_thumbnail};
use crate::util::fnv1a64;

pub const UNTITLED: &str = "Untitled";
pub const UNKNOWN_ARTIST: &str = "Unknown Artist";
pub const DEFAULT_SOURCE: &str = "youtube_music";

/// Track length as the upstream reported it: `"3:45"` or seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TrackDuration {
    Seconds(u64),
    Text(String),
}

impl Default for TrackDuration {
    fn default() -> Self {
        TrackDuration::Text(String::new())
    }
}

impl TrackDuration {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(TrackDuration::Text(s.clone())),
            Value::Number(n) => n
                .as_u64()
                .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f.round() as u64))
                .map(TrackDuration::Seconds),
            _ => None,
        }
    }
}

/// Canonical track.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub id: String,
    pub title: String,
    pub artist: String,
    pub thumbnail: String,
    #[serde(default)]
    pub duration: TrackDuration,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album: Option<String>,
    pub source: String,
}

/// Normalizes one raw upstream record.
///
/// Returns `None` only when `raw` is not an object or is an empty one;
/// every other record yields a track, with missing fields synthesized.
pub fn normalize(raw: &Value, default_artist: &str) -> Option<Track> {
    let record = raw.as_object().filter(|r| !r.is_empty())?;

    let title = record
        .get("title")
        .and_then(Value::as_str)
        .filter(|t| !t.is_empty())
        .unwrap_or(UNTITLED)
        .to_string();

    let artist = first_match(ARTIST_RULES, record)
        .or(Some(default_artist).filter(|a| !a.is_empty()))
        .unwrap_or(UNKNOWN_ARTIST)
        .to_string();

    let id = match first_match(ID_RULES, record) {
        Some(id) => id.to_string(),
        None => {
            let seed_title = str_field(record, "title").unwrap_or("unknown");
            let seed_artist = str_field(record, "artist")
                .or_else(|| str_field(record, "author"))
                .unwrap_or("unknown");
            let id = synthesize_id(seed_title, seed_artist);
            debug!("ID generado para '{}': {}", title, id);
            id
        }
    };

    let thumbnail = pick_thumbnail(record, &id);

    let duration = ["duration", "length"]
        .iter()
        .find_map(|field| record.get(*field).and_then(TrackDuration::from_value))
        .unwrap_or_default();

    let source = record
        .get("source")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_SOURCE)
        .to_string();

    Some(Track {
        album: first_match(ALBUM_RULES, record).map(str::to_string),
        id,
        title,
        artist,
        thumbnail,
        duration,
        source,
    })
}

/// Normalizes every record of a list, skipping the ones that are not
/// objects.
pub fn normalize_all(raw: &[Value], default_artist: &str) -> Vec<Track> {
    raw.iter()
        .filter_map(|item| normalize(item, default_artist))
        .collect()
}

fn pick_thumbnail(record: &Map<String, Value>, id: &str) -> String {
    let resolved = thumbnail::resolve(record.get("thumbnails"));
    if is_usable_thumbnail(&resolved) {
        return resolved;
    }

    if let Some(alternate) =
        first_match(ALTERNATE_THUMBNAIL_RULES, record).and_then(canonical_https)
    {
        if !alternate.contains("default") {
            return alternate;
        }
    }
    video_thumbnail(id)
}

fn is_usable_thumbnail(url: &str) -> bool {
    url.chars().count() > 10 && !url.contains("default")
}

fn str_field<'r>(record: &'r Map<String, Value>, name: &str) -> Option<&'r str> {
    record
        .get(name)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

/// Stable `gen_NNNNNNN` id for records without any usable identifier.
pub fn synthesize_id(title: &str, artist: &str) -> String {
    let mut seed = String::with_capacity(title.len() + artist.len());
    seed.push_str(title);
    seed.push_str(artist);
    format!("gen_{:07}", fnv1a64(seed.as_bytes()) % 10_000_000)
}

/// Splits an `"Artist - Title"` video title. Returns `(artist, title)`.
pub fn infer_artist_from_title(title: &str) -> Option<(String, String)> {
    let (artist, rest) = title.split_once(" - ")?;
    let (artist, rest) = (artist.trim(), rest.trim());
    if artist.is_empty() || rest.is_empty() {
        return None;
    }
    Some((artist.to_string(), rest.to_string()))
}
