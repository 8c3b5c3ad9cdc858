//! Response shapes returned by the catalog operations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cache::{CacheStats, PolicyStats};
use crate::normalize::{AlbumStub, ArtistStub, PlaylistStub, Track};

/// One search hit, tagged with its kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SearchItem {
    Track(Track),
    Artist(ArtistStub),
    Album(AlbumStub),
    Playlist(PlaylistStub),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResults {
    pub query: String,
    pub region: String,
    /// Language the upstream actually answered in; `default` when it was
    /// queried without one.
    pub language: String,
    pub items: Vec<SearchItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Charts {
    pub region: String,
    pub singles: Vec<Track>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenreRecommendations {
    pub artists: Vec<ArtistStub>,
    pub playlists: Vec<PlaylistStub>,
    pub tracks: Vec<Track>,
}

/// Health snapshot returned by `CatalogService::status`.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceStatus {
    /// `ok` when the upstream check succeeded, `degraded` otherwise.
    pub status: &'static str,
    pub upstream_available: bool,
    pub latency_ms: Option<u128>,
    pub upstream_error: Option<String>,
    pub last_successful_operation: Option<DateTime<Utc>>,
    pub checked_at: DateTime<Utc>,
    pub cache: CacheStats,
    pub policy: PolicyStats,
    pub version: &'static str,
}
