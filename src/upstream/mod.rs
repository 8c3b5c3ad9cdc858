//! # Upstream Catalog
//!
//! The catalog engine talks to the third-party music service only through
//! [`CatalogUpstream`]. Responses are untrusted [`serde_json::Value`]s in a
//! YouTube-Music-like layout (`videoId`, `title`, `artists`, `thumbnails`,
//! `browseId`, ...) which the normalizers then clean up.
//!
//! [`invidious::InvidiousUpstream`] is the bundled HTTP implementation.

pub mod invidious;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::error::{CatalogError, Result};

pub use invidious::InvidiousUpstream;

/// Languages the upstream answers in.
pub const SUPPORTED_LANGUAGES: &[&str] = &[
    "ja", "en", "de", "zh_CN", "fr", "ur", "ko", "hi", "ru", "nl", "es", "ar", "pt", "zh_TW",
    "tr", "it",
];

/// The supported language equal to `language`, if any.
pub fn supported_language(language: &str) -> Option<&'static str> {
    SUPPORTED_LANGUAGES
        .iter()
        .copied()
        .find(|supported| *supported == language.trim())
}

/// Kind of result a search asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchFilter {
    #[default]
    Songs,
    Videos,
    Artists,
    Albums,
    Playlists,
}

impl SearchFilter {
    pub fn as_str(self) -> &'static str {
        match self {
            SearchFilter::Songs => "songs",
            SearchFilter::Videos => "videos",
            SearchFilter::Artists => "artists",
            SearchFilter::Albums => "albums",
            SearchFilter::Playlists => "playlists",
        }
    }

    /// Whether a raw record's `resultType` belongs to this filter. Records
    /// without a `resultType` are accepted.
    pub fn accepts(self, result_type: Option<&str>) -> bool {
        let Some(result_type) = result_type else {
            return true;
        };
        let result_type = result_type.to_lowercase();
        match self {
            SearchFilter::Songs | SearchFilter::Videos => {
                result_type == "song" || result_type == "video"
            }
            SearchFilter::Artists => result_type == "artist",
            SearchFilter::Albums => result_type == "album",
            SearchFilter::Playlists => result_type == "playlist",
        }
    }
}

impl fmt::Display for SearchFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchFilter {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "songs" | "song" => Ok(SearchFilter::Songs),
            "videos" | "video" => Ok(SearchFilter::Videos),
            "artists" | "artist" => Ok(SearchFilter::Artists),
            "albums" | "album" => Ok(SearchFilter::Albums),
            "playlists" | "playlist" => Ok(SearchFilter::Playlists),
            other => Err(CatalogError::InvalidInput(format!(
                "filtro de búsqueda desconocido: {}",
                other
            ))),
        }
    }
}

/// Capability the catalog needs from the upstream service.
///
/// `language: None` asks the upstream for its default language.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CatalogUpstream: Send + Sync {
    async fn search(
        &self,
        query: &str,
        filter: SearchFilter,
        limit: usize,
        language: Option<&'static str>,
    ) -> Result<Vec<Value>>;

    /// Artist page: `name`, `description`, `thumbnails`, `songs.results`, ...
    async fn get_artist(&self, browse_id: &str, language: Option<&'static str>) -> Result<Value>;

    /// Radio for a video: `{"tracks": [...], "lyrics": "MPLY..."}`.
    async fn get_watch_playlist(&self, video_id: &str, limit: usize) -> Result<Value>;

    async fn get_mood_categories(&self) -> Result<Value>;

    async fn get_mood_playlists(&self, params: &str) -> Result<Vec<Value>>;

    async fn get_playlist(&self, playlist_id: &str, limit: usize) -> Result<Value>;

    /// Charts for a country: `{"singles": [...], "albums": [...]}`.
    async fn get_charts(&self, country: &str) -> Result<Value>;

    /// Explore page: `{"sections": [{"title": ..., "items" | "playlists": [...]}]}`.
    async fn get_explore(&self) -> Result<Value>;

    async fn get_lyrics(&self, browse_id: &str, timestamps: bool) -> Result<Value>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supported_language() {
        assert_eq!(supported_language("es"), Some("es"));
        assert_eq!(supported_language(" zh_TW "), Some("zh_TW"));
        assert_eq!(supported_language("xx"), None);
        assert_eq!(supported_language(""), None);
    }

    #[test]
    fn test_filter_parsing_and_result_types() {
        assert_eq!("Artists".parse::<SearchFilter>().unwrap(), SearchFilter::Artists);
        assert!("podcasts".parse::<SearchFilter>().unwrap_err().is_client_error());

        assert!(SearchFilter::Songs.accepts(Some("Video")));
        assert!(SearchFilter::Songs.accepts(None));
        assert!(!SearchFilter::Albums.accepts(Some("artist")));
    }
}
