use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::{debug, info, warn};

use super::{CatalogUpstream, SearchFilter};
use crate::error::{CatalogError, Result};

/// Public Invidious instances tried when none are configured.
pub const DEFAULT_INSTANCES: &[&str] = &[
    "https://yewtu.be",
    "https://inv.nadeko.net",
    "https://invidious.nerdvpn.de",
    "https://invidious.protokolla.fi",
    "https://invidious.privacydev.net",
    "https://invidious.fdn.fr",
];

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// [`CatalogUpstream`] backed by the Invidious REST API.
///
/// Requests start at the last instance that answered and rotate through
/// the rest on failure. Responses are mapped into the YouTube-Music-like
/// layout the normalizers expect.
pub struct InvidiousUpstream {
    client: reqwest::Client,
    instances: Vec<String>,
    current_instance: AtomicUsize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
struct Thumbnail {
    url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    height: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct VideoEntry {
    #[serde(rename = "videoId")]
    video_id: String,
    title: String,
    author: Option<String>,
    #[serde(rename = "authorId")]
    author_id: Option<String>,
    #[serde(rename = "lengthSeconds")]
    length_seconds: Option<u64>,
    #[serde(rename = "videoThumbnails", default)]
    video_thumbnails: Vec<Thumbnail>,
}

#[derive(Debug, Deserialize)]
struct ChannelEntry {
    author: String,
    #[serde(rename = "authorId")]
    author_id: String,
    #[serde(rename = "authorThumbnails", default)]
    author_thumbnails: Vec<Thumbnail>,
    #[serde(rename = "subCount")]
    sub_count: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct PlaylistEntry {
    #[serde(rename = "playlistId")]
    playlist_id: String,
    title: String,
    author: Option<String>,
    #[serde(rename = "videoCount")]
    video_count: Option<u64>,
    #[serde(rename = "playlistThumbnail")]
    playlist_thumbnail: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum SearchEntry {
    Video(VideoEntry),
    Channel(ChannelEntry),
    Playlist(PlaylistEntry),
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct ChannelDetail {
    author: Option<String>,
    #[serde(rename = "authorId")]
    author_id: Option<String>,
    #[serde(default)]
    description: String,
    #[serde(rename = "authorThumbnails", default)]
    author_thumbnails: Vec<Thumbnail>,
    #[serde(rename = "subCount")]
    sub_count: Option<u64>,
    #[serde(rename = "totalViews")]
    total_views: Option<u64>,
    #[serde(rename = "latestVideos", default)]
    latest_videos: Vec<VideoEntry>,
    #[serde(rename = "relatedChannels", default)]
    related_channels: Vec<ChannelEntry>,
}

#[derive(Debug, Deserialize)]
struct VideoDetail {
    #[serde(flatten)]
    video: VideoEntry,
    #[serde(rename = "recommendedVideos", default)]
    recommended_videos: Vec<VideoEntry>,
}

#[derive(Debug, Deserialize)]
struct PlaylistDetail {
    title: String,
    author: Option<String>,
    #[serde(rename = "videoCount")]
    video_count: Option<u64>,
    #[serde(default)]
    videos: Vec<VideoEntry>,
}

impl InvidiousUpstream {
    pub fn new(instances: Vec<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| CatalogError::upstream("client", e.to_string()))?;

        let instances: Vec<String> = if instances.is_empty() {
            DEFAULT_INSTANCES.iter().map(|s| s.to_string()).collect()
        } else {
            instances
                .into_iter()
                .map(|s| s.trim_end_matches('/').to_string())
                .collect()
        };

        info!("🌐 Upstream Invidious con {} instancias", instances.len());
        Ok(Self {
            client,
            instances,
            current_instance: AtomicUsize::new(0),
        })
    }

    pub fn instances(&self) -> &[String] {
        &self.instances
    }

    /// GETs `path` from the instances in rotation until one answers.
    async fn get_json<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T> {
        let start = self.current_instance.load(Ordering::Relaxed);
        let mut last_error = String::new();

        for offset in 0..self.instances.len() {
            let index = (start + offset) % self.instances.len();
            let instance = &self.instances[index];

            match self.try_get(instance, path, query).await {
                Ok(body) => {
                    self.current_instance.store(index, Ordering::Relaxed);
                    debug!("✅ {} respondió en {}", operation, instance);
                    return Ok(body);
                }
                Err(e) => {
                    warn!("❌ Falló {} en {}: {}", operation, instance, e);
                    last_error = format!("{}: {}", instance, e);
                }
            }
        }

        Err(CatalogError::upstream(
            operation,
            format!("todas las instancias fallaron. Último error: {}", last_error),
        ))
    }

    async fn try_get<T: DeserializeOwned>(
        &self,
        instance: &str,
        path: &str,
        query: &[(&str, &str)],
    ) -> std::result::Result<T, reqwest::Error> {
        self.client
            .get(format!("{}{}", instance, path))
            .query(query)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
    }
}

#[async_trait]
impl CatalogUpstream for InvidiousUpstream {
    async fn search(
        &self,
        query: &str,
        filter: SearchFilter,
        limit: usize,
        language: Option<&'static str>,
    ) -> Result<Vec<Value>> {
        info!("🔍 Buscando en Invidious: {} ({})", query, filter);

        let (kind, query) = match filter {
            SearchFilter::Songs | SearchFilter::Videos => ("video", query.to_string()),
            SearchFilter::Artists => ("channel", query.to_string()),
            SearchFilter::Playlists => ("playlist", query.to_string()),
            SearchFilter::Albums => ("playlist", format!("{} album", query)),
        };
        let mut params = vec![("q", query.as_str()), ("type", kind), ("page", "1")];
        if let Some(language) = language {
            params.push(("hl", language));
        }

        let entries: Vec<SearchEntry> = self.get_json("search", "/api/v1/search", &params).await?;
        Ok(entries
            .into_iter()
            .filter_map(|entry| map_search_entry(entry, filter))
            .take(limit)
            .collect())
    }

    async fn get_artist(&self, browse_id: &str, language: Option<&'static str>) -> Result<Value> {
        let path = format!("/api/v1/channels/{}", urlencoding::encode(browse_id));
        let query: Vec<(&str, &str)> = language.map(|l| vec![("hl", l)]).unwrap_or_default();
        let channel: ChannelDetail = self.get_json("get_artist", &path, &query).await?;
        map_channel(channel)
    }

    async fn get_watch_playlist(&self, video_id: &str, limit: usize) -> Result<Value> {
        let path = format!("/api/v1/videos/{}", urlencoding::encode(video_id));
        let detail: VideoDetail = self.get_json("get_watch_playlist", &path, &[]).await?;

        let tracks: Vec<Value> = std::iter::once(detail.video)
            .chain(detail.recommended_videos)
            .take(limit)
            .map(|video| map_video(video, "song"))
            .collect();
        Ok(json!({ "tracks": tracks, "lyrics": null }))
    }

    async fn get_mood_categories(&self) -> Result<Value> {
        Err(CatalogError::Unsupported("mood categories"))
    }

    async fn get_mood_playlists(&self, _params: &str) -> Result<Vec<Value>> {
        Err(CatalogError::Unsupported("mood playlists"))
    }

    async fn get_playlist(&self, playlist_id: &str, limit: usize) -> Result<Value> {
        let path = format!("/api/v1/playlists/{}", urlencoding::encode(playlist_id));
        let detail: PlaylistDetail = self.get_json("get_playlist", &path, &[]).await?;

        let tracks: Vec<Value> = detail
            .videos
            .into_iter()
            .take(limit)
            .map(|video| map_video(video, "song"))
            .collect();
        Ok(json!({
            "id": playlist_id,
            "title": detail.title,
            "author": detail.author,
            "trackCount": detail.video_count,
            "tracks": tracks,
        }))
    }

    async fn get_charts(&self, country: &str) -> Result<Value> {
        let videos: Vec<VideoEntry> = self
            .get_json(
                "get_charts",
                "/api/v1/trending",
                &[("type", "music"), ("region", country)],
            )
            .await?;
        let singles: Vec<Value> = videos
            .into_iter()
            .map(|video| map_video(video, "song"))
            .collect();
        Ok(json!({ "singles": singles, "albums": [] }))
    }

    async fn get_explore(&self) -> Result<Value> {
        let videos: Vec<VideoEntry> = self
            .get_json("get_explore", "/api/v1/trending", &[("type", "music")])
            .await?;
        let items: Vec<Value> = videos
            .into_iter()
            .map(|video| {
                let mut item = map_video(video, "single");
                if let Some(author) = item["artists"][0]["name"].as_str().map(str::to_string) {
                    item["subtitle"] = json!(author);
                }
                item["type"] = json!("single");
                item
            })
            .collect();
        Ok(json!({ "sections": [{ "title": "New music", "items": items }] }))
    }

    async fn get_lyrics(&self, _browse_id: &str, _timestamps: bool) -> Result<Value> {
        Err(CatalogError::Unsupported("lyrics"))
    }
}

/// `215` → `"3:35"`, `3723` → `"1:02:03"`.
fn format_length(seconds: u64) -> String {
    let (h, m, s) = (seconds / 3600, (seconds % 3600) / 60, seconds % 60);
    if h > 0 {
        format!("{}:{:02}:{:02}", h, m, s)
    } else {
        format!("{}:{:02}", m, s)
    }
}

fn map_video(video: VideoEntry, result_type: &str) -> Value {
    let mut record = json!({
        "resultType": result_type,
        "videoId": video.video_id,
        "title": video.title,
        "thumbnails": video.video_thumbnails,
    });
    if let Some(author) = video.author {
        record["artists"] = json!([{ "name": author, "id": video.author_id }]);
    }
    if let Some(seconds) = video.length_seconds {
        record["duration"] = json!(format_length(seconds));
        record["duration_seconds"] = json!(seconds);
    }
    record
}

fn map_channel_entry(channel: ChannelEntry) -> Value {
    json!({
        "resultType": "artist",
        "browseId": channel.author_id,
        "artist": channel.author,
        "thumbnails": channel.author_thumbnails,
        "subscribers": channel.sub_count.map(|n| n.to_string()),
    })
}

fn map_search_entry(entry: SearchEntry, filter: SearchFilter) -> Option<Value> {
    match (entry, filter) {
        (SearchEntry::Video(video), SearchFilter::Songs) => Some(map_video(video, "song")),
        (SearchEntry::Video(video), SearchFilter::Videos) => Some(map_video(video, "video")),
        (SearchEntry::Channel(channel), SearchFilter::Artists) => Some(map_channel_entry(channel)),
        (SearchEntry::Playlist(playlist), SearchFilter::Playlists | SearchFilter::Albums) => {
            let thumbnails: Vec<Thumbnail> = playlist
                .playlist_thumbnail
                .into_iter()
                .map(|url| Thumbnail {
                    url,
                    width: None,
                    height: None,
                })
                .collect();
            let author = playlist.author.unwrap_or_default();
            Some(if filter == SearchFilter::Albums {
                json!({
                    "resultType": "album",
                    "browseId": playlist.playlist_id,
                    "title": playlist.title,
                    "artists": [{ "name": author }],
                    "thumbnails": thumbnails,
                })
            } else {
                json!({
                    "resultType": "playlist",
                    "playlistId": playlist.playlist_id,
                    "browseId": playlist.playlist_id,
                    "title": playlist.title,
                    "author": author,
                    "itemCount": playlist.video_count,
                    "thumbnails": thumbnails,
                })
            })
        }
        _ => None,
    }
}

fn map_channel(channel: ChannelDetail) -> Result<Value> {
    let name = channel
        .author
        .ok_or_else(|| CatalogError::structure_changed("get_artist", "author"))?;

    let songs: Vec<Value> = channel
        .latest_videos
        .into_iter()
        .map(|video| map_video(video, "song"))
        .collect();
    let related: Vec<Value> = channel
        .related_channels
        .into_iter()
        .map(map_channel_entry)
        .collect();

    Ok(json!({
        "name": name,
        "channelId": channel.author_id,
        "description": channel.description,
        "thumbnails": channel.author_thumbnails,
        "subscribers": channel.sub_count.map(|n| n.to_string()),
        "views": channel.total_views.map(|n| n.to_string()),
        "songs": { "results": songs },
        "related": { "results": related },
    }))
}
