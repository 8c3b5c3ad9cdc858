use serde_json::{json, Value};
use std::collections::HashSet;
use tracing::{debug, error, info, warn};

use super::CatalogService;
use crate::cache::{CacheKey, CacheMode, Produced};
use crate::error::{CatalogError, Result};
use crate::model::{Charts, GenreRecommendations};
use crate::normalize::{
    self, infer_artist_from_title, AlbumStub, ArtistStub, PlaylistStub, Track,
};
use crate::strategy::{Attempt, FallbackChain};
use crate::upstream::SearchFilter;

const MAX_GENRES: usize = 3;
const WATCH_PLAYLIST_LIMIT: usize = 25;
const MOOD_PLAYLIST_TRACKS: usize = 10;
const MOOD_CATEGORIES_USED: usize = 2;

impl CatalogService {
    /// Tracks related to a seed artist and/or seed track.
    ///
    /// Sources, in order: the seed artist's top songs, a radio built from
    /// the best match of the seed track (or artist), and mood playlists
    /// when the list is still short. Every source fails soft.
    pub async fn recommendations(
        &self,
        seed_artist: &str,
        seed_track: &str,
        limit: usize,
        mode: CacheMode,
    ) -> Result<Vec<Track>> {
        let (seed_artist, seed_track) = (seed_artist.trim(), seed_track.trim());
        let key = CacheKey::new("recommendations")
            .param("seed_artist", seed_artist)
            .param("seed_track", seed_track)
            .param("limit", limit);

        self.policy
            .invoke_outcome(&key, self.settings.recommendations_ttl, mode, move || async move {
                let mut results = Vec::new();

                if !seed_artist.is_empty() {
                    match self.artist_top_tracks(seed_artist).await {
                        Ok(tracks) => results.extend(tracks),
                        Err(e) => error!("Error obteniendo tracks del artista: {}", e),
                    }
                }

                if !seed_track.is_empty() || (!seed_artist.is_empty() && results.is_empty()) {
                    let query = if seed_track.is_empty() { seed_artist } else { seed_track };
                    match self.radio_tracks(query).await {
                        Ok(tracks) => results.extend(tracks),
                        Err(e) => error!("Error obteniendo playlist de watch: {}", e),
                    }
                }

                if results.len() < limit {
                    info!(
                        "No hay suficientes recomendaciones ({}), añadiendo generales",
                        results.len()
                    );
                    match self.mood_tracks().await {
                        Ok(tracks) => results.extend(tracks),
                        Err(e) => error!("Error obteniendo mood playlists: {}", e),
                    }
                }

                let mut seen = HashSet::new();
                let tracks: Vec<Track> = results
                    .into_iter()
                    .filter(|track| seen.insert(track.id.clone()))
                    .take(limit)
                    .map(fill_artist_from_title)
                    .collect();
                info!("🎧 Total de recomendaciones: {}", tracks.len());

                Ok(if tracks.is_empty() {
                    Produced::Degraded(tracks)
                } else {
                    Produced::Live(tracks)
                })
            })
            .await
            .map(Produced::into_inner)
    }

    async fn artist_top_tracks(&self, seed_artist: &str) -> Result<Vec<Track>> {
        let found = self
            .upstream
            .search(seed_artist, SearchFilter::Artists, 1, None)
            .await?;
        let Some(artist_id) = found
            .first()
            .and_then(|a| a.get("browseId"))
            .and_then(Value::as_str)
        else {
            return Ok(Vec::new());
        };

        let page = self.upstream.get_artist(artist_id, None).await?;
        self.mark_success();
        let songs = page["songs"]["results"].as_array().cloned().unwrap_or_default();
        info!("Obtenidos {} tracks del artista {}", songs.len(), artist_id);

        Ok(songs
            .iter()
            .filter(|song| song.get("videoId").is_some())
            .filter_map(|song| normalize::normalize(song, seed_artist))
            .map(|track| Track {
                source: "artist_track".to_string(),
                ..track
            })
            .collect())
    }

    async fn radio_tracks(&self, query: &str) -> Result<Vec<Track>> {
        let found = self.upstream.search(query, SearchFilter::Songs, 1, None).await?;
        let Some(seed) = found.first() else {
            return Ok(Vec::new());
        };
        let Some(video_id) = seed.get("videoId").and_then(Value::as_str) else {
            return Ok(Vec::new());
        };

        let playlist = self
            .upstream
            .get_watch_playlist(video_id, WATCH_PLAYLIST_LIMIT)
            .await?;
        self.mark_success();
        let tracks = playlist["tracks"].as_array().cloned().unwrap_or_default();
        info!("Obtenidas {} recomendaciones para {}", tracks.len(), video_id);

        let mut normalized = Vec::new();
        for mut raw in tracks {
            if !raw.is_object() || raw.get("videoId").and_then(Value::as_str) == Some(video_id) {
                continue;
            }
            if !has_artist_info(&raw) {
                self.fill_artist(&mut raw).await;
            }
            normalized.extend(normalize::normalize(&raw, ""));
        }
        Ok(normalized)
    }

    /// Fills a radio track's artist from its title, or from a search by its
    /// video id.
    async fn fill_artist(&self, raw: &mut Value) {
        if let Some((artist, _)) = raw
            .get("title")
            .and_then(Value::as_str)
            .and_then(infer_artist_from_title)
        {
            debug!("Artista extraído del título: '{}'", artist);
            raw["artist"] = json!(artist);
            return;
        }

        let Some(video_id) = raw.get("videoId").and_then(Value::as_str).map(str::to_string)
        else {
            return;
        };
        match self
            .upstream
            .search(&video_id, SearchFilter::Songs, 1, None)
            .await
        {
            Ok(found) => {
                if let Some(info) = found.first() {
                    if let Some(artists) = info.get("artists").filter(|a| {
                        a.as_array().is_some_and(|list| !list.is_empty())
                    }) {
                        raw["artists"] = artists.clone();
                    } else if let Some(artist) = info.get("artist") {
                        raw["artist"] = artist.clone();
                    }
                }
            }
            Err(e) => warn!("Error buscando información adicional: {}", e),
        }
    }

    async fn mood_tracks(&self) -> Result<Vec<Track>> {
        let categories = self.upstream.get_mood_categories().await?;
        let mut tracks = Vec::new();

        for params in mood_params(&categories).into_iter().take(MOOD_CATEGORIES_USED) {
            let playlists = match self.upstream.get_mood_playlists(&params).await {
                Ok(playlists) => playlists,
                Err(e) => {
                    error!("Error obteniendo mood playlists: {}", e);
                    continue;
                }
            };
            let Some(playlist_id) = playlists.first().and_then(|p| {
                p.get("playlistId")
                    .or_else(|| p.get("browseId"))
                    .and_then(Value::as_str)
            }) else {
                continue;
            };

            match self
                .upstream
                .get_playlist(playlist_id, MOOD_PLAYLIST_TRACKS)
                .await
            {
                Ok(playlist) => {
                    self.mark_success();
                    let raw_tracks = playlist["tracks"].as_array().cloned().unwrap_or_default();
                    tracks.extend(
                        raw_tracks
                            .iter()
                            .filter(|t| t.get("videoId").is_some())
                            .filter_map(|t| normalize::normalize(t, ""))
                            .map(|track| Track {
                                source: "mood_recommendation".to_string(),
                                ..track
                            }),
                    );
                }
                Err(e) => error!("Error obteniendo playlist {}: {}", playlist_id, e),
            }
        }
        Ok(tracks)
    }

    /// Artists, playlists and tracks for up to three genres. Any upstream
    /// error replaces the whole answer with synthetic recommendations.
    pub async fn recommendations_by_genres(
        &self,
        genres: &[String],
        artists_per_genre: usize,
        playlists_per_genre: usize,
        tracks_per_genre: usize,
        mode: CacheMode,
    ) -> Result<GenreRecommendations> {
        let genres: Vec<String> = genres
            .iter()
            .map(|g| g.trim().to_string())
            .filter(|g| !g.is_empty())
            .take(MAX_GENRES)
            .collect();
        if genres.is_empty() {
            return Err(CatalogError::InvalidInput(
                "se requieren géneros favoritos".to_string(),
            ));
        }

        info!("Obteniendo recomendaciones para géneros: {:?}", genres);
        let key = CacheKey::new("recommendations_by_genres")
            .param("genres", genres.join("-"))
            .param("artists", artists_per_genre)
            .param("playlists", playlists_per_genre)
            .param("tracks", tracks_per_genre);
        let genres = genres.as_slice();

        self.policy
            .invoke_outcome(
                &key,
                self.settings.genre_recommendations_ttl,
                mode,
                move || async move {
                    match self
                        .live_genre_recommendations(
                            genres,
                            artists_per_genre,
                            playlists_per_genre,
                            tracks_per_genre,
                        )
                        .await
                    {
                        Ok(result) => {
                            info!(
                                "Recomendaciones generadas: {} artistas, {} playlists, {} tracks",
                                result.artists.len(),
                                result.playlists.len(),
                                result.tracks.len()
                            );
                            Ok(Produced::Live(result))
                        }
                        Err(e) => {
                            error!("Error al obtener recomendaciones por géneros: {}", e);
                            Ok(Produced::Degraded(self.fallback.genre_recommendations(genres)))
                        }
                    }
                },
            )
            .await
            .map(Produced::into_inner)
    }

    async fn live_genre_recommendations(
        &self,
        genres: &[String],
        artists_per_genre: usize,
        playlists_per_genre: usize,
        tracks_per_genre: usize,
    ) -> Result<GenreRecommendations> {
        let mut result = GenreRecommendations::default();

        for genre in genres {
            let artists = self
                .upstream
                .search(&format!("{} artist", genre), SearchFilter::Artists, artists_per_genre, None)
                .await?;
            result.artists.extend(
                artists
                    .iter()
                    .filter(|a| a.get("browseId").is_some() && a.get("thumbnails").is_some())
                    .filter_map(|a| ArtistStub::from_search(a, 0))
                    .map(|artist| ArtistStub {
                        popularity: 80,
                        source: "youtube_music".to_string(),
                        from_search: false,
                        ..artist.with_genre(genre)
                    }),
            );

            let playlists = self
                .upstream
                .search(&format!("{} music", genre), SearchFilter::Playlists, playlists_per_genre, None)
                .await?;
            result
                .playlists
                .extend(playlists.iter().filter_map(PlaylistStub::from_raw));

            let tracks = self
                .upstream
                .search(genre, SearchFilter::Songs, tracks_per_genre, None)
                .await?;
            result.tracks.extend(
                tracks
                    .iter()
                    .filter(|t| t.get("videoId").is_some())
                    .filter_map(|t| normalize::normalize(t, ""))
                    .map(|track| Track {
                        source: "youtube".to_string(),
                        ..track
                    }),
            );
        }
        self.mark_success();
        Ok(result)
    }

    /// Playlists from the explore page's playlists section, or predefined
    /// ones for the region.
    pub async fn featured_playlists(
        &self,
        region: &str,
        limit: usize,
        mode: CacheMode,
    ) -> Result<Vec<PlaylistStub>> {
        info!("📋 Playlists destacadas para región {}, límite {}", region, limit);
        let key = CacheKey::new("featured_playlists")
            .param("region", region)
            .param("limit", limit);

        self.policy
            .invoke_outcome(&key, self.settings.default_ttl, mode, move || async move {
                FallbackChain::new("featured_playlists")
                    .then("explore", self.live_featured_playlists(region, limit))
                    .run_or_else(|| self.fallback.featured_playlists(region, limit))
                    .await
            })
            .await
            .map(Produced::into_inner)
    }

    async fn live_featured_playlists(
        &self,
        region: &str,
        limit: usize,
    ) -> Result<Attempt<Vec<PlaylistStub>>> {
        let explore = self.upstream.get_explore().await?;
        self.mark_success();
        let playlists: Vec<PlaylistStub> =
            explore_section(&explore, |title| title.contains("Playlists"), "playlists")
                .iter()
                .take(limit)
                .filter_map(PlaylistStub::from_raw)
                .map(|p| p.with_region(region))
                .collect();
        Ok(Attempt::non_empty(playlists))
    }

    /// New releases gathered from the explore page's "new" sections, chart
    /// singles and chart albums whose title looks recent.
    pub async fn new_releases(
        &self,
        region: &str,
        limit: usize,
        mode: CacheMode,
    ) -> Result<Vec<AlbumStub>> {
        info!("💿 Nuevos lanzamientos para región {}, límite {}", region, limit);
        let key = CacheKey::new("new_releases")
            .param("region", region)
            .param("limit", limit);

        self.policy
            .invoke_outcome(&key, self.settings.default_ttl, mode, move || async move {
                FallbackChain::new("new_releases")
                    .then("explore y charts", self.live_new_releases(region, limit))
                    .run_or_else(|| self.fallback.new_releases(region, limit))
                    .await
            })
            .await
            .map(Produced::into_inner)
    }

    async fn live_new_releases(
        &self,
        region: &str,
        limit: usize,
    ) -> Result<Attempt<Vec<AlbumStub>>> {
        let (charts, explore) =
            tokio::join!(self.upstream.get_charts(region), self.upstream.get_explore());

        let mut candidates: Vec<Value> = Vec::new();
        match &explore {
            Ok(explore) => {
                candidates.extend(explore_section(explore, is_new_section, "items").iter().cloned())
            }
            Err(e) => warn!("Explore no disponible: {}", e),
        }
        match &charts {
            Ok(charts) => {
                let singles = charts["singles"].as_array().cloned().unwrap_or_default();
                candidates.extend(singles.into_iter().take(limit));
                let albums = charts["albums"].as_array().cloned().unwrap_or_default();
                candidates.extend(
                    albums
                        .into_iter()
                        .take(limit * 2)
                        .filter(|album| looks_recent(album)),
                );
            }
            Err(e) => warn!("Charts no disponibles: {}", e),
        }
        if let (Err(_), Err(e)) = (charts, explore) {
            return Err(e);
        }
        self.mark_success();

        let mut seen = HashSet::new();
        let releases: Vec<AlbumStub> = candidates
            .iter()
            .filter(|release| release_id(release).is_some_and(|id| seen.insert(id.to_string())))
            .take(limit)
            .filter(|release| {
                release["thumbnails"]
                    .as_array()
                    .is_some_and(|thumbs| !thumbs.is_empty())
            })
            .filter_map(AlbumStub::from_raw)
            .map(|album| album.with_region(region))
            .collect();
        info!("Total de {} lanzamientos encontrados", releases.len());
        Ok(Attempt::non_empty(releases))
    }

    /// Chart singles for `region`, or predefined ones.
    pub async fn charts(&self, region: &str, limit: usize, mode: CacheMode) -> Result<Charts> {
        info!("📈 Charts para región {}, límite {}", region, limit);
        let key = CacheKey::new("charts")
            .param("region", region)
            .param("limit", limit);

        self.policy
            .invoke_outcome(&key, self.settings.default_ttl, mode, move || async move {
                FallbackChain::new("charts")
                    .then("charts", self.live_charts(region, limit))
                    .run_or_else(|| Charts {
                        region: region.to_string(),
                        singles: self.fallback.chart_singles(region, limit),
                    })
                    .await
            })
            .await
            .map(Produced::into_inner)
    }

    async fn live_charts(&self, region: &str, limit: usize) -> Result<Attempt<Charts>> {
        let charts = self.upstream.get_charts(region).await?;
        self.mark_success();
        let singles: Vec<Track> = charts["singles"]
            .as_array()
            .map(|singles| {
                singles
                    .iter()
                    .take(limit)
                    .filter_map(|single| normalize::normalize(single, ""))
                    .collect()
            })
            .unwrap_or_default();

        if singles.is_empty() {
            return Ok(Attempt::SoftFailure(format!(
                "sin singles para región {}",
                region
            )));
        }
        Ok(Attempt::Success(Charts {
            region: region.to_string(),
            singles,
        }))
    }

    /// Radio for a video, normalized. Not cached.
    pub async fn watch_playlist(&self, video_id: &str, limit: usize) -> Result<Vec<Track>> {
        let video_id = video_id.trim();
        if video_id.is_empty() {
            return Err(CatalogError::InvalidInput(
                "se requiere el parámetro videoId".to_string(),
            ));
        }

        let playlist = self.upstream.get_watch_playlist(video_id, limit).await?;
        self.mark_success();
        let tracks = playlist["tracks"]
            .as_array()
            .map(|raw| normalize::normalize_all(raw, ""))
            .unwrap_or_default();
        if tracks.is_empty() {
            warn!("No se encontró watch playlist para videoId: {}", video_id);
            return Err(CatalogError::NotFound(format!(
                "playlist de reproducción para {}",
                video_id
            )));
        }
        info!("Watch playlist con {} tracks para {}", tracks.len(), video_id);
        Ok(tracks)
    }

    /// Lyrics for a `MPLY...` browse id.
    pub async fn lyrics(&self, browse_id: &str, timestamps: bool) -> Result<Value> {
        let browse_id = browse_id.trim();
        if browse_id.is_empty() {
            return Err(CatalogError::InvalidInput("se requiere browseId".to_string()));
        }
        if !browse_id.starts_with("MPLY") {
            return Err(CatalogError::InvalidInput(format!(
                "browseId no válido para letras: {}",
                browse_id
            )));
        }

        info!("📝 Obteniendo letras para {} (timestamps: {})", browse_id, timestamps);
        let lyrics = self.upstream.get_lyrics(browse_id, timestamps).await?;
        if is_empty_value(&lyrics) {
            return Err(CatalogError::NotFound(format!("letras para {}", browse_id)));
        }
        self.mark_success();
        Ok(lyrics)
    }

    pub async fn mood_categories(&self) -> Result<Value> {
        let categories = self.upstream.get_mood_categories().await?;
        self.mark_success();
        Ok(categories)
    }

    pub async fn mood_playlists(&self, params: &str) -> Result<Vec<Value>> {
        let params = params.trim();
        if params.is_empty() {
            return Err(CatalogError::InvalidInput(
                "se requiere el parámetro params".to_string(),
            ));
        }
        let playlists = self.upstream.get_mood_playlists(params).await?;
        self.mark_success();
        Ok(playlists)
    }
}

fn has_artist_info(raw: &Value) -> bool {
    raw.get("artists")
        .and_then(Value::as_array)
        .is_some_and(|a| !a.is_empty())
        || raw
            .get("artist")
            .and_then(Value::as_str)
            .is_some_and(|a| !a.trim().is_empty())
}

/// Last chance for tracks whose artist could not be determined.
fn fill_artist_from_title(track: Track) -> Track {
    if track.artist != normalize::track::UNKNOWN_ARTIST {
        return track;
    }
    match infer_artist_from_title(&track.title) {
        Some((artist, _)) => Track { artist, ..track },
        None => track,
    }
}

/// `params` of every mood category. Categories come either as a list or
/// grouped by section title.
fn mood_params(categories: &Value) -> Vec<String> {
    let entries: Vec<&Value> = match categories {
        Value::Array(list) => list.iter().collect(),
        Value::Object(groups) => groups
            .values()
            .filter_map(Value::as_array)
            .flatten()
            .collect(),
        _ => Vec::new(),
    };
    entries
        .into_iter()
        .filter_map(|c| c.get("params").and_then(Value::as_str))
        .map(str::to_string)
        .collect()
}

/// Entries under `field` of the first explore section whose title matches.
fn explore_section<'v>(
    explore: &'v Value,
    matches: impl Fn(&str) -> bool,
    field: &str,
) -> &'v [Value] {
    explore["sections"]
        .as_array()
        .into_iter()
        .flatten()
        .filter(|section| matches(section["title"].as_str().unwrap_or_default()))
        .find_map(|section| section[field].as_array())
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

fn is_new_section(title: &str) -> bool {
    title.contains("New") || title.contains("Nuevo") || title.to_lowercase().contains("reciente")
}

fn looks_recent(album: &Value) -> bool {
    album["title"].as_str().is_some_and(|title| {
        let title = title.to_lowercase();
        ["new", "nuevo", "2025", "2024"]
            .iter()
            .any(|marker| title.contains(marker))
    })
}

fn release_id(release: &Value) -> Option<&str> {
    release
        .get("videoId")
        .or_else(|| release.get("browseId"))
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
}

fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(list) => list.is_empty(),
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}
