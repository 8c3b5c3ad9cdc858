use serde_json::{json, Map, Value};
use std::collections::HashSet;
use tracing::{error, info, warn};

use super::{CatalogService, FALLBACK_LANGUAGE};
use crate::cache::{CacheKey, CacheMode, Produced};
use crate::error::{CatalogError, Result};
use crate::normalize::{ArtistStub, Image};
use crate::strategy::{Attempt, FallbackChain};
use crate::upstream::{supported_language, SearchFilter};

/// Genres searched live for the top-artists list.
const TOP_ARTIST_SEARCH_GENRES: &[&str] = &["pop", "rock", "hip hop"];

/// Sections of an artist page copied into the formatted detail.
const ARTIST_SECTIONS: &[&str] = &["songs", "albums", "singles", "videos", "related"];

/// `error_cause` reported when the upstream artist page lost its header.
pub const HEADER_NOT_FOUND: &str = "musicImmersiveHeaderRenderer_not_found";

impl CatalogService {
    /// Artists for `genre`: a live artist search topped up with predefined
    /// artists for the genre and region, de-duplicated by id. Cached only
    /// when the live search contributed something.
    pub async fn artists_by_genre(
        &self,
        genre: &str,
        limit: usize,
        region: &str,
        language: &str,
        mode: CacheMode,
    ) -> Result<Vec<ArtistStub>> {
        let genre = genre.trim();
        if genre.is_empty() {
            warn!("No se proporcionó ningún género");
            return Ok(Vec::new());
        }

        let language = Self::resolve_language(language);
        let key = CacheKey::new("artists_by_genre")
            .param("genre", genre)
            .param("limit", limit)
            .param("region", region)
            .param("language", language);

        self.policy
            .invoke_outcome(&key, self.settings.artists_by_genre_ttl, mode, move || async move {
                let mut chain = FallbackChain::new("artists_by_genre").then(
                    "idioma solicitado",
                    self.search_genre_artists(genre, limit, region, language),
                );
                if language != FALLBACK_LANGUAGE {
                    chain = chain.then(
                        "inglés",
                        self.search_genre_artists(genre, limit, region, FALLBACK_LANGUAGE),
                    );
                }
                let mut artists = chain
                    .run()
                    .await?
                    .map(|(_, artists)| artists)
                    .unwrap_or_default();
                let live = !artists.is_empty();

                if artists.len() < limit {
                    info!(
                        "No hay suficientes artistas ({}). Usando predefinidos para '{}' en {}",
                        artists.len(),
                        genre,
                        region
                    );
                    let mut seen: HashSet<String> = artists.iter().map(|a| a.id.clone()).collect();
                    for artist in self.fallback.artists_for(genre, limit, region) {
                        if artists.len() >= limit {
                            break;
                        }
                        if seen.insert(artist.id.clone()) {
                            artists.push(artist);
                        }
                    }
                }
                artists.truncate(limit);

                Ok(if live {
                    Produced::Live(artists)
                } else {
                    Produced::Degraded(artists)
                })
            })
            .await
            .map(Produced::into_inner)
    }

    async fn search_genre_artists(
        &self,
        genre: &str,
        limit: usize,
        region: &str,
        language: &'static str,
    ) -> Result<Attempt<Vec<ArtistStub>>> {
        let results = self
            .upstream
            .search(genre, SearchFilter::Artists, limit, Some(language))
            .await?;
        self.mark_success();

        let artists: Vec<ArtistStub> = results
            .iter()
            .enumerate()
            .filter_map(|(position, raw)| ArtistStub::from_search(raw, position))
            .map(|artist| artist.with_genre(genre).with_region(region))
            .collect();
        info!("🎤 {} artistas encontrados para género {}", artists.len(), genre);
        Ok(Attempt::Success(artists))
    }

    /// Formatted artist page.
    ///
    /// The upstream is retried up to `artist_retries` times with a linear
    /// backoff. A page missing its structural keys degrades to a partial
    /// record (from an artist search) or a minimal stub. When every attempt
    /// fails, a cached copy up to `artist_stale_max_age` old is returned
    /// with a `warning`.
    pub async fn artist_detail(
        &self,
        artist_id: &str,
        language: &str,
        artist_name: Option<&str>,
        mode: CacheMode,
    ) -> Result<Value> {
        let artist_id = artist_id.trim();
        if artist_id.is_empty() {
            return Err(CatalogError::InvalidInput(
                "se requiere un ID de artista".to_string(),
            ));
        }

        info!("🎤 Obteniendo información del artista: {}", artist_id);
        let key = CacheKey::new("artist_detail")
            .param("id", artist_id)
            .param("language", language);
        let upstream_language = supported_language(language);

        let result = self
            .policy
            .invoke_outcome(&key, self.settings.artist_ttl, mode, move || async move {
                self.fetch_artist(artist_id, upstream_language, artist_name)
                    .await
            })
            .await;

        match result {
            Ok(detail) => Ok(detail.into_inner()),
            Err(e) if e.is_client_error() => Err(e),
            Err(e) => {
                error!(
                    "❌ Error final al obtener información del artista {}: {}",
                    artist_id, e
                );
                match self
                    .policy
                    .store()
                    .get_with_max_age(&key.to_string(), self.settings.artist_stale_max_age)
                    .await
                {
                    Some(Value::Object(mut stale)) => {
                        info!("Usando caché antiguo como fallback para: {}", artist_id);
                        stale.insert(
                            "warning".to_string(),
                            json!("Datos obtenidos de caché antiguo debido a un error en la API"),
                        );
                        Ok(Value::Object(stale))
                    }
                    _ => Err(e),
                }
            }
        }
    }

    async fn fetch_artist(
        &self,
        artist_id: &str,
        language: Option<&'static str>,
        artist_name: Option<&str>,
    ) -> Result<Produced<Value>> {
        let retries = self.settings.artist_retries.max(1);
        let mut last_error = None;

        for attempt in 0..retries {
            let outcome = match self.upstream.get_artist(artist_id, language).await {
                Ok(page) if page.get("name").is_some_and(|n| !n.is_null()) => {
                    self.mark_success();
                    return Ok(Produced::Live(format_artist(artist_id, page)));
                }
                Ok(_) => CatalogError::structure_changed("get_artist", "name"),
                Err(e) => e,
            };
            error!(
                "Error en intento {}/{} para artista {}: {}",
                attempt + 1,
                retries,
                artist_id,
                outcome
            );

            if attempt + 1 < retries {
                let delay = self.settings.artist_retry_backoff * (attempt + 1);
                info!("Reintentando en {:?}...", delay);
                tokio::time::sleep(delay).await;
            }
            last_error = Some(outcome);
        }

        match last_error {
            Some(CatalogError::StructureChanged { .. }) => {
                warn!("Creando respuesta mínima para el artista {}", artist_id);
                Ok(Produced::Degraded(
                    self.partial_artist(artist_id, artist_name).await,
                ))
            }
            Some(e) => Err(e),
            None => Err(CatalogError::NotFound(artist_id.to_string())),
        }
    }

    /// Best-effort artist record when the page itself cannot be read:
    /// an artist search by channel id or by the supplied name.
    async fn partial_artist(&self, artist_id: &str, artist_name: Option<&str>) -> Value {
        let query = if artist_id.starts_with("UC") {
            Some(artist_id)
        } else {
            artist_name.filter(|n| !n.trim().is_empty())
        };

        if let Some(query) = query {
            match self
                .upstream
                .search(query, SearchFilter::Artists, 1, None)
                .await
            {
                Ok(results) => {
                    if let Some(found) = results.first().and_then(|r| ArtistStub::from_search(r, 0))
                    {
                        info!("Usando datos mínimos de búsqueda: {}", found.name);
                        let thumbnails = results[0]
                            .get("thumbnails")
                            .cloned()
                            .unwrap_or_else(|| json!([]));
                        return json!({
                            "id": artist_id,
                            "name": found.name,
                            "thumbnails": thumbnails,
                            "partial_data": true,
                            "subscribers": "Desconocido",
                            "source": "youtube_music",
                            "warning": "Datos parciales debido a cambios en la API de YouTube Music",
                        });
                    }
                }
                Err(e) => error!("Error al buscar datos alternativos: {}", e),
            }
        }

        json!({
            "id": artist_id,
            "name": "Artista no encontrado",
            "thumbnails": [],
            "source": "youtube_music",
            "error_cause": HEADER_NOT_FOUND,
            "description": "No se pudo obtener información detallada del artista debido a cambios en la API de YouTube Music",
        })
    }

    /// Popular artists from live searches over a few genres, or generic
    /// placeholders when the upstream returns none.
    pub async fn top_artists(&self, limit: usize, mode: CacheMode) -> Result<Vec<ArtistStub>> {
        let key = CacheKey::new("top_artists").param("limit", limit);
        let per_genre = (limit / TOP_ARTIST_SEARCH_GENRES.len()).max(1);

        self.policy
            .invoke_outcome(&key, self.settings.top_artists_ttl, mode, move || async move {
                FallbackChain::new("top_artists")
                    .then("búsqueda por géneros", self.live_top_artists(limit, per_genre))
                    .run_or_else(|| self.fallback.top_artists(limit))
                    .await
            })
            .await
            .map(Produced::into_inner)
    }

    async fn live_top_artists(
        &self,
        limit: usize,
        per_genre: usize,
    ) -> Result<Attempt<Vec<ArtistStub>>> {
        let mut artists = Vec::new();
        for genre in TOP_ARTIST_SEARCH_GENRES {
            match self
                .upstream
                .search(&format!("{} artist", genre), SearchFilter::Artists, per_genre, None)
                .await
            {
                Ok(results) => {
                    self.mark_success();
                    info!("Artistas para género {}: {}", genre, results.len());
                    artists.extend(
                        results
                            .iter()
                            .filter(|raw| raw.get("browseId").is_some())
                            .filter_map(|raw| popular_artist(raw, genre)),
                    );
                }
                Err(e) => warn!("❌ Búsqueda de artistas para {} falló: {}", genre, e),
            }
        }
        artists.truncate(limit);
        if !artists.is_empty() {
            info!("⭐ Artistas populares encontrados: {}", artists.len());
        }
        Ok(Attempt::non_empty(artists))
    }
}

fn popular_artist(raw: &Value, genre: &str) -> Option<ArtistStub> {
    let mut artist = ArtistStub::from_search(raw, 0)?;
    let category = raw
        .get("category")
        .and_then(Value::as_str)
        .filter(|c| !c.is_empty())
        .unwrap_or(genre);
    artist.genres = vec![category.to_string()];
    artist.popularity = 80;
    artist.source = "youtube_music".to_string();
    artist.from_search = false;
    // Largest thumbnail comes last.
    artist.images = artist.images.pop().map(|img: Image| vec![img]).unwrap_or_default();
    Some(artist)
}

/// Shapes an upstream artist page into the detail record.
fn format_artist(artist_id: &str, mut page: Value) -> Value {
    if let Some(songs) = page.get("songs").and_then(Value::as_object) {
        let results = songs.get("results").cloned().unwrap_or_else(|| json!([]));
        page["videos"] = json!({ "results": results });
    } else if page.get("videos").is_none() {
        warn!("No se encontraron 'songs' ni 'videos' en la respuesta del artista");
        page["videos"] = json!({ "results": [] });
    }

    let text = |field: &str, default: &str| -> Value {
        match page.get(field) {
            Some(v) if !v.is_null() => v.clone(),
            _ => json!(default),
        }
    };

    let mut detail = Map::new();
    detail.insert("id".into(), json!(artist_id));
    detail.insert("name".into(), text("name", "Artista Desconocido"));
    detail.insert("description".into(), text("description", ""));
    detail.insert("subscribers".into(), text("subscribers", "0"));
    detail.insert(
        "thumbnails".into(),
        page.get("thumbnails").cloned().unwrap_or_else(|| json!([])),
    );
    detail.insert("views".into(), text("views", "0"));
    detail.insert("source".into(), json!("youtube_music"));
    for section in ARTIST_SECTIONS {
        if let Some(content) = page.get(*section) {
            detail.insert((*section).to_string(), content.clone());
        }
    }
    Value::Object(detail)
}

#[cfg(test)]
mod tests {
    use super::super::testing;
    use super::*;
    use crate::upstream::MockCatalogUpstream;
    use mockall::predicate::eq;
    use pretty_assertions::assert_eq;

    fn artist_page() -> Value {
        json!({
            "name": "Aitana",
            "description": "Cantante",
            "thumbnails": [{"url": "https://example.com/a.jpg"}],
            "songs": {"results": [{"videoId": "abc1234567", "title": "Mon Amour"}]},
            "related": {"results": []}
        })
    }

    #[tokio::test]
    async fn test_artists_by_genre_tops_up_and_dedups() {
        let mut mock = MockCatalogUpstream::new();
        mock.expect_search()
            .with(eq("pop"), eq(SearchFilter::Artists), eq(5), eq(Some("es")))
            .times(1)
            .returning(|_, _, _, _| {
                Ok(vec![
                    json!({"browseId": "es-pop1", "artist": "Aitana"}),
                    json!({"browseId": "UClive", "artist": "Live Artist"}),
                ])
            });
        let (_dir, service) = testing::service(mock).await;

        let artists = service
            .artists_by_genre("pop", 5, "ES", "es", CacheMode::Use)
            .await
            .unwrap();
        let ids: Vec<&str> = artists.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["es-pop1", "UClive", "es-pop2", "es-pop3", "pop1"]);
        assert!(artists[0].from_search);
        assert!(!artists[2].from_search);

        // Second call is a cache hit.
        let cached = service
            .artists_by_genre("pop", 5, "ES", "es", CacheMode::Use)
            .await
            .unwrap();
        assert_eq!(cached, artists);
    }

    #[tokio::test]
    async fn test_artists_by_genre_fallback_is_not_cached() {
        let mut mock = MockCatalogUpstream::new();
        mock.expect_search()
            .times(4)
            .returning(|_, _, _, _| Err(CatalogError::upstream("search", "down")));
        let (_dir, service) = testing::service(mock).await;

        for _ in 0..2 {
            let artists = service
                .artists_by_genre("rock", 3, "US", "de", CacheMode::Use)
                .await
                .unwrap();
            assert_eq!(artists.len(), 3);
            assert_eq!(artists[0].id, "rock1");
        }
    }

    #[tokio::test]
    async fn test_empty_genre_returns_nothing() {
        let (_dir, service) = testing::service(MockCatalogUpstream::new()).await;
        let artists = service
            .artists_by_genre("  ", 5, "US", "en", CacheMode::Use)
            .await
            .unwrap();
        assert!(artists.is_empty());
    }

    #[tokio::test]
    async fn test_artist_detail_mirrors_songs_into_videos() {
        let mut mock = MockCatalogUpstream::new();
        mock.expect_get_artist()
            .with(eq("UCaitana"), eq(Some("es")))
            .times(1)
            .returning(|_, _| Ok(artist_page()));
        let (_dir, service) = testing::service(mock).await;

        let detail = service
            .artist_detail("UCaitana", "es", None, CacheMode::Use)
            .await
            .unwrap();
        assert_eq!(detail["name"], json!("Aitana"));
        assert_eq!(detail["subscribers"], json!("0"));
        assert_eq!(detail["source"], json!("youtube_music"));
        assert_eq!(detail["videos"]["results"], detail["songs"]["results"]);
        assert!(detail.get("albums").is_none());

        let cached = service
            .artist_detail("UCaitana", "es", None, CacheMode::Use)
            .await
            .unwrap();
        assert_eq!(cached, detail);
    }

    #[tokio::test]
    async fn test_artist_detail_retries_then_succeeds() {
        let mut mock = MockCatalogUpstream::new();
        let mut calls = 0;
        mock.expect_get_artist().times(2).returning(move |_, _| {
            calls += 1;
            if calls == 1 {
                Err(CatalogError::upstream("get_artist", "timeout"))
            } else {
                Ok(artist_page())
            }
        });
        let (_dir, service) = testing::service(mock).await;

        let detail = service
            .artist_detail("MPLAartist", "en", None, CacheMode::Use)
            .await
            .unwrap();
        assert_eq!(detail["id"], json!("MPLAartist"));
    }

    #[tokio::test]
    async fn test_structure_change_degrades_to_search_result() {
        let mut mock = MockCatalogUpstream::new();
        mock.expect_get_artist()
            .times(6)
            .returning(|_, _| Err(CatalogError::structure_changed("get_artist", "header")));
        mock.expect_search()
            .with(eq("UCbroken"), eq(SearchFilter::Artists), eq(1), eq(None::<&str>))
            .times(2)
            .returning(|_, _, _, _| Ok(vec![json!({"browseId": "UCbroken", "artist": "Found"})]));
        let (_dir, service) = testing::service(mock).await;

        // Degraded answers are not cached: the second call asks again.
        for _ in 0..2 {
            let detail = service
                .artist_detail("UCbroken", "es", None, CacheMode::Use)
                .await
                .unwrap();
            assert_eq!(detail["name"], json!("Found"));
            assert_eq!(detail["partial_data"], json!(true));
        }
    }

    #[tokio::test]
    async fn test_structure_change_without_name_gives_minimal_stub() {
        let mut mock = MockCatalogUpstream::new();
        mock.expect_get_artist()
            .times(3)
            .returning(|_, _| Ok(json!({"description": "no name"})));
        let (_dir, service) = testing::service(mock).await;

        let detail = service
            .artist_detail("MPLAxyz", "es", None, CacheMode::Use)
            .await
            .unwrap();
        assert_eq!(detail["error_cause"], json!(HEADER_NOT_FOUND));
        assert_eq!(detail["name"], json!("Artista no encontrado"));
    }

    #[tokio::test]
    async fn test_stale_copy_served_with_warning() {
        let mut mock = MockCatalogUpstream::new();
        mock.expect_get_artist()
            .times(3)
            .returning(|_, _| Err(CatalogError::upstream("get_artist", "down")));
        let (_dir, service) = testing::service(mock).await;

        let key = CacheKey::new("artist_detail")
            .param("id", "UCold")
            .param("language", "es")
            .to_string();
        // Expired for its zero TTL, still within the stale bound.
        service
            .policy()
            .store()
            .put(&key, json!({"id": "UCold", "name": "Old"}), std::time::Duration::ZERO)
            .await
            .unwrap();

        let detail = service
            .artist_detail("UCold", "es", None, CacheMode::Use)
            .await
            .unwrap();
        assert_eq!(detail["name"], json!("Old"));
        assert!(detail["warning"].as_str().unwrap().contains("caché antiguo"));
    }

    #[tokio::test]
    async fn test_artist_detail_error_without_stale_copy() {
        let mut mock = MockCatalogUpstream::new();
        mock.expect_get_artist()
            .times(3)
            .returning(|_, _| Err(CatalogError::upstream("get_artist", "down")));
        let (_dir, service) = testing::service(mock).await;

        let err = service
            .artist_detail("UCnone", "es", None, CacheMode::Use)
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::Upstream { .. }));
        assert!(service
            .artist_detail(" ", "es", None, CacheMode::Use)
            .await
            .unwrap_err()
            .is_client_error());
    }

    #[tokio::test]
    async fn test_top_artists_live_and_fallback() {
        let mut mock = MockCatalogUpstream::new();
        mock.expect_search()
            .with(eq("pop artist"), eq(SearchFilter::Artists), eq(2), eq(None::<&str>))
            .returning(|_, _, _, _| {
                Ok(vec![json!({
                    "browseId": "UCpop",
                    "artist": "Pop Star",
                    "thumbnails": [{"url": "https://a/small.jpg"}, {"url": "https://a/large.jpg"}]
                })])
            });
        mock.expect_search()
            .returning(|_, _, _, _| Err(CatalogError::upstream("search", "down")));
        let (_dir, service) = testing::service(mock).await;

        let top = service.top_artists(6, CacheMode::Use).await.unwrap();
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].genres, vec!["pop".to_string()]);
        assert_eq!(top[0].images, vec![Image::new("https://a/large.jpg")]);
        assert_eq!(top[0].popularity, 80);
    }

    #[tokio::test]
    async fn test_top_artists_placeholders_when_upstream_empty() {
        let mut mock = MockCatalogUpstream::new();
        mock.expect_search().returning(|_, _, _, _| Ok(Vec::new()));
        let (_dir, service) = testing::service(mock).await;

        let top = service.top_artists(4, CacheMode::Use).await.unwrap();
        assert_eq!(top.len(), 4);
        assert_eq!(top[0].name, "Artista Popular 0");
    }
}
