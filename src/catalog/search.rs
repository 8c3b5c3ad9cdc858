use serde_json::Value;
use tracing::{info, warn};

use super::{CatalogService, FALLBACK_LANGUAGE};
use crate::cache::{CacheKey, CacheMode, Produced};
use crate::error::{CatalogError, Result};
use crate::model::{SearchItem, SearchResults};
use crate::normalize::{self, AlbumStub, ArtistStub, PlaylistStub, Track};
use crate::strategy::{Attempt, FallbackChain};
use crate::upstream::SearchFilter;

const GLOBAL_REGION: &str = "global";
const DEFAULT_LANGUAGE_LABEL: &str = "default";

#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub query: String,
    pub filter: SearchFilter,
    pub limit: usize,
    pub region: String,
    pub language: String,
    pub mode: CacheMode,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            filter: SearchFilter::Songs,
            limit: 10,
            region: "US".to_string(),
            language: FALLBACK_LANGUAGE.to_string(),
            mode: CacheMode::Use,
        }
    }

    pub fn filter(mut self, filter: SearchFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn mode(mut self, mode: CacheMode) -> Self {
        self.mode = mode;
        self
    }
}

impl CatalogService {
    /// Searches the upstream in the requested language, then in English,
    /// then in the upstream's default language. Only errors move on to the
    /// next language; an empty answer is final. When every language fails
    /// the result is empty.
    pub async fn search(&self, request: &SearchRequest) -> Result<SearchResults> {
        let query = request.query.trim();
        if query.is_empty() {
            return Err(CatalogError::InvalidInput(
                "se requiere parámetro query".to_string(),
            ));
        }

        let language = Self::resolve_language(&request.language);
        let key = CacheKey::new("search")
            .param("query", query)
            .param("filter", request.filter)
            .param("limit", request.limit)
            .param("region", &request.region)
            .param("language", language);

        info!(
            "🔍 Búsqueda: {} (filtro: {}, límite: {}, región: {}, idioma: {})",
            query, request.filter, request.limit, request.region, language
        );

        self.policy
            .invoke_outcome(&key, self.settings.search_ttl, request.mode, move || async move {
                let mut chain = FallbackChain::new("search").then(
                    "idioma solicitado",
                    self.search_in(query, request, Some(language)),
                );
                if language != FALLBACK_LANGUAGE {
                    chain = chain.then(
                        "inglés",
                        self.search_in(query, request, Some(FALLBACK_LANGUAGE)),
                    );
                }
                chain = chain.then("idioma por defecto", self.search_in(query, request, None));

                Ok(match chain.run().await? {
                    Some((_, results)) if !results.items.is_empty() => Produced::Live(results),
                    Some((_, results)) => Produced::Degraded(results),
                    None => Produced::Degraded(SearchResults {
                        query: query.to_string(),
                        region: request.region.clone(),
                        language: language.to_string(),
                        items: Vec::new(),
                    }),
                })
            })
            .await
            .map(Produced::into_inner)
    }

    async fn search_in(
        &self,
        query: &str,
        request: &SearchRequest,
        language: Option<&'static str>,
    ) -> Result<Attempt<SearchResults>> {
        let raw = self
            .upstream
            .search(query, request.filter, request.limit, language)
            .await?;
        self.mark_success();

        // Without a language the upstream answers globally.
        let region = match language {
            Some(_) => request.region.as_str(),
            None => GLOBAL_REGION,
        };
        let items = transform(&raw, request.filter, region);
        info!("Búsqueda de {} completada: {} resultados", request.filter, items.len());

        Ok(Attempt::Success(SearchResults {
            query: query.to_string(),
            region: region.to_string(),
            language: language.unwrap_or(DEFAULT_LANGUAGE_LABEL).to_string(),
            items,
        }))
    }

    /// Best song match for `title`/`artist` (or an explicit `query`).
    ///
    /// `Ok(None)` when nothing with a video id was found; only real matches
    /// are cached.
    pub async fn find_track(
        &self,
        title: &str,
        artist: &str,
        query: Option<&str>,
        mode: CacheMode,
    ) -> Result<Option<Track>> {
        let query = match query {
            Some(q) => q.trim().to_string(),
            None => format!("{} {}", title, artist).trim().to_string(),
        };
        if query.is_empty() {
            return Err(CatalogError::InvalidInput(
                "se requiere una consulta".to_string(),
            ));
        }

        let query = query.as_str();
        let key = CacheKey::new("find_track").param("query", query);
        let language = Self::resolve_language(&self.settings.default_language);

        self.policy
            .invoke_outcome(&key, self.settings.find_track_ttl, mode, move || async move {
                let results = self
                    .upstream
                    .search(query, SearchFilter::Songs, 5, Some(language))
                    .await?;
                self.mark_success();

                let best = results
                    .first()
                    .filter(|best| {
                        best.get("videoId")
                            .and_then(Value::as_str)
                            .is_some_and(|id| !id.is_empty())
                    })
                    .and_then(|best| normalize::normalize(best, artist));

                Ok(match best {
                    Some(track) => {
                        info!("✅ Mejor resultado para '{}': {} ({})", query, track.title, track.id);
                        Produced::Live(Some(track))
                    }
                    None => {
                        warn!("Sin resultados para: '{}'", query);
                        Produced::Degraded(None)
                    }
                })
            })
            .await
            .map(Produced::into_inner)
    }
}

/// Keeps the records matching `filter` and normalizes them.
fn transform(raw: &[Value], filter: SearchFilter, region: &str) -> Vec<SearchItem> {
    raw.iter()
        .filter(|item| filter.accepts(item.get("resultType").and_then(Value::as_str)))
        .enumerate()
        .filter_map(|(position, item)| match filter {
            SearchFilter::Songs | SearchFilter::Videos => {
                normalize::normalize(item, "").map(SearchItem::Track)
            }
            SearchFilter::Artists => ArtistStub::from_search(item, position)
                .map(|artist| SearchItem::Artist(artist.with_region(region))),
            SearchFilter::Albums => {
                AlbumStub::from_raw(item).map(|album| SearchItem::Album(album.with_region(region)))
            }
            SearchFilter::Playlists => PlaylistStub::from_raw(item)
                .map(|playlist| SearchItem::Playlist(playlist.with_region(region))),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::super::testing;
    use super::*;
    use crate::upstream::MockCatalogUpstream;
    use mockall::predicate::eq;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn song(id: &str, title: &str) -> Value {
        json!({
            "resultType": "song",
            "videoId": id,
            "title": title,
            "artists": [{"name": "Band"}],
            "thumbnails": [{"url": "https://lh3.googleusercontent.com/x=w60-h60", "width": 60, "height": 60}]
        })
    }

    #[tokio::test]
    async fn test_empty_query_is_rejected() {
        let (_dir, service) = testing::service(MockCatalogUpstream::new()).await;
        let err = service.search(&SearchRequest::new("   ")).await.unwrap_err();
        assert!(err.is_client_error());
    }

    #[tokio::test]
    async fn test_search_normalizes_and_caches() {
        let mut mock = MockCatalogUpstream::new();
        mock.expect_search()
            .with(eq("daft punk"), eq(SearchFilter::Songs), eq(10), eq(Some("es")))
            .times(1)
            .returning(|_, _, _, _| {
                Ok(vec![
                    song("abc1234567", "One More Time"),
                    json!({"resultType": "artist", "browseId": "UCdp"}),
                ])
            });
        let (_dir, service) = testing::service(mock).await;

        let request = SearchRequest::new("daft punk").language("es").region("ES");
        let first = service.search(&request).await.unwrap();
        let second = service.search(&request).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first.language, "es");
        assert_eq!(first.items.len(), 1);
        let SearchItem::Track(track) = &first.items[0] else {
            panic!("expected a track");
        };
        assert_eq!(track.artist, "Band");
        assert_eq!(
            track.thumbnail,
            "https://lh3.googleusercontent.com/x=w544-h544-l90-rj"
        );
    }

    #[tokio::test]
    async fn test_language_chain_on_errors() {
        let mut mock = MockCatalogUpstream::new();
        mock.expect_search()
            .with(eq("q"), eq(SearchFilter::Songs), eq(10), eq(Some("fr")))
            .times(1)
            .returning(|_, _, _, _| Err(CatalogError::upstream("search", "boom")));
        mock.expect_search()
            .with(eq("q"), eq(SearchFilter::Songs), eq(10), eq(Some("en")))
            .times(1)
            .returning(|_, _, _, _| Err(CatalogError::upstream("search", "boom")));
        mock.expect_search()
            .with(eq("q"), eq(SearchFilter::Songs), eq(10), eq(None::<&str>))
            .times(1)
            .returning(|_, _, _, _| Ok(vec![song("abc1234567", "Song")]));
        let (_dir, service) = testing::service(mock).await;

        let results = service
            .search(&SearchRequest::new("q").language("fr"))
            .await
            .unwrap();
        assert_eq!(results.language, "default");
        assert_eq!(results.region, "global");
        assert_eq!(results.items.len(), 1);
    }

    #[tokio::test]
    async fn test_all_languages_failing_yields_empty_uncached() {
        let mut mock = MockCatalogUpstream::new();
        mock.expect_search()
            .times(4)
            .returning(|_, _, _, _| Err(CatalogError::upstream("search", "down")));
        let (_dir, service) = testing::service(mock).await;

        // Unsupported language resolves to English: two attempts per call.
        let request = SearchRequest::new("q").language("xx");
        assert!(service.search(&request).await.unwrap().items.is_empty());
        assert!(service.search(&request).await.unwrap().items.is_empty());
    }

    #[tokio::test]
    async fn test_artist_search_builds_stubs() {
        let mut mock = MockCatalogUpstream::new();
        mock.expect_search().returning(|_, _, _, _| {
            Ok(vec![
                json!({"resultType": "artist", "browseId": "UCabc", "artist": "Rosalía"}),
                json!({"resultType": "artist", "title": "Sin id"}),
            ])
        });
        let (_dir, service) = testing::service(mock).await;

        let results = service
            .search(&SearchRequest::new("rosalia").filter(SearchFilter::Artists).region("ES"))
            .await
            .unwrap();
        let ids: Vec<String> = results
            .items
            .iter()
            .map(|item| match item {
                SearchItem::Artist(a) => a.id.clone(),
                other => panic!("unexpected {:?}", other),
            })
            .collect();
        assert_eq!(ids, vec!["UCabc".to_string(), "yt-artist-1".to_string()]);
    }

    #[tokio::test]
    async fn test_find_track_caches_only_real_matches() {
        let mut mock = MockCatalogUpstream::new();
        mock.expect_search()
            .with(eq("Song Band"), eq(SearchFilter::Songs), eq(5), eq(Some("en")))
            .times(1)
            .returning(|_, _, _, _| Ok(vec![song("abc1234567", "Song")]));
        mock.expect_search()
            .with(eq("nothing here"), eq(SearchFilter::Songs), eq(5), eq(Some("en")))
            .times(2)
            .returning(|_, _, _, _| Ok(vec![json!({"title": "no id"})]));
        let (_dir, service) = testing::service(mock).await;

        let found = service
            .find_track("Song", "Band", None, CacheMode::Use)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, "abc1234567");
        let again = service
            .find_track("Song", "Band", None, CacheMode::Use)
            .await
            .unwrap();
        assert_eq!(again, Some(found));

        for _ in 0..2 {
            let missing = service
                .find_track("", "", Some("nothing here"), CacheMode::Use)
                .await
                .unwrap();
            assert_eq!(missing, None);
        }

        assert!(service
            .find_track(" ", " ", None, CacheMode::Use)
            .await
            .unwrap_err()
            .is_client_error());
    }
}
