//! # Fallback Data
//!
//! Synthetic, region- and genre-keyed datasets served when the upstream
//! fails or returns nothing. Every generator is infallible.
//!
//! Matched genres always produce the same list. Unmatched genres get a
//! shuffled mix of every genre table; with `FALLBACK_SEED` set the mix
//! is the same on every call.

mod data;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::{debug, info};

use crate::model::GenreRecommendations;
use crate::normalize::{AlbumStub, ArtistStub, Image, PlaylistStub, Track, TrackDuration};
use data::{SeedAlbum, SeedArtist, SeedPlaylist, SeedSingle};

const GLOBAL_REGION: &str = "global";
const FALLBACK_POPULARITY: u32 = 50;

#[derive(Debug, Clone, Default)]
pub struct FallbackProvider {
    seed: Option<u64>,
}

impl FallbackProvider {
    pub fn new(seed: Option<u64>) -> Self {
        Self { seed }
    }

    fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }

    /// Table key matching `genre`: lowercase substring match in either
    /// direction, first table wins. Empty genres match nothing.
    pub fn match_genre(genre: &str) -> Option<&'static str> {
        let genre = genre.trim().to_lowercase();
        if genre.is_empty() {
            return None;
        }
        data::GENRE_ARTISTS
            .iter()
            .map(|(key, _)| *key)
            .find(|key| genre.contains(key) || key.contains(genre.as_str()))
    }

    /// Up to `count` artists for `genre` in `region`: region-specific
    /// artists first, then the genre table.
    pub fn artists_for(&self, genre: &str, count: usize, region: &str) -> Vec<ArtistStub> {
        let matched = Self::match_genre(genre);

        let regional: Vec<&SeedArtist> = matched
            .and_then(|key| {
                data::REGION_ARTISTS
                    .iter()
                    .find(|(r, g, _)| r.eq_ignore_ascii_case(region) && *g == key)
            })
            .map(|(_, _, artists)| artists.iter().collect())
            .unwrap_or_default();

        let generic: Vec<&SeedArtist> = match matched {
            Some(key) => data::GENRE_ARTISTS
                .iter()
                .filter(|(g, _)| *g == key)
                .flat_map(|(_, artists)| artists.iter())
                .collect(),
            None => {
                let mut all: Vec<&SeedArtist> = data::GENRE_ARTISTS
                    .iter()
                    .flat_map(|(_, artists)| artists.iter())
                    .collect();
                all.shuffle(&mut self.rng());
                all
            }
        };

        debug!(
            "Artistas predefinidos para '{}' ({:?}) en {}: {} regionales",
            genre,
            matched,
            region,
            regional.len()
        );

        regional
            .into_iter()
            .chain(generic)
            .take(count)
            .map(|seed| ArtistStub {
                id: seed.id.to_string(),
                name: seed.name.to_string(),
                images: vec![Image::new(seed.image)],
                genres: vec![genre.to_string()],
                popularity: FALLBACK_POPULARITY,
                source: "youtube".to_string(),
                region: Some(region.to_string()),
                from_search: false,
            })
            .collect()
    }

    pub fn featured_playlists(&self, region: &str, limit: usize) -> Vec<PlaylistStub> {
        info!("📋 Usando playlists predefinidas para región {}", region);
        regional(data::REGION_PLAYLISTS, region)
            .iter()
            .map(|seed| to_playlist(seed, region))
            .chain(
                data::GLOBAL_PLAYLISTS
                    .iter()
                    .map(|seed| to_playlist(seed, GLOBAL_REGION)),
            )
            .take(limit)
            .collect()
    }

    pub fn new_releases(&self, region: &str, limit: usize) -> Vec<AlbumStub> {
        info!("💿 Usando álbumes predefinidos para región {}", region);
        regional(data::REGION_ALBUMS, region)
            .iter()
            .map(|seed| to_album(seed, region))
            .chain(
                data::GLOBAL_ALBUMS
                    .iter()
                    .map(|seed| to_album(seed, GLOBAL_REGION)),
            )
            .take(limit)
            .collect()
    }

    pub fn chart_singles(&self, region: &str, limit: usize) -> Vec<Track> {
        regional(data::REGION_SINGLES, region)
            .iter()
            .chain(data::GLOBAL_SINGLES)
            .take(limit)
            .map(to_track)
            .collect()
    }

    /// Five artists, three playlists and ten tracks per genre.
    pub fn genre_recommendations(&self, genres: &[String]) -> GenreRecommendations {
        let mut result = GenreRecommendations::default();

        for genre in genres {
            let label = capitalize(genre);
            let slug = genre.replace(' ', "+");

            for i in 1..=5 {
                result.artists.push(ArtistStub {
                    id: format!("fallback_artist_{}_{}", genre, i - 1),
                    name: format!("Artista de {} {}", label, i),
                    images: vec![Image::new(placeholder(&format!("{}+Artist+{}", slug, i)))],
                    genres: vec![genre.clone()],
                    popularity: 80,
                    source: "youtube_music".to_string(),
                    region: None,
                    from_search: false,
                });
            }

            for i in 1..=3 {
                result.playlists.push(PlaylistStub {
                    id: format!("fallback_playlist_{}_{}", genre, i - 1),
                    title: format!("Playlist de {} {}", label, i),
                    description: format!("Los mejores éxitos de {}", genre),
                    author: "YouTube Music".to_string(),
                    track_count: 20,
                    images: vec![Image::new(placeholder(&format!("{}+Playlist+{}", slug, i)))],
                    region: None,
                });
            }

            for i in 1..=10 {
                result.tracks.push(Track {
                    id: format!("fallback_track_{}_{}", genre, i - 1),
                    title: format!("Canción de {} {}", label, i),
                    artist: format!("Artista de {}", label),
                    thumbnail: placeholder(&format!("{}+Track+{}", slug, i)),
                    duration: TrackDuration::Seconds(180),
                    album: Some(format!("Álbum de {}", label)),
                    source: "youtube".to_string(),
                });
            }
        }
        result
    }

    /// At most sixteen generic popular artists.
    pub fn top_artists(&self, limit: usize) -> Vec<ArtistStub> {
        (0..limit.min(16))
            .map(|i| ArtistStub {
                id: format!("artist{}", i),
                name: format!("Artista Popular {}", i),
                images: vec![Image::new(placeholder(&format!("Artist{}", i)))],
                genres: vec![data::TOP_ARTIST_GENRES[i % data::TOP_ARTIST_GENRES.len()].to_string()],
                popularity: 80 + (i % 20) as u32,
                source: "youtube_music".to_string(),
                region: None,
                from_search: false,
            })
            .collect()
    }
}

fn regional<T>(table: &'static [(&'static str, &'static [T])], region: &str) -> &'static [T] {
    table
        .iter()
        .find(|(r, _)| r.eq_ignore_ascii_case(region))
        .map(|(_, items)| *items)
        .unwrap_or(&[])
}

fn placeholder(text: &str) -> String {
    format!("https://via.placeholder.com/300?text={}", text)
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

fn to_playlist(seed: &SeedPlaylist, region: &str) -> PlaylistStub {
    PlaylistStub {
        id: seed.id.to_string(),
        title: seed.title.to_string(),
        description: seed.description.to_string(),
        author: "YouTube Music".to_string(),
        track_count: seed.track_count,
        images: vec![Image::new(seed.image)],
        region: Some(region.to_string()),
    }
}

fn to_album(seed: &SeedAlbum, region: &str) -> AlbumStub {
    AlbumStub {
        id: seed.id.to_string(),
        title: seed.title.to_string(),
        artist: seed.artist.to_string(),
        images: vec![Image::new(seed.image)],
        year: "2025".to_string(),
        kind: "album".to_string(),
        region: Some(region.to_string()),
    }
}

fn to_track(seed: &SeedSingle) -> Track {
    Track {
        id: seed.video_id.to_string(),
        title: seed.title.to_string(),
        artist: seed.artist.to_string(),
        thumbnail: seed.image.to_string(),
        duration: TrackDuration::default(),
        album: None,
        source: "youtube_music".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ids(artists: &[ArtistStub]) -> Vec<&str> {
        artists.iter().map(|a| a.id.as_str()).collect()
    }

    #[test]
    fn test_pop_in_spain_puts_regional_artists_first() {
        let provider = FallbackProvider::default();
        let artists = provider.artists_for("pop", 4, "ES");

        assert_eq!(ids(&artists), vec!["es-pop1", "es-pop2", "es-pop3", "pop1"]);
        for artist in &artists {
            assert_eq!(artist.genres, vec!["pop".to_string()]);
            assert_eq!(artist.region.as_deref(), Some("ES"));
            assert_eq!(artist.popularity, 50);
            assert_eq!(artist.source, "youtube");
        }
        assert_eq!(artists, provider.artists_for("pop", 4, "ES"));
    }

    #[test]
    fn test_genre_matching_is_substring_both_ways() {
        assert_eq!(FallbackProvider::match_genre("K-Pop"), Some("pop"));
        assert_eq!(FallbackProvider::match_genre("hip"), Some("hip hop"));
        assert_eq!(FallbackProvider::match_genre("Electronic Dance"), Some("electronic"));
        assert_eq!(FallbackProvider::match_genre("jazz"), None);
        assert_eq!(FallbackProvider::match_genre(""), None);
    }

    #[test]
    fn test_region_without_override_uses_genre_table() {
        let artists = FallbackProvider::default().artists_for("rock", 10, "US");
        assert_eq!(ids(&artists), vec!["rock1", "rock2", "rock3", "rock4"]);
        assert_eq!(artists[0].genres, vec!["rock".to_string()]);
    }

    #[test]
    fn test_unmatched_genre_mixes_all_tables() {
        let provider = FallbackProvider::new(Some(7));
        let a = provider.artists_for("jazz", 20, "US");
        let b = provider.artists_for("jazz", 20, "US");

        assert_eq!(a.len(), 20);
        assert_eq!(a, b);
        assert!(a.iter().all(|x| x.genres == vec!["jazz".to_string()]));

        let unseeded = FallbackProvider::default().artists_for("jazz", 20, "US");
        let mut sorted_a = ids(&a);
        let mut sorted_u = ids(&unseeded);
        sorted_a.sort();
        sorted_u.sort();
        assert_eq!(sorted_a, sorted_u);
    }

    #[test]
    fn test_playlists_albums_and_singles() {
        let provider = FallbackProvider::default();

        let playlists = provider.featured_playlists("MX", 3);
        assert_eq!(playlists.len(), 3);
        assert_eq!(playlists[0].id, "MX_regional");
        assert_eq!(playlists[2].region.as_deref(), Some("global"));

        let albums = provider.new_releases("FR", 10);
        assert_eq!(albums.len(), 5);
        assert_eq!(albums[0].artist, "Dua Lipa");

        let singles = provider.chart_singles("US", 20);
        assert_eq!(
            singles.iter().map(|t| t.id.as_str()).collect::<Vec<_>>(),
            vec!["us_pop_1", "global_pop_1", "global_pop_2"]
        );
    }

    #[test]
    fn test_genre_recommendations_shape() {
        let recs = FallbackProvider::default()
            .genre_recommendations(&["pop".to_string(), "hip hop".to_string()]);

        assert_eq!(recs.artists.len(), 10);
        assert_eq!(recs.playlists.len(), 6);
        assert_eq!(recs.tracks.len(), 20);
        assert_eq!(recs.artists[0].name, "Artista de Pop 1");
        assert_eq!(
            recs.tracks[10].thumbnail,
            "https://via.placeholder.com/300?text=hip+hop+Track+1"
        );
    }

    #[test]
    fn test_top_artists_capped_at_sixteen() {
        let provider = FallbackProvider::default();
        assert_eq!(provider.top_artists(40).len(), 16);
        let top = provider.top_artists(6);
        assert_eq!(top[5].genres, vec!["pop".to_string()]);
        assert_eq!(top[5].popularity, 85);
    }
}
