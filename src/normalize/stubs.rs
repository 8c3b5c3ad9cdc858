use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::rules::{first_match, FieldRule, Rule};
use super::thumbnail::{self, canonical_https};
use super::track::UNKNOWN_ARTIST;

const ARTIST_NAME_RULES: &[Rule] = &[
    Rule::text(FieldRule::Field("artist")),
    Rule::text(FieldRule::Field("name")),
    Rule::text(FieldRule::Field("title")),
];

const ALBUM_ARTIST_RULES: &[Rule] = &[
    Rule::text(FieldRule::FirstNameIn("artists")),
    Rule::text(FieldRule::Field("artist")),
    Rule::text(FieldRule::Field("subtitle")),
];

const PLAYLIST_AUTHOR_RULES: &[Rule] = &[
    Rule::text(FieldRule::Nested("author", "name")),
    Rule::text(FieldRule::Field("author")),
    Rule::text(FieldRule::FirstNameIn("authors")),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    pub url: String,
}

impl Image {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    /// Every usable URL of a `thumbnails` list, `https`-forced, in order.
    pub fn from_thumbnails(thumbnails: Option<&Value>) -> Vec<Image> {
        thumbnails
            .and_then(Value::as_array)
            .map(|list| {
                list.iter()
                    .filter_map(|t| t.get("url").and_then(Value::as_str))
                    .filter_map(canonical_https)
                    .map(Image::new)
                    .collect()
            })
            .unwrap_or_default()
    }
}

fn is_false(value: &bool) -> bool {
    !*value
}

fn str_field<'r>(record: &'r Map<String, Value>, name: &str) -> Option<&'r str> {
    record
        .get(name)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtistStub {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub images: Vec<Image>,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub popularity: u32,
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(rename = "fromSearch", default, skip_serializing_if = "is_false")]
    pub from_search: bool,
}

impl ArtistStub {
    /// Builds a stub from an artist search result. `position` numbers the
    /// results of one search and names records that carry no `browseId`.
    pub fn from_search(raw: &Value, position: usize) -> Option<Self> {
        let record = raw.as_object().filter(|r| !r.is_empty())?;
        let id = str_field(record, "browseId")
            .map(str::to_string)
            .unwrap_or_else(|| format!("yt-artist-{}", position));
        let name = first_match(ARTIST_NAME_RULES, record).unwrap_or(UNKNOWN_ARTIST);

        Some(Self {
            id,
            name: name.to_string(),
            images: Image::from_thumbnails(record.get("thumbnails")),
            genres: Vec::new(),
            popularity: 50,
            source: "youtube".to_string(),
            region: None,
            from_search: true,
        })
    }

    pub fn with_genre(mut self, genre: &str) -> Self {
        self.genres = vec![genre.to_string()];
        self
    }

    pub fn with_region(mut self, region: &str) -> Self {
        self.region = Some(region.to_string());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlbumStub {
    pub id: String,
    pub title: String,
    pub artist: String,
    #[serde(default)]
    pub images: Vec<Image>,
    #[serde(default)]
    pub year: String,
    #[serde(rename = "type", default = "AlbumStub::default_kind")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
}

impl AlbumStub {
    fn default_kind() -> String {
        "album".to_string()
    }

    /// Builds a stub from an album-like record (search result, chart or
    /// explore entry). Records without any identifier are named after
    /// their title; records with neither are rejected.
    pub fn from_raw(raw: &Value) -> Option<Self> {
        let record = raw.as_object().filter(|r| !r.is_empty())?;
        let title = str_field(record, "title");
        let id = str_field(record, "browseId")
            .or_else(|| str_field(record, "videoId"))
            .or_else(|| str_field(record, "audioPlaylistId"))
            .map(str::to_string)
            .or_else(|| title.map(|t| format!("yt-{}", t.replace(' ', "-"))))?;

        let mut images = Image::from_thumbnails(record.get("thumbnails"));
        if images.is_empty() {
            images.push(Image::new(thumbnail::resolve(record.get("thumbnails"))));
        }

        Some(Self {
            id,
            title: title.unwrap_or(super::track::UNTITLED).to_string(),
            artist: first_match(ALBUM_ARTIST_RULES, record)
                .unwrap_or(UNKNOWN_ARTIST)
                .to_string(),
            images,
            year: record
                .get("year")
                .map(|y| match y {
                    Value::String(s) => s.clone(),
                    Value::Number(n) => n.to_string(),
                    _ => String::new(),
                })
                .unwrap_or_default(),
            kind: str_field(record, "type")
                .or_else(|| str_field(record, "resultType"))
                .unwrap_or("album")
                .to_lowercase(),
            region: None,
        })
    }

    pub fn with_region(mut self, region: &str) -> Self {
        self.region = Some(region.to_string());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistStub {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub author: String,
    #[serde(rename = "trackCount", default)]
    pub track_count: u32,
    #[serde(default)]
    pub images: Vec<Image>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
}

impl PlaylistStub {
    /// Builds a stub from a playlist-like record. Playlists without an id
    /// or without any image are rejected.
    pub fn from_raw(raw: &Value) -> Option<Self> {
        let record = raw.as_object().filter(|r| !r.is_empty())?;
        let id = str_field(record, "playlistId").or_else(|| str_field(record, "browseId"))?;
        let images = Image::from_thumbnails(record.get("thumbnails"));
        if images.is_empty() {
            return None;
        }
        let track_count = ["trackCount", "itemCount", "count"]
            .iter()
            .find_map(|field| match record.get(*field)? {
                Value::Number(n) => n.as_u64(),
                Value::String(s) => s
                    .chars()
                    .filter(char::is_ascii_digit)
                    .collect::<String>()
                    .parse()
                    .ok(),
                _ => None,
            })
            .unwrap_or(0);

        Some(Self {
            id: id.to_string(),
            title: str_field(record, "title")
                .unwrap_or(super::track::UNTITLED)
                .to_string(),
            description: str_field(record, "description").unwrap_or_default().to_string(),
            author: first_match(PLAYLIST_AUTHOR_RULES, record)
                .unwrap_or("YouTube Music")
                .to_string(),
            track_count: u32::try_from(track_count).unwrap_or(u32::MAX),
            images,
            region: None,
        })
    }

    pub fn with_region(mut self, region: &str) -> Self {
        self.region = Some(region.to_string());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_artist_from_search() {
        let raw = json!({
            "browseId": "UCabc123",
            "artist": "Aitana",
            "thumbnails": [{"url": "http://lh3.example/a"}, {"url": ""}]
        });
        let stub = ArtistStub::from_search(&raw, 0)
            .unwrap()
            .with_genre("pop")
            .with_region("ES");

        assert_eq!(stub.id, "UCabc123");
        assert_eq!(stub.name, "Aitana");
        assert_eq!(stub.images, vec![Image::new("https://lh3.example/a")]);
        assert_eq!(stub.genres, vec!["pop".to_string()]);
        assert_eq!(stub.region.as_deref(), Some("ES"));
        assert!(stub.from_search);

        let value = serde_json::to_value(&stub).unwrap();
        assert_eq!(value["fromSearch"], json!(true));
    }

    #[test]
    fn test_artist_without_browse_id_is_numbered() {
        let stub = ArtistStub::from_search(&json!({"name": "Leiva"}), 3).unwrap();
        assert_eq!(stub.id, "yt-artist-3");
        assert!(stub.images.is_empty());
        assert!(ArtistStub::from_search(&json!(null), 0).is_none());
    }

    #[test]
    fn test_album_from_raw() {
        let raw = json!({
            "browseId": "MPREb_xyz",
            "title": "Motomami",
            "artists": [{"name": "Rosalía"}],
            "year": 2022,
            "resultType": "Album",
            "thumbnails": [{"url": "https://lh3.example/m=w120-h120"}]
        });
        let album = AlbumStub::from_raw(&raw).unwrap();
        assert_eq!(album.id, "MPREb_xyz");
        assert_eq!(album.artist, "Rosalía");
        assert_eq!(album.year, "2022");
        assert_eq!(album.kind, "album");
        assert_eq!(album.images.len(), 1);

        let album = AlbumStub::from_raw(&json!({"title": "New Thing", "subtitle": "Someone"})).unwrap();
        assert_eq!(album.id, "yt-New-Thing");
        assert_eq!(album.artist, "Someone");
        assert_eq!(album.images[0].url, thumbnail::DEFAULT_THUMBNAIL);
    }

    #[test]
    fn test_playlist_from_raw() {
        let raw = json!({
            "playlistId": "RDCLAK5uy_abc",
            "title": "Éxitos",
            "itemCount": "1,200 songs",
            "author": {"name": "YouTube Music"},
            "thumbnails": [{"url": "https://i.ytimg.com/vi/x/maxresdefault.jpg"}]
        });
        let playlist = PlaylistStub::from_raw(&raw).unwrap();
        assert_eq!(playlist.id, "RDCLAK5uy_abc");
        assert_eq!(playlist.track_count, 1200);
        assert_eq!(playlist.author, "YouTube Music");

        assert!(PlaylistStub::from_raw(&json!({"playlistId": "x", "thumbnails": []})).is_none());
    }
}
