//! # Normalization
//!
//! Turns untrusted upstream records into the crate's canonical shapes.
//!
//! The upstream returns the same entity in many layouts: a song may carry
//! `artists[].name`, `artist`, `author` or nothing at all; ids may live in
//! `videoId`, `id`, `browseId` or some other `*Id` field; images may be a
//! `thumbnails` list, a `cover` string or missing. Every normalizer here is
//! total: given any JSON object it produces a usable value, synthesizing
//! what is missing.
//!
//! - [`thumbnail`]: best image of a `thumbnails` list, upscaled and `https`
//! - [`rules`]: ordered field-extraction rules
//! - [`track`]: canonical [`Track`]
//! - [`stubs`]: [`ArtistStub`], [`AlbumStub`], [`PlaylistStub`]

pub mod rules;
pub mod stubs;
pub mod thumbnail;
pub mod track;

pub use stubs::{AlbumStub, ArtistStub, Image, PlaylistStub};
pub use thumbnail::DEFAULT_THUMBNAIL;
pub use track::{infer_artist_from_title, normalize, normalize_all, Track, TrackDuration};
