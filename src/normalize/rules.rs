//! Field extraction rules.
//!
//! Upstream records reach us in several shapes. Instead of nesting
//! lookups, every field we need is described as an ordered list of
//! [`Rule`]s; the first rule that yields an acceptable value wins.

use serde_json::{Map, Value};

/// Where a rule looks for a string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRule {
    /// String at a top-level field.
    Field(&'static str),
    /// `name` of the first element of a list of objects that has one.
    FirstNameIn(&'static str),
    /// String at `outer.inner`.
    Nested(&'static str, &'static str),
    /// First string field, in record order, whose lowercased name contains
    /// any of the fragments.
    KeyContains(&'static [&'static str]),
}

/// What a found string must look like to be accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accept {
    NonEmpty,
    /// At least `min_chars` characters and not the literal `default`.
    Identifier { min_chars: usize },
    /// More than `min_chars` characters.
    LongerThan { min_chars: usize },
    /// Starts with `http` and is longer than ten characters.
    HttpUrl,
}

impl Accept {
    pub fn accepts(self, value: &str) -> bool {
        match self {
            Accept::NonEmpty => !value.is_empty(),
            Accept::Identifier { min_chars } => {
                value != "default" && value.chars().count() >= min_chars
            }
            Accept::LongerThan { min_chars } => value.chars().count() > min_chars,
            Accept::HttpUrl => value.starts_with("http") && value.chars().count() > 10,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rule {
    pub source: FieldRule,
    pub accept: Accept,
}

impl Rule {
    pub const fn new(source: FieldRule, accept: Accept) -> Self {
        Self { source, accept }
    }

    pub const fn text(source: FieldRule) -> Self {
        Self::new(source, Accept::NonEmpty)
    }

    /// First acceptable string this rule finds in `record`.
    pub fn apply<'r>(&self, record: &'r Map<String, Value>) -> Option<&'r str> {
        let accept = |s: &&str| self.accept.accepts(s);
        match self.source {
            FieldRule::Field(name) => record.get(name).and_then(Value::as_str).filter(accept),
            FieldRule::FirstNameIn(list) => record
                .get(list)
                .and_then(Value::as_array)?
                .iter()
                .filter_map(|item| item.get("name").and_then(Value::as_str))
                .find(|name| !name.is_empty())
                .filter(accept),
            FieldRule::Nested(outer, inner) => record
                .get(outer)
                .and_then(|o| o.get(inner))
                .and_then(Value::as_str)
                .filter(accept),
            FieldRule::KeyContains(fragments) => record.iter().find_map(|(name, value)| {
                let name = name.to_lowercase();
                if !fragments.iter().any(|f| name.contains(f)) {
                    return None;
                }
                value.as_str().filter(accept)
            }),
        }
    }
}

/// Folds `rules` in order and returns the first hit.
pub fn first_match<'r>(rules: &[Rule], record: &'r Map<String, Value>) -> Option<&'r str> {
    rules.iter().find_map(|rule| rule.apply(record))
}

pub const ID_RULES: &[Rule] = &[
    Rule::new(FieldRule::Field("videoId"), Accept::Identifier { min_chars: 5 }),
    Rule::new(FieldRule::Field("id"), Accept::Identifier { min_chars: 6 }),
    Rule::new(FieldRule::Field("browseId"), Accept::Identifier { min_chars: 6 }),
    Rule::new(FieldRule::KeyContains(&["id"]), Accept::Identifier { min_chars: 6 }),
];

pub const ARTIST_RULES: &[Rule] = &[
    Rule::text(FieldRule::FirstNameIn("artists")),
    Rule::text(FieldRule::Field("artist")),
    Rule::text(FieldRule::Field("author")),
    Rule::text(FieldRule::FirstNameIn("authors")),
    Rule::text(FieldRule::Nested("artistInfo", "artist")),
    Rule::text(FieldRule::KeyContains(&["artist"])),
];

/// Image fields tried when `thumbnails` gave nothing usable.
pub const ALTERNATE_THUMBNAIL_RULES: &[Rule] = &[
    Rule::new(FieldRule::Field("thumbnail"), Accept::LongerThan { min_chars: 10 }),
    Rule::new(FieldRule::Field("cover"), Accept::LongerThan { min_chars: 10 }),
    Rule::new(FieldRule::Field("albumArt"), Accept::LongerThan { min_chars: 10 }),
    Rule::new(
        FieldRule::KeyContains(&["image", "thumbnail", "cover"]),
        Accept::HttpUrl,
    ),
];

pub const ALBUM_RULES: &[Rule] = &[
    Rule::text(FieldRule::Nested("album", "name")),
    Rule::text(FieldRule::Field("album")),
];
