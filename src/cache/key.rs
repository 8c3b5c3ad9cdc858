use std::collections::BTreeMap;
use std::fmt;

use crate::util::fnv1a64;

/// Longest file stem we hand to the filesystem; most filesystems cap a
/// name at 255 bytes and we still append `.json` and a temp suffix.
const MAX_STEM_BYTES: usize = 180;

/// Canonical identifier of a cached computation.
///
/// A key is an operation name plus a set of named parameters. Parameters
/// are kept sorted by name, so the order in which a call site adds them
/// never changes the key:
///
/// ```rust
/// use freevibes_catalog::cache::CacheKey;
///
/// let a = CacheKey::new("artists_by_genre").param("genre", "pop").param("region", "ES");
/// let b = CacheKey::new("artists_by_genre").param("region", "ES").param("genre", "pop");
/// assert_eq!(a, b);
/// assert_eq!(a.to_string(), "artists_by_genre?genre=pop&region=ES");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    operation: String,
    params: BTreeMap<String, String>,
}

impl CacheKey {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            params: BTreeMap::new(),
        }
    }

    /// Adds a parameter. Values are trimmed; adding the same name twice
    /// keeps the last value.
    pub fn param(mut self, name: &str, value: impl fmt::Display) -> Self {
        self.params
            .insert(name.to_string(), value.to_string().trim().to_string());
        self
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.operation)?;
        for (i, (name, value)) in self.params.iter().enumerate() {
            let sep = if i == 0 { '?' } else { '&' };
            write!(
                f,
                "{}{}={}",
                sep,
                urlencoding::encode(name),
                urlencoding::encode(value)
            )?;
        }
        Ok(())
    }
}

/// Maps a key string to a file stem by replacing path-unsafe characters
/// with `_`. Distinct keys may collide after this transform.
///
/// Over-long stems are cut and suffixed with a hash of the full key.
pub fn sanitize(key: &str) -> String {
    let stem: String = key
        .chars()
        .map(|c| match c {
            '/' | '?' | '=' | '\\' => '_',
            c => c,
        })
        .collect();

    if stem.len() <= MAX_STEM_BYTES {
        return stem;
    }

    let mut cut = MAX_STEM_BYTES - 17;
    while !stem.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}~{:016x}", &stem[..cut], fnv1a64(key.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_param_order_does_not_matter() {
        let a = CacheKey::new("search")
            .param("query", "daft punk")
            .param("limit", 10)
            .param("region", "US");
        let b = CacheKey::new("search")
            .param("region", "US")
            .param("query", "daft punk")
            .param("limit", 10);
        assert_eq!(a, b);
        assert_eq!(a.to_string(), b.to_string());
    }

    #[test]
    fn test_values_are_trimmed_and_encoded() {
        let key = CacheKey::new("find_track").param("query", "  AC/DC = rock ");
        assert_eq!(key.to_string(), "find_track?query=AC%2FDC%20%3D%20rock");
        assert!(!sanitize(&key.to_string()).contains('/'));
    }

    #[test]
    fn test_operation_without_params() {
        assert_eq!(CacheKey::new("mood_categories").to_string(), "mood_categories");
    }

    #[test]
    fn test_sanitize_replaces_unsafe_characters() {
        assert_eq!(sanitize("charts/US?limit=20"), "charts_US_limit_20");
        assert_eq!(sanitize("a\\b"), "a_b");
    }

    #[test]
    fn test_sanitize_bounds_long_keys() {
        let long = format!("search?query={}", "ñ".repeat(200));
        let stem = sanitize(&long);
        assert!(stem.len() <= MAX_STEM_BYTES);
        assert_ne!(stem, sanitize(&format!("{}x", long)));
    }
}
