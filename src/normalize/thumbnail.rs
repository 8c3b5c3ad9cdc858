use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;
use tracing::debug;
use url::Url;

/// Returned whenever no usable candidate exists.
pub const DEFAULT_THUMBNAIL: &str = "https://img.youtube.com/vi/default/hqdefault.jpg";

/// Size suffix appended to upstream image URLs (`=w544-h544-l90-rj`).
const HIGH_RES_SUFFIX: &str = "=w544-h544-l90-rj";

static SIZE_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"=w\d+-h\d+.*$").expect("valid size-suffix pattern"));

/// YouTube's own still for a video id.
pub fn video_thumbnail(id: &str) -> String {
    format!("https://img.youtube.com/vi/{}/hqdefault.jpg", id)
}

/// Picks the best image from a `thumbnails` value and rewrites it to the
/// high-resolution, `https` form. Always returns an absolute URL.
///
/// Candidates carrying both `width` and `height` win over those without;
/// among them the largest area wins and equal areas keep the earliest one.
pub fn resolve(thumbnails: Option<&Value>) -> String {
    let Some(candidates) = thumbnails.and_then(Value::as_array) else {
        return DEFAULT_THUMBNAIL.to_string();
    };

    let mut best_sized: Option<(f64, &str)> = None;
    let mut first_unsized: Option<&str> = None;

    for candidate in candidates {
        let Some(url) = candidate.get("url").and_then(Value::as_str) else {
            continue;
        };
        if url.is_empty() {
            continue;
        }
        let width = candidate.get("width").and_then(Value::as_f64);
        let height = candidate.get("height").and_then(Value::as_f64);
        match (width, height) {
            (Some(w), Some(h)) => {
                let area = w * h;
                if best_sized.is_none_or(|(best, _)| area > best) {
                    best_sized = Some((area, url));
                }
            }
            _ => {
                first_unsized.get_or_insert(url);
            }
        }
    }

    let Some(chosen) = best_sized.map(|(_, url)| url).or(first_unsized) else {
        return DEFAULT_THUMBNAIL.to_string();
    };

    let resized = upscale(chosen);
    match canonical_https(&resized) {
        Some(url) => url,
        None => {
            debug!("Miniatura inválida descartada: {}", chosen);
            DEFAULT_THUMBNAIL.to_string()
        }
    }
}

/// Replaces an upstream `=w<W>-h<H>...` size suffix with the high-resolution
/// one; any other `=`-suffix is dropped.
pub fn upscale(url: &str) -> String {
    if SIZE_SUFFIX.is_match(url) {
        return SIZE_SUFFIX.replace(url, HIGH_RES_SUFFIX).into_owned();
    }
    match url.split_once('=') {
        Some((base, _)) => base.to_string(),
        None => url.to_string(),
    }
}

/// Forces `https` on an absolute or protocol-relative URL. Anything that
/// still is not an absolute URL with a host yields `None`.
pub fn canonical_https(url: &str) -> Option<String> {
    let url = url.trim();
    let candidate = if let Some(rest) = url.strip_prefix("http:") {
        format!("https:{}", rest)
    } else if url.starts_with("//") {
        format!("https:{}", url)
    } else {
        url.to_string()
    };

    let parsed = Url::parse(&candidate).ok()?;
    if parsed.scheme() != "https" || parsed.host_str().is_none() {
        return None;
    }
    Some(candidate)
}
