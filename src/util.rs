//! Small helpers shared across the crate.

use std::time::Duration;

/// 64-bit FNV-1a. Stable across runs and platforms, which is all the
/// synthesized ids and file names need.
pub fn fnv1a64(data: &[u8]) -> u64 {
    let mut h: u64 = 0xcbf29ce484222325;
    for &b in data {
        h ^= b as u64;
        h = h.wrapping_mul(0x100000001b3);
    }
    h
}

/// Formats a duration for logs, e.g. `1h 30m`.
pub fn human(duration: Duration) -> String {
    humantime::format_duration(Duration::from_secs(duration.as_secs())).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fnv1a64_known_values() {
        assert_eq!(fnv1a64(b""), 0xcbf29ce484222325);
        assert_eq!(fnv1a64(b"a"), 0xaf63dc4c8601ec8c);
    }

    #[test]
    fn test_human_drops_subsecond_noise() {
        assert_eq!(human(Duration::from_millis(3_600_250)), "1h");
    }
}
