//! # Cache Module
//!
//! Disk-backed response cache for the catalog.
//!
//! Every upstream-derived response is stored as one JSON document per
//! key in the cache directory and served back until its TTL runs out.
//! The cache never evicts by size; entries live until they expire and
//! are purged, or until they are invalidated.
//!
//! ## Pieces
//!
//! - [`CacheKey`]: canonical `operation?name=value&...` key, independent of
//!   parameter order
//! - [`CacheEntry`]: the on-disk document (`key`, `timestamp`, `ttl`, `data`)
//! - [`CacheStore`]: read/write/invalidate/purge over the directory
//! - [`CachePolicy`]: "return the cached value or compute and store it",
//!   shared by every catalog operation
//!
//! ## Configuration
//!
//! ```env
//! CACHE_DIR=cache             # Directory holding the documents
//! CACHE_TTL=1h                # TTL for legacy documents without one
//! ```
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use freevibes_catalog::cache::{CacheKey, CacheMode, CachePolicy, CacheStore};
//! use std::time::Duration;
//!
//! # async fn example() -> freevibes_catalog::error::Result<()> {
//! let store = CacheStore::open("cache", Duration::from_secs(3600)).await?;
//! let policy = CachePolicy::new(store);
//!
//! let key = CacheKey::new("charts").param("region", "US");
//! let charts: Vec<String> = policy
//!     .invoke(&key, Duration::from_secs(3600), CacheMode::Use, || async {
//!         Ok(vec!["Song A".to_string(), "Song B".to_string()])
//!     })
//!     .await?;
//! println!("{} singles", charts.len());
//! # Ok(())
//! # }
//! ```

pub mod entry;
pub mod key;
pub mod policy;
pub mod store;

pub use entry::CacheEntry;
pub use key::CacheKey;
pub use policy::{CacheMode, CachePolicy, PolicyStats, Produced};
pub use store::{CacheStats, CacheStore};
