//! Cached, normalizing front for a third-party music catalog.
//!
//! [`catalog::CatalogService`] is the entry point; see its module docs.

pub mod cache;
pub mod catalog;
pub mod config;
pub mod error;
pub mod fallback;
pub mod model;
pub mod normalize;
pub mod strategy;
pub mod upstream;
pub mod util;
