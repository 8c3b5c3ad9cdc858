//! Error taxonomy for the catalog engine.
//!
//! Library code returns [`CatalogError`]; the binary and configuration
//! loading use `anyhow` on top of it.

use std::io;

/// Errors surfaced by the cache, the upstream capability and the catalog
/// operations.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// The upstream service failed (network, HTTP status, unexpected body).
    #[error("upstream {operation} failed: {message}")]
    Upstream {
        operation: &'static str,
        message: String,
    },

    /// The upstream answered, but a structural key the caller relies on
    /// is missing (the upstream changed its response layout).
    #[error("upstream {operation} response is missing '{missing}'")]
    StructureChanged {
        operation: &'static str,
        missing: String,
    },

    /// The upstream adapter cannot serve this operation at all.
    #[error("upstream does not support {0}")]
    Unsupported(&'static str),

    /// Caller supplied invalid or missing parameters.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Nothing was found for an otherwise valid request.
    #[error("not found: {0}")]
    NotFound(String),

    #[error("cache I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CatalogError {
    pub fn upstream(operation: &'static str, message: impl Into<String>) -> Self {
        CatalogError::Upstream {
            operation,
            message: message.into(),
        }
    }

    pub fn structure_changed(operation: &'static str, missing: impl Into<String>) -> Self {
        CatalogError::StructureChanged {
            operation,
            missing: missing.into(),
        }
    }

    /// Whether this error is the caller's fault (reported immediately,
    /// never masked by fallback data).
    pub fn is_client_error(&self) -> bool {
        matches!(self, CatalogError::InvalidInput(_))
    }
}

pub type Result<T, E = CatalogError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_operation() {
        let err = CatalogError::upstream("search", "timeout");
        assert_eq!(err.to_string(), "upstream search failed: timeout");

        let err = CatalogError::structure_changed("get_artist", "musicImmersiveHeaderRenderer");
        assert!(err.to_string().contains("musicImmersiveHeaderRenderer"));
    }

    #[test]
    fn test_only_invalid_input_is_client_error() {
        assert!(CatalogError::InvalidInput("query".into()).is_client_error());
        assert!(!CatalogError::NotFound("lyrics".into()).is_client_error());
        assert!(!CatalogError::Unsupported("lyrics").is_client_error());
    }
}
