//! Failure taxonomy for the prerender pipeline.

use std::time::Duration;

use edge_sdk::edge_core::ConfigError;

use crate::render::RenderError;
use crate::resolve::ResolveError;

/// Everything that can stop a prerender short of a `200`.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PrerenderError {
    #[error("configuration missing: {0}")]
    ConfigurationMissing(#[from] ConfigError),

    /// Never surfaced to the client; the pipeline continues untombstoned.
    #[error("tombstone list unavailable: {0}")]
    TombstoneListUnavailable(String),

    #[error("job not found")]
    NotFound,

    #[error("store lookup timed out after {0:?}")]
    Timeout(Duration),

    #[error("store error: {0}")]
    StoreError(String),

    #[error("unexpected failure: {0}")]
    UnexpectedFailure(String),
}

impl From<ResolveError> for PrerenderError {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::NotFound => Self::NotFound,
            ResolveError::Timeout(limit) => Self::Timeout(limit),
            ResolveError::StoreError(message) => Self::StoreError(message),
        }
    }
}

impl From<RenderError> for PrerenderError {
    fn from(err: RenderError) -> Self {
        Self::UnexpectedFailure(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_errors_map_one_to_one() {
        assert_eq!(PrerenderError::from(ResolveError::NotFound), PrerenderError::NotFound);
        assert_eq!(
            PrerenderError::from(ResolveError::Timeout(Duration::from_secs(10))),
            PrerenderError::Timeout(Duration::from_secs(10))
        );
        assert_eq!(
            PrerenderError::from(ResolveError::StoreError("boom".into())),
            PrerenderError::StoreError("boom".into())
        );
    }

    #[test]
    fn test_config_error_message() {
        let err = PrerenderError::from(ConfigError::Missing("SUPABASE_KEY"));
        assert_eq!(
            err.to_string(),
            "configuration missing: missing configuration value: SUPABASE_KEY"
        );
    }
}
