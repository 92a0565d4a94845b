//! Resource limits for workload execution.

use serde::{Deserialize, Serialize};

/// Resource limits configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceLimits {
    /// Maximum size of a single fetched response body.
    pub max_fetch_response_bytes: usize,
    /// Maximum number of entries kept from a removed-content list.
    pub max_tombstone_entries: usize,
    /// Maximum length of a slug worth sending to the store.
    pub max_slug_bytes: usize,
}

impl Default for ResourceLimits {
    fn default() -> Self {
        Self {
            max_fetch_response_bytes: 2 * 1024 * 1024, // 2 MB
            max_tombstone_entries: 50_000,
            max_slug_bytes: 512,
        }
    }
}

impl ResourceLimits {
    /// Create new resource limits with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set maximum fetched body size.
    pub fn with_max_fetch_response_bytes(mut self, bytes: usize) -> Self {
        self.max_fetch_response_bytes = bytes;
        self
    }

    /// Set maximum removed-content list size.
    pub fn with_max_tombstone_entries(mut self, entries: usize) -> Self {
        self.max_tombstone_entries = entries;
        self
    }

    /// Set maximum slug length.
    pub fn with_max_slug_bytes(mut self, bytes: usize) -> Self {
        self.max_slug_bytes = bytes;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), LimitsError> {
        if self.max_fetch_response_bytes == 0 {
            return Err(LimitsError::InvalidConfig(
                "max_fetch_response_bytes must be > 0".to_string(),
            ));
        }
        if self.max_slug_bytes == 0 {
            return Err(LimitsError::InvalidConfig(
                "max_slug_bytes must be > 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Check a slug against the length limit.
    pub fn check_slug(&self, slug: &str) -> Result<(), LimitsError> {
        if slug.len() > self.max_slug_bytes {
            return Err(LimitsError::SlugTooLong {
                size: slug.len(),
                limit: self.max_slug_bytes,
            });
        }
        Ok(())
    }
}

/// Errors from limit checks.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LimitsError {
    #[error("invalid limits configuration: {0}")]
    InvalidConfig(String),

    #[error("slug of {size} bytes exceeds limit of {limit}")]
    SlugTooLong { size: usize, limit: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        assert!(ResourceLimits::default().validate().is_ok());
    }

    #[test]
    fn test_zero_body_limit_rejected() {
        let limits = ResourceLimits::new().with_max_fetch_response_bytes(0);
        assert!(matches!(limits.validate(), Err(LimitsError::InvalidConfig(_))));
    }

    #[test]
    fn test_slug_check() {
        let limits = ResourceLimits::new().with_max_slug_bytes(8);
        assert!(limits.check_slug("rust-dev").is_ok());
        assert_eq!(
            limits.check_slug("rust-developer"),
            Err(LimitsError::SlugTooLong { size: 14, limit: 8 })
        );
    }
}
