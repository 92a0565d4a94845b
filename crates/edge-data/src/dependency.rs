//! Dependency tagging for semantic categorization.

use std::time::Duration;

/// The outbound dependencies of a prerender workload.
///
/// Each tag carries a default timeout used by [`crate::FetchPolicy::from_tag`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DependencyTag {
    /// Backing job store (lookup by slug).
    Store,
    /// Removed-content list served from the site origin.
    Tombstones,
    /// Client-rendered site origin, for pass-through proxying.
    Upstream,
}

impl DependencyTag {
    /// Get the default timeout for this dependency type.
    pub fn default_timeout(&self) -> Duration {
        match self {
            Self::Store => Duration::from_secs(10),
            Self::Tombstones => Duration::from_secs(3),
            Self::Upstream => Duration::from_secs(10),
        }
    }

    /// Get the name of this dependency.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Store => "store",
            Self::Tombstones => "tombstones",
            Self::Upstream => "upstream",
        }
    }
}

impl std::fmt::Display for DependencyTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_timeout_is_ten_seconds() {
        assert_eq!(DependencyTag::Store.default_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_tombstones_fail_fast() {
        assert!(DependencyTag::Tombstones.default_timeout() < DependencyTag::Store.default_timeout());
    }

    #[test]
    fn test_names() {
        assert_eq!(DependencyTag::Tombstones.to_string(), "tombstones");
        assert_eq!(DependencyTag::Upstream.name(), "upstream");
    }
}
