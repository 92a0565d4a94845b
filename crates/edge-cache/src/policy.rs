//! Route-level cache policies.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Cache scope determining who can cache the response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheScope {
    /// Cacheable by CDNs and crawlers (shared cache).
    Public,
    /// Never stored.
    #[default]
    None,
}

impl CacheScope {
    /// Get the Cache-Control directive for this scope.
    pub fn cache_control_directive(&self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::None => "no-store",
        }
    }
}

/// Route-level cache policy.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RouteCachePolicy {
    /// Cache scope.
    pub scope: CacheScope,
    /// Time-to-live for cached responses.
    pub ttl: Duration,
    /// Request headers the response varies on.
    #[serde(default)]
    pub vary: Vec<String>,
}

impl RouteCachePolicy {
    /// Create a new cache policy with no caching.
    pub fn none() -> Self {
        Self::default()
    }

    /// Create a public cache policy.
    pub fn public(ttl: Duration) -> Self {
        Self {
            scope: CacheScope::Public,
            ttl,
            vary: Vec::new(),
        }
    }

    /// Vary on a request header.
    pub fn vary_on(mut self, header: impl Into<String>) -> Self {
        self.vary.push(header.into());
        self
    }

    /// Generate Cache-Control header value.
    pub fn cache_control_header(&self) -> String {
        match self.scope {
            CacheScope::None => self.scope.cache_control_directive().to_string(),
            CacheScope::Public => format!(
                "{}, max-age={}",
                self.scope.cache_control_directive(),
                self.ttl.as_secs()
            ),
        }
    }

    /// Generate Vary header value.
    pub fn vary_header(&self) -> Option<String> {
        if self.vary.is_empty() {
            None
        } else {
            Some(self.vary.join(", "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_cache_control() {
        let policy = RouteCachePolicy::public(Duration::from_secs(300));
        assert_eq!(policy.cache_control_header(), "public, max-age=300");
    }

    #[test]
    fn test_gone_cache_control() {
        let policy = RouteCachePolicy::public(Duration::from_secs(86_400));
        assert_eq!(policy.cache_control_header(), "public, max-age=86400");
    }

    #[test]
    fn test_none_is_no_store() {
        assert_eq!(RouteCachePolicy::none().cache_control_header(), "no-store");
    }

    #[test]
    fn test_vary() {
        let policy = RouteCachePolicy::public(Duration::from_secs(60))
            .vary_on("User-Agent")
            .vary_on("Accept-Encoding");
        assert_eq!(policy.vary_header().as_deref(), Some("User-Agent, Accept-Encoding"));
        assert_eq!(RouteCachePolicy::none().vary_header(), None);
    }
}
