//! Response header composition.

use crate::policy::RouteCachePolicy;

/// Header names set by edge workloads.
pub mod header_names {
    /// Names the workload branch that produced the response.
    pub const X_EDGE_FUNCTION: &str = "X-Edge-Function";
    /// Request ID, echoed from the platform when present.
    pub const X_REQUEST_ID: &str = "X-Request-ID";
    /// Standard headers, spelled once.
    pub const CACHE_CONTROL: &str = "Cache-Control";
    pub const CONTENT_TYPE: &str = "Content-Type";
    pub const VARY: &str = "Vary";
}

/// Builder for cache response headers.
#[derive(Debug, Default)]
pub struct CacheHeadersBuilder {
    cache_control: Option<String>,
    vary: Option<String>,
}

impl CacheHeadersBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set Cache-Control from policy.
    pub fn cache_control_from_policy(mut self, policy: &RouteCachePolicy) -> Self {
        self.cache_control = Some(policy.cache_control_header());
        self
    }

    /// Set Vary from policy.
    pub fn vary_from_policy(mut self, policy: &RouteCachePolicy) -> Self {
        self.vary = policy.vary_header();
        self
    }

    /// Build the headers.
    pub fn build(self) -> Vec<(String, String)> {
        let mut headers = Vec::new();

        if let Some(cc) = self.cache_control {
            headers.push((header_names::CACHE_CONTROL.to_string(), cc));
        }

        if let Some(vary) = self.vary {
            headers.push((header_names::VARY.to_string(), vary));
        }

        headers
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_build_from_policy() {
        let policy = RouteCachePolicy::public(Duration::from_secs(300)).vary_on("User-Agent");
        let headers = CacheHeadersBuilder::new()
            .cache_control_from_policy(&policy)
            .vary_from_policy(&policy)
            .build();

        assert_eq!(
            headers,
            vec![
                ("Cache-Control".to_string(), "public, max-age=300".to_string()),
                ("Vary".to_string(), "User-Agent".to_string()),
            ]
        );
    }

    #[test]
    fn test_empty_builder() {
        assert!(CacheHeadersBuilder::new().build().is_empty());
    }

    #[test]
    fn test_no_store_has_no_vary() {
        let headers = CacheHeadersBuilder::new()
            .cache_control_from_policy(&RouteCachePolicy::none())
            .vary_from_policy(&RouteCachePolicy::none())
            .build();
        assert_eq!(headers, vec![("Cache-Control".to_string(), "no-store".to_string())]);
    }
}
