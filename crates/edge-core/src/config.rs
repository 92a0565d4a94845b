//! Route and site configuration.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use url::Url;

/// Public origin used when no site URL is configured.
pub const DEFAULT_SITE_URL: &str = "https://seo-vacancy.eu";

/// Variable names, in lookup order. The `VITE_` and bare `URL` names are the
/// ones the hosting platform injects for the client bundle.
pub mod keys {
    pub const STORE_URL: &[&str] = &["SUPABASE_URL", "VITE_SUPABASE_URL"];
    pub const STORE_KEY: &[&str] = &["SUPABASE_KEY", "VITE_SUPABASE_KEY"];
    pub const SITE_URL: &[&str] = &["SITE_URL", "URL"];
    pub const UPSTREAM_URL: &[&str] = &["UPSTREAM_URL"];
}

/// Configuration for a single route.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteConfig {
    /// Route pattern (e.g., "/job/*").
    pub pattern: String,
    /// Handler function name.
    pub handler: String,
    /// HTTP methods this route accepts.
    #[serde(default = "default_methods")]
    pub methods: Vec<String>,
}

fn default_methods() -> Vec<String> {
    vec!["GET".to_string(), "HEAD".to_string()]
}

impl RouteConfig {
    /// Create a new route configuration.
    pub fn new(pattern: impl Into<String>, handler: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            handler: handler.into(),
            methods: default_methods(),
        }
    }

    /// Set allowed HTTP methods.
    pub fn with_methods(mut self, methods: Vec<&str>) -> Self {
        self.methods = methods.into_iter().map(String::from).collect();
        self
    }

    /// Literal part of the pattern before the trailing wildcard.
    pub fn prefix(&self) -> &str {
        self.pattern.strip_suffix('*').unwrap_or(&self.pattern)
    }

    /// Check whether a path falls under this route.
    pub fn matches(&self, path: &str) -> bool {
        match self.pattern.strip_suffix('*') {
            Some(prefix) => path.starts_with(prefix),
            None => path == self.pattern,
        }
    }

    /// The part of `path` covered by the wildcard, if the route matches.
    pub fn captured<'a>(&self, path: &'a str) -> Option<&'a str> {
        let prefix = self.pattern.strip_suffix('*')?;
        path.strip_prefix(prefix)
    }

    /// Check whether the route accepts a method (case-insensitive).
    pub fn accepts(&self, method: &str) -> bool {
        self.methods.iter().any(|m| m.eq_ignore_ascii_case(method))
    }
}

/// Errors raised while reading configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("missing configuration value: {0}")]
    Missing(&'static str),

    #[error("invalid URL in {key}: {reason}")]
    InvalidUrl { key: &'static str, reason: String },
}

/// Source of named configuration values.
pub trait VariableSource {
    /// Look up a value. Empty values are reported as absent.
    fn get(&self, key: &str) -> Option<String>;

    /// First non-empty value among `keys`.
    fn first_of(&self, keys: &[&str]) -> Option<String> {
        keys.iter()
            .filter_map(|k| self.get(k))
            .find(|v| !v.trim().is_empty())
    }
}

/// Reads variables from the process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvVariables;

impl VariableSource for EnvVariables {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok().filter(|v| !v.is_empty())
    }
}

/// In-memory variables, used by tests and the CLI.
#[derive(Debug, Clone, Default)]
pub struct MapVariables(HashMap<String, String>);

impl MapVariables {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a variable.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }
}

impl VariableSource for MapVariables {
    fn get(&self, key: &str) -> Option<String> {
        self.0.get(key).filter(|v| !v.is_empty()).cloned()
    }
}

/// Credentials for the backing job store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreCredentials {
    /// Store REST origin.
    pub url: Url,
    /// Access key sent as `apikey` and bearer token.
    pub key: String,
}

/// Process-wide site configuration. Built once at start-up and shared
/// read-only by every request.
#[derive(Debug, Clone)]
pub struct SiteConfig {
    store_url: Option<String>,
    store_key: Option<String>,
    site_url: Url,
    upstream_url: Option<Url>,
}

impl SiteConfig {
    /// Create a configuration for a site origin with no store credentials.
    pub fn new(site_url: Url) -> Self {
        Self {
            store_url: None,
            store_key: None,
            site_url,
            upstream_url: None,
        }
    }

    /// Set store credentials.
    pub fn with_store(mut self, url: impl Into<String>, key: impl Into<String>) -> Self {
        self.store_url = Some(url.into());
        self.store_key = Some(key.into());
        self
    }

    /// Set the origin that serves the client-rendered site.
    pub fn with_upstream(mut self, upstream: Url) -> Self {
        self.upstream_url = Some(upstream);
        self
    }

    /// Read configuration from a variable source.
    ///
    /// Store credentials stay optional here; their absence is reported per
    /// request by [`SiteConfig::credentials`].
    pub fn from_source(source: &dyn VariableSource) -> Result<Self, ConfigError> {
        let site = source
            .first_of(keys::SITE_URL)
            .unwrap_or_else(|| DEFAULT_SITE_URL.to_string());
        let site_url = parse_url("SITE_URL", &site)?;

        let upstream_url = Self::upstream_from_source(source)?;

        Ok(Self {
            store_url: source.first_of(keys::STORE_URL),
            store_key: source.first_of(keys::STORE_KEY),
            site_url,
            upstream_url,
        })
    }

    /// Only the upstream origin, for requests that are forwarded without
    /// being prerendered.
    pub fn upstream_from_source(source: &dyn VariableSource) -> Result<Option<Url>, ConfigError> {
        source
            .first_of(keys::UPSTREAM_URL)
            .map(|u| parse_url("UPSTREAM_URL", &u))
            .transpose()
    }

    /// Store credentials, or the first missing/invalid value.
    pub fn credentials(&self) -> Result<StoreCredentials, ConfigError> {
        let url = self
            .store_url
            .as_deref()
            .ok_or(ConfigError::Missing("SUPABASE_URL"))?;
        let key = self
            .store_key
            .as_deref()
            .ok_or(ConfigError::Missing("SUPABASE_KEY"))?;

        Ok(StoreCredentials {
            url: parse_url("SUPABASE_URL", url)?,
            key: key.to_string(),
        })
    }

    /// Whether both store values are present.
    pub fn has_store(&self) -> bool {
        self.store_url.is_some() && self.store_key.is_some()
    }

    /// Site origin without a trailing slash, used to build absolute links.
    pub fn base_url(&self) -> &str {
        self.site_url.as_str().trim_end_matches('/')
    }

    /// Origin of the client-rendered site, if configured.
    pub fn upstream_url(&self) -> Option<&Url> {
        self.upstream_url.as_ref()
    }
}

fn parse_url(key: &'static str, value: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(value.trim()).map_err(|e| ConfigError::InvalidUrl {
        key,
        reason: e.to_string(),
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError::InvalidUrl {
            key,
            reason: format!("unsupported scheme '{}'", other),
        }),
    }
}
