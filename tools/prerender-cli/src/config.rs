//! CLI configuration.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use edge_core::{EnvVariables, VariableSource};

/// CLI configuration file (`prerender.toml`).
///
/// Values left out fall back to the same environment variables the
/// component reads.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CliConfig {
    /// Site origin settings.
    #[serde(default)]
    pub site: SiteSection,

    /// Job store credentials.
    #[serde(default)]
    pub store: StoreSection,

    /// Rendering settings.
    #[serde(default)]
    pub render: RenderSection,
}

impl CliConfig {
    /// Load config from a file.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path))?;

        if path.ends_with(".json") {
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse JSON config: {}", path))
        } else {
            Self::parse(&content).with_context(|| format!("Failed to parse TOML config: {}", path))
        }
    }

    /// Parse TOML config text.
    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    fn configured(&self, key: &str) -> Option<&str> {
        match key {
            "SITE_URL" => self.site.url.as_deref(),
            "UPSTREAM_URL" => self.site.upstream_url.as_deref(),
            "SUPABASE_URL" => self.store.url.as_deref(),
            "SUPABASE_KEY" => self.store.key.as_deref(),
            _ => None,
        }
    }
}

impl VariableSource for CliConfig {
    fn get(&self, key: &str) -> Option<String> {
        self.configured(key)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .or_else(|| EnvVariables.get(key))
    }
}

/// Site origin settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SiteSection {
    /// Public site origin used for canonical links.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Origin of the client-rendered site.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upstream_url: Option<String>,
}

/// Job store credentials.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
}

/// Rendering settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderSection {
    /// Pin the clock used for missing posting dates (RFC 3339).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub now: Option<DateTime<Utc>>,

    /// Include the tracking pixel.
    #[serde(default = "default_analytics")]
    pub analytics: bool,

    /// Override the slug length limit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_slug_bytes: Option<usize>,
}

impl Default for RenderSection {
    fn default() -> Self {
        Self {
            now: None,
            analytics: default_analytics(),
            max_slug_bytes: None,
        }
    }
}

fn default_analytics() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_parse_full_config() {
        let config = CliConfig::parse(
            r#"
[site]
url = "https://jobs.example"
upstream_url = "https://app.jobs.example"

[store]
url = "https://abc.supabase.co"
key = "anon"

[render]
now = "2024-03-01T12:00:00Z"
analytics = false
max_slug_bytes = 64
"#,
        )
        .unwrap();

        assert_eq!(config.get("SITE_URL").as_deref(), Some("https://jobs.example"));
        assert_eq!(config.get("SUPABASE_KEY").as_deref(), Some("anon"));
        assert_eq!(
            config.render.now,
            Some(Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap())
        );
        assert!(!config.render.analytics);
        assert_eq!(config.render.max_slug_bytes, Some(64));
    }

    #[test]
    fn test_empty_config_defaults() {
        let config = CliConfig::parse("").unwrap();
        assert!(config.render.analytics);
        assert!(config.render.now.is_none());
        assert!(config.site.url.is_none());
    }

    #[test]
    fn test_invalid_value_type_rejected() {
        assert!(CliConfig::parse("[render]\nanalytics = \"maybe\"").is_err());
    }
}
