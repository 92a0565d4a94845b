//! CLI execution context.

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};

use edge_core::{Clock, FixedClock, SiteConfig, SystemClock};
use edge_observability::{AnalyticsSink, NoAnalytics, PixelAnalytics};
use edge_security::ResourceLimits;

use crate::config::CliConfig;
use crate::output::Output;

/// Execution context for CLI commands.
pub struct Context {
    /// CLI configuration.
    pub config: CliConfig,
    /// Output handler.
    pub output: Output,
    /// Working directory.
    pub cwd: PathBuf,
}

impl Context {
    /// Load context from config file.
    pub fn load(config_path: Option<&str>, output: Output) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current directory")?;

        let config = if let Some(path) = config_path {
            CliConfig::load(path)?
        } else {
            // Try to find config in current directory or parent directories
            Self::find_config(&cwd).unwrap_or_default()
        };

        Ok(Self { config, output, cwd })
    }

    /// Find config file in directory tree.
    fn find_config(start: &Path) -> Option<CliConfig> {
        let config_names = ["prerender.toml", ".prerender.toml"];

        let mut current = start.to_path_buf();
        loop {
            for name in &config_names {
                let config_path = current.join(name);
                if config_path.exists() {
                    if let Ok(config) = CliConfig::load(config_path.to_str()?) {
                        return Some(config);
                    }
                }
            }

            if !current.pop() {
                break;
            }
        }

        None
    }

    /// Site configuration from the config file and environment.
    pub fn site_config(&self) -> Result<SiteConfig> {
        SiteConfig::from_source(&self.config).context("Invalid site configuration")
    }

    /// Clock for rendering; pinned when the config sets `render.now`.
    pub fn clock(&self) -> Box<dyn Clock> {
        match self.config.render.now {
            Some(now) => Box::new(FixedClock(now)),
            None => Box::new(SystemClock),
        }
    }

    /// Tracking pixel for `base_url`, unless disabled.
    pub fn analytics(&self, base_url: &str, disabled: bool) -> Box<dyn AnalyticsSink> {
        if disabled || !self.config.render.analytics {
            return Box::new(NoAnalytics);
        }
        match PixelAnalytics::new(base_url) {
            Some(pixel) => Box::new(pixel),
            None => Box::new(NoAnalytics),
        }
    }

    /// Resource limits, with the configured slug limit applied.
    pub fn limits(&self) -> Result<ResourceLimits> {
        let limits = ResourceLimits::default();
        let limits = match self.config.render.max_slug_bytes {
            Some(bytes) => limits.with_max_slug_bytes(bytes),
            None => limits,
        };
        limits.validate().context("Invalid render limits")?;
        Ok(limits)
    }

    /// Resolve a path relative to the working directory.
    pub fn resolve_path(&self, path: &str) -> PathBuf {
        if PathBuf::from(path).is_absolute() {
            PathBuf::from(path)
        } else {
            self.cwd.join(path)
        }
    }

    /// Read a file argument; `-` reads stdin.
    pub fn read_input(&self, path: &str) -> Result<String> {
        if path == "-" {
            let mut content = String::new();
            std::io::stdin()
                .read_to_string(&mut content)
                .context("Failed to read stdin")?;
            return Ok(content);
        }

        let resolved = self.resolve_path(path);
        std::fs::read_to_string(&resolved)
            .with_context(|| format!("Failed to read {}", resolved.display()))
    }

    /// Write output to a file, or print it when no file is given.
    pub fn write_output(&self, path: Option<&str>, content: &str) -> Result<()> {
        match path {
            Some(path) => {
                let resolved = self.resolve_path(path);
                std::fs::write(&resolved, content)
                    .with_context(|| format!("Failed to write {}", resolved.display()))
            }
            None => {
                self.output.body(content);
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(config: CliConfig) -> Context {
        Context {
            config,
            output: Output::new(false, true),
            cwd: PathBuf::from("/tmp"),
        }
    }

    #[test]
    fn test_analytics_can_be_disabled_in_config() {
        let mut config = CliConfig::default();
        config.render.analytics = false;
        let ctx = context(config);
        let sink = ctx.analytics("https://seo-vacancy.eu", false);
        assert!(sink
            .beacon(&edge_observability::AnalyticsEvent::Prerendered { slug: "x".into() })
            .is_none());
    }

    #[test]
    fn test_limits_override() {
        let mut config = CliConfig::default();
        config.render.max_slug_bytes = Some(12);
        assert_eq!(context(config).limits().unwrap().max_slug_bytes, 12);
    }

    #[test]
    fn test_zero_slug_limit_rejected() {
        let mut config = CliConfig::default();
        config.render.max_slug_bytes = Some(0);
        let err = context(config).limits().unwrap_err();
        assert!(err.to_string().contains("Invalid render limits"));
    }

    #[test]
    fn test_resolve_path() {
        let ctx = context(CliConfig::default());
        assert_eq!(ctx.resolve_path("jobs.json"), PathBuf::from("/tmp/jobs.json"));
        assert_eq!(ctx.resolve_path("/etc/jobs.json"), PathBuf::from("/etc/jobs.json"));
    }
}
