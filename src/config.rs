use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::debug;

use crate::constants::{
    DEFAULT_COUNTRIES_URL, DEFAULT_FEED_URL, DEFAULT_OPEN_COVID_URL, DEFAULT_TIMEOUT_SECS,
    DEFAULT_USER_AGENT, WORLD_AGGREGATE,
};
use crate::error::{PipelineError, Result};

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub sources: SourcesConfig,
    pub http: HttpConfig,
    pub pipeline: PipelineSettings,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct SourcesConfig {
    pub feed_url: String,
    /// Base URL of the Open COVID-19 data files
    pub open_covid_url: String,
    /// Base URL of the reference set API (`/all`, `/alpha/{code}`, `/name/{name}`)
    pub countries_url: String,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            feed_url: DEFAULT_FEED_URL.to_string(),
            open_covid_url: DEFAULT_OPEN_COVID_URL.to_string(),
            countries_url: DEFAULT_COUNTRIES_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_seconds: u64,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: DEFAULT_TIMEOUT_SECS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct PipelineSettings {
    /// Feed locations dropped before enrichment (aggregate rows)
    pub excluded_locations: Vec<String>,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            excluded_locations: vec![WORLD_AGGREGATE.to_string()],
        }
    }
}

impl Config {
    /// Load from a TOML file. Missing sections fall back to defaults.
    pub fn load(config_path: impl AsRef<Path>) -> Result<Self> {
        let config_path = config_path.as_ref();
        let config_content = fs::read_to_string(config_path).map_err(|e| {
            PipelineError::Config(format!(
                "Failed to read config file '{}': {}",
                config_path.display(),
                e
            ))
        })?;

        let config: Config = toml::from_str(&config_content)?;
        Ok(config)
    }

    /// File (if given) or defaults, then environment overrides.
    pub fn resolve(config_path: Option<&Path>) -> Result<Self> {
        let mut config = match config_path {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        debug!(?config, "configuration resolved");
        Ok(config)
    }

    /// Apply overrides from a key lookup (the process environment in
    /// production).
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("COVID_FEED_URL") {
            self.sources.feed_url = v;
        }
        if let Some(v) = lookup("COVID_OPEN_COVID_URL") {
            self.sources.open_covid_url = v;
        }
        if let Some(v) = lookup("COVID_COUNTRIES_URL") {
            self.sources.countries_url = v;
        }
        if let Some(v) = lookup("COVID_HTTP_TIMEOUT_SECS") {
            self.http.timeout_seconds = v.trim().parse().map_err(|_| {
                PipelineError::Config(format!("COVID_HTTP_TIMEOUT_SECS is not a number: '{}'", v))
            })?;
        }
        if let Some(v) = lookup("COVID_EXCLUDED_LOCATIONS") {
            self.pipeline.excluded_locations = v
                .split(',')
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .map(|s| s.to_string())
                .collect();
        }

        if self.http.timeout_seconds == 0 {
            return Err(PipelineError::Config(
                "http.timeout_seconds must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.sources.feed_url, DEFAULT_FEED_URL);
        assert_eq!(config.http.timeout_seconds, 30);
        assert_eq!(config.pipeline.excluded_locations, vec!["World".to_string()]);
    }

    #[test]
    fn test_load_partial_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[http]\ntimeout_seconds = 5\n\n[pipeline]\nexcluded_locations = []\n"
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.http.timeout_seconds, 5);
        assert!(config.pipeline.excluded_locations.is_empty());
        assert_eq!(config.sources, SourcesConfig::default());
    }

    #[test]
    fn test_load_missing_file_is_config_error() {
        let err = Config::load("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, PipelineError::Config(_)));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("COVID_FEED_URL", "http://localhost/feed.csv"),
            ("COVID_OPEN_COVID_URL", "http://localhost/open-covid"),
            ("COVID_HTTP_TIMEOUT_SECS", "12"),
            ("COVID_EXCLUDED_LOCATIONS", "World, International,"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config
            .apply_overrides(|k| env.get(k).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.sources.feed_url, "http://localhost/feed.csv");
        assert_eq!(config.sources.open_covid_url, "http://localhost/open-covid");
        assert_eq!(config.http.timeout_seconds, 12);
        assert_eq!(
            config.pipeline.excluded_locations,
            vec!["World".to_string(), "International".to_string()]
        );
    }

    #[test]
    fn test_empty_exclusion_override_disables_filter() {
        let mut config = Config::default();
        config
            .apply_overrides(|k| (k == "COVID_EXCLUDED_LOCATIONS").then(String::new))
            .unwrap();
        assert!(config.pipeline.excluded_locations.is_empty());
    }

    #[test]
    fn test_bad_timeout_override() {
        let mut config = Config::default();
        let err = config
            .apply_overrides(|k| (k == "COVID_HTTP_TIMEOUT_SECS").then(|| "soon".to_string()))
            .unwrap_err();
        assert!(err.to_string().contains("COVID_HTTP_TIMEOUT_SECS"));
    }
}
