//! Worker configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::scope::WorkerScope;

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {reason}")]
    Read { path: String, reason: String },

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Invalid origin '{origin}': {reason}")]
    InvalidOrigin { origin: String, reason: String },
}

/// Log output format selected in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormatSetting {
    #[default]
    Json,
    Human,
}

/// Configuration for one deployed worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Origin the worker serves (e.g., "https://app.example.com").
    pub origin: String,
    /// Directory the worker is served from.
    #[serde(default = "default_base_path")]
    pub base_path: String,
    /// Name of the current cache generation.
    #[serde(default = "default_cache_name")]
    pub cache_name: String,
    /// Directory route templates live in.
    #[serde(default = "default_template_dir")]
    pub template_dir: String,
    /// Directory partials are fetched from, relative to the base path.
    #[serde(default = "default_template_dir")]
    pub partial_dir: String,
    /// Route manifest location.
    #[serde(default = "default_routes_file")]
    pub routes_file: String,
    /// Static assets cached at install time.
    #[serde(default = "default_static_assets")]
    pub static_assets: Vec<String>,
    /// Header marking a request for routed handling.
    #[serde(default = "default_flag_header")]
    pub flag_header: String,
    /// Case-insensitive prefix of headers forwarded to RPC parameters.
    #[serde(default = "default_header_prefix")]
    pub header_prefix: String,
    /// Structured log format.
    #[serde(default)]
    pub log_format: LogFormatSetting,
    /// Minimum structured log level.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_base_path() -> String {
    "/".to_string()
}

fn default_cache_name() -> String {
    "cs-htmx".to_string()
}

fn default_template_dir() -> String {
    "templates".to_string()
}

fn default_routes_file() -> String {
    "routes.json".to_string()
}

fn default_static_assets() -> Vec<String> {
    vec!["index.html".to_string(), "styles.css".to_string()]
}

fn default_flag_header() -> String {
    "HX-Request".to_string()
}

fn default_header_prefix() -> String {
    "hx-".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl WorkerConfig {
    /// Create a config for an origin with every other field defaulted.
    pub fn new(origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            base_path: default_base_path(),
            cache_name: default_cache_name(),
            template_dir: default_template_dir(),
            partial_dir: default_template_dir(),
            routes_file: default_routes_file(),
            static_assets: default_static_assets(),
            flag_header: default_flag_header(),
            header_prefix: default_header_prefix(),
            log_format: LogFormatSetting::default(),
            log_level: default_log_level(),
        }
    }

    /// Set the base path.
    pub fn with_base_path(mut self, base_path: impl Into<String>) -> Self {
        self.base_path = base_path.into();
        self
    }

    /// Load config from a file. `.json` files are parsed as JSON, anything else as TOML.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        let config = if path.extension().is_some_and(|e| e == "json") {
            Self::from_json_str(&content)?
        } else {
            Self::from_toml_str(&content)?
        };

        config.validate()?;
        Ok(config)
    }

    /// Parse from a TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Parse from a JSON string.
    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Check that the config describes a usable scope.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.scope().map(|_| ())
    }

    /// Build the worker scope for this config.
    pub fn scope(&self) -> Result<WorkerScope, ConfigError> {
        WorkerScope::new(&self.origin, &self.base_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_minimal_toml() {
        let config = WorkerConfig::from_toml_str(r#"origin = "https://example.com""#).unwrap();
        assert_eq!(config.base_path, "/");
        assert_eq!(config.cache_name, "cs-htmx");
        assert_eq!(config.template_dir, "templates");
        assert_eq!(config.routes_file, "routes.json");
        assert_eq!(config.static_assets, vec!["index.html", "styles.css"]);
        assert_eq!(config.flag_header, "HX-Request");
        assert_eq!(config.header_prefix, "hx-");
        assert_eq!(config.log_format, LogFormatSetting::Json);
    }

    #[test]
    fn test_from_json() {
        let config = WorkerConfig::from_json_str(
            r#"{"origin": "https://example.com", "base_path": "/app", "log_format": "human"}"#,
        )
        .unwrap();
        assert_eq!(config.base_path, "/app");
        assert_eq!(config.log_format, LogFormatSetting::Human);
        assert_eq!(config.scope().unwrap().base_path(), "/app/");
    }

    #[test]
    fn test_missing_origin_is_parse_error() {
        let result = WorkerConfig::from_toml_str(r#"base_path = "/""#);
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_validate_rejects_bad_origin() {
        let config = WorkerConfig::new("nope");
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidOrigin { .. })
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let result = WorkerConfig::load("/definitely/not/here.toml");
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }
}
