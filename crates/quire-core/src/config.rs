//! Configuration types for Quire components.
//!
//! Site credentials come from `~/.config/quire/site.toml`, environment
//! variables or CLI flags (see the `quire` binary). The core only ever sees
//! the resulting plain values.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::AppError;

// =============================================================================
// Metadata format
// =============================================================================

/// Front matter format the content source uses to render article metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetaFormat {
    #[default]
    Yaml,
    Json,
    Toml,
}

impl MetaFormat {
    /// Parses a configuration value, ignoring case.
    ///
    /// Unrecognized values fall back to the default format instead of failing,
    /// so a typo in the config never blocks a sync.
    pub fn from_config_value(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "yaml" | "yml" => Self::Yaml,
            "json" => Self::Json,
            "toml" => Self::Toml,
            other => {
                tracing::warn!(
                    value = other,
                    "Unknown meta format, falling back to {}",
                    Self::default()
                );
                Self::default()
            }
        }
    }
}

impl fmt::Display for MetaFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Yaml => write!(f, "yaml"),
            Self::Json => write!(f, "json"),
            Self::Toml => write!(f, "toml"),
        }
    }
}

// =============================================================================
// Runtime knobs
// =============================================================================

/// HTTP client configuration for calls to the blog backend.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub timeout: Duration,
    /// Attempts for idempotent reads. Writes are sent exactly once.
    pub max_retries: u32,
    pub retry_base_delay: Duration,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_retries: 3,
            retry_base_delay: Duration::from_millis(500),
        }
    }
}

/// Batch synchronization configuration.
#[derive(Debug, Clone, Default)]
pub struct SyncConfig {
    /// Upper bound on concurrently running tasks of one batch.
    ///
    /// `None` spawns every task of the batch at once.
    pub max_in_flight: Option<usize>,
}

impl SyncConfig {
    /// Caps the number of tasks running at the same time.
    pub fn with_max_in_flight(mut self, limit: usize) -> Self {
        self.max_in_flight = Some(limit.max(1));
        self
    }
}

// =============================================================================
// Site configuration (site.toml)
// =============================================================================

/// Connection settings for the blog backend.
///
/// # Example
///
/// ```toml
/// url = "https://blog.example.com/"
/// username = "admin"
/// password = "secret"
/// meta_format = "yaml"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Base URL of the blog. A trailing `/` is tolerated.
    pub url: String,
    pub username: String,
    pub password: String,
    /// Raw meta format selector; see [`SiteConfig::meta_format`].
    #[serde(default)]
    pub meta_format: Option<String>,
}

impl SiteConfig {
    /// Returns the base URL with trailing separators stripped.
    pub fn base_url(&self) -> &str {
        self.url.trim_end_matches('/')
    }

    /// Returns the configured meta format, defaulting to YAML.
    pub fn meta_format(&self) -> MetaFormat {
        self.meta_format
            .as_deref()
            .map(MetaFormat::from_config_value)
            .unwrap_or_default()
    }

    /// Checks that the values are usable before any request is made.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.base_url().is_empty() {
            return Err(AppError::ConfigError("site url is empty".to_string()));
        }
        if !(self.url.starts_with("http://") || self.url.starts_with("https://")) {
            return Err(AppError::InvalidUrl(self.url.clone()));
        }
        if self.username.is_empty() || self.password.is_empty() {
            return Err(AppError::ConfigError(
                "username and password are required".to_string(),
            ));
        }
        Ok(())
    }
}

/// Default configuration file name.
pub const CONFIG_FILE_NAME: &str = "site.toml";

/// Returns the default configuration directory path: `~/.config/quire/`.
pub fn default_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("quire"))
}

/// Returns the default configuration file path: `~/.config/quire/site.toml`.
pub fn default_config_path() -> Option<PathBuf> {
    default_config_dir().map(|p| p.join(CONFIG_FILE_NAME))
}

/// Load site configuration from a TOML file.
///
/// # Returns
/// * `Ok(Some(config))` - Configuration loaded successfully
/// * `Ok(None)` - No file at the default path (flags and env may still supply values)
/// * `Err(e)` - A custom path does not exist, or the file is invalid
pub fn load_site_config(path: Option<PathBuf>) -> Result<Option<SiteConfig>, AppError> {
    let using_default_path = path.is_none();
    let config_path = match path {
        Some(p) => p,
        None => match default_config_path() {
            Some(p) => p,
            None => return Ok(None),
        },
    };

    if !config_path.exists() {
        if using_default_path {
            tracing::debug!(path = %config_path.display(), "No site config file found");
            return Ok(None);
        }
        return Err(AppError::ConfigError(format!(
            "Config file not found: {}",
            config_path.display()
        )));
    }

    let content = std::fs::read_to_string(&config_path).map_err(|e| {
        AppError::ConfigError(format!(
            "Failed to read config file '{}': {}",
            config_path.display(),
            e
        ))
    })?;

    let config: SiteConfig = toml::from_str(&content).map_err(|e| {
        AppError::ConfigError(format!(
            "Invalid TOML in '{}': {}",
            config_path.display(),
            e
        ))
    })?;

    Ok(Some(config))
}
