//! Configuration management
//!
//! Loads the TOML configuration file (by default
//! `~/.config/s3sum/config.toml`) and merges it with command-line overrides
//! into an immutable [`Settings`] value that is built once at startup.

use std::path::PathBuf;

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::status::ExitCodes;

/// Current configuration schema version
pub const SCHEMA_VERSION: u32 = 1;

const DEFAULT_REGION: &str = "ap-northeast-1";
const DEFAULT_ACL: &str = "private";

/// Content type used when none is configured
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Content type value that asks for a guess from the file extension
pub const AUTO_CONTENT_TYPE: &str = "auto";

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Schema version for migration support
    pub schema_version: u32,

    /// Default settings
    #[serde(default)]
    pub defaults: Defaults,

    /// Exit code mapping
    #[serde(default)]
    pub exit_codes: ExitCodes,

    /// Custom endpoint for S3-compatible stores
    #[serde(default)]
    pub endpoint: Option<EndpointConfig>,
}

/// Default settings for transfers
#[derive(Debug, Clone, Deserialize)]
pub struct Defaults {
    /// AWS region
    #[serde(default = "default_region")]
    pub region: String,

    /// Named AWS profile; unset uses the SDK's default credential chain
    #[serde(default)]
    pub profile: Option<String>,

    /// Canned ACL for uploads
    #[serde(default = "default_acl")]
    pub acl: String,

    /// Content type for uploads, or "auto"
    #[serde(default = "default_content_type")]
    pub content_type: String,
}

fn default_region() -> String {
    DEFAULT_REGION.to_string()
}

fn default_acl() -> String {
    DEFAULT_ACL.to_string()
}

fn default_content_type() -> String {
    DEFAULT_CONTENT_TYPE.to_string()
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            region: default_region(),
            profile: None,
            acl: default_acl(),
            content_type: default_content_type(),
        }
    }
}

/// Connection details for a non-AWS endpoint
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct EndpointConfig {
    /// Endpoint URL
    pub url: String,

    /// Static access key; both keys must be set to take effect
    #[serde(default)]
    pub access_key: Option<String>,

    /// Static secret key
    #[serde(default)]
    pub secret_key: Option<String>,

    /// Address buckets by path instead of virtual host
    #[serde(default)]
    pub force_path_style: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            defaults: Defaults::default(),
            exit_codes: ExitCodes::default(),
            endpoint: None,
        }
    }
}

/// Configuration manager handles locating and loading the config file
#[derive(Debug)]
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a new ConfigManager with the default config path
    pub fn new() -> Result<Self> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| Error::Config("Could not determine config directory".into()))?;
        let config_path = config_dir.join("s3sum").join("config.toml");
        Ok(Self { config_path })
    }

    /// Create a ConfigManager with a custom path
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    /// Get the configuration file path
    pub fn config_path(&self) -> &PathBuf {
        &self.config_path
    }

    /// Load configuration from disk
    ///
    /// If the configuration file doesn't exist, returns a default configuration.
    /// If the schema version doesn't match, attempts migration.
    pub fn load(&self) -> Result<Config> {
        if !self.config_path.exists() {
            return Ok(Config::default());
        }

        let content = std::fs::read_to_string(&self.config_path)?;
        let mut config: Config = toml::from_str(&content)?;

        if config.schema_version < SCHEMA_VERSION {
            config = self.migrate(config)?;
        } else if config.schema_version > SCHEMA_VERSION {
            return Err(Error::Config(format!(
                "Configuration file version {} is newer than supported version {}. Please upgrade s3sum.",
                config.schema_version, SCHEMA_VERSION
            )));
        }

        Ok(config)
    }

    /// Migrate configuration from older schema version
    fn migrate(&self, config: Config) -> Result<Config> {
        let mut config = config;
        tracing::debug!(from = config.schema_version, to = SCHEMA_VERSION, "migrating config");
        config.schema_version = SCHEMA_VERSION;
        Ok(config)
    }
}

/// Command-line values that take precedence over the file
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub region: Option<String>,
    pub profile: Option<String>,
    pub endpoint: Option<String>,
    pub acl: Option<String>,
    pub content_type: Option<String>,
    pub rc_ok: Option<i32>,
    pub rc_changed: Option<i32>,
    pub rc_failed: Option<i32>,
}

/// Effective settings for one invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub region: String,
    pub profile: Option<String>,
    pub endpoint: Option<EndpointConfig>,
    pub acl: String,
    pub content_type: String,
    pub exit_codes: ExitCodes,
}

impl Settings {
    /// Merge a loaded config with overrides and validate the result
    pub fn resolve(config: Config, overrides: Overrides) -> Result<Self> {
        let defaults = config.defaults;

        let endpoint = match (overrides.endpoint, config.endpoint) {
            (Some(url), Some(file)) => Some(EndpointConfig { url, ..file }),
            (Some(url), None) => Some(EndpointConfig {
                url,
                ..Default::default()
            }),
            (None, file) => file,
        };
        if let Some(endpoint) = &endpoint {
            url::Url::parse(&endpoint.url)?;
        }

        let exit_codes = ExitCodes {
            ok: overrides.rc_ok.unwrap_or(config.exit_codes.ok),
            changed: overrides.rc_changed.unwrap_or(config.exit_codes.changed),
            failed: overrides.rc_failed.unwrap_or(config.exit_codes.failed),
        };
        exit_codes.validate()?;

        Ok(Self {
            region: overrides.region.unwrap_or(defaults.region),
            profile: overrides.profile.or(defaults.profile),
            endpoint,
            acl: overrides.acl.unwrap_or(defaults.acl),
            content_type: overrides.content_type.unwrap_or(defaults.content_type),
            exit_codes,
        })
    }
}
