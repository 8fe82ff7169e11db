use std::path::Path;
use std::time::Duration;

use config::{Config as ConfigBuilder, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use xtra_media_providers::gql::{DEFAULT_GQL_URL, WEB_CLIENT_ID};
use xtra_media_providers::helix::DEFAULT_HELIX_URL;
use xtra_media_providers::Credentials;

use crate::backend::BackendPreference;
use crate::credentials::StaticCredentials;
use crate::listing::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub gql: GqlConfig,
    pub helix: HelixConfig,
    pub listing: ListingConfig,
    pub cheer: CheerConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GqlConfig {
    pub url: String,
    pub client_id: String,
    pub token: Option<String>,
    pub device_id: Option<String>,
    pub integrity_token: Option<String>,
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
}

impl Default for GqlConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_GQL_URL.to_string(),
            client_id: WEB_CLIENT_ID.to_string(),
            token: None,
            device_id: None,
            integrity_token: None,
            timeout_secs: 30,
            connect_timeout_secs: 10,
        }
    }
}

impl GqlConfig {
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    #[must_use]
    pub fn credentials(&self) -> Credentials {
        Credentials {
            client_id: Some(self.client_id.clone()),
            token: self.token.clone(),
            device_id: self.device_id.clone(),
            integrity_token: self.integrity_token.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HelixConfig {
    pub url: String,
    pub client_id: Option<String>,
    pub token: Option<String>,
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
}

impl Default for HelixConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_HELIX_URL.to_string(),
            client_id: None,
            token: None,
            timeout_secs: 30,
            connect_timeout_secs: 10,
        }
    }
}

impl HelixConfig {
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    #[must_use]
    pub fn credentials(&self) -> Credentials {
        Credentials {
            client_id: self.client_id.clone(),
            token: self.token.clone(),
            ..Credentials::default()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ListingConfig {
    pub page_size: u32,
    pub default_preference: BackendPreference,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            default_preference: BackendPreference::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CheerConfig {
    pub animated: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String, // "json" or "pretty"
    pub file_path: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            file_path: None,
        }
    }
}

impl Config {
    /// Load configuration from multiple sources with priority:
    /// 1. Environment variables (highest priority)
    /// 2. Config file (if provided)
    /// 3. Defaults (lowest priority)
    pub fn load(config_file: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = ConfigBuilder::builder();

        if let Some(path) = config_file {
            if Path::new(path).exists() {
                builder = builder.add_source(File::with_name(path));
            }
        }

        // XTRA_GQL__CLIENT_ID, XTRA_LISTING__DEFAULT_PREFERENCE=helix,gql, ...
        builder = builder.add_source(
            Environment::with_prefix("XTRA")
                .prefix_separator("_")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("listing.default_preference")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Load from environment variables only
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load(None)
    }

    /// Load from file path
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        Self::load(Some(path))
    }

    /// Problems that make this configuration unusable; empty when valid
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();
        if self.gql.url.trim().is_empty() {
            problems.push("gql.url must not be empty".to_string());
        }
        if self.gql.client_id.trim().is_empty() {
            problems.push("gql.client_id must not be empty".to_string());
        }
        if self.helix.url.trim().is_empty() {
            problems.push("helix.url must not be empty".to_string());
        }
        if !(1..=MAX_PAGE_SIZE).contains(&self.listing.page_size) {
            problems.push(format!(
                "listing.page_size must be between 1 and {MAX_PAGE_SIZE}, got {}",
                self.listing.page_size
            ));
        }
        if !matches!(self.logging.format.as_str(), "json" | "pretty") {
            problems.push(format!("logging.format must be json or pretty, got {}", self.logging.format));
        }
        problems
    }

    /// Credentials from the configured client ids and tokens
    #[must_use]
    pub fn credentials(&self) -> StaticCredentials {
        StaticCredentials::new(self.gql.credentials(), self.helix.credentials())
    }
}
