//! # Server Configuration
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     MEDBILL_PORT=5050                                                  │
//! │     MEDBILL_AUTH__MODE=verified                                        │
//! │     MEDBILL_AUTH__JWT_SECRET=...                                       │
//! │                                                                         │
//! │  2. medbill.toml in the working directory (optional)                   │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! host = "127.0.0.1"
//! port = 5000
//! database_path = "/var/lib/medbill/medbill.db"
//! default_owner_id = 1
//!
//! [auth]
//! mode = "verified"   # verified | unverified | disabled
//! jwt_secret = "change-me"
//! issuer = "https://auth.example.com"
//! ```

use std::path::PathBuf;

use config::{Config, Environment, File};
use serde::Deserialize;
use tracing::{debug, warn};

use medbill_core::OwnerId;

const CONFIG_FILE: &str = "medbill";
const ENV_PREFIX: &str = "MEDBILL";

// =============================================================================
// Auth
// =============================================================================

/// How bearer tokens are turned into identities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMode {
    /// HS256 signature, expiry and optional audience/issuer are checked.
    Verified,
    /// Claims are read without any signature check. Development only.
    Unverified,
    /// Bearer tokens are ignored.
    #[default]
    Disabled,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub mode: AuthMode,
    pub jwt_secret: Option<String>,
    pub audience: Option<String>,
    pub issuer: Option<String>,
}

// =============================================================================
// Server
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address.
    pub host: String,

    /// First port to try.
    pub port: u16,

    /// How many successive ports to try when the first is taken.
    pub port_retries: u16,

    /// SQLite file. Defaults to the platform data directory.
    pub database_path: Option<PathBuf>,

    pub db_max_connections: u32,

    /// Owner used when a request carries no identity at all.
    pub default_owner_id: OwnerId,

    /// Create the demo account on startup.
    pub seed_demo_user: bool,

    pub auth: AuthConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: "0.0.0.0".to_string(),
            port: 5000,
            port_retries: 5,
            database_path: None,
            db_max_connections: 10,
            default_owner_id: 1,
            seed_demo_user: true,
            auth: AuthConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Loads defaults, then `medbill.toml`, then `MEDBILL_*` variables.
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name(CONFIG_FILE).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: ServerConfig = settings.try_deserialize()?;
        config.validate()?;

        debug!(?config.auth.mode, port = config.port, "Configuration loaded");
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.auth.mode {
            AuthMode::Verified => {
                let secret = self.auth.jwt_secret.as_deref().unwrap_or("").trim();
                if secret.is_empty() {
                    return Err(ConfigError::MissingRequired("auth.jwt_secret".to_string()));
                }
            }
            AuthMode::Unverified => {
                warn!("auth.mode = unverified: bearer tokens are NOT signature-checked");
            }
            AuthMode::Disabled => {}
        }

        if self.db_max_connections == 0 {
            return Err(ConfigError::InvalidValue("db_max_connections".to_string()));
        }

        Ok(())
    }

    /// Resolved SQLite path.
    pub fn database_path(&self) -> PathBuf {
        if let Some(path) = &self.database_path {
            return path.clone();
        }

        directories::ProjectDirs::from("com", "medbill", "medbill")
            .map(|dirs| dirs.data_dir().join("medbill.db"))
            .unwrap_or_else(|| PathBuf::from("medbill.db"))
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read configuration: {0}")]
    Source(#[from] config::ConfigError),

    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.port, 5000);
        assert_eq!(config.port_retries, 5);
        assert_eq!(config.default_owner_id, 1);
        assert_eq!(config.auth.mode, AuthMode::Disabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_verified_mode_needs_secret() {
        let mut config = ServerConfig::default();
        config.auth.mode = AuthMode::Verified;
        assert!(matches!(config.validate(), Err(ConfigError::MissingRequired(_))));

        config.auth.jwt_secret = Some("s3cret".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_explicit_database_path_wins() {
        let config = ServerConfig {
            database_path: Some(PathBuf::from("/tmp/shop.db")),
            ..Default::default()
        };
        assert_eq!(config.database_path(), PathBuf::from("/tmp/shop.db"));
    }

    #[test]
    fn test_toml_overrides_defaults() {
        let settings = Config::builder()
            .add_source(File::from_str(
                "port = 6000\n[auth]\nmode = \"unverified\"\n",
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap();
        let config: ServerConfig = settings.try_deserialize().unwrap();

        assert_eq!(config.port, 6000);
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.auth.mode, AuthMode::Unverified);
    }
}
