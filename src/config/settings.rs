//! Application settings loaded from `config.toml`.
//!
//! The file is optional: every section has defaults, so a bare checkout starts a
//! server on localhost with no bootstrap administrator. A few values can also be
//! overridden from the environment (see [`Config::apply_env_overrides`]).

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, info};

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// HTTP listener settings
    #[serde(default)]
    pub server: ServerConfig,
    /// Administrator account ensured at startup, if any
    #[serde(default)]
    pub admin: Option<AdminConfig>,
}

/// HTTP server settings
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Socket address to listen on
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    /// Lifetime of a sign-in session, in hours
    #[serde(default = "default_session_hours")]
    pub session_hours: i64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            session_hours: default_session_hours(),
        }
    }
}

fn default_bind_address() -> String {
    "127.0.0.1:5000".to_string()
}

const fn default_session_hours() -> i64 {
    8
}

/// Bootstrap administrator account
#[derive(Debug, Clone, Deserialize)]
pub struct AdminConfig {
    /// Sign-in email
    pub email: String,
    /// Given name
    pub first_name: String,
    /// Family name
    pub last_name: String,
    /// Initial password; falls back to `ADMIN_PASSWORD` when omitted
    #[serde(default)]
    pub password: Option<String>,
}

impl Config {
    /// Applies `BIND_ADDRESS` and `ADMIN_PASSWORD` from the environment.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(bind_address) = std::env::var("BIND_ADDRESS") {
            self.server.bind_address = bind_address;
        }

        if let Some(admin) = self.admin.as_mut() {
            if admin.password.is_none() {
                admin.password = std::env::var("ADMIN_PASSWORD").ok();
            }
        }
    }
}

/// Loads configuration from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    debug!("Loading configuration from {:?}", path.as_ref());
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read config file: {e}"),
    })?;

    toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })
}

/// Loads `./config.toml` if present, defaults otherwise, then applies environment overrides.
pub fn load_default_config() -> Result<Config> {
    let path = Path::new("config.toml");
    let mut config = if path.exists() {
        load_config(path)?
    } else {
        info!("No config.toml found, using defaults");
        Config::default()
    };

    config.apply_env_overrides();
    Ok(config)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let toml_str = r#"
            [server]
            bind_address = "0.0.0.0:8080"
            session_hours = 2

            [admin]
            email = "admin@example.com"
            first_name = "Ada"
            last_name = "Admin"
            password = "Secret123!"
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.bind_address, "0.0.0.0:8080");
        assert_eq!(config.server.session_hours, 2);

        let admin = config.admin.unwrap();
        assert_eq!(admin.email, "admin@example.com");
        assert_eq!(admin.password.as_deref(), Some("Secret123!"));
    }

    #[test]
    fn test_parse_empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.server.bind_address, "127.0.0.1:5000");
        assert_eq!(config.server.session_hours, 8);
        assert!(config.admin.is_none());
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let result = load_config("does/not/exist.toml");
        assert!(matches!(result, Err(Error::Config { .. })));
    }
}
