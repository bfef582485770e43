//! Configuration module for amigo-server.
//!
//! Handles loading configuration from TOML files, CLI arguments,
//! and environment variables. Also handles admin secret hashing.

pub mod file;

use crate::config::file::{FileConfig, ParticipantConfig};
use amigo_core::config::{AdminConfig, DrawConfig, ServerConfig, SharedConfig, hash_secret};
use std::collections::HashSet;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    #[error("validation error: {0}")]
    ValidationError(String),

    #[error("password hashing error: {0}")]
    HashError(String),

    #[error("DATABASE_URL environment variable not set")]
    MissingDatabaseUrl,
}

/// Connection settings for the PostgreSQL pool.
#[derive(Debug, Clone, Copy)]
pub struct DatabaseSettings {
    pub max_connections: u32,
    pub operation_timeout: Duration,
}

/// Loaded configuration result containing all parts.
#[derive(Debug)]
pub struct LoadedConfig {
    pub server: ServerConfig,
    pub admin: AdminConfig,
    pub draw: DrawConfig,
    pub database: DatabaseSettings,
    pub participants: Vec<ParticipantConfig>,
}

impl LoadedConfig {
    /// Split off the sections that can be reloaded at runtime.
    pub fn shared(&self) -> SharedConfig {
        SharedConfig::new(self.admin.clone())
    }
}

/// Configuration loader that handles the complete loading process.
pub struct ConfigLoader {
    config_path: std::path::PathBuf,
    listen_override: Option<SocketAddr>,
}

impl ConfigLoader {
    /// Create a new config loader.
    pub fn new(config_path: impl AsRef<Path>, listen_override: Option<SocketAddr>) -> Self {
        Self {
            config_path: config_path.as_ref().to_path_buf(),
            listen_override,
        }
    }

    /// Load and process the configuration.
    ///
    /// This will:
    /// 1. Read the TOML file
    /// 2. Apply CLI overrides
    /// 3. Validate the configuration
    /// 4. Hash the admin secret if it's plaintext (and rewrite the file)
    /// 5. Build the loaded configuration
    pub fn load(&self) -> Result<LoadedConfig, ConfigError> {
        let config_content = std::fs::read_to_string(&self.config_path)?;
        let mut file_config: FileConfig = toml::from_str(&config_content)?;

        if let Some(listen) = self.listen_override {
            file_config.server.listen = listen;
        }

        validate(&file_config)?;

        let secret_hash = if file_config.is_admin_secret_hashed() {
            file_config.admin.secret.clone()
        } else {
            let hash = hash_secret(&file_config.admin.secret)
                .map_err(|e| ConfigError::HashError(e.to_string()))?;
            file_config.admin.secret = hash.clone();
            self.rewrite_config(&file_config)?;
            tracing::info!("Admin secret hashed and config file updated");
            hash
        };

        Ok(build_loaded_config(file_config, secret_hash))
    }

    /// Reload the configuration (used during SIGHUP).
    pub fn reload(&self) -> Result<LoadedConfig, ConfigError> {
        self.load()
    }

    fn rewrite_config(&self, config: &FileConfig) -> Result<(), ConfigError> {
        let toml_string = toml::to_string_pretty(config)?;

        // Write atomically: write to temp file, then rename
        let temp_path = self.config_path.with_extension("toml.tmp");
        std::fs::write(&temp_path, toml_string)?;
        std::fs::rename(&temp_path, &self.config_path)?;

        Ok(())
    }
}

fn validate(config: &FileConfig) -> Result<(), ConfigError> {
    if config.admin.secret.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "admin secret must not be empty".to_string(),
        ));
    }
    if config.database.operation_timeout_ms == 0 {
        return Err(ConfigError::ValidationError(
            "database.operation_timeout_ms must be greater than zero".to_string(),
        ));
    }
    if config.database.max_connections == 0 {
        return Err(ConfigError::ValidationError(
            "database.max_connections must be greater than zero".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    for participant in &config.participants {
        let name = participant.name.trim();
        if name.is_empty() {
            return Err(ConfigError::ValidationError(
                "participant name must not be empty".to_string(),
            ));
        }
        if !seen.insert(name.to_lowercase()) {
            return Err(ConfigError::ValidationError(format!(
                "participant {name} is listed more than once"
            )));
        }
    }
    Ok(())
}

fn build_loaded_config(file_config: FileConfig, secret_hash: String) -> LoadedConfig {
    LoadedConfig {
        server: ServerConfig {
            listen: file_config.server.listen,
        },
        admin: AdminConfig::from_hash(secret_hash),
        draw: DrawConfig {
            strategy: file_config.draw.strategy,
            seed: file_config.draw.seed,
        },
        database: DatabaseSettings {
            max_connections: file_config.database.max_connections,
            operation_timeout: Duration::from_millis(file_config.database.operation_timeout_ms),
        },
        participants: file_config.participants,
    }
}

/// Get the database URL from the environment.
pub fn get_database_url() -> Result<String, ConfigError> {
    std::env::var("DATABASE_URL").map_err(|_| ConfigError::MissingDatabaseUrl)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    struct TempConfig(PathBuf);

    impl TempConfig {
        fn new(content: &str) -> Self {
            let path =
                std::env::temp_dir().join(format!("amigo-config-{}.toml", uuid::Uuid::new_v4()));
            std::fs::write(&path, content).unwrap();
            Self(path)
        }
    }

    impl Drop for TempConfig {
        fn drop(&mut self) {
            let _ = std::fs::remove_file(&self.0);
        }
    }

    #[test]
    fn test_plaintext_secret_is_hashed_and_rewritten() {
        let file = TempConfig::new(
            "[admin]\nsecret = \"hunter2\"\n\n[[participants]]\nname = \"Alice\"\n",
        );
        let loader = ConfigLoader::new(&file.0, None);

        let loaded = loader.load().unwrap();
        assert!(loaded.admin.verify_secret("hunter2"));
        assert_eq!(loaded.participants.len(), 1);

        let rewritten = std::fs::read_to_string(&file.0).unwrap();
        assert!(!rewritten.contains("hunter2"));
        assert!(rewritten.contains("$argon2"));

        let reloaded = loader.reload().unwrap();
        assert!(reloaded.admin.verify_secret("hunter2"));
        assert_eq!(reloaded.admin.secret_hash(), loaded.admin.secret_hash());
    }

    #[test]
    fn test_listen_override() {
        let file = TempConfig::new("[admin]\nsecret = \"s\"\n");
        let addr: SocketAddr = "127.0.0.1:9999".parse().unwrap();

        let loaded = ConfigLoader::new(&file.0, Some(addr)).load().unwrap();
        assert_eq!(loaded.server.listen, addr);
        assert_eq!(loaded.database.operation_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_duplicate_participants_are_rejected() {
        let file = TempConfig::new(
            "[admin]\nsecret = \"s\"\n\n[[participants]]\nname = \"Alice\"\n\n\
             [[participants]]\nname = \" alice \"\n",
        );
        let err = ConfigLoader::new(&file.0, None).load().unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_zero_timeout_is_rejected() {
        let file =
            TempConfig::new("[admin]\nsecret = \"s\"\n[database]\noperation_timeout_ms = 0\n");
        let err = ConfigLoader::new(&file.0, None).load().unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }
}
