//! TOML file configuration structures.
//!
//! These structs directly map to the `amigo-config.toml` file format.

use amigo_core::draw::DrawStrategy;
use serde::{Deserialize, Serialize};
use std::net::{Ipv4Addr, SocketAddr};

/// Root configuration structure as read from the TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub server: ServerConfig,
    pub admin: AdminConfig,
    #[serde(default)]
    pub draw: DrawConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub participants: Vec<ParticipantConfig>,
}

/// Server configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The address and port to listen on (e.g., "0.0.0.0:8080").
    #[serde(default = "default_listen_addr")]
    pub listen: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen_addr(),
        }
    }
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from((Ipv4Addr::UNSPECIFIED, 8080))
}

/// Admin configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminConfig {
    /// The admin secret. If this is plaintext (doesn't start with `$argon2`),
    /// it will be hashed and the config file will be rewritten.
    pub secret: String,
}

/// Draw configuration section.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct DrawConfig {
    #[serde(default)]
    pub strategy: DrawStrategy,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

/// Database configuration section. The URL itself comes from `DATABASE_URL`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Upper bound for a single store call, in milliseconds.
    #[serde(default = "default_operation_timeout_ms")]
    pub operation_timeout_ms: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            max_connections: default_max_connections(),
            operation_timeout_ms: default_operation_timeout_ms(),
        }
    }
}

fn default_max_connections() -> u32 {
    10
}

fn default_operation_timeout_ms() -> u64 {
    5000
}

/// A participant seeded into the pool at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticipantConfig {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interests: Option<String>,
}

impl FileConfig {
    /// Check if the admin secret is already hashed (argon2 format).
    pub fn is_admin_secret_hashed(&self) -> bool {
        amigo_core::config::AdminConfig::is_hashed(&self.admin.secret)
    }
}
