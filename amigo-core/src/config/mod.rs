//! Runtime configuration types.
//!
//! These types represent the validated configuration used by the services.
//! Loading and parsing the configuration file is handled by the server crate.

mod admin;
mod draw;
mod server;

pub use admin::{AdminConfig, hash_secret};
pub use draw::DrawConfig;
pub use server::ServerConfig;

use std::sync::Arc;
use tokio::sync::RwLock;

/// Configuration sections that request handlers read and SIGHUP replaces.
///
/// The listen address is only read at startup. The draw section is owned by
/// [`crate::services::DrawService`], which reseeds its random source when the
/// section changes.
#[derive(Clone)]
pub struct SharedConfig {
    /// Admin configuration (authentication).
    pub admin: Arc<RwLock<AdminConfig>>,
}

impl SharedConfig {
    pub fn new(admin: AdminConfig) -> Self {
        Self {
            admin: Arc::new(RwLock::new(admin)),
        }
    }
}
