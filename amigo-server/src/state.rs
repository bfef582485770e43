//! Application state shared across all request handlers.

use amigo_core::config::SharedConfig;
use amigo_core::services::DrawService;
use std::sync::Arc;

/// Application state that is shared across all request handlers.
///
/// This is cloneable and cheap to pass around (everything is behind Arc).
#[derive(Clone)]
pub struct AppState {
    /// The draw engine and its store.
    pub draw: Arc<DrawService>,
    /// Runtime configuration (admin section can be reloaded via SIGHUP).
    pub config: SharedConfig,
}

impl AppState {
    pub fn new(draw: Arc<DrawService>, config: SharedConfig) -> Self {
        Self { draw, config }
    }
}
