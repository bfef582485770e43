//! Draw configuration.

use crate::draw::DrawStrategy;

/// How the pool is drawn and where randomness comes from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrawConfig {
    pub strategy: DrawStrategy,
    /// Fixed seed for reproducible draws; `None` seeds from the OS.
    pub seed: Option<u64>,
}
