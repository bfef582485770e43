//! Errors surfaced by the draw services.

use crate::store::StoreError;
use thiserror::Error;

/// Errors returned by enrollment, lookup, draw and reset.
///
/// Every variant except [`DrawError::StoreUnavailable`] and
/// [`DrawError::Entropy`] is caused by the caller's input or the pool state.
#[derive(Debug, Error)]
pub enum DrawError {
    /// No participant has the given name.
    #[error("participant not found")]
    NotFound,

    /// No valid friend is left for this participant in the current cycle.
    #[error("no friend available in the pool")]
    PoolExhausted,

    /// The access token was never issued or was cleared by a reset.
    #[error("invalid access token")]
    InvalidToken,

    /// The participant holds a token but has no assignment.
    #[error("participant has no assigned friend yet")]
    NotAssignedYet,

    /// The store failed or timed out.
    #[error("store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),

    /// The system random source failed while minting a token.
    #[error("failed to gather entropy for access token")]
    Entropy,
}

impl From<ring::error::Unspecified> for DrawError {
    fn from(_: ring::error::Unspecified) -> Self {
        Self::Entropy
    }
}
