pub mod admin;
pub mod participant;

pub use admin::{AdminCredential, AdminParticipantResponse, ErrorResponse, OkResponse};
pub use participant::{HistoryRequest, HistoryResponse, ParticipateRequest, ParticipateResponse};

/// Longest accepted participant name, in characters.
pub const MAX_NAME_LEN: usize = 100;
/// Longest accepted interests text, in characters.
pub const MAX_INTERESTS_LEN: usize = 1000;
/// Longest accepted admin secret, in characters.
pub const MAX_SECRET_LEN: usize = 256;
/// Longest accepted access token, in characters.
pub const MAX_TOKEN_LEN: usize = 128;

/// Request bodies that must be checked before they reach the draw engine.
pub trait Validate {
    fn validate(&self) -> Result<(), ValidationError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("field `{0}` must not be empty")]
    Empty(&'static str),
    #[error("field `{field}` exceeds {max} characters")]
    TooLong { field: &'static str, max: usize },
}

pub(crate) fn require_text(
    field: &'static str,
    value: &str,
    max: usize,
) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Empty(field));
    }
    limit_text(field, value, max)
}

pub(crate) fn limit_text(
    field: &'static str,
    value: &str,
    max: usize,
) -> Result<(), ValidationError> {
    if value.chars().count() > max {
        return Err(ValidationError::TooLong { field, max });
    }
    Ok(())
}
