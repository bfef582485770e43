//! Participant API request and response types.
//!
//! Field names follow the public JSON contract of the draw server, which
//! predates this crate and is kept in Spanish.

use serde::{Deserialize, Serialize};

use super::{
    MAX_INTERESTS_LEN, MAX_NAME_LEN, MAX_TOKEN_LEN, Validate, ValidationError, limit_text,
    require_text,
};

/// Request body for `POST /api/participar`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipateRequest {
    /// Participant name, matched case-insensitively.
    pub nombre: String,
    /// Free-text interests; omitted or `null` keeps whatever is stored.
    #[serde(default)]
    pub intereses: Option<String>,
}

impl Validate for ParticipateRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        require_text("nombre", &self.nombre, MAX_NAME_LEN)?;
        if let Some(intereses) = &self.intereses {
            limit_text("intereses", intereses, MAX_INTERESTS_LEN)?;
        }
        Ok(())
    }
}

/// Response returned after enrolling (or re-enrolling) in the draw.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipateResponse {
    /// Name of the assigned friend.
    pub amigo: String,
    /// Interests of the assigned friend.
    pub intereses: String,
    /// Access token for later lookups.
    pub token: String,
}

/// Request body for `POST /api/historial`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRequest {
    pub token: String,
}

impl Validate for HistoryRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        require_text("token", &self.token, MAX_TOKEN_LEN)
    }
}

/// Response of a token lookup. Interests are read live from the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub amigo: String,
    pub intereses: String,
}
