//! Admin API request and response types.

use serde::{Deserialize, Serialize};

use super::{MAX_SECRET_LEN, Validate, ValidationError, require_text};

/// Body of `POST /api/admin-login` and `POST /api/reset`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminCredential {
    pub clave: String,
}

impl std::fmt::Debug for AdminCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminCredential")
            .field("clave", &"<redacted>")
            .finish()
    }
}

impl Validate for AdminCredential {
    fn validate(&self) -> Result<(), ValidationError> {
        require_text("clave", &self.clave, MAX_SECRET_LEN)
    }
}

/// `{ "ok": true }` acknowledgement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OkResponse {
    pub ok: bool,
}

impl OkResponse {
    pub const OK: Self = Self { ok: true };
}

/// Error body shared by every endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub ok: bool,
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            error: error.into(),
        }
    }
}

/// A participant as shown on the admin dashboard.
///
/// Never carries the assigned friend or the access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminParticipantResponse {
    pub nombre: String,
    pub participo: bool,
    pub tiene_intereses: bool,
    /// Unix timestamp of the enrollment in the current cycle.
    pub inscrito_en: Option<i64>,
}
