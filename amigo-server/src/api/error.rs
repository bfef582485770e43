//! HTTP error mapping.
//!
//! Every failure is answered with `{"ok": false, "error": "<message>"}`.
//! Infrastructure errors are logged here and never leak into the body.

use amigo_core::DrawError;
use amigo_sdk::objects::ErrorResponse;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

/// Errors returned by the API handlers and extractors.
#[derive(Debug)]
pub enum ApiError {
    /// The request body is malformed or fails validation.
    BadRequest(String),
    /// The admin credential is missing or wrong.
    Unauthorized,
    /// The draw engine refused or failed the operation.
    Draw(DrawError),
}

impl From<DrawError> for ApiError {
    fn from(err: DrawError) -> Self {
        Self::Draw(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "Clave incorrecta".to_string()),
            ApiError::Draw(err) => {
                let (status, message) = draw_error_status(&err);
                if status.is_server_error() {
                    tracing::error!(error = %err, "Draw engine failure");
                }
                (status, message.to_string())
            }
        };
        (status, Json(ErrorResponse::new(message))).into_response()
    }
}

fn draw_error_status(err: &DrawError) -> (StatusCode, &'static str) {
    match err {
        DrawError::NotFound => (StatusCode::BAD_REQUEST, "Participante no existe"),
        DrawError::PoolExhausted => (
            StatusCode::BAD_REQUEST,
            "No quedan amigos disponibles en el sorteo",
        ),
        DrawError::NotAssignedYet => (StatusCode::BAD_REQUEST, "Aún no tienes amigo asignado"),
        DrawError::InvalidToken => (StatusCode::NOT_FOUND, "Token inválido"),
        DrawError::StoreUnavailable(_) | DrawError::Entropy => {
            (StatusCode::INTERNAL_SERVER_ERROR, "Error del servidor")
        }
    }
}
