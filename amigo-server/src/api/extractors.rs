//! Custom Axum extractors for request validation and admin authentication.
//!
//! Provides:
//! - `ValidJson<T>`: deserializes a JSON body and runs its [`Validate`] checks.
//! - `AdminAuth`: verifies the `Amigo-Admin-Authorization` header against the
//!   configured argon2 hash (used by the admin read endpoints).

use amigo_sdk::ADMIN_AUTH_HEADER;
use amigo_sdk::objects::Validate;
use axum::{
    Json,
    extract::{FromRequest, FromRequestParts, Request},
    http::request::Parts,
};
use serde::de::DeserializeOwned;

use crate::api::error::ApiError;
use crate::state::AppState;

/// A JSON body that passed boundary validation.
pub struct ValidJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidJson<T>
where
    T: DeserializeOwned + Validate + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
        value
            .validate()
            .map_err(|e| ApiError::BadRequest(e.to_string()))?;
        Ok(Self(value))
    }
}

/// Check a plaintext admin secret against the configured hash.
pub async fn verify_admin(state: &AppState, secret: &str) -> Result<(), ApiError> {
    let admin = state.config.admin.read().await;
    if admin.verify_secret(secret) {
        Ok(())
    } else {
        tracing::warn!("Rejected admin credential");
        Err(ApiError::Unauthorized)
    }
}

/// Proof that the request carried a valid `Amigo-Admin-Authorization` header.
pub struct AdminAuth;

impl FromRequestParts<AppState> for AdminAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let secret = parts
            .headers
            .get(ADMIN_AUTH_HEADER)
            .and_then(|value| value.to_str().ok())
            .ok_or(ApiError::Unauthorized)?;

        verify_admin(state, secret).await?;
        Ok(AdminAuth)
    }
}
