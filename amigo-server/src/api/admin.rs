//! Admin API handlers.
//!
//! Login and reset carry the plaintext admin secret in the JSON body; the
//! participant listing takes it in the `Amigo-Admin-Authorization` header.
//!
//! # Endpoints
//!
//! - `POST /sorteo`             – draw the whole pool as one cycle
//! - `POST /admin-login`        – check the admin secret
//! - `POST /reset`              – start a new cycle
//! - `GET  /admin/participants` – list participants without their friends

use amigo_core::entities::participant::Participant;
use amigo_core::services::{DrawOutcome, DrawPool, ListPool, ResetPool};
use amigo_sdk::objects::{AdminCredential, AdminParticipantResponse, OkResponse};
use axum::{Json, extract::State};
use kanau::processor::Processor;

use crate::api::error::ApiError;
use crate::api::extractors::{AdminAuth, ValidJson, verify_admin};
use crate::state::AppState;

/// `POST /sorteo` — draw the pool. A pool that is already drawn is left as is.
pub async fn draw(State(state): State<AppState>) -> Result<Json<OkResponse>, ApiError> {
    match state.draw.process(DrawPool).await? {
        DrawOutcome::Drawn { .. } => {}
        DrawOutcome::AlreadyDrawn => tracing::debug!("Pool already drawn in this cycle"),
    }
    Ok(Json(OkResponse::OK))
}

/// `POST /admin-login` — check the admin secret without side effects.
pub async fn login(
    State(state): State<AppState>,
    ValidJson(credential): ValidJson<AdminCredential>,
) -> Result<Json<OkResponse>, ApiError> {
    verify_admin(&state, &credential.clave).await?;
    Ok(Json(OkResponse::OK))
}

/// `POST /reset` — clear every assignment, token and participation flag.
pub async fn reset(
    State(state): State<AppState>,
    ValidJson(credential): ValidJson<AdminCredential>,
) -> Result<Json<OkResponse>, ApiError> {
    verify_admin(&state, &credential.clave).await?;
    state.draw.process(ResetPool).await?;
    Ok(Json(OkResponse::OK))
}

/// `GET /admin/participants` — enrollment status of every participant.
pub async fn list_participants(
    State(state): State<AppState>,
    _auth: AdminAuth,
) -> Result<Json<Vec<AdminParticipantResponse>>, ApiError> {
    let participants = state.draw.process(ListPool).await?;
    Ok(Json(participants.iter().map(to_admin_response).collect()))
}

fn to_admin_response(p: &Participant) -> AdminParticipantResponse {
    AdminParticipantResponse {
        nombre: p.name.clone(),
        participo: p.participated,
        tiene_intereses: p
            .interests
            .as_deref()
            .is_some_and(|text| !text.trim().is_empty()),
        inscrito_en: p.enrolled_at.map(|t| t.assume_utc().unix_timestamp()),
    }
}
