//! Participant API handlers.
//!
//! # Endpoints
//!
//! - `POST /participar` – enroll by name and receive the assigned friend
//! - `POST /historial`  – look up the assigned friend with an access token

use amigo_core::entities::participant::FriendView;
use amigo_core::services::{Enroll, LookupFriend};
use amigo_sdk::objects::{HistoryRequest, HistoryResponse, ParticipateRequest, ParticipateResponse};
use axum::{Json, extract::State};
use kanau::processor::Processor;

use crate::api::error::ApiError;
use crate::api::extractors::ValidJson;
use crate::state::AppState;

/// `POST /participar` — enroll, or replay an existing enrollment.
pub async fn participate(
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<ParticipateRequest>,
) -> Result<Json<ParticipateResponse>, ApiError> {
    let enrollment = state
        .draw
        .process(Enroll {
            name: payload.nombre,
            interests: payload.intereses,
        })
        .await?;
    if enrollment.replayed {
        tracing::debug!("Served an existing enrollment");
    }

    Ok(Json(ParticipateResponse {
        amigo: enrollment.friend.name.clone(),
        intereses: enrollment.friend.interests_text().to_owned(),
        token: enrollment.access_token,
    }))
}

/// `POST /historial` — resolve an access token to the assigned friend.
pub async fn history(
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<HistoryRequest>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let friend = state
        .draw
        .process(LookupFriend {
            token: payload.token,
        })
        .await?;

    Ok(Json(to_history(&friend)))
}

fn to_history(friend: &FriendView) -> HistoryResponse {
    HistoryResponse {
        amigo: friend.name.clone(),
        intereses: friend.interests_text().to_owned(),
    }
}
