//! HTTP API, mounted under `/api`.

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

mod admin;
pub mod error;
pub mod extractors;
mod participant;

/// Build the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/sorteo", post(admin::draw))
        .route("/participar", post(participant::participate))
        .route("/historial", post(participant::history))
        .route("/admin-login", post(admin::login))
        .route("/reset", post(admin::reset))
        .route("/admin/participants", get(admin::list_participants))
}
