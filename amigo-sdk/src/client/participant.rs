//! Participant API client (draw frontend → server).

use reqwest::Client;
use url::Url;

use super::{ClientError, parse_response};
use crate::objects::{HistoryRequest, HistoryResponse, ParticipateRequest, ParticipateResponse};

/// Typed HTTP client for the participant-facing endpoints.
///
/// These endpoints carry no credentials: enrollment is keyed by name and
/// lookups by the access token returned at enrollment.
#[derive(Debug, Clone)]
pub struct ParticipantClient {
    http: Client,
    base_url: Url,
}

impl ParticipantClient {
    pub fn new(base_url: Url) -> Self {
        Self {
            http: Client::new(),
            base_url,
        }
    }

    /// Replace the default `reqwest::Client` with a custom one.
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http = client;
        self
    }

    /// `POST /api/participar` – enroll and receive the assigned friend.
    ///
    /// Calling this again for an enrolled participant returns the same
    /// friend and token.
    pub async fn participate(
        &self,
        nombre: impl Into<String>,
        intereses: Option<String>,
    ) -> Result<ParticipateResponse, ClientError> {
        let url = self.base_url.join("/api/participar")?;
        let body = ParticipateRequest {
            nombre: nombre.into(),
            intereses,
        };

        let resp = self.http.post(url).json(&body).send().await?;
        parse_response(resp).await
    }

    /// `POST /api/historial` – look up the assigned friend by access token.
    pub async fn history(&self, token: impl Into<String>) -> Result<HistoryResponse, ClientError> {
        let url = self.base_url.join("/api/historial")?;
        let body = HistoryRequest {
            token: token.into(),
        };

        let resp = self.http.post(url).json(&body).send().await?;
        parse_response(resp).await
    }
}
