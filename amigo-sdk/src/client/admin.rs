//! Admin API client (admin dashboard → server).

use reqwest::Client;
use url::Url;

use super::{ClientError, parse_response};
use crate::ADMIN_AUTH_HEADER;
use crate::objects::{AdminCredential, AdminParticipantResponse, OkResponse};

/// Typed HTTP client for the admin endpoints.
///
/// The plaintext admin secret is sent in the JSON body for login and reset,
/// and in the `Amigo-Admin-Authorization` header for read endpoints. The
/// server verifies it against an argon2 hash.
#[derive(Debug, Clone)]
pub struct AdminClient {
    http: Client,
    base_url: Url,
    admin_secret: String,
}

impl AdminClient {
    /// Create a new `AdminClient`.
    ///
    /// * `base_url` – root URL of the draw server.
    /// * `admin_secret` – the plaintext admin secret.
    pub fn new(base_url: Url, admin_secret: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url,
            admin_secret: admin_secret.into(),
        }
    }

    /// Replace the default `reqwest::Client` with a custom one.
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http = client;
        self
    }

    fn credential(&self) -> AdminCredential {
        AdminCredential {
            clave: self.admin_secret.clone(),
        }
    }

    /// `POST /api/admin-login` – check the admin secret.
    pub async fn login(&self) -> Result<OkResponse, ClientError> {
        let url = self.base_url.join("/api/admin-login")?;
        let resp = self.http.post(url).json(&self.credential()).send().await?;
        parse_response(resp).await
    }

    /// `POST /api/reset` – clear every assignment, token and participation flag.
    pub async fn reset(&self) -> Result<OkResponse, ClientError> {
        let url = self.base_url.join("/api/reset")?;
        let resp = self.http.post(url).json(&self.credential()).send().await?;
        parse_response(resp).await
    }

    /// `POST /api/sorteo` – draw the whole pool at once.
    pub async fn draw(&self) -> Result<OkResponse, ClientError> {
        let url = self.base_url.join("/api/sorteo")?;
        let resp = self.http.post(url).send().await?;
        parse_response(resp).await
    }

    /// `GET /api/admin/participants` – list participants and their status.
    pub async fn list_participants(&self) -> Result<Vec<AdminParticipantResponse>, ClientError> {
        let url = self.base_url.join("/api/admin/participants")?;

        let resp = self
            .http
            .get(url)
            .header(ADMIN_AUTH_HEADER, &self.admin_secret)
            .send()
            .await?;

        parse_response(resp).await
    }
}
