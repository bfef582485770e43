//! Wire types and HTTP client for the secret friend draw server.
//!
//! The request and response objects in [`objects`] are shared by the server
//! and by any client. The typed client lives behind the `client` feature.

#[cfg(feature = "client")]
pub mod client;
pub mod objects;

/// Header name for admin API authentication (plaintext secret).
pub const ADMIN_AUTH_HEADER: &str = "Amigo-Admin-Authorization";

/// Interests text returned when a friend has not recorded any interests.
pub const NO_INTERESTS: &str = "Sin intereses registrados";
