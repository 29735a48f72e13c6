//! Connection configuration and REST calls for one CrashAlert server.

use crashalert_core::accident::Accident;
use tokio_tungstenite::connect_async;

use crate::api::parse_envelope;
use crate::connection::AlertConnection;
use crate::error::ClientError;

/// API prefix the server mounts its routes under.
const API_PREFIX: &str = "/api/v1";

/// Configuration handle for a CrashAlert server.
///
/// Holds the base URL and the caller's access token. Create a live
/// [`AlertConnection`] with [`connect`](Self::connect).
pub struct AlertClient {
    base_url: String,
    token: String,
    http: reqwest::Client,
}

impl AlertClient {
    /// * `base_url` - HTTP base URL, e.g. `http://localhost:3000`.
    /// * `token`    - access token returned by `POST /auth/login`.
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url, token)
    }

    /// Reuse an existing [`reqwest::Client`] for connection pooling.
    pub fn with_client(
        http: reqwest::Client,
        base_url: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            token: token.into(),
            http,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Realtime endpoint with the token in the query string.
    pub fn ws_url(&self) -> String {
        let ws_base = if let Some(rest) = self.base_url.strip_prefix("https://") {
            format!("wss://{rest}")
        } else if let Some(rest) = self.base_url.strip_prefix("http://") {
            format!("ws://{rest}")
        } else {
            self.base_url.clone()
        };
        format!("{ws_base}{API_PREFIX}/ws?token={}", self.token)
    }

    /// Open the realtime connection (phase one).
    ///
    /// The returned connection does nothing until handlers are registered
    /// and [`AlertConnection::run`] is awaited.
    pub async fn connect(&self) -> Result<AlertConnection, ClientError> {
        let (ws_stream, _response) = connect_async(self.ws_url()).await.map_err(|e| {
            ClientError::Connection(format!(
                "Failed to connect to CrashAlert at {}: {e}",
                self.base_url
            ))
        })?;

        tracing::info!(base_url = %self.base_url, "Connected to realtime feed");
        Ok(AlertConnection::new(ws_stream))
    }

    /// Fetch all open accidents, newest first.
    ///
    /// Call after every (re)connect: frames sent while disconnected are
    /// not replayed.
    pub async fn fetch_active_accidents(&self) -> Result<Vec<Accident>, ClientError> {
        let response = self
            .http
            .get(format!("{}{API_PREFIX}/accidents/active-accidents", self.base_url))
            .bearer_auth(&self.token)
            .send()
            .await?;

        parse_envelope(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ws_url_maps_scheme_and_carries_token() {
        let client = AlertClient::new("http://localhost:3000/", "abc.def.ghi");
        assert_eq!(
            client.ws_url(),
            "ws://localhost:3000/api/v1/ws?token=abc.def.ghi"
        );

        let secure = AlertClient::new("https://alerts.example.com", "t");
        assert_eq!(secure.ws_url(), "wss://alerts.example.com/api/v1/ws?token=t");
    }

    #[test]
    fn base_url_is_trimmed() {
        let client = AlertClient::new("http://host:3000///", "t");
        assert_eq!(client.base_url(), "http://host:3000");
    }
}
