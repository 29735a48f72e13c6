/// Errors from the realtime connection and the REST calls.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Failed to establish the WebSocket connection.
    #[error("Connection error: {0}")]
    Connection(String),

    /// A protocol-level error on an established connection.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The server answered with a non-2xx status or `success: false`.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// A response body or frame could not be decoded.
    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),
}
