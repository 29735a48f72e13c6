//! Decoding of the `{success, data?, message?}` response envelope.

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::ClientError;

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    success: bool,
    data: Option<T>,
    message: Option<String>,
}

/// Turn a response into its `data` payload.
///
/// Non-2xx statuses and `success: false` bodies become [`ClientError::Api`]
/// carrying the server's message when one is present.
pub async fn parse_envelope<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, ClientError> {
    let status = response.status();
    let body = response.text().await?;
    decode_envelope(status.as_u16(), &body)
}

pub(crate) fn decode_envelope<T: DeserializeOwned>(status: u16, body: &str) -> Result<T, ClientError> {
    if !(200..300).contains(&status) {
        let message = serde_json::from_str::<Envelope<serde_json::Value>>(body)
            .ok()
            .and_then(|e| e.message)
            .unwrap_or_else(|| body.to_string());
        return Err(ClientError::Api { status, message });
    }

    let envelope: Envelope<T> = serde_json::from_str(body)?;
    match (envelope.success, envelope.data) {
        (true, Some(data)) => Ok(data),
        _ => Err(ClientError::Api {
            status,
            message: envelope
                .message
                .unwrap_or_else(|| "Response carried no data".to_string()),
        }),
    }
}
