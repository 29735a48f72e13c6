//! Exponential-backoff reconnection for the realtime feed.
//!
//! When the connection drops, call [`reconnect_loop`] to keep retrying with
//! increasing delays until the connection is restored or the
//! [`CancellationToken`] fires.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::client::AlertClient;
use crate::connection::AlertConnection;

/// Tunable parameters for the exponential-backoff strategy.
#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    /// Delay before the first reconnection attempt.
    pub initial_delay: Duration,
    /// Upper bound on the delay between attempts.
    pub max_delay: Duration,
    /// Factor by which the delay grows after each failure.
    pub multiplier: f64,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            multiplier: 2.0,
        }
    }
}

/// Calculate the next backoff delay from the current delay and config.
///
/// The result is clamped to [`ReconnectConfig::max_delay`].
pub fn next_delay(current: Duration, config: &ReconnectConfig) -> Duration {
    let next_ms = (current.as_millis() as f64 * config.multiplier) as u64;
    Duration::from_millis(next_ms).min(config.max_delay)
}

/// Reconnect with exponential backoff.
///
/// Returns `Some(connection)` once a connection succeeds, or `None` if
/// `cancel` fires first.
pub async fn reconnect_loop(
    client: &AlertClient,
    config: &ReconnectConfig,
    cancel: &CancellationToken,
) -> Option<AlertConnection> {
    let mut delay = config.initial_delay;
    let mut attempt = 0u32;

    loop {
        if cancel.is_cancelled() {
            return None;
        }

        attempt += 1;
        tracing::info!(
            base_url = client.base_url(),
            attempt,
            delay_ms = delay.as_millis() as u64,
            "Reconnecting to realtime feed",
        );

        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Reconnect cancelled");
                return None;
            }
            result = client.connect() => {
                match result {
                    Ok(conn) => {
                        tracing::info!(attempt, "Reconnected to realtime feed");
                        return Some(conn);
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Reconnect attempt {attempt} failed");
                    }
                }
            }
        }

        tokio::select! {
            _ = cancel.cancelled() => return None,
            _ = tokio::time::sleep(delay) => {}
        }

        delay = next_delay(delay, config);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_delay_doubles() {
        let config = ReconnectConfig::default();
        assert_eq!(next_delay(Duration::from_secs(1), &config), Duration::from_secs(2));
    }

    #[test]
    fn next_delay_clamps_at_max() {
        let config = ReconnectConfig {
            max_delay: Duration::from_secs(10),
            ..Default::default()
        };
        assert_eq!(next_delay(Duration::from_secs(8), &config), Duration::from_secs(10));
    }

    #[test]
    fn full_backoff_sequence() {
        let config = ReconnectConfig::default();
        let mut delay = config.initial_delay;

        for expected_secs in [1, 2, 4, 8, 16, 30, 30, 30] {
            assert_eq!(delay.as_secs(), expected_secs);
            delay = next_delay(delay, &config);
        }
    }

    #[tokio::test]
    async fn cancelled_token_stops_before_connecting() {
        let cancel = CancellationToken::new();
        cancel.cancel();

        let client = AlertClient::new("http://127.0.0.1:9", "token");
        let result = reconnect_loop(&client, &ReconnectConfig::default(), &cancel).await;
        assert!(result.is_none());
    }
}
