//! Keep a local [`ActiveAccidents`] list in step with the server.

use std::sync::{Arc, Mutex, MutexGuard};

use crashalert_core::accident::Accident;
use crashalert_core::realtime::{ActiveAccidents, ServerMessage};
use tokio_util::sync::CancellationToken;

use crate::client::AlertClient;
use crate::connection::{AlertConnection, CloseReason};
use crate::error::ClientError;
use crate::reconnect::{reconnect_loop, ReconnectConfig};

/// Follow the realtime feed until cancelled or logged out elsewhere.
///
/// After every (re)connect the list is replaced from
/// `GET /accidents/active-accidents`, then realtime frames are merged into
/// it. A failed refetch keeps the current list and the feed keeps running.
/// Drops trigger [`reconnect_loop`]; a `force_logout` ends the loop with
/// [`CloseReason::ForcedLogout`].
pub async fn keep_in_sync(
    client: &AlertClient,
    active: Arc<Mutex<ActiveAccidents>>,
    config: &ReconnectConfig,
    cancel: &CancellationToken,
) -> Result<Option<CloseReason>, ClientError> {
    let mut conn = match client.connect().await {
        Ok(conn) => conn,
        Err(e) => {
            tracing::warn!(error = %e, "Initial connect failed, entering reconnect loop");
            match reconnect_loop(client, config, cancel).await {
                Some(conn) => conn,
                None => return Ok(None),
            }
        }
    };

    loop {
        match client.fetch_active_accidents().await {
            Ok(list) => replace(&active, list),
            Err(e) => {
                tracing::warn!(error = %e, "Active accident refetch failed, keeping current list");
            }
        }
        register_merge_handlers(&mut conn, &active);

        let reason = tokio::select! {
            _ = cancel.cancelled() => return Ok(None),
            reason = conn.run() => reason,
        };

        match reason {
            Ok(CloseReason::ForcedLogout) => return Ok(Some(CloseReason::ForcedLogout)),
            Ok(other) => tracing::info!(reason = ?other, "Realtime feed ended"),
            Err(e) => tracing::warn!(error = %e, "Realtime feed failed"),
        }

        conn = match reconnect_loop(client, config, cancel).await {
            Some(conn) => conn,
            None => return Ok(None),
        };
    }
}

/// A handler that panicked mid-merge poisons the lock; the list itself is
/// still consistent, so recover it.
fn lock(active: &Mutex<ActiveAccidents>) -> MutexGuard<'_, ActiveAccidents> {
    active.lock().unwrap_or_else(|poisoned| {
        tracing::warn!("Active accident list lock was poisoned, recovering");
        poisoned.into_inner()
    })
}

fn replace(active: &Mutex<ActiveAccidents>, list: Vec<Accident>) {
    lock(active).replace_all(list);
}

fn register_merge_handlers(conn: &mut AlertConnection, active: &Arc<Mutex<ActiveAccidents>>) {
    let on_new = Arc::clone(active);
    let on_update = Arc::clone(active);
    conn.on_new_accident(move |accident| merge(&on_new, ServerMessage::NewAccident(accident)))
        .on_accident_update(move |accident| {
            merge(&on_update, ServerMessage::AccidentUpdate(accident))
        })
        .on_force_logout(|message| {
            tracing::warn!(%message, "Session ended by a newer login");
        });
}

fn merge(active: &Mutex<ActiveAccidents>, message: ServerMessage) {
    let outcome = lock(active).apply(&message);
    tracing::debug!(?outcome, event = message.event_name(), "Merged realtime frame");
}
