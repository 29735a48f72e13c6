//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] is the publish/subscribe hub for [`AccidentEvent`]s.
//! It is shared via `Arc<EventBus>` across the application.

use chrono::{DateTime, Utc};
use crashalert_core::accident::Accident;
use crashalert_core::realtime::ServerMessage;
use crashalert_core::types::DbId;
use serde::Serialize;
use tokio::sync::broadcast;

// ---------------------------------------------------------------------------
// AccidentEvent
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AccidentEventKind {
    New,
    Update,
}

/// A change to an accident record.
#[derive(Debug, Clone, Serialize)]
pub struct AccidentEvent {
    pub kind: AccidentEventKind,

    /// The full record after the change.
    pub accident: Accident,

    /// User that triggered the change; `None` for detections.
    pub actor_user_id: Option<DbId>,

    /// When the event was created (UTC).
    pub timestamp: DateTime<Utc>,
}

impl AccidentEvent {
    pub fn new_accident(accident: Accident) -> Self {
        Self {
            kind: AccidentEventKind::New,
            accident,
            actor_user_id: None,
            timestamp: Utc::now(),
        }
    }

    pub fn updated(accident: Accident) -> Self {
        Self {
            kind: AccidentEventKind::Update,
            accident,
            actor_user_id: None,
            timestamp: Utc::now(),
        }
    }

    /// Attach the acting user to the event.
    pub fn with_actor(mut self, user_id: DbId) -> Self {
        self.actor_user_id = Some(user_id);
        self
    }

    /// The realtime frame clients receive for this event.
    pub fn to_message(&self) -> ServerMessage {
        match self.kind {
            AccidentEventKind::New => ServerMessage::NewAccident(self.accident.clone()),
            AccidentEventKind::Update => ServerMessage::AccidentUpdate(self.accident.clone()),
        }
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out event bus.
///
/// Wraps a [`broadcast::Sender`] so that any number of subscribers can
/// independently receive every published [`AccidentEvent`].
///
/// ```rust
/// use crashalert_events::EventBus;
///
/// let bus = EventBus::default();
/// let _rx = bus.subscribe();
/// assert_eq!(bus.subscriber_count(), 1);
/// ```
pub struct EventBus {
    sender: broadcast::Sender<AccidentEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full, the oldest un-consumed messages are dropped
    /// and slow receivers will observe a `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// With no subscribers the event is dropped.
    pub fn publish(&self, event: AccidentEvent) {
        let accident_id = event.accident.id;
        if self.sender.send(event).is_err() {
            tracing::debug!(accident_id, "No event subscribers");
        }
    }

    /// Subscribe to all events published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<AccidentEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use crashalert_core::accident::{AccidentStatus, Severity};

    use super::*;

    fn accident(id: DbId) -> Accident {
        Accident {
            id,
            camera_id: "cam-1".into(),
            location: "Main Road".into(),
            occurred_at: Utc::now(),
            display_date: None,
            display_time: None,
            severity: Severity::High,
            status: AccidentStatus::Active,
            assigned_to: None,
            false_positive: false,
            description: None,
            video: None,
        }
    }

    #[tokio::test]
    async fn publish_and_receive_single_subscriber() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();

        bus.publish(AccidentEvent::updated(accident(42)).with_actor(7));

        let received = rx.recv().await.expect("should receive the event");
        assert_eq!(received.kind, AccidentEventKind::Update);
        assert_eq!(received.accident.id, 42);
        assert_eq!(received.actor_user_id, Some(7));
    }

    #[tokio::test]
    async fn multiple_subscribers_receive_same_event() {
        let bus = EventBus::default();
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        bus.publish(AccidentEvent::new_accident(accident(1)));

        let e1 = rx1.recv().await.expect("subscriber 1 should receive");
        let e2 = rx2.recv().await.expect("subscriber 2 should receive");
        assert_eq!(e1.accident.id, 1);
        assert_eq!(e2.accident.id, 1);
    }

    #[tokio::test]
    async fn events_arrive_in_publish_order() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();

        for id in 1..=3 {
            bus.publish(AccidentEvent::new_accident(accident(id)));
        }

        for id in 1..=3 {
            assert_eq!(rx.recv().await.unwrap().accident.id, id);
        }
    }

    #[tokio::test]
    async fn slow_subscriber_observes_lag() {
        let bus = EventBus::new(2);
        let mut rx = bus.subscribe();

        for id in 1..=4 {
            bus.publish(AccidentEvent::new_accident(accident(id)));
        }

        assert!(matches!(
            rx.recv().await,
            Err(broadcast::error::RecvError::Lagged(2))
        ));
        assert_eq!(rx.recv().await.unwrap().accident.id, 3);
    }

    #[test]
    fn publish_with_no_subscribers_does_not_panic() {
        let bus = EventBus::default();
        bus.publish(AccidentEvent::new_accident(accident(1)));
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn event_maps_to_realtime_message() {
        let new = AccidentEvent::new_accident(accident(5)).to_message();
        assert_eq!(new.event_name(), "new_accident");

        let update = AccidentEvent::updated(accident(5)).to_message();
        assert_eq!(update.event_name(), "accident_update");
        assert_eq!(update.accident().map(|a| a.id), Some(5));
    }

    #[test]
    fn kind_serializes_snake_case() {
        let json = serde_json::to_value(AccidentEventKind::New).unwrap();
        assert_eq!(json, "new");
    }
}
