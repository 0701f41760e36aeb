//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] is the publish/subscribe hub for [`TripEvent`]s emitted by
//! a trip session. It is designed to be shared via `Arc<EventBus>` between
//! the session and whatever views observe it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tripsync_core::types::{SavedTripId, TripId, UserId};

// ---------------------------------------------------------------------------
// TripEvent
// ---------------------------------------------------------------------------

/// What happened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TripEventKind {
    /// A load completed and both lists were applied.
    Loaded { trips: usize, saved: usize },
    /// A load failed for at least one resource.
    LoadFailed { error: String },
    /// An automatic load retry has been scheduled.
    RetryScheduled { attempt: u32, delay_secs: u64 },
    /// Automatic retries are used up; a manual retry is required.
    RetriesExhausted { attempts: u32 },
    TripCreated { trip_id: TripId },
    TripSaved { trip_id: TripId, link_id: SavedTripId },
    /// `confirmed` is false when the removal is local-only.
    TripUnsaved { trip_id: TripId, confirmed: bool },
    TripDeleted { trip_id: TripId },
    NotesUpdated { trip_id: TripId, link_id: SavedTripId },
    HotelsRequested { trip_id: TripId },
}

impl TripEventKind {
    /// Dot-separated event name, e.g. `"trip.saved"`.
    pub fn event_type(&self) -> &'static str {
        match self {
            TripEventKind::Loaded { .. } => "trips.loaded",
            TripEventKind::LoadFailed { .. } => "trips.load_failed",
            TripEventKind::RetryScheduled { .. } => "trips.retry_scheduled",
            TripEventKind::RetriesExhausted { .. } => "trips.retries_exhausted",
            TripEventKind::TripCreated { .. } => "trip.created",
            TripEventKind::TripSaved { .. } => "trip.saved",
            TripEventKind::TripUnsaved { .. } => "trip.unsaved",
            TripEventKind::TripDeleted { .. } => "trip.deleted",
            TripEventKind::NotesUpdated { .. } => "trip.notes_updated",
            TripEventKind::HotelsRequested { .. } => "trip.hotels_requested",
        }
    }
}

/// A session event envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TripEvent {
    pub kind: TripEventKind,

    /// Id of the session user, when known.
    pub user_id: Option<UserId>,

    /// When the event was created (UTC).
    pub timestamp: DateTime<Utc>,
}

impl TripEvent {
    pub fn new(kind: TripEventKind) -> Self {
        Self {
            kind,
            user_id: None,
            timestamp: Utc::now(),
        }
    }

    /// Attach the session user to the event.
    pub fn with_user(mut self, user_id: Option<UserId>) -> Self {
        self.user_id = user_id;
        self
    }

    pub fn event_type(&self) -> &'static str {
        self.kind.event_type()
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 256;

/// In-process fan-out event bus.
///
/// Wraps a [`broadcast::Sender`] so that any number of subscribers can
/// independently receive every published [`TripEvent`].
///
/// # Usage
///
/// ```rust
/// use tripsync_events::bus::{EventBus, TripEvent, TripEventKind};
///
/// let bus = EventBus::default();
/// let mut rx = bus.subscribe();
///
/// bus.publish(TripEvent::new(TripEventKind::HotelsRequested { trip_id: 4 }));
/// assert_eq!(rx.try_recv().unwrap().event_type(), "trip.hotels_requested");
///
/// bus.publish(TripEvent::new(TripEventKind::TripDeleted { trip_id: 4 }));
/// ```
pub struct EventBus {
    sender: broadcast::Sender<TripEvent>,
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
    /// If there are no active subscribers the event is silently dropped.
    pub fn publish(&self, event: TripEvent) {
        tracing::debug!(event_type = event.event_type(), "Publishing trip event");
        // Ignore the SendError; it only means there are zero receivers.
        let _ = self.sender.send(event);
    }

    /// Subscribe to all events published on this bus.
    pub fn subscribe(&self) -> broadcast::Receiver<TripEvent> {
        self.sender.subscribe()
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
    use super::*;

    #[tokio::test]
    async fn publish_and_receive_single_subscriber() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();

        bus.publish(
            TripEvent::new(TripEventKind::TripSaved {
                trip_id: 3,
                link_id: 30,
            })
            .with_user(Some(7)),
        );

        let received = rx.recv().await.expect("should receive the event");
        assert_eq!(received.event_type(), "trip.saved");
        assert_eq!(received.user_id, Some(7));
        assert_eq!(
            received.kind,
            TripEventKind::TripSaved {
                trip_id: 3,
                link_id: 30
            }
        );
    }

    #[tokio::test]
    async fn multiple_subscribers_receive_same_event() {
        let bus = EventBus::default();
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        bus.publish(TripEvent::new(TripEventKind::TripDeleted { trip_id: 1 }));

        let e1 = rx1.recv().await.expect("subscriber 1 should receive");
        let e2 = rx2.recv().await.expect("subscriber 2 should receive");

        assert_eq!(e1.event_type(), "trip.deleted");
        assert_eq!(e2.event_type(), "trip.deleted");
    }

    #[test]
    fn publish_with_no_subscribers_does_not_panic() {
        let bus = EventBus::default();
        bus.publish(TripEvent::new(TripEventKind::HotelsRequested { trip_id: 1 }));
    }

    #[test]
    fn kind_serializes_with_type_tag() {
        let json = serde_json::to_value(TripEventKind::TripUnsaved {
            trip_id: 5,
            confirmed: false,
        })
        .unwrap();
        assert_eq!(json["type"], "trip_unsaved");
        assert_eq!(json["confirmed"], false);
    }
}
