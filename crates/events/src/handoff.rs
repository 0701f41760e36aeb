//! At-most-once "find hotels for this trip" handoff.
//!
//! The trip views hand a single trip id to the hotel recommendations view.
//! The mailbox holds at most one pending id. A view that is currently
//! mounted can wait on [`HotelHandoff::recv`]; a view that mounts later
//! calls [`HotelHandoff::take`] once. Either way the id is removed when it
//! is read, so re-entering the view never repeats the handoff.

use std::sync::Mutex;

use tokio::sync::Notify;
use tripsync_core::types::TripId;

/// Single-slot mailbox for a pending hotel search.
#[derive(Debug, Default)]
pub struct HotelHandoff {
    slot: Mutex<Option<TripId>>,
    notify: Notify,
}

impl HotelHandoff {
    pub fn new() -> Self {
        Self::default()
    }

    /// Post a trip id, replacing any id that has not been consumed yet.
    pub fn send(&self, trip_id: TripId) {
        let replaced = self.lock().replace(trip_id);
        if let Some(previous) = replaced {
            tracing::debug!(previous, trip_id, "Replacing unconsumed hotel handoff");
        }
        self.notify.notify_one();
    }

    /// Take the pending id, if any, clearing the slot.
    pub fn take(&self) -> Option<TripId> {
        self.lock().take()
    }

    /// Whether an id is waiting to be consumed.
    pub fn is_pending(&self) -> bool {
        self.lock().is_some()
    }

    /// Wait until an id is posted, then take it.
    ///
    /// Only one listener should wait at a time; the mailbox delivers each
    /// id to exactly one reader.
    pub async fn recv(&self) -> TripId {
        loop {
            if let Some(trip_id) = self.take() {
                return trip_id;
            }
            self.notify.notified().await;
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<TripId>> {
        // A poisoned slot still holds a valid Option.
        self.slot.lock().unwrap_or_else(|e| e.into_inner())
    }
}
