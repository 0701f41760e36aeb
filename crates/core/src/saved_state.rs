//! Derived "saved by the current user" state.
//!
//! The backend stores trips and saved-trip links as separate resources.
//! The client joins them on load: a trip is saved if and only if some link
//! in the user's [`SavedIndex`] references its id. The index itself holds
//! at most one link per trip.

use crate::saved_trip::SavedTripLink;
use crate::trip::Trip;
use crate::types::{SavedTripId, TripId};

// ---------------------------------------------------------------------------
// SavedIndex
// ---------------------------------------------------------------------------

/// The user's saved-trip links, unique by trip id, in server order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SavedIndex {
    links: Vec<SavedTripLink>,
    duplicates: Vec<SavedTripLink>,
}

impl SavedIndex {
    /// Build an index from a server listing.
    ///
    /// When two links reference the same trip the first one is kept and
    /// the later one is recorded in [`duplicates`](Self::duplicates).
    pub fn from_links(links: impl IntoIterator<Item = SavedTripLink>) -> Self {
        let mut index = Self::default();
        for link in links {
            if let Err(duplicate) = index.insert(link) {
                index.duplicates.push(duplicate);
            }
        }
        index
    }

    /// Add a link. Returns the link back if its trip is already linked.
    pub fn insert(&mut self, link: SavedTripLink) -> Result<(), SavedTripLink> {
        if self.contains_trip(link.trip_id) {
            return Err(link);
        }
        self.links.push(link);
        Ok(())
    }

    /// Remove and return the link for a trip, if any.
    pub fn remove_trip(&mut self, trip_id: TripId) -> Option<SavedTripLink> {
        let pos = self.links.iter().position(|l| l.trip_id == trip_id)?;
        Some(self.links.remove(pos))
    }

    pub fn link_for(&self, trip_id: TripId) -> Option<&SavedTripLink> {
        self.links.iter().find(|l| l.trip_id == trip_id)
    }

    pub fn link_for_mut(&mut self, trip_id: TripId) -> Option<&mut SavedTripLink> {
        self.links.iter_mut().find(|l| l.trip_id == trip_id)
    }

    pub fn contains_trip(&self, trip_id: TripId) -> bool {
        self.link_for(trip_id).is_some()
    }

    /// Links dropped by [`from_links`](Self::from_links) because their
    /// trip was already linked.
    pub fn duplicates(&self) -> &[SavedTripLink] {
        &self.duplicates
    }

    pub fn links(&self) -> &[SavedTripLink] {
        &self.links
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}

// ---------------------------------------------------------------------------
// TripEntry
// ---------------------------------------------------------------------------

/// A loaded trip together with its derived saved-state.
#[derive(Debug, Clone, PartialEq)]
pub struct TripEntry {
    pub trip: Trip,
    /// Id of the user's saved-trip link for this trip, if saved.
    pub saved_link_id: Option<SavedTripId>,
}

impl TripEntry {
    pub fn unsaved(trip: Trip) -> Self {
        Self {
            trip,
            saved_link_id: None,
        }
    }

    pub fn id(&self) -> Option<TripId> {
        self.trip.id
    }

    pub fn is_saved(&self) -> bool {
        self.saved_link_id.is_some()
    }
}

/// Join a trip listing against the saved index.
///
/// Trip order is preserved. Trips without an id are never saved.
pub fn derive_saved_state(trips: Vec<Trip>, index: &SavedIndex) -> Vec<TripEntry> {
    trips
        .into_iter()
        .map(|trip| {
            let saved_link_id = trip
                .id
                .and_then(|id| index.link_for(id))
                .map(|link| link.id);
            TripEntry {
                trip,
                saved_link_id,
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
