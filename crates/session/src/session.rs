//! The trip reconciliation session.
//!
//! A [`TripSession`] holds the user's trips, the saved-trip links and the
//! saved flag derived from joining the two. Saved state only changes after
//! the backend acknowledges a change; there are no optimistic flips. All
//! state lives behind one lock and is reachable only through the session's
//! operations and snapshot accessors.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use tripsync_client::{ApiError, ApiResult, TripApi};
use tripsync_core::error::CoreError;
use tripsync_core::saved_state::{derive_saved_state, SavedIndex, TripEntry};
use tripsync_core::saved_trip::{validate_notes, NewSavedTrip, SavedTripLink};
use tripsync_core::trip::{Trip, TripDraft};
use tripsync_core::types::{SavedTripId, TripId, UserId};
use tripsync_events::{EventBus, HotelHandoff, TripEvent, TripEventKind};

use crate::confirm::{ConfirmedDelete, DeleteRequest};
use crate::error::{Operation, SessionError};
use crate::in_flight::{InFlight, InFlightGuard};
use crate::outcome::{
    DeleteOutcome, DetailPane, LoadFailure, LoadReport, LoadState, ResourceError, SaveOutcome,
    UnsaveOutcome,
};
use crate::retry::LoadRetryPolicy;

// ---------------------------------------------------------------------------
// SessionContext
// ---------------------------------------------------------------------------

/// Construction-time context for a [`TripSession`].
///
/// The current user and the hotel handoff are passed in explicitly so that
/// sibling views can share the same handoff and event bus.
#[derive(Clone)]
pub struct SessionContext {
    pub user_id: Option<UserId>,
    pub events: Arc<EventBus>,
    pub handoff: Arc<HotelHandoff>,
    pub retry: LoadRetryPolicy,
}

impl SessionContext {
    pub fn new(user_id: Option<UserId>) -> Self {
        Self {
            user_id,
            events: Arc::new(EventBus::default()),
            handoff: Arc::new(HotelHandoff::new()),
            retry: LoadRetryPolicy::default(),
        }
    }

    pub fn with_events(mut self, events: Arc<EventBus>) -> Self {
        self.events = events;
        self
    }

    pub fn with_handoff(mut self, handoff: Arc<HotelHandoff>) -> Self {
        self.handoff = handoff;
        self
    }

    pub fn with_retry(mut self, retry: LoadRetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct SessionState {
    entries: Vec<TripEntry>,
    saved: SavedIndex,
    selected: Option<TripId>,
    detail: DetailPane,
    load: LoadState,
    /// Trips unsaved locally whose remote removal was not confirmed.
    pending_unsaves: HashSet<TripId>,
}

impl SessionState {
    fn set_saved_flag(&mut self, trip_id: TripId, link_id: Option<SavedTripId>) {
        for entry in self.entries.iter_mut().filter(|e| e.id() == Some(trip_id)) {
            entry.saved_link_id = link_id;
        }
    }

    fn clear_selection_if(&mut self, trip_id: TripId) -> bool {
        let detail_for_trip = match &self.detail {
            DetailPane::Loading(id) | DetailPane::Failed { trip_id: id, .. } => *id == trip_id,
            DetailPane::Loaded(trip) => trip.id == Some(trip_id),
            DetailPane::Empty => false,
        };
        if detail_for_trip {
            self.detail = DetailPane::Empty;
        }
        if self.selected == Some(trip_id) {
            self.selected = None;
            self.detail = DetailPane::Empty;
            return true;
        }
        false
    }
}

// ---------------------------------------------------------------------------
// TripSession
// ---------------------------------------------------------------------------

/// In-memory trip list and saved state for one user, kept in sync with
/// the backend.
pub struct TripSession {
    api: Arc<dyn TripApi>,
    user_id: Option<UserId>,
    state: RwLock<SessionState>,
    in_flight: InFlight,
    load_seq: AtomicU64,
    select_seq: AtomicU64,
    retry: LoadRetryPolicy,
    events: Arc<EventBus>,
    handoff: Arc<HotelHandoff>,
}

impl TripSession {
    pub fn new(api: Arc<dyn TripApi>, context: SessionContext) -> Self {
        Self {
            api,
            user_id: context.user_id,
            state: RwLock::new(SessionState::default()),
            in_flight: InFlight::new(),
            load_seq: AtomicU64::new(0),
            select_seq: AtomicU64::new(0),
            retry: context.retry,
            events: context.events,
            handoff: context.handoff,
        }
    }

    // -- Load ---------------------------------------------------------------

    /// Fetch trips and saved links concurrently and rebuild the derived
    /// saved state.
    ///
    /// A resource that fails to load is replaced with an empty list and
    /// the report is [`LoadReport::Failed`]. A `404` on the saved-trips
    /// listing means the user has no saved trips. If another load starts
    /// before this one finishes, this one is discarded.
    pub async fn load(&self) -> Result<LoadReport, SessionError> {
        let user_id = self.require_user()?;
        let seq = self.load_seq.fetch_add(1, Ordering::SeqCst) + 1;
        let pending: Vec<TripId> = self
            .state
            .read()
            .await
            .pending_unsaves
            .iter()
            .copied()
            .collect();

        let (trips, links) = futures::future::join(
            self.api.list_trips(user_id),
            self.fetch_saved_links(user_id),
        )
        .await;

        let mut failure = LoadFailure::default();
        let trips = trips.unwrap_or_else(|e| {
            tracing::warn!(user_id, error = %e, "Failed to load trips");
            failure.trips = Some(ResourceError::from(&e));
            Vec::new()
        });
        let (links, replayed) = match links {
            Ok(links) => self.replay_unsaves(seq, &pending, links).await,
            Err(e) => {
                tracing::warn!(user_id, error = %e, "Failed to load saved trips");
                failure.saved_trips = Some(ResourceError::from(&e));
                (Vec::new(), Vec::new())
            }
        };

        let mut state = self.state.write().await;
        if self.load_seq.load(Ordering::SeqCst) != seq {
            tracing::debug!(user_id, seq, "Discarding superseded load");
            return Ok(LoadReport::Superseded);
        }

        let index = SavedIndex::from_links(links);
        for duplicate in index.duplicates() {
            tracing::warn!(
                user_id,
                trip_id = duplicate.trip_id,
                link_id = duplicate.id,
                "Ignoring duplicate saved-trip link",
            );
        }
        state.entries = derive_saved_state(trips, &index);
        state.saved = index;
        for guard in &replayed {
            state.pending_unsaves.remove(&guard.trip_id());
        }
        if let Some(selected) = state.selected {
            if !state.entries.iter().any(|e| e.id() == Some(selected)) {
                state.clear_selection_if(selected);
            }
        }

        let trips = state.entries.len();
        let saved = state.saved.len();
        let report = if failure.is_empty() {
            state.load = LoadState::Loaded;
            LoadReport::Loaded { trips, saved }
        } else {
            state.load = LoadState::Failed(failure.clone());
            LoadReport::Failed(failure)
        };
        drop(state);

        match &report {
            LoadReport::Failed(failure) => self.emit(TripEventKind::LoadFailed {
                error: failure.to_string(),
            }),
            _ => {
                tracing::info!(user_id, trips, saved, "Trips loaded");
                self.emit(TripEventKind::Loaded { trips, saved });
            }
        }
        Ok(report)
    }

    /// [`load`](Self::load), retrying failed loads according to the retry
    /// policy.
    ///
    /// Returns the report of the last attempt. Stops early on success, on
    /// a superseded load, or when `cancel` is triggered while waiting.
    pub async fn load_with_retry(
        &self,
        cancel: &CancellationToken,
    ) -> Result<LoadReport, SessionError> {
        let mut retries = 0u32;

        loop {
            let report = self.load().await?;
            if !report.is_failed() {
                return Ok(report);
            }

            let Some(delay) = self.retry.delay_for(retries + 1) else {
                tracing::error!(
                    user_id = self.user_id,
                    retries,
                    "Load retries exhausted, manual retry required",
                );
                self.emit(TripEventKind::RetriesExhausted { attempts: retries });
                return Ok(report);
            };
            retries += 1;

            tracing::warn!(
                user_id = self.user_id,
                attempt = retries,
                delay_secs = delay.as_secs(),
                "Scheduling load retry",
            );
            self.emit(TripEventKind::RetryScheduled {
                attempt: retries,
                delay_secs: delay.as_secs(),
            });

            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!(user_id = self.user_id, "Load retry cancelled");
                    return Ok(report);
                }
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }

    /// Saved-trips listing, with a `404` read as "no saved trips".
    ///
    /// Only the status counts here. Any other rejection is a failure, even
    /// when its body says "not found".
    async fn fetch_saved_links(&self, user_id: UserId) -> ApiResult<Vec<SavedTripLink>> {
        match self.api.list_saved_trips(user_id).await {
            Err(e) if e.status() == Some(404) => {
                tracing::debug!(user_id, "No saved trips for user");
                Ok(Vec::new())
            }
            other => other,
        }
    }

    /// Retry unconfirmed unsaves against a fresh listing.
    ///
    /// Links whose removal is confirmed are dropped from `links`. When a
    /// replay fails the server's link is kept and the trip shows as saved.
    /// A trip with a save or unsave running, or that was re-saved since the
    /// load started, is left alone. Replay stops once a newer load starts.
    ///
    /// Returns the guards of the trips handled here; they stay busy until
    /// the caller has applied the listing.
    async fn replay_unsaves(
        &self,
        seq: u64,
        pending: &[TripId],
        mut links: Vec<SavedTripLink>,
    ) -> (Vec<SavedTripLink>, Vec<InFlightGuard<'_>>) {
        let mut handled = Vec::new();
        for &trip_id in pending {
            if self.load_seq.load(Ordering::SeqCst) != seq {
                tracing::debug!(trip_id, seq, "Load superseded, leaving unsave pending");
                break;
            }
            let Some(guard) = self.in_flight.acquire(trip_id) else {
                continue;
            };
            if !self.state.read().await.pending_unsaves.contains(&trip_id) {
                continue;
            }
            let Some(pos) = links.iter().position(|l| l.trip_id == trip_id) else {
                handled.push(guard);
                continue;
            };
            let link_id = links[pos].id;
            match self.api.delete_saved_trip(link_id).await {
                Ok(()) => {
                    tracing::info!(trip_id, link_id, "Replayed pending unsave");
                    links.remove(pos);
                }
                Err(e) if e.is_not_found() => {
                    links.remove(pos);
                }
                Err(e) => {
                    tracing::warn!(
                        trip_id,
                        link_id,
                        error = %e,
                        "Pending unsave failed, keeping server link",
                    );
                }
            }
            handled.push(guard);
        }
        (links, handled)
    }

    // -- Save ---------------------------------------------------------------

    /// Save a trip for the current user with empty notes.
    pub async fn save_trip(&self, trip: &Trip) -> Result<SaveOutcome, SessionError> {
        self.save_with_notes(trip, "").await
    }

    /// Save a trip for the current user.
    ///
    /// A trip that is already saved locally is reported as
    /// [`SaveOutcome::AlreadySaved`] without a network call. A duplicate
    /// rejection from the server adopts the server's link.
    pub async fn save_with_notes(
        &self,
        trip: &Trip,
        notes: &str,
    ) -> Result<SaveOutcome, SessionError> {
        let user_id = self.require_user()?;
        let trip_id = trip
            .id
            .ok_or_else(|| CoreError::Validation("Trip id is required".into()))?;
        validate_notes(notes)?;
        let _guard = self
            .in_flight
            .acquire(trip_id)
            .ok_or(SessionError::InFlight(trip_id))?;

        if let Some(link) = self.state.read().await.saved.link_for(trip_id) {
            return Ok(SaveOutcome::AlreadySaved {
                link_id: Some(link.id),
            });
        }

        let request = NewSavedTrip {
            user_id,
            trip_id,
            notes: notes.to_string(),
        };
        match self.api.create_saved_trip(&request).await {
            Ok(link) => {
                let link_id = link.id;
                self.mark_saved(link).await;
                tracing::info!(user_id, trip_id, link_id, "Trip saved");
                self.emit(TripEventKind::TripSaved { trip_id, link_id });
                Ok(SaveOutcome::Saved { link_id })
            }
            Err(e) if e.is_duplicate() => {
                tracing::info!(user_id, trip_id, "Trip already saved on server");
                let link_id = self.adopt_server_link(user_id, trip_id).await;
                Ok(SaveOutcome::AlreadySaved { link_id })
            }
            Err(e) => {
                tracing::warn!(user_id, trip_id, error = %e, "Failed to save trip");
                Err(SessionError::api(Operation::Save, e))
            }
        }
    }

    /// Re-read the listing and record the server's link for `trip_id`.
    /// Leaves state unchanged if the listing fails or has no such link.
    async fn adopt_server_link(&self, user_id: UserId, trip_id: TripId) -> Option<SavedTripId> {
        match self.find_remote_link(user_id, trip_id).await {
            Ok(Some(link)) => {
                let link_id = link.id;
                self.mark_saved(link).await;
                self.emit(TripEventKind::TripSaved { trip_id, link_id });
                Some(link_id)
            }
            Ok(None) => {
                tracing::warn!(trip_id, "Duplicate reported but no link found");
                None
            }
            Err(e) => {
                tracing::warn!(trip_id, error = %e, "Could not read server link after duplicate");
                None
            }
        }
    }

    async fn find_remote_link(
        &self,
        user_id: UserId,
        trip_id: TripId,
    ) -> ApiResult<Option<SavedTripLink>> {
        let links = self.fetch_saved_links(user_id).await?;
        Ok(links.into_iter().find(|l| l.trip_id == trip_id))
    }

    async fn mark_saved(&self, link: SavedTripLink) {
        let trip_id = link.trip_id;
        let link_id = link.id;
        let mut state = self.state.write().await;
        state.saved.remove_trip(trip_id);
        // Cannot collide: the trip's previous link was just removed.
        let _ = state.saved.insert(link);
        state.set_saved_flag(trip_id, Some(link_id));
        state.pending_unsaves.remove(&trip_id);
    }

    // -- Unsave -------------------------------------------------------------

    /// Remove the current user's saved-trip link for a trip.
    pub async fn unsave_trip(&self, trip_id: TripId) -> Result<UnsaveOutcome, SessionError> {
        let user_id = self.require_user()?;
        let _guard = self
            .in_flight
            .acquire(trip_id)
            .ok_or(SessionError::InFlight(trip_id))?;

        let local = self
            .state
            .read()
            .await
            .saved
            .link_for(trip_id)
            .map(|l| l.id);
        let link_id = match local {
            Some(link_id) => link_id,
            None => match self.find_remote_link(user_id, trip_id).await {
                Ok(Some(link)) => link.id,
                Ok(None) => return Ok(UnsaveOutcome::NotSaved),
                Err(e) => return Err(SessionError::api(Operation::Unsave, e)),
            },
        };

        let outcome = match self.api.delete_saved_trip(link_id).await {
            Ok(()) => UnsaveOutcome::Removed { link_id },
            Err(e) if e.is_not_found() => self.confirm_removed(user_id, trip_id, link_id).await,
            Err(e) => {
                tracing::warn!(trip_id, link_id, error = %e, "Unsave not confirmed by server");
                UnsaveOutcome::LocalOnly {
                    link_id: Some(link_id),
                    reason: e.to_string(),
                }
            }
        };

        self.mark_unsaved(trip_id, !outcome.is_confirmed()).await;
        tracing::info!(trip_id, confirmed = outcome.is_confirmed(), "Trip unsaved");
        self.emit(TripEventKind::TripUnsaved {
            trip_id,
            confirmed: outcome.is_confirmed(),
        });
        Ok(outcome)
    }

    /// After a `404` on the link delete, check whether the trip still has
    /// a link on the server.
    async fn confirm_removed(
        &self,
        user_id: UserId,
        trip_id: TripId,
        link_id: SavedTripId,
    ) -> UnsaveOutcome {
        match self.find_remote_link(user_id, trip_id).await {
            Ok(None) => UnsaveOutcome::Removed { link_id },
            Ok(Some(remaining)) => UnsaveOutcome::LocalOnly {
                link_id: Some(remaining.id),
                reason: format!("Server still has link {} for the trip", remaining.id),
            },
            Err(e) => UnsaveOutcome::LocalOnly {
                link_id: Some(link_id),
                reason: e.to_string(),
            },
        }
    }

    async fn mark_unsaved(&self, trip_id: TripId, pending: bool) {
        let mut state = self.state.write().await;
        state.saved.remove_trip(trip_id);
        state.set_saved_flag(trip_id, None);
        if pending {
            state.pending_unsaves.insert(trip_id);
        } else {
            state.pending_unsaves.remove(&trip_id);
        }
    }

    // -- Delete -------------------------------------------------------------

    /// Start deleting a loaded trip. The returned request must be
    /// confirmed before it can be passed to [`delete_trip`](Self::delete_trip).
    pub async fn request_delete(&self, trip_id: TripId) -> Result<DeleteRequest, SessionError> {
        let state = self.state.read().await;
        let entry = state
            .entries
            .iter()
            .find(|e| e.id() == Some(trip_id))
            .ok_or(SessionError::UnknownTrip(trip_id))?;
        Ok(DeleteRequest::new(trip_id, entry.trip.display_title()))
    }

    /// Delete a trip on the server, then drop it locally.
    ///
    /// The trip's saved-trip link is dropped from local tracking without
    /// calling the saved-trips resource. On failure nothing changes.
    pub async fn delete_trip(
        &self,
        confirmed: ConfirmedDelete,
    ) -> Result<DeleteOutcome, SessionError> {
        let trip_id = confirmed.trip_id();
        let _guard = self
            .in_flight
            .acquire(trip_id)
            .ok_or(SessionError::InFlight(trip_id))?;

        if let Err(e) = self.api.delete_trip(trip_id).await {
            tracing::warn!(trip_id, error = %e, "Failed to delete trip");
            return Err(SessionError::api(Operation::Delete, e));
        }

        let mut state = self.state.write().await;
        state.entries.retain(|e| e.id() != Some(trip_id));
        let dropped_link = state.saved.remove_trip(trip_id).map(|l| l.id);
        state.pending_unsaves.remove(&trip_id);
        let cleared_selection = state.clear_selection_if(trip_id);
        drop(state);

        tracing::info!(trip_id, ?dropped_link, "Trip deleted");
        self.emit(TripEventKind::TripDeleted { trip_id });
        Ok(DeleteOutcome {
            trip_id,
            cleared_selection,
            dropped_link,
        })
    }

    // -- Selection ----------------------------------------------------------

    /// Select a trip and fetch its detail.
    ///
    /// Returns `Ok(None)` if the selection changed before the detail
    /// arrived: a newer selection, or a delete or load that cleared it. A
    /// failed fetch marks only the detail pane as failed; the trip list is
    /// untouched.
    pub async fn select_trip(&self, trip_id: TripId) -> Result<Option<Trip>, SessionError> {
        let seq = self.select_seq.fetch_add(1, Ordering::SeqCst) + 1;
        {
            let mut state = self.state.write().await;
            state.selected = Some(trip_id);
            state.detail = DetailPane::Loading(trip_id);
        }

        let result = self.api.get_trip(trip_id).await;

        let mut state = self.state.write().await;
        if self.select_seq.load(Ordering::SeqCst) != seq || state.selected != Some(trip_id) {
            tracing::debug!(trip_id, "Discarding superseded trip detail");
            return Ok(None);
        }
        match result {
            Ok(trip) => {
                state.detail = DetailPane::Loaded(trip.clone());
                Ok(Some(trip))
            }
            Err(e) => {
                tracing::warn!(trip_id, error = %e, "Failed to load trip detail");
                state.detail = DetailPane::Failed {
                    trip_id,
                    error: e.to_string(),
                };
                Err(SessionError::api(Operation::LoadDetail, e))
            }
        }
    }

    /// Clear the selection, discarding any detail fetch still running.
    pub async fn clear_selection(&self) {
        self.select_seq.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.write().await;
        state.selected = None;
        state.detail = DetailPane::Empty;
    }

    // -- Create / notes / hotels -------------------------------------------

    /// Create a trip for the current user and append it, unsaved.
    pub async fn create_trip(&self, draft: TripDraft) -> Result<Trip, SessionError> {
        let user_id = self.require_user()?;
        let request = draft.for_user(user_id);
        request.validate()?;

        let trip = self
            .api
            .create_trip(&request)
            .await
            .map_err(|e| SessionError::api(Operation::Create, e))?;
        let trip_id = trip.id.ok_or_else(|| {
            SessionError::api(
                Operation::Create,
                ApiError::Malformed("Created trip has no id".into()),
            )
        })?;

        self.state
            .write()
            .await
            .entries
            .push(TripEntry::unsaved(trip.clone()));
        tracing::info!(user_id, trip_id, "Trip created");
        self.emit(TripEventKind::TripCreated { trip_id });
        Ok(trip)
    }

    /// Replace the notes on a saved trip's link.
    pub async fn update_notes(
        &self,
        trip_id: TripId,
        notes: &str,
    ) -> Result<SavedTripLink, SessionError> {
        validate_notes(notes)?;
        let _guard = self
            .in_flight
            .acquire(trip_id)
            .ok_or(SessionError::InFlight(trip_id))?;

        let link_id = self
            .state
            .read()
            .await
            .saved
            .link_for(trip_id)
            .map(|l| l.id)
            .ok_or(SessionError::NotSaved(trip_id))?;

        let updated = self
            .api
            .update_saved_trip_notes(link_id, notes)
            .await
            .map_err(|e| SessionError::api(Operation::UpdateNotes, e))?;

        let link = {
            let mut state = self.state.write().await;
            match state.saved.link_for_mut(trip_id) {
                Some(link) => {
                    link.notes = updated.notes;
                    link.clone()
                }
                // Unsaved while the update was in flight.
                None => updated,
            }
        };
        tracing::info!(trip_id, link_id, "Saved trip notes updated");
        self.emit(TripEventKind::NotesUpdated { trip_id, link_id });
        Ok(link)
    }

    /// Hand a trip to the hotel recommendations view.
    pub fn request_hotels(&self, trip_id: TripId) {
        self.handoff.send(trip_id);
        self.emit(TripEventKind::HotelsRequested { trip_id });
    }

    // -- Snapshots ----------------------------------------------------------

    pub fn user_id(&self) -> Option<UserId> {
        self.user_id
    }

    pub fn events(&self) -> &Arc<EventBus> {
        &self.events
    }

    pub fn handoff(&self) -> &Arc<HotelHandoff> {
        &self.handoff
    }

    /// Loaded trips with their derived saved state, in server order.
    pub async fn trips(&self) -> Vec<TripEntry> {
        self.state.read().await.entries.clone()
    }

    pub async fn entry(&self, trip_id: TripId) -> Option<TripEntry> {
        self.state
            .read()
            .await
            .entries
            .iter()
            .find(|e| e.id() == Some(trip_id))
            .cloned()
    }

    pub async fn is_saved(&self, trip_id: TripId) -> bool {
        self.state.read().await.saved.contains_trip(trip_id)
    }

    /// The user's saved-trip links, at most one per trip.
    pub async fn saved_links(&self) -> Vec<SavedTripLink> {
        self.state.read().await.saved.links().to_vec()
    }

    pub async fn selected(&self) -> Option<TripId> {
        self.state.read().await.selected
    }

    pub async fn detail(&self) -> DetailPane {
        self.state.read().await.detail.clone()
    }

    pub async fn load_state(&self) -> LoadState {
        self.state.read().await.load.clone()
    }

    /// Trips whose unsave is waiting to be replayed on the next load.
    pub async fn pending_unsaves(&self) -> Vec<TripId> {
        let mut pending: Vec<_> = self
            .state
            .read()
            .await
            .pending_unsaves
            .iter()
            .copied()
            .collect();
        pending.sort_unstable();
        pending
    }

    // -- private ------------------------------------------------------------

    fn require_user(&self) -> Result<UserId, SessionError> {
        self.user_id.ok_or(SessionError::NoUser)
    }

    fn emit(&self, kind: TripEventKind) {
        self.events
            .publish(TripEvent::new(kind).with_user(self.user_id));
    }
}
