//! REST API client for the travel-planner backend.
//!
//! [`TripApi`] lists every backend call the session layer makes.
//! [`HttpTripApi`] implements it with [`reqwest`]: every request carries
//! `Content-Type: application/json`, is bounded by the configured timeout,
//! and has its response body read as text and decoded defensively.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use serde::de::DeserializeOwned;

use tripsync_core::hotel::{HotelRecommendation, NewTripHotel};
use tripsync_core::saved_trip::{
    NewSavedTrip, NotesUpdate, SavedTripLink, SavedTripRecord,
};
use tripsync_core::trip::{NewTrip, Trip};
use tripsync_core::types::{SavedTripId, TripId, UserId};

use crate::config::ClientConfig;
use crate::error::{snippet, ApiError, ApiResult};

// ---------------------------------------------------------------------------
// TripApi
// ---------------------------------------------------------------------------

/// Backend operations used by the trip session.
///
/// Implementations report failures through [`ApiError`] and never apply
/// policy: for example a `404` on the saved-trips listing is returned as
/// an error here and interpreted by the caller.
#[async_trait]
pub trait TripApi: Send + Sync {
    /// `GET /api/trips/user/{userId}`
    async fn list_trips(&self, user_id: UserId) -> ApiResult<Vec<Trip>>;

    /// `GET /api/trips/{tripId}`
    async fn get_trip(&self, trip_id: TripId) -> ApiResult<Trip>;

    /// `POST /api/trips`
    async fn create_trip(&self, trip: &NewTrip) -> ApiResult<Trip>;

    /// `DELETE /api/trips/{tripId}`
    async fn delete_trip(&self, trip_id: TripId) -> ApiResult<()>;

    /// `GET /api/saved-trips/user/{userId}`
    async fn list_saved_trips(&self, user_id: UserId) -> ApiResult<Vec<SavedTripLink>>;

    /// `POST /api/saved-trips`
    async fn create_saved_trip(&self, request: &NewSavedTrip) -> ApiResult<SavedTripLink>;

    /// `DELETE /api/saved-trips/{linkId}`
    async fn delete_saved_trip(&self, link_id: SavedTripId) -> ApiResult<()>;

    /// `PUT /api/saved-trips/{linkId}/notes`
    async fn update_saved_trip_notes(
        &self,
        link_id: SavedTripId,
        notes: &str,
    ) -> ApiResult<SavedTripLink>;

    /// `GET /api/hotels/recommendations?tripId={tripId}`
    async fn hotel_recommendations(&self, trip_id: TripId)
        -> ApiResult<Vec<HotelRecommendation>>;

    /// `POST /api/trips/{tripId}/hotels`
    async fn add_hotel_to_trip(&self, trip_id: TripId, hotel: &NewTripHotel) -> ApiResult<()>;
}

// ---------------------------------------------------------------------------
// HttpTripApi
// ---------------------------------------------------------------------------

/// [`TripApi`] over HTTP.
#[derive(Clone)]
pub struct HttpTripApi {
    client: reqwest::Client,
    config: ClientConfig,
}

impl HttpTripApi {
    /// Build a client with JSON default headers and the configured timeout.
    pub fn new(config: ClientConfig) -> ApiResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout)
            .build()
            .map_err(ApiError::Request)?;

        Ok(Self { client, config })
    }

    pub fn api_url(&self) -> &str {
        &self.config.api_url
    }

    // ---- private helpers ----

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.api_url, path)
    }

    /// Send a request and ensure a 2xx status.
    async fn send(&self, request: reqwest::RequestBuilder) -> ApiResult<reqwest::Response> {
        let response = request
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        tracing::debug!(status = status.as_u16(), url = %response.url(), "Backend responded");

        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(ApiError::rejected(status.as_u16(), body));
        }
        Ok(response)
    }

    /// Read a successful response body and decode it as `T`.
    async fn parse<T: DeserializeOwned>(&self, response: reqwest::Response) -> ApiResult<T> {
        let body = response.text().await.map_err(|e| self.classify(e))?;
        serde_json::from_str(&body)
            .map_err(|e| ApiError::Malformed(format!("{e}; body: {}", snippet(&body))))
    }

    /// Map a transport error, surfacing timeouts as [`ApiError::Timeout`].
    fn classify(&self, err: reqwest::Error) -> ApiError {
        if err.is_timeout() {
            ApiError::Timeout(self.config.request_timeout)
        } else {
            ApiError::Request(err)
        }
    }

    fn into_link(record: SavedTripRecord) -> ApiResult<SavedTripLink> {
        SavedTripLink::try_from(record).map_err(|e| ApiError::Malformed(e.to_string()))
    }
}

#[async_trait]
impl TripApi for HttpTripApi {
    async fn list_trips(&self, user_id: UserId) -> ApiResult<Vec<Trip>> {
        let response = self
            .send(self.client.get(self.url(&format!("/api/trips/user/{user_id}"))))
            .await?;
        self.parse(response).await
    }

    async fn get_trip(&self, trip_id: TripId) -> ApiResult<Trip> {
        let response = self
            .send(self.client.get(self.url(&format!("/api/trips/{trip_id}"))))
            .await?;
        self.parse(response).await
    }

    async fn create_trip(&self, trip: &NewTrip) -> ApiResult<Trip> {
        let response = self
            .send(self.client.post(self.url("/api/trips")).json(trip))
            .await?;
        self.parse(response).await
    }

    async fn delete_trip(&self, trip_id: TripId) -> ApiResult<()> {
        self.send(self.client.delete(self.url(&format!("/api/trips/{trip_id}"))))
            .await?;
        Ok(())
    }

    async fn list_saved_trips(&self, user_id: UserId) -> ApiResult<Vec<SavedTripLink>> {
        let response = self
            .send(
                self.client
                    .get(self.url(&format!("/api/saved-trips/user/{user_id}"))),
            )
            .await?;
        let records: Vec<SavedTripRecord> = self.parse(response).await?;

        let mut links = Vec::with_capacity(records.len());
        for record in records {
            match SavedTripLink::try_from(record) {
                Ok(link) => links.push(link),
                Err(e) => {
                    tracing::warn!(user_id, error = %e, "Skipping unusable saved trip record");
                }
            }
        }
        Ok(links)
    }

    async fn create_saved_trip(&self, request: &NewSavedTrip) -> ApiResult<SavedTripLink> {
        let response = self
            .send(self.client.post(self.url("/api/saved-trips")).json(request))
            .await?;
        let mut record: SavedTripRecord = self.parse(response).await?;
        // The create response may omit the flat reference; we know it.
        record.trip_id.get_or_insert(request.trip_id);
        record.user_id.get_or_insert(request.user_id);
        Self::into_link(record)
    }

    async fn delete_saved_trip(&self, link_id: SavedTripId) -> ApiResult<()> {
        self.send(
            self.client
                .delete(self.url(&format!("/api/saved-trips/{link_id}"))),
        )
        .await?;
        Ok(())
    }

    async fn update_saved_trip_notes(
        &self,
        link_id: SavedTripId,
        notes: &str,
    ) -> ApiResult<SavedTripLink> {
        let body = NotesUpdate {
            notes: notes.to_string(),
        };
        let response = self
            .send(
                self.client
                    .put(self.url(&format!("/api/saved-trips/{link_id}/notes")))
                    .json(&body),
            )
            .await?;
        let record: SavedTripRecord = self.parse(response).await?;
        Self::into_link(record)
    }

    async fn hotel_recommendations(
        &self,
        trip_id: TripId,
    ) -> ApiResult<Vec<HotelRecommendation>> {
        let response = self
            .send(
                self.client
                    .get(self.url("/api/hotels/recommendations"))
                    .query(&[("tripId", trip_id)]),
            )
            .await?;
        self.parse(response).await
    }

    async fn add_hotel_to_trip(&self, trip_id: TripId, hotel: &NewTripHotel) -> ApiResult<()> {
        // The backend answers with a plain-text confirmation.
        self.send(
            self.client
                .post(self.url(&format!("/api/trips/{trip_id}/hotels")))
                .json(hotel),
        )
        .await?;
        Ok(())
    }
}
