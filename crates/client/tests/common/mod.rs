//! In-process fake of the travel-planner backend.
//!
//! Serves the trip, saved-trip and hotel endpoints from an in-memory
//! store on an ephemeral port, mimicking the real backend's quirks:
//! duplicate saves are a `400` with a plain-text message and saved trips
//! are returned with a nested `trip` object instead of a flat `tripId`.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, Query, Request, State};
use axum::http::{HeaderMap, Method, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};

use tripsync_client::{ClientConfig, HttpTripApi};

/// A request as seen by the fake backend.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub content_type: Option<String>,
}

#[derive(Default)]
pub struct BackendState {
    pub trips: Vec<Value>,
    pub saved: Vec<Value>,
    pub next_id: i64,
    pub requests: Vec<RecordedRequest>,
    /// Status returned by the saved-trips listing instead of the data.
    pub saved_list_status: Option<StatusCode>,
    /// Serve a non-JSON body from the trip listing.
    pub malformed_trips: bool,
    /// Delay applied to every request before it is handled.
    pub delay: Duration,
}

pub type Shared = Arc<Mutex<BackendState>>;

/// A running fake backend.
pub struct FakeBackend {
    pub state: Shared,
    pub base_url: String,
}

impl FakeBackend {
    /// Bind to `127.0.0.1:0` and serve in a background task.
    pub async fn start() -> Self {
        let state: Shared = Arc::new(Mutex::new(BackendState {
            next_id: 100,
            ..Default::default()
        }));

        let app = Router::new()
            .route("/api/trips", post(create_trip))
            .route("/api/trips/user/{user_id}", get(list_trips))
            .route("/api/trips/{id}", get(get_trip).delete(delete_trip))
            .route("/api/trips/{id}/hotels", post(add_hotel))
            .route("/api/saved-trips", post(create_saved))
            .route("/api/saved-trips/user/{user_id}", get(list_saved))
            .route("/api/saved-trips/{id}", axum::routing::delete(delete_saved))
            .route("/api/saved-trips/{id}/notes", put(update_notes))
            .route("/api/hotels/recommendations", get(recommendations))
            .layer(middleware::from_fn_with_state(state.clone(), record))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            state,
            base_url: format!("http://{addr}"),
        }
    }

    /// An API client pointed at this backend.
    pub fn api(&self) -> HttpTripApi {
        self.api_with_timeout(Duration::from_secs(5))
    }

    pub fn api_with_timeout(&self, timeout: Duration) -> HttpTripApi {
        let config = ClientConfig::default()
            .with_api_url(self.base_url.clone())
            .with_request_timeout(timeout);
        HttpTripApi::new(config).unwrap()
    }

    /// Insert a trip owned by `user_id` and return its id.
    pub fn seed_trip(&self, user_id: i64, title: &str) -> i64 {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let id = state.next_id;
        state.trips.push(json!({
            "id": id,
            "userId": user_id,
            "title": title,
            "description": format!("{title} description"),
            "startDate": "2025-06-01",
            "endDate": "2025-06-07",
            "budget": 1200,
            "status": "PLANNING",
            "destinations": [],
            "hotels": []
        }));
        id
    }

    pub fn saved_count(&self) -> usize {
        self.state.lock().unwrap().saved.len()
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.lock().unwrap().requests.clone()
    }

    pub fn set<F: FnOnce(&mut BackendState)>(&self, f: F) {
        f(&mut self.state.lock().unwrap());
    }
}

// ---------------------------------------------------------------------------
// Middleware
// ---------------------------------------------------------------------------

async fn record(State(state): State<Shared>, request: Request, next: Next) -> Response {
    let delay = {
        let mut s = state.lock().unwrap();
        s.requests.push(RecordedRequest {
            method: request.method().clone(),
            path: request.uri().path().to_string(),
            content_type: content_type(request.headers()),
        });
        s.delay
    };
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
    next.run(request).await
}

fn content_type(headers: &HeaderMap) -> Option<String> {
    headers
        .get(axum::http::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn list_trips(State(state): State<Shared>, Path(user_id): Path<i64>) -> Response {
    let s = state.lock().unwrap();
    if s.malformed_trips {
        return (StatusCode::OK, "<html>gateway says hi</html>").into_response();
    }
    let trips: Vec<Value> = s
        .trips
        .iter()
        .filter(|t| t["userId"] == user_id)
        .cloned()
        .collect();
    Json(trips).into_response()
}

async fn get_trip(State(state): State<Shared>, Path(id): Path<i64>) -> Response {
    let s = state.lock().unwrap();
    match s.trips.iter().find(|t| t["id"] == id) {
        Some(trip) => Json(trip.clone()).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn create_trip(State(state): State<Shared>, Json(mut body): Json<Value>) -> Response {
    let mut s = state.lock().unwrap();
    s.next_id += 1;
    body["id"] = json!(s.next_id);
    body["status"] = json!("PLANNING");
    body["destinations"] = json!([]);
    body["hotels"] = json!([]);
    s.trips.push(body.clone());
    Json(body).into_response()
}

async fn delete_trip(State(state): State<Shared>, Path(id): Path<i64>) -> Response {
    let mut s = state.lock().unwrap();
    let before = s.trips.len();
    s.trips.retain(|t| t["id"] != id);
    if s.trips.len() == before {
        return StatusCode::NOT_FOUND.into_response();
    }
    s.saved.retain(|l| l["tripId"] != id);
    StatusCode::NO_CONTENT.into_response()
}

async fn add_hotel(
    State(state): State<Shared>,
    Path(id): Path<i64>,
    Json(mut hotel): Json<Value>,
) -> Response {
    let mut s = state.lock().unwrap();
    s.next_id += 1;
    hotel["id"] = json!(s.next_id);
    let Some(trip) = s.trips.iter_mut().find(|t| t["id"] == id) else {
        return (StatusCode::BAD_REQUEST, "Trip not found").into_response();
    };
    match trip["hotels"].as_array_mut() {
        Some(hotels) => hotels.push(hotel),
        None => trip["hotels"] = json!([hotel]),
    }
    (StatusCode::OK, "Hotel added to trip").into_response()
}

async fn list_saved(State(state): State<Shared>, Path(user_id): Path<i64>) -> Response {
    let s = state.lock().unwrap();
    if let Some(status) = s.saved_list_status {
        return status.into_response();
    }
    let links: Vec<Value> = s
        .saved
        .iter()
        .filter(|l| l["userId"] == user_id)
        .map(|l| nested_link(&s, l))
        .collect();
    Json(links).into_response()
}

/// Render a stored link the way the backend does: nested trip, no flat id.
fn nested_link(state: &BackendState, link: &Value) -> Value {
    let trip = state
        .trips
        .iter()
        .find(|t| t["id"] == link["tripId"])
        .cloned()
        .unwrap_or(Value::Null);
    json!({
        "id": link["id"],
        "notes": link["notes"],
        "savedAt": "2025-01-15T09:30:00.123456",
        "trip": trip,
    })
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SaveBody {
    user_id: i64,
    trip_id: i64,
    notes: Option<String>,
}

async fn create_saved(State(state): State<Shared>, Json(body): Json<SaveBody>) -> Response {
    let mut s = state.lock().unwrap();
    let exists = s
        .saved
        .iter()
        .any(|l| l["userId"] == body.user_id && l["tripId"] == body.trip_id);
    if exists {
        return (StatusCode::BAD_REQUEST, "Trip already saved").into_response();
    }
    if !s.trips.iter().any(|t| t["id"] == body.trip_id) {
        return (StatusCode::BAD_REQUEST, "Trip not found").into_response();
    }
    s.next_id += 1;
    let link = json!({
        "id": s.next_id,
        "userId": body.user_id,
        "tripId": body.trip_id,
        "notes": body.notes.unwrap_or_default(),
    });
    s.saved.push(link.clone());
    Json(nested_link(&s, &link)).into_response()
}

async fn delete_saved(State(state): State<Shared>, Path(id): Path<i64>) -> Response {
    let mut s = state.lock().unwrap();
    let before = s.saved.len();
    s.saved.retain(|l| l["id"] != id);
    if s.saved.len() == before {
        return StatusCode::NOT_FOUND.into_response();
    }
    StatusCode::OK.into_response()
}

#[derive(Deserialize)]
struct NotesBody {
    notes: Option<String>,
}

async fn update_notes(
    State(state): State<Shared>,
    Path(id): Path<i64>,
    Json(body): Json<NotesBody>,
) -> Response {
    let mut s = state.lock().unwrap();
    let Some(pos) = s.saved.iter().position(|l| l["id"] == id) else {
        return (StatusCode::BAD_REQUEST, "Saved trip not found").into_response();
    };
    s.saved[pos]["notes"] = json!(body.notes.unwrap_or_default());
    let link = s.saved[pos].clone();
    Json(nested_link(&s, &link)).into_response()
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecommendationQuery {
    trip_id: i64,
}

async fn recommendations(
    State(state): State<Shared>,
    Query(query): Query<RecommendationQuery>,
) -> Response {
    let s = state.lock().unwrap();
    if !s.trips.iter().any(|t| t["id"] == query.trip_id) {
        return (StatusCode::BAD_REQUEST, "Trip not found").into_response();
    }
    Json(json!([
        {
            "name": "Harbor Inn",
            "location": "Old Town",
            "rating": 4.4,
            "averageDistance": 0.7,
            "distancesFromDestinations": {"Museum": 0.5},
            "imageUrl": null,
            "mapUrl": "https://maps.example/harbor"
        }
    ]))
    .into_response()
}
