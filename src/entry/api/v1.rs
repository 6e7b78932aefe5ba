use axum::{
    Router,
    extract::{Extension, Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::auth::CurrentUser;
use crate::auth::api::v1::ErrorResponse;
use crate::entry::{Entry, EntryStore, EntryStoreError};
use crate::hub::NotificationHub;

/// State shared by the entry handlers: the store plus the hub notified
/// after every successful mutation.
pub struct EntryState {
    pub store: EntryStore,
    pub hub: Arc<NotificationHub>,
}

/// JSON representation of an Entry for API responses.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct EntryJson {
    /// Unique identifier for the entry
    id: u64,
    /// ID of the owning user
    #[serde(rename = "userId")]
    user_id: u64,
    /// Whether the entry has been completed
    completed: bool,
    /// The entry's content
    content: String,
}

impl From<Entry> for EntryJson {
    fn from(entry: Entry) -> Self {
        Self {
            id: entry.id(),
            user_id: entry.user_id(),
            completed: entry.completed(),
            content: entry.content().to_string(),
        }
    }
}

/// API response for listing the current user's entries.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct EntriesResponse {
    /// The user's entries, ordered by ascending ID
    pub entries: Vec<EntryJson>,
    /// Total number of entries
    pub count: usize,
}

/// JSON request payload for appending an entry.
#[derive(Debug, Deserialize, ToSchema)]
pub struct AddEntryRequest {
    /// The entry content; must not be empty
    pub content: String,
}

/// JSON request payload for updating an entry's completion state.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateEntryRequest {
    /// The new completion state
    pub completed: bool,
}

/// Handler for GET /api/v1/entry - returns the current user's entries.
#[tracing::instrument(skip(state, current_user))]
#[utoipa::path(
    get,
    path = "/api/v1/entry",
    responses(
        (status = 200, description = "Successfully retrieved entries", body = EntriesResponse),
        (status = 401, description = "Missing or invalid credentials", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Entries"
)]
pub async fn get_entries_handler(
    State(state): State<Arc<EntryState>>,
    Extension(current_user): Extension<CurrentUser>,
) -> Result<Json<EntriesResponse>, (StatusCode, Json<ErrorResponse>)> {
    match state.store.entries_by_user(current_user.id).await {
        Ok(entries) => {
            let entries: Vec<EntryJson> = entries.into_iter().map(EntryJson::from).collect();
            let count = entries.len();
            Ok(Json(EntriesResponse { entries, count }))
        }
        Err(err) => {
            tracing::error!("Failed to list entries: {}", err);
            Err(internal_error("Failed to retrieve entries"))
        }
    }
}

/// Handler for POST /api/v1/entry - appends a new entry for the current user.
#[tracing::instrument(skip(state, current_user, payload))]
#[utoipa::path(
    post,
    path = "/api/v1/entry",
    request_body = AddEntryRequest,
    responses(
        (status = 201, description = "Entry created", body = EntryJson),
        (status = 400, description = "Empty content", body = ErrorResponse),
        (status = 401, description = "Missing or invalid credentials", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Entries"
)]
pub async fn add_entry_handler(
    State(state): State<Arc<EntryState>>,
    Extension(current_user): Extension<CurrentUser>,
    Json(payload): Json<AddEntryRequest>,
) -> Result<(StatusCode, Json<EntryJson>), (StatusCode, Json<ErrorResponse>)> {
    if payload.content.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(
                "VALIDATION_ERROR",
                "Entry content must not be empty",
            )),
        ));
    }

    match state.store.add_entry(current_user.id, payload.content).await {
        Ok(entry) => {
            state.hub.broadcast_changed();
            Ok((StatusCode::CREATED, Json(EntryJson::from(entry))))
        }
        Err(err) => {
            tracing::error!("Failed to add entry: {}", err);
            Err(internal_error("Failed to add entry"))
        }
    }
}

/// Handler for POST /api/v1/entry/{id} - sets an entry's completion state.
#[tracing::instrument(skip(state, current_user, payload))]
#[utoipa::path(
    post,
    path = "/api/v1/entry/{id}",
    params(("id" = u64, Path, description = "ID of the entry to update")),
    request_body = UpdateEntryRequest,
    responses(
        (status = 200, description = "Entry updated", body = EntryJson),
        (status = 401, description = "Missing or invalid credentials", body = ErrorResponse),
        (status = 404, description = "No entry with the given ID", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Entries"
)]
pub async fn update_entry_handler(
    State(state): State<Arc<EntryState>>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<u64>,
    Json(payload): Json<UpdateEntryRequest>,
) -> Result<Json<EntryJson>, (StatusCode, Json<ErrorResponse>)> {
    match state.store.set_completion(id, payload.completed).await {
        Ok(entry) => {
            tracing::info!(user = current_user.id, entry = id, "completion updated");
            state.hub.broadcast_changed();
            Ok(Json(EntryJson::from(entry)))
        }
        Err(EntryStoreError::EntryNotFound(id)) => Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new(
                "NOT_FOUND",
                format!("Entry with ID {} not found", id),
            )),
        )),
        Err(err) => {
            tracing::error!("Failed to update entry {}: {}", id, err);
            Err(internal_error("Failed to update entry"))
        }
    }
}

fn internal_error(message: &str) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse::new("STORAGE_ERROR", message)),
    )
}

/// Creates and returns the entries API router.
/// Must be mounted behind `require_auth_middleware`.
pub fn create_api_router(state: Arc<EntryState>) -> Router {
    Router::new()
        .route("/entry", get(get_entries_handler).post(add_entry_handler))
        .route("/entry/{id}", post(update_entry_handler))
        .with_state(state)
}
