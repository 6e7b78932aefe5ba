use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

use todo_server::auth::AuthState;
use todo_server::entry::api::v1::EntryState;
use todo_server::entry::{Entry, EntryStore};
use todo_server::hub::NotificationHub;
use todo_server::storage::JsonDocument;
use todo_server::user::{User, UserService, password_digest};
use todo_server::web::build_router;

pub const JWT_SECRET: &str = "test_secret";

/// A fully wired application over a temp data directory.
pub struct TestApp {
    pub router: axum::Router,
    pub hub: Arc<NotificationHub>,
    // Keeps the data directory alive for the duration of the test.
    pub data_dir: tempfile::TempDir,
}

impl TestApp {
    pub fn entries_path(&self) -> std::path::PathBuf {
        self.data_dir.path().join("items.json")
    }

    /// Reads the persisted entry collection back from disk.
    pub fn persisted_entries(&self) -> Vec<Entry> {
        let json = std::fs::read_to_string(self.entries_path()).unwrap();
        serde_json::from_str(&json).unwrap()
    }
}

/// Builds an app seeded with the given users and entries.
pub fn setup_app(users: &[User], entries: &[Entry]) -> TestApp {
    let data_dir = tempfile::tempdir().unwrap();
    let users_path = data_dir.path().join("users.json");
    let entries_path = data_dir.path().join("items.json");
    std::fs::write(&users_path, serde_json::to_string_pretty(users).unwrap()).unwrap();
    std::fs::write(
        &entries_path,
        serde_json::to_string_pretty(entries).unwrap(),
    )
    .unwrap();

    let auth_state = Arc::new(AuthState::new(
        JWT_SECRET.to_string(),
        UserService::new(JsonDocument::new(users_path)),
    ));
    let hub = Arc::new(NotificationHub::new());
    let entry_state = Arc::new(EntryState {
        store: EntryStore::new(JsonDocument::new(entries_path)),
        hub: hub.clone(),
    });

    TestApp {
        router: build_router(auth_state, entry_state, hub.clone()),
        hub,
        data_dir,
    }
}

/// The default seeded user.
pub fn default_user() -> User {
    User::new(7, "alice".to_string(), password_digest("hunter2"))
}

/// A bearer token for the given user ID, signed with the test secret.
pub async fn bearer_token_for(user_id: u64) -> String {
    todo_server::auth::encode_jwt(user_id, JWT_SECRET)
        .await
        .unwrap()
}

/// Sends one JSON request through the router and returns status plus the
/// parsed response body.
pub async fn send_json(
    router: &axum::Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}
