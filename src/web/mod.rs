use std::sync::Arc;

use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::AuthState;
use crate::config::Config;
use crate::entry::api::v1::EntryState;
use crate::entry::{Entry, EntryStore};
use crate::hub::NotificationHub;
use crate::storage::JsonDocument;
use crate::user::UserService;

pub mod api;

/// Builds the application router from its states.
///
/// Factored out of `start_web_server` so endpoint tests can drive the app
/// directly with `tower::ServiceExt`.
pub fn build_router(
    auth_state: Arc<AuthState>,
    entry_state: Arc<EntryState>,
    hub: Arc<NotificationHub>,
) -> axum::Router {
    axum::Router::new()
        .merge(api::create_api_router(auth_state, entry_state, hub))
        .route("/health", axum::routing::get(health_check_handler))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                // The original service accepts all origins so the bundled
                // standalone client can reach it from anywhere.
                .layer(CorsLayer::permissive()),
        )
}

#[tracing::instrument(skip(config))]
pub async fn start_web_server(config: Config) -> anyhow::Result<()> {
    let server_address = format!("0.0.0.0:{}", &config.port);
    let listener = tokio::net::TcpListener::bind(&server_address).await?;
    tracing::info!("Web server running on http://{}", server_address);

    let entries_doc: JsonDocument<Vec<Entry>> = JsonDocument::new(config.entries_path());
    seed_if_missing(&entries_doc).await?;

    let users = UserService::new(JsonDocument::new(config.users_path()));
    let auth_state = Arc::new(AuthState::new(config.jwt_secret.clone(), users));
    let hub = Arc::new(NotificationHub::new());
    let entry_state = Arc::new(EntryState {
        store: EntryStore::new(entries_doc),
        hub: hub.clone(),
    });

    let app = build_router(auth_state, entry_state, hub);

    axum::serve(listener, app).await?;
    Ok(())
}

/// Writes an empty entry collection when none exists yet. An existing but
/// unreadable document is left alone so a corruption is never papered over.
async fn seed_if_missing(doc: &JsonDocument<Vec<Entry>>) -> anyhow::Result<()> {
    if !tokio::fs::try_exists(doc.path()).await? {
        if let Some(parent) = doc.path().parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        doc.save(&Vec::new()).await?;
        tracing::info!("Created empty entry collection at {}", doc.path().display());
    }
    Ok(())
}

#[tracing::instrument]
pub async fn health_check_handler() -> &'static str {
    "OK"
}
