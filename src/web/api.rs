use std::sync::Arc;

use crate::{
    auth::{self, AuthState},
    entry::api::v1::EntryState,
    hub::{self, NotificationHub},
};

use axum::{
    Router,
    middleware::{from_fn, from_fn_with_state},
};

use tower::ServiceBuilder;

/// Creates the API routes for JSON API endpoints.
///
/// Login and the updates socket are public; the user and entry resources
/// require authentication.
pub fn create_api_router(
    auth_state: Arc<AuthState>,
    entry_state: Arc<EntryState>,
    hub: Arc<NotificationHub>,
) -> axum::Router {
    let public_routes = auth::api::v1::create_login_router(auth_state.clone())
        .merge(hub::create_updates_router(hub));
    let protected_routes = auth::api::v1::create_user_router()
        .merge(crate::entry::api::v1::create_api_router(entry_state))
        .layer(ServiceBuilder::new().layer(from_fn(auth::api::v1::require_auth_middleware)));
    let api_routes = public_routes.merge(protected_routes);
    Router::new()
        .nest("/api/v1", api_routes)
        .layer(ServiceBuilder::new().layer(from_fn_with_state(
            auth_state,
            auth::api::v1::auth_user_middleware,
        )))
}
