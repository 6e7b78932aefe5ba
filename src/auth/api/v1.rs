use axum::{
    Json, Router,
    extract::{Extension, Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use crate::auth::{AuthState, CurrentUser, decode_jwt, encode_jwt};

/// JSON request payload for API login
#[derive(serde::Deserialize, Debug)]
pub struct JsonLoginRequest {
    pub username: String,
    pub password: String,
}

/// JSON response for successful API login
#[derive(serde::Serialize, Debug)]
pub struct LoginResponse {
    pub token: String,
}

/// JSON response describing the authenticated user
#[derive(serde::Serialize, Debug)]
pub struct UserResponse {
    pub id: u64,
    pub username: String,
}

/// JSON response for API errors
#[derive(serde::Serialize, serde::Deserialize, Debug, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
        }
    }
}

/// Creates the public authentication router (login only).
pub fn create_login_router(state: Arc<AuthState>) -> Router {
    Router::new()
        .route("/login", axum::routing::post(json_login_handler))
        .with_state(state)
}

/// Creates the router exposing the authenticated user's identity.
/// Must be mounted behind `require_auth_middleware`.
pub fn create_user_router() -> Router {
    Router::new().route("/user", axum::routing::get(current_user_handler))
}

/// API authentication middleware that extracts the current user from the
/// Authorization Bearer header.
/// Sets the CurrentUser extension when the token is valid and the user it
/// names still exists. A storage failure while resolving the user is a
/// server error, not an authentication failure.
pub async fn auth_user_middleware(
    State(state): State<Arc<AuthState>>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Response {
    if let Some(auth_header) = headers.get("authorization") {
        if let Ok(auth_str) = auth_header.to_str() {
            if let Some(token) = auth_str.strip_prefix("Bearer ") {
                if let Ok(claims) = decode_jwt(token, &state.jwt_secret).await {
                    match state.users.user_by_id(claims.id).await {
                        Ok(Some(user)) => {
                            let current_user =
                                CurrentUser::new(user.id(), user.username().to_string());
                            request.extensions_mut().insert(current_user);
                        }
                        // An unknown ID falls through to 401 downstream.
                        Ok(None) => {}
                        Err(err) => {
                            tracing::error!("Failed to resolve user {}: {}", claims.id, err);
                            let error_response = ErrorResponse::new(
                                "STORAGE_ERROR",
                                "Failed to resolve the authenticated user",
                            );
                            return (StatusCode::INTERNAL_SERVER_ERROR, Json(error_response))
                                .into_response();
                        }
                    }
                }
            }
        }
    }

    next.run(request).await
}

/// Middleware that ensures the current user is authenticated.
/// Returns UNAUTHORIZED if the CurrentUser extension is not found in the request.
/// This middleware should be applied after auth_user_middleware.
pub async fn require_auth_middleware(request: Request, next: Next) -> Response {
    let is_authenticated = request.extensions().get::<CurrentUser>().is_some();

    if !is_authenticated {
        let error_response = ErrorResponse::new(
            "UNAUTHORIZED",
            "Authentication required to access this resource",
        );
        return (StatusCode::UNAUTHORIZED, Json(error_response)).into_response();
    }

    next.run(request).await
}

/// Handles JSON login requests and returns a JWT token.
/// Validates credentials and returns either a success response with token or an error.
#[tracing::instrument(skip(state, payload))]
pub async fn json_login_handler(
    State(state): State<Arc<AuthState>>,
    Json(payload): Json<JsonLoginRequest>,
) -> Result<Json<LoginResponse>, (StatusCode, Json<ErrorResponse>)> {
    if payload.username.is_empty() || payload.password.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(
                "VALIDATION_ERROR",
                "Username and password must not be empty",
            )),
        ));
    }

    let user = state
        .users
        .user_by_credentials(&payload.username, &payload.password)
        .await
        .map_err(|err| {
            tracing::error!("Failed to look up user credentials: {}", err);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new(
                    "STORAGE_ERROR",
                    "Failed to verify credentials",
                )),
            )
        })?;

    match user {
        Some(user) => {
            let jwt_token = encode_jwt(user.id(), &state.jwt_secret)
                .await
                .map_err(|_| {
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        Json(ErrorResponse::new(
                            "JWT_ERROR",
                            "Failed to generate authentication token",
                        )),
                    )
                })?;

            Ok(Json(LoginResponse { token: jwt_token }))
        }
        None => Err((
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse::new(
                "INVALID_CREDENTIALS",
                "Invalid username or password",
            )),
        )),
    }
}

/// Handler for GET /api/v1/user - returns the authenticated user's identity.
#[tracing::instrument(skip(current_user))]
pub async fn current_user_handler(
    Extension(current_user): Extension<CurrentUser>,
) -> Json<UserResponse> {
    Json(UserResponse {
        id: current_user.id,
        username: current_user.username,
    })
}
