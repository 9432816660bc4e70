//! services/api/src/web/auth.rs
//!
//! Authentication endpoints for user signup, login, guest access, and logout.

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use med_imaging_core::{auth, ports::CredentialError, session::Session};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;
use utoipa::ToSchema;

use crate::web::state::AppState;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct SignupRequest {
    pub username: String,
    pub password: String,
}

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize, ToSchema)]
pub struct AuthResponse {
    pub username: Option<String>,
    pub guest: bool,
}

fn session_cookie(token: &str) -> String {
    format!("session={token}; HttpOnly; SameSite=Lax; Path=/")
}

fn clear_cookie() -> String {
    "session=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0".to_string()
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /auth/signup - Create a new user account.
///
/// Signup only creates the account; the visitor still logs in explicitly.
#[utoipa::path(
    post,
    path = "/auth/signup",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "User created successfully", body = AuthResponse),
        (status = 409, description = "Username already exists"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn signup_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SignupRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    match auth::register(state.store.as_ref(), &req.username, &req.password).await {
        Ok(user) => Ok((
            StatusCode::CREATED,
            Json(AuthResponse {
                username: Some(user.username),
                guest: false,
            }),
        )),
        Err(CredentialError::AlreadyExists) => Err((
            StatusCode::CONFLICT,
            "Username already exists".to_string(),
        )),
        Err(e) => {
            error!("Failed to create user: {:?}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to create user".to_string(),
            ))
        }
    }
}

/// POST /auth/login - Login with existing account.
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let mut session = Session::default();
    match session
        .login(state.store.as_ref(), &req.username, &req.password)
        .await
    {
        Ok(()) => {}
        Err(CredentialError::NotFound | CredentialError::WrongPassword) => {
            return Err((
                StatusCode::UNAUTHORIZED,
                "Invalid username or password".to_string(),
            ));
        }
        Err(e) => {
            error!("Failed to verify credentials: {:?}", e);
            return Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                "Authentication error".to_string(),
            ));
        }
    }

    let username = session.current_username().map(str::to_string);
    let token = state.insert_session(session).await;

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, session_cookie(&token))],
        Json(AuthResponse {
            username,
            guest: false,
        }),
    ))
}

/// POST /auth/guest - Continue without an account.
#[utoipa::path(
    post,
    path = "/auth/guest",
    responses(
        (status = 200, description = "Guest session created", body = AuthResponse)
    )
)]
pub async fn guest_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let mut session = Session::default();
    session.continue_as_guest();
    let token = state.insert_session(session).await;

    (
        StatusCode::OK,
        [(header::SET_COOKIE, session_cookie(&token))],
        Json(AuthResponse {
            username: None,
            guest: true,
        }),
    )
}

/// POST /auth/logout - End the current session.
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses(
        (status = 200, description = "Session ended")
    )
)]
pub async fn logout_handler(
    State(state): State<Arc<AppState>>,
    headers: axum::http::HeaderMap,
) -> impl IntoResponse {
    if let Some(token) = super::middleware::session_token(&headers) {
        state.remove_session(&token).await;
    }
    (StatusCode::OK, [(header::SET_COOKIE, clear_cookie())])
}
