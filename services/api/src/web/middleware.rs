//! services/api/src/web/middleware.rs
//!
//! Session middleware for protecting the analysis route.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use crate::web::state::AppState;

/// Pulls the `session=` token out of the cookie header, if present.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    let cookie_header = headers.get(header::COOKIE)?.to_str().ok()?;
    cookie_header.split(';').find_map(|c| {
        c.trim()
            .strip_prefix("session=")
            .map(|token| token.to_string())
    })
}

/// Middleware that validates the session cookie against the in-memory table.
///
/// The analysis pipeline is reachable only for authenticated or guest
/// visitors; anyone else gets 401 Unauthorized. The resolved session is
/// inserted into request extensions for handlers to use.
pub async fn require_session(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let token = session_token(req.headers()).ok_or(StatusCode::UNAUTHORIZED)?;

    let session = state
        .get_session(&token)
        .await
        .ok_or(StatusCode::UNAUTHORIZED)?;

    if !session.can_analyze() {
        return Err(StatusCode::UNAUTHORIZED);
    }

    req.extensions_mut().insert(session);
    Ok(next.run(req).await)
}
