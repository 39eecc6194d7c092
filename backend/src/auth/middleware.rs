//! Middleware for protecting the moderation routes with the shared API secret.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use tracing::warn;

use super::errors::AuthError;
use crate::state::AppState;

/// Compares the raw `Authorization` header against the configured secret.
pub fn check_api_key(header: Option<&str>, secret: &str) -> Result<(), AuthError> {
    match header {
        None => Err(AuthError::MissingHeader),
        Some(value) if value == secret => Ok(()),
        Some(_) => Err(AuthError::InvalidHeader),
    }
}

pub async fn require_api_key(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .map(|value| value.to_str().unwrap_or_default());

    if let Err(err) = check_api_key(header, &state.config.api_key_secret) {
        warn!("Rejected {} {}: {err}", request.method(), request.uri().path());
        return Err(err);
    }

    Ok(next.run(request).await)
}
