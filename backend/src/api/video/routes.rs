//! Defines the HTTP routes under `/api/moderation/video`.
//!
//! Everything except the connectivity status requires the API secret.

use std::sync::Arc;

use axum::{
    middleware::from_fn_with_state,
    routing::{delete, get, post},
    Router,
};

use super::handlers::{analyze_video, check_progress, connectivity_status, delete_file, generate_signed_url};
use crate::{auth::require_api_key, state::AppState};

pub fn video_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    let protected = Router::new()
        .route("/signed-url", post(generate_signed_url))
        .route("/file/:fileKey", delete(delete_file))
        .route("/analyze", post(analyze_video))
        .route("/analyze/status/:id", get(check_progress))
        .route_layer(from_fn_with_state(state, require_api_key));

    Router::new()
        .route("/status", get(connectivity_status))
        .merge(protected)
}
