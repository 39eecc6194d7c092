//! Defines the HTTP routes under `/api/moderation/bad-words`, all behind the API secret.

use std::sync::Arc;

use axum::{middleware::from_fn_with_state, routing::get, Router};

use super::handlers::{get_list, save_list};
use crate::{auth::require_api_key, state::AppState};

pub fn bad_words_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/:language", get(get_list).put(save_list))
        .route_layer(from_fn_with_state(state, require_api_key))
}
