//! Defines the HTTP routes under `/api/data-test`. None of them require the API secret.

use std::sync::Arc;

use axum::{
    routing::{delete, get, post},
    Router,
};

use super::handlers::{
    clear, create_hologram, create_user, delete_user, get_user, info, list_users, seed, update_user,
    user_holograms,
};
use crate::state::AppState;

pub fn data_test_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/info", get(info))
        .route("/seed", post(seed))
        .route("/clear", delete(clear))
        .route("/users", get(list_users).post(create_user))
        .route("/users/:id", get(get_user).put(update_user).delete(delete_user))
        .route("/users/:id/holograms", get(user_holograms))
        .route("/holograms", post(create_hologram))
}
