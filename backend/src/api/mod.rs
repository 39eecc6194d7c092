//! Central module for organizing the application's HTTP API.
//!
//! This module assembles the service-health endpoints, the video moderation
//! routes, the bad-words administration routes and the data-test sandbox into
//! a single router.

pub mod bad_words;
pub mod data_test;
pub mod extract;
pub mod health;
pub mod video;

use std::sync::Arc;

use axum::{routing::get, Router};

use crate::{middleware, state::AppState};

pub fn router(state: Arc<AppState>) -> Router {
    let app = Router::new()
        .route("/health", get(health::health))
        .route("/api", get(health::api_root))
        .nest("/api/moderation/video", video::routes::video_router(state.clone()))
        .nest("/api/moderation/bad-words", bad_words::routes::bad_words_router(state.clone()))
        .nest("/api/data-test", data_test::routes::data_test_router());

    middleware::apply(app).with_state(state)
}
