//! General-purpose middleware for the API.
//!
//! Layers applied to the whole router: permissive CORS for the browser client,
//! request tracing and the JSON body limit.

use axum::{extract::DefaultBodyLimit, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub const BODY_LIMIT_BYTES: usize = 10 * 1024 * 1024;

pub fn apply<S>(router: Router<S>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
