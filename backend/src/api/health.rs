//! Liveness endpoints reporting the selected storage backend.

use std::sync::Arc;

use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::{database::timestamp, state::AppState};

pub async fn health(State(state): State<Arc<AppState>>) -> Json<Value> {
    let summary = state.config.database.summary();
    let mut body = json!({
        "status": "ok",
        "database": {
            "type": summary.database_type,
            "environment": summary.environment,
            "isStatelessCapable": summary.is_stateless_capable,
            "warnings": summary.warnings,
            "recommendations": summary.recommendations,
        },
        "timestamp": timestamp(),
    });

    if state.config.database.is_in_memory() {
        if let Some(stats) = state.store.collection_stats().await {
            body["inMemoryStats"] = json!(stats);
        }
    }

    Json(body)
}

pub async fn api_root(State(state): State<Arc<AppState>>) -> Json<Value> {
    let summary = state.config.database.summary();
    Json(json!({
        "ok": true,
        "database": {
            "type": summary.database_type,
            "isStatelessCapable": summary.is_stateless_capable,
        },
    }))
}
