//! Handler functions for the data-test sandbox.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};

use crate::{
    api::extract::{AppJson, AppQuery},
    config::DatabaseKind,
    database::{
        models::{Hologram, User, UserUpdate},
        queries::Record,
        timestamp,
    },
    errors::AppError,
    services::sandbox::{NewHologram, NewUser, UserQuery},
    state::AppState,
};

fn user_not_found() -> AppError {
    AppError::NotFound("User not found".to_string())
}

pub async fn info(State(state): State<Arc<AppState>>) -> Result<Json<Value>, AppError> {
    let stats = state.sandbox.storage_stats().await?;

    let mut body = json!(stats);
    body["configuration"] = json!(state.config.database.summary());
    body["configurationHelp"] = json!({
        "environmentVariables": {
            "DATABASE_TYPE": "Set to \"documentdb\" or \"in-memory\" to override auto-detection",
            "FORCE_IN_MEMORY_DB": "Set to \"true\" to force in-memory storage regardless of other settings",
            "MONGODB_CONNECTION_STRING": "Provide DocumentDB connection string to enable persistent storage",
            "APP_ENV": "Current environment setting",
        },
        "examples": {
            "forceDocumentDB": "DATABASE_TYPE=documentdb",
            "forceInMemory": "DATABASE_TYPE=in-memory",
            "testMode": "FORCE_IN_MEMORY_DB=true",
        },
    });

    if state.config.database.is_in_memory() {
        if let Some(collections) = state.sandbox.collection_stats().await {
            body["inMemoryCollections"] = json!(collections);
        }
    }

    Ok(Json(body))
}

pub async fn seed(State(state): State<Arc<AppState>>) -> Result<Json<Value>, AppError> {
    let data = state.sandbox.seed_sample_data().await?;
    Ok(Json(json!({
        "message": "Sample data seeded successfully",
        "data": data,
    })))
}

pub async fn clear(State(state): State<Arc<AppState>>) -> Result<Response, AppError> {
    if state.sandbox.kind() != DatabaseKind::InMemory {
        let body = json!({
            "error": "Clear operation only available for in-memory storage",
            "currentDatabase": state.sandbox.kind(),
            "hint": "Set DATABASE_TYPE=in-memory to enable data clearing",
        });
        return Ok((StatusCode::BAD_REQUEST, Json(body)).into_response());
    }

    state.sandbox.clear().await?;
    Ok(Json(json!({
        "message": "In-memory data cleared successfully",
        "timestamp": timestamp(),
    }))
    .into_response())
}

pub async fn list_users(
    State(state): State<Arc<AppState>>,
    AppQuery(query): AppQuery<UserQuery>,
) -> Result<Json<Vec<Record<User>>>, AppError> {
    Ok(Json(state.sandbox.get_users(&query).await?))
}

pub async fn create_user(
    State(state): State<Arc<AppState>>,
    AppJson(new_user): AppJson<NewUser>,
) -> Result<(StatusCode, Json<Record<User>>), AppError> {
    let user = state.sandbox.create_user(new_user).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Record<User>>, AppError> {
    state.sandbox.get_user(&id).await?.map(Json).ok_or_else(user_not_found)
}

pub async fn update_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    AppJson(update): AppJson<UserUpdate>,
) -> Result<Json<Record<User>>, AppError> {
    state
        .sandbox
        .update_user(&id, &update)
        .await?
        .map(Json)
        .ok_or_else(user_not_found)
}

pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    if !state.sandbox.delete_user(&id).await? {
        return Err(user_not_found());
    }
    Ok(Json(json!({ "message": "User deleted successfully" })))
}

pub async fn user_holograms(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Record<Hologram>>>, AppError> {
    Ok(Json(state.sandbox.holograms_by_user(&id).await?))
}

pub async fn create_hologram(
    State(state): State<Arc<AppState>>,
    AppJson(new_hologram): AppJson<NewHologram>,
) -> Result<(StatusCode, Json<Record<Hologram>>), AppError> {
    let hologram = state.sandbox.create_hologram(new_hologram).await?;
    Ok((StatusCode::CREATED, Json(hologram)))
}
