//! Handler functions for reading and replacing per-language bad-words lists.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;

use crate::{
    api::extract::AppJson,
    database::{models::BadWords, queries::Record},
    errors::AppError,
    state::AppState,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveListRequest {
    /// Comma-separated words and phrases.
    pub swear_words: String,
}

pub async fn get_list(
    State(state): State<Arc<AppState>>,
    Path(language): Path<String>,
) -> Result<Json<Record<BadWords>>, AppError> {
    state
        .bad_words
        .get_list(&language)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("No bad words list for language {language}")))
}

pub async fn save_list(
    State(state): State<Arc<AppState>>,
    Path(language): Path<String>,
    AppJson(request): AppJson<SaveListRequest>,
) -> Result<Json<Record<BadWords>>, AppError> {
    Ok(Json(state.bad_words.upsert_list(&language, &request.swear_words).await?))
}
