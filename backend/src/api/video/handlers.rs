//! Handler functions for the video moderation API.
//!
//! These functions validate request bodies, call into
//! `services::video_analyzer` and serialize the analysis reports.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::{
    api::extract::AppJson,
    errors::AppError,
    services::{
        connectivity::{self, ConnectivityStatus},
        video_analyzer::AnalysisReport,
    },
    state::AppState,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedUrlRequest {
    pub file_key: Option<String>,
    pub content_type: Option<String>,
    pub file_size: Option<u64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedUrlResponse {
    pub signed_url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    pub file_key: Option<String>,
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

pub async fn generate_signed_url(
    State(state): State<Arc<AppState>>,
    AppJson(request): AppJson<SignedUrlRequest>,
) -> Result<Json<SignedUrlResponse>, AppError> {
    let (Some(file_key), Some(content_type), Some(file_size)) = (
        present(request.file_key),
        present(request.content_type),
        request.file_size.filter(|size| *size > 0),
    ) else {
        return Err(AppError::BadRequest(
            "Missing fileKey, contentType, or fileSize in request".to_string(),
        ));
    };

    let signed_url = state
        .analyzer
        .generate_signed_url(&file_key, &content_type, file_size)
        .await?;
    Ok(Json(SignedUrlResponse { signed_url }))
}

pub async fn delete_file(
    State(state): State<Arc<AppState>>,
    Path(file_key): Path<String>,
) -> Result<StatusCode, AppError> {
    state.analyzer.delete_file(&file_key).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn analyze_video(
    State(state): State<Arc<AppState>>,
    AppJson(request): AppJson<AnalyzeRequest>,
) -> Result<Json<AnalysisReport>, AppError> {
    let file_key = present(request.file_key)
        .ok_or_else(|| AppError::BadRequest("Missing fileKey in request".to_string()))?;

    Ok(Json(state.analyzer.analyze_video(&file_key).await?))
}

pub async fn check_progress(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<String>,
) -> Result<Json<AnalysisReport>, AppError> {
    Ok(Json(state.analyzer.check_moderation_progress(&job_id).await?))
}

pub async fn connectivity_status(State(state): State<Arc<AppState>>) -> Json<ConnectivityStatus> {
    Json(connectivity::status(&state.adapters).await)
}
