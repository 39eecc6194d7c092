//! Generic data models for the `adapters` crate.
//!
//! These models are provider-neutral representations of what the external
//! services answer (object metadata, moderation detections, transcription job
//! state, toxicity and sentiment scores), so the backend services never touch
//! vendor SDK types directly.

use std::fmt;

/// Metadata returned by a HEAD request on a stored object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectMetadata {
    pub content_type: Option<String>,
    pub content_length: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModerationJobStatus {
    InProgress,
    Succeeded,
    Failed,
    Other(String),
}

impl ModerationJobStatus {
    pub fn as_str(&self) -> &str {
        match self {
            ModerationJobStatus::InProgress => "IN_PROGRESS",
            ModerationJobStatus::Succeeded => "SUCCEEDED",
            ModerationJobStatus::Failed => "FAILED",
            ModerationJobStatus::Other(raw) => raw,
        }
    }

    pub fn is_in_progress(&self) -> bool {
        matches!(self, ModerationJobStatus::InProgress)
    }
}

impl From<&str> for ModerationJobStatus {
    fn from(raw: &str) -> Self {
        match raw {
            "IN_PROGRESS" => ModerationJobStatus::InProgress,
            "SUCCEEDED" => ModerationJobStatus::Succeeded,
            "FAILED" => ModerationJobStatus::Failed,
            other => ModerationJobStatus::Other(other.to_string()),
        }
    }
}

impl fmt::Display for ModerationJobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single moderation label. `confidence` is a percentage in `0..=100`.
#[derive(Debug, Clone, PartialEq)]
pub struct ModerationDetection {
    pub name: String,
    pub confidence: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModerationJob {
    pub status: ModerationJobStatus,
    pub detections: Vec<ModerationDetection>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptionRequest {
    pub job_name: String,
    pub media_uri: String,
    pub output_bucket: String,
    pub output_key: String,
    pub language_options: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscriptionJobStatus {
    Queued,
    InProgress,
    Completed,
    Failed,
    Other(String),
}

impl TranscriptionJobStatus {
    pub fn as_str(&self) -> &str {
        match self {
            TranscriptionJobStatus::Queued => "QUEUED",
            TranscriptionJobStatus::InProgress => "IN_PROGRESS",
            TranscriptionJobStatus::Completed => "COMPLETED",
            TranscriptionJobStatus::Failed => "FAILED",
            TranscriptionJobStatus::Other(raw) => raw,
        }
    }
}

impl From<&str> for TranscriptionJobStatus {
    fn from(raw: &str) -> Self {
        match raw {
            "QUEUED" => TranscriptionJobStatus::Queued,
            "IN_PROGRESS" => TranscriptionJobStatus::InProgress,
            "COMPLETED" => TranscriptionJobStatus::Completed,
            "FAILED" => TranscriptionJobStatus::Failed,
            other => TranscriptionJobStatus::Other(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptionJobState {
    pub status: TranscriptionJobStatus,
    pub language_code: Option<String>,
    pub identified_language_score: Option<f32>,
    pub failure_reason: Option<String>,
}

/// One toxicity label. `score` is in `0..=1`.
#[derive(Debug, Clone, PartialEq)]
pub struct ToxicContent {
    pub name: String,
    pub score: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SentimentScores {
    pub sentiment: String,
    pub mixed: f32,
    pub negative: f32,
    pub neutral: f32,
    pub positive: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn moderation_status_keeps_unknown_values() {
        assert_eq!(ModerationJobStatus::from("SUCCEEDED"), ModerationJobStatus::Succeeded);
        let other = ModerationJobStatus::from("PARTIAL_SUCCESS");
        assert_eq!(other.as_str(), "PARTIAL_SUCCESS");
        assert!(!other.is_in_progress());
        assert!(ModerationJobStatus::from("IN_PROGRESS").is_in_progress());
    }

    #[test]
    fn transcription_status_parses_service_values() {
        assert_eq!(TranscriptionJobStatus::from("COMPLETED"), TranscriptionJobStatus::Completed);
        assert_eq!(TranscriptionJobStatus::from("QUEUED").as_str(), "QUEUED");
    }
}
