//! Custom error types specific to the `adapters` crate.
//!
//! This module defines errors that can occur while talking to the object store,
//! the moderation, transcription and text-analysis services, providing a unified
//! error type for every adapter call.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AdapterError {
    #[error("Object storage error: {0}")]
    Storage(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Video moderation error: {0}")]
    Moderation(String),

    #[error("Transcription error: {0}")]
    Transcription(String),

    #[error("Text analysis error: {0}")]
    TextAnalysis(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
