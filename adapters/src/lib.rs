//! Core `adapters` crate for abstracting the managed cloud services used by the
//! moderation backend.
//!
//! This crate defines one trait per external collaborator (`ObjectStorage`,
//! `VideoModeration`, `Transcription`, `TextAnalysis`) and provides the concrete
//! AWS implementations (S3, Rekognition, Transcribe, Comprehend). The backend only
//! depends on the traits, so every service can be swapped for a fake in tests.

pub mod comprehend;
pub mod errors;
pub mod models;
pub mod rekognition;
pub mod s3;
pub mod transcribe;

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region, SdkConfig};

pub use errors::AdapterError;
pub use models::*;

#[async_trait]
pub trait ObjectStorage: Send + Sync {
    fn bucket_name(&self) -> &str;

    /// Returns a URL the client can `PUT` the object to until `expires_in` elapses.
    async fn presign_upload(
        &self,
        key: &str,
        content_type: &str,
        expires_in: Duration,
    ) -> Result<String, AdapterError>;

    async fn delete_object(&self, key: &str) -> Result<(), AdapterError>;

    async fn head_object(&self, key: &str) -> Result<ObjectMetadata, AdapterError>;

    async fn get_object(&self, key: &str) -> Result<Vec<u8>, AdapterError>;

    async fn put_object(
        &self,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<(), AdapterError>;

    async fn check_connectivity(&self) -> Result<(), AdapterError>;
}

#[async_trait]
pub trait VideoModeration: Send + Sync {
    /// Starts an asynchronous moderation job and returns its id.
    async fn start_moderation(&self, bucket: &str, key: &str) -> Result<String, AdapterError>;

    async fn moderation_job(&self, job_id: &str) -> Result<ModerationJob, AdapterError>;

    async fn check_connectivity(&self) -> Result<(), AdapterError>;
}

#[async_trait]
pub trait Transcription: Send + Sync {
    async fn start_transcription(&self, request: &TranscriptionRequest) -> Result<(), AdapterError>;

    async fn transcription_job(&self, job_name: &str) -> Result<TranscriptionJobState, AdapterError>;

    async fn check_connectivity(&self) -> Result<(), AdapterError>;
}

#[async_trait]
pub trait TextAnalysis: Send + Sync {
    async fn detect_toxic_content(
        &self,
        text: &str,
        language_code: &str,
    ) -> Result<Vec<ToxicContent>, AdapterError>;

    async fn detect_sentiment(
        &self,
        text: &str,
        language_code: &str,
    ) -> Result<SentimentScores, AdapterError>;

    async fn check_connectivity(&self) -> Result<(), AdapterError>;
}

/// One handle per external service, shared by all backend services.
#[derive(Clone)]
pub struct AdapterSet {
    pub storage: Arc<dyn ObjectStorage>,
    pub moderation: Arc<dyn VideoModeration>,
    pub transcription: Arc<dyn Transcription>,
    pub text: Arc<dyn TextAnalysis>,
}

impl AdapterSet {
    pub fn from_sdk_config(config: &SdkConfig, bucket_name: impl Into<String>) -> Self {
        Self {
            storage: Arc::new(s3::S3Storage::new(config, bucket_name)),
            moderation: Arc::new(rekognition::RekognitionModeration::new(config)),
            transcription: Arc::new(transcribe::TranscribeService::new(config)),
            text: Arc::new(comprehend::ComprehendAnalysis::new(config)),
        }
    }
}

/// Loads the shared AWS configuration from the default provider chain
/// (environment, profile, container or instance role).
pub async fn load_sdk_config(region: Option<String>) -> SdkConfig {
    let mut loader = aws_config::defaults(BehaviorVersion::latest());
    if let Some(region) = region {
        loader = loader.region(Region::new(region));
    }

    let config = loader.load().await;
    log::info!(
        "Loaded AWS configuration for region {}",
        config.region().map(|r| r.as_ref()).unwrap_or("<unset>")
    );
    config
}
