//! Rekognition-specific adapter for asynchronous video content moderation.
//!
//! This file contains the concrete implementation of the `VideoModeration` trait,
//! including result pagination and conversion of Rekognition labels into
//! [`ModerationDetection`]s.

use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_rekognition::{
    types::{ContentModerationDetection, S3Object, Video},
    Client,
};

use crate::{AdapterError, ModerationDetection, ModerationJob, ModerationJobStatus, VideoModeration};

pub struct RekognitionModeration {
    client: Client,
}

impl RekognitionModeration {
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            client: Client::new(config),
        }
    }
}

fn to_detection(raw: &ContentModerationDetection) -> Option<ModerationDetection> {
    let label = raw.moderation_label()?;
    Some(ModerationDetection {
        name: label.name()?.to_string(),
        confidence: label.confidence().unwrap_or_default(),
    })
}

#[async_trait]
impl VideoModeration for RekognitionModeration {
    async fn start_moderation(&self, bucket: &str, key: &str) -> Result<String, AdapterError> {
        let video = Video::builder()
            .s3_object(S3Object::builder().bucket(bucket).name(key).build())
            .build();

        let output = self
            .client
            .start_content_moderation()
            .video(video)
            .send()
            .await
            .map_err(|err| AdapterError::Moderation(format!("Cannot start moderation of {key}: {err}")))?;

        output
            .job_id()
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .ok_or_else(|| AdapterError::Moderation("No JobId returned from Rekognition".to_string()))
    }

    async fn moderation_job(&self, job_id: &str) -> Result<ModerationJob, AdapterError> {
        let mut detections = Vec::new();
        let mut next_token: Option<String> = None;

        loop {
            let output = self
                .client
                .get_content_moderation()
                .job_id(job_id)
                .set_next_token(next_token.take())
                .send()
                .await
                .map_err(|err| AdapterError::Moderation(format!("Cannot read moderation job {job_id}: {err}")))?;

            let status = output
                .job_status()
                .map(|s| ModerationJobStatus::from(s.as_str()))
                .unwrap_or_else(|| ModerationJobStatus::Other("Unknown".to_string()));

            detections.extend(output.moderation_labels().iter().filter_map(to_detection));

            match output.next_token() {
                Some(token) if !token.is_empty() && !status.is_in_progress() => {
                    next_token = Some(token.to_string());
                }
                _ => return Ok(ModerationJob { status, detections }),
            }
        }
    }

    async fn check_connectivity(&self) -> Result<(), AdapterError> {
        self.client
            .list_collections()
            .max_results(1)
            .send()
            .await
            .map_err(|err| AdapterError::Moderation(format!("Rekognition unreachable: {err}")))?;

        Ok(())
    }
}
