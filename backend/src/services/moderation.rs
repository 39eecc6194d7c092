//! Video moderation jobs: start, poll until settled, and turn detections into labels.

use std::{sync::Arc, time::Duration};

use moderation_adapters::{ModerationDetection, ModerationJobStatus, VideoModeration};
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use super::content_analysis::{determine_severity, ToxicLabel};
use crate::{config::PollSettings, errors::AppError};

#[derive(Debug, Clone)]
pub struct ModerationOutcome {
    pub job_id: String,
    pub status: ModerationJobStatus,
    pub labels: Vec<ToxicLabel>,
}

#[derive(Debug, Clone)]
pub struct ModerationProgress {
    pub status: ModerationJobStatus,
    pub labels: Vec<ToxicLabel>,
}

#[derive(Clone)]
pub struct ModerationService {
    moderation: Arc<dyn VideoModeration>,
    poll: PollSettings,
}

fn to_label(detection: ModerationDetection) -> ToxicLabel {
    let score = detection.confidence / 100.0;
    ToxicLabel {
        details: Some(format!(
            "AWS Rekognition detected {} with {:.1}% confidence",
            detection.name, detection.confidence
        )),
        name: detection.name,
        score,
        severity: determine_severity(score),
    }
}

impl ModerationService {
    pub fn new(moderation: Arc<dyn VideoModeration>, poll: PollSettings) -> Self {
        Self { moderation, poll }
    }

    /// Wait before re-poll number `attempt` (counted from 1). The interval steps up
    /// by one base interval every ten attempts, up to the cap.
    fn backoff(&self, attempt: u32) -> Duration {
        let scaled = self.poll.moderation_interval * (1 + attempt / 10);
        scaled.min(self.poll.moderation_max_interval)
    }

    fn max_attempts(&self) -> u32 {
        let interval = self.poll.moderation_interval.as_millis().max(1);
        (self.poll.moderation_timeout.as_millis() / interval) as u32
    }

    pub async fn start_and_wait(&self, bucket: &str, key: &str) -> Result<ModerationOutcome, AppError> {
        let job_id = self.moderation.start_moderation(bucket, key).await?;
        info!("Started moderation job {job_id} for {key}");

        let started = Instant::now();
        let max_attempts = self.max_attempts();
        let mut attempts = 0;
        let mut job = self.moderation.moderation_job(&job_id).await?;

        while job.status.is_in_progress() {
            if attempts >= max_attempts || started.elapsed() >= self.poll.moderation_timeout {
                warn!("Moderation job {job_id} still running after {attempts} polls, returning partial results");
                break;
            }

            attempts += 1;
            let wait = self.backoff(attempts);
            debug!("Moderation job {job_id} in progress, polling again in {wait:?}");
            sleep(wait).await;

            job = self.moderation.moderation_job(&job_id).await?;
        }

        let mut labels: Vec<ToxicLabel> = job.detections.into_iter().map(to_label).collect();
        if labels.is_empty() {
            labels.push(ToxicLabel::content_check("No content concerns detected"));
        }

        info!("Moderation job {job_id} finished polling with status {}", job.status);
        Ok(ModerationOutcome {
            job_id,
            status: job.status,
            labels,
        })
    }

    pub async fn progress(&self, job_id: &str) -> Result<ModerationProgress, AppError> {
        let job = self.moderation.moderation_job(job_id).await?;
        Ok(ModerationProgress {
            status: job.status,
            labels: job.detections.into_iter().map(to_label).collect(),
        })
    }
}
