//! Orchestrates a full video analysis.
//!
//! The moderation job runs in the request, transcription and text analysis run
//! in a background task, and clients poll [`VideoAnalyzerService::check_moderation_progress`]
//! for the combined report.

use std::sync::Arc;

use moderation_adapters::{ModerationJobStatus, ObjectStorage};
use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{error, info};

use super::{
    bad_words::{confirm_matches, BadWordsResult},
    content_analysis::{Finding, ToxicLabel},
    job_cache::{JobCache, JobResult, JobStatus, Stage},
    media::MediaStandardizer,
    moderation::{ModerationOutcome, ModerationService},
    transcription::{DetectedLanguage, TranscriptAnalysis, TranscriptionService},
};
use crate::{config::UploadPolicy, errors::AppError, utils::file::is_under_size_limit};

const PENDING: &str = "PENDING";
const MODERATION_IN_PROGRESS_TRANSCRIPT: &str = "Video moderation still in progress";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisProgress {
    pub rekognition_status: String,
    pub transcription_status: String,
    pub comprehend_status: String,
    pub job_status: JobStatus,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    pub job_id: String,
    pub file_key: String,
    pub moderation_labels: Vec<ToxicLabel>,
    pub transcript: String,
    pub detected_languages: Vec<DetectedLanguage>,
    pub toxic_labels: Vec<Finding>,
    pub transcript_bad_words_result: BadWordsResult,
    pub progress: AnalysisProgress,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Clone)]
pub struct VideoAnalyzerService {
    storage: Arc<dyn ObjectStorage>,
    media: MediaStandardizer,
    moderation: ModerationService,
    transcription: TranscriptionService,
    jobs: Arc<JobCache>,
    upload: UploadPolicy,
    toxicity_threshold: f32,
}

/// Folds the background transcript analysis into the cached job result.
///
/// Confirmed bad words fail the job outright. Otherwise the job fails when the
/// highest toxicity score across moderation and transcript labels exceeds
/// `threshold`.
pub fn summarize(moderation_labels: &[ToxicLabel], analysis: TranscriptAnalysis, threshold: f32) -> JobResult {
    let confirmed = confirm_matches(&analysis.transcript, &analysis.bad_words.detected_bad_words);

    let (toxic, sentiment): (Vec<Finding>, Vec<Finding>) = analysis
        .findings
        .into_iter()
        .partition(|finding| finding.as_toxic().is_some());

    let mut toxic_labels: Vec<Finding> = moderation_labels.iter().cloned().map(Finding::Toxic).collect();
    toxic_labels.extend(toxic);

    let max_score = toxic_labels
        .iter()
        .filter_map(Finding::as_toxic)
        .map(|label| label.score)
        .fold(0.0_f32, f32::max);

    let job_status = if !confirmed.is_empty() || max_score > threshold {
        JobStatus::Failed
    } else {
        JobStatus::Completed
    };

    toxic_labels.extend(sentiment);

    JobResult {
        transcript: analysis.transcript,
        detected_languages: analysis.detected_languages,
        toxic_labels,
        bad_words: BadWordsResult::from_matches(confirmed),
        job_status,
        error: None,
    }
}

impl VideoAnalyzerService {
    pub fn new(
        storage: Arc<dyn ObjectStorage>,
        media: MediaStandardizer,
        moderation: ModerationService,
        transcription: TranscriptionService,
        jobs: Arc<JobCache>,
        upload: UploadPolicy,
        toxicity_threshold: f32,
    ) -> Self {
        Self {
            storage,
            media,
            moderation,
            transcription,
            jobs,
            upload,
            toxicity_threshold,
        }
    }

    pub fn jobs(&self) -> &Arc<JobCache> {
        &self.jobs
    }

    pub async fn generate_signed_url(&self, file_key: &str, content_type: &str, file_size: u64) -> Result<String, AppError> {
        if !content_type.starts_with("video/") {
            return Err(AppError::BadRequest(format!(
                "Invalid file type for {file_key}. Expected a video file, got {content_type}."
            )));
        }
        if !is_under_size_limit(file_size, self.upload.max_size_bytes) {
            return Err(AppError::BadRequest(format!(
                "File {file_key} exceeds max size of {}MB.",
                self.upload.max_size_bytes / (1024 * 1024)
            )));
        }

        Ok(self
            .storage
            .presign_upload(file_key, content_type, self.upload.url_expiry)
            .await?)
    }

    pub async fn delete_file(&self, file_key: &str) -> Result<(), AppError> {
        self.storage.delete_object(file_key).await?;
        info!("Deleted {file_key}");
        Ok(())
    }

    pub async fn analyze_video(&self, file_key: &str) -> Result<AnalysisReport, AppError> {
        let (report, _background) = self.start_analysis(file_key).await?;
        Ok(report)
    }

    /// Runs moderation, caches the job and spawns the transcript analysis.
    pub(crate) async fn start_analysis(&self, file_key: &str) -> Result<(AnalysisReport, JoinHandle<()>), AppError> {
        if !self.jobs.try_reserve(file_key).await {
            return Err(AppError::Conflict("A job for this file is already in progress.".to_string()));
        }

        let outcome = match self.moderate(file_key).await {
            Ok(outcome) => outcome,
            Err(err) => {
                self.jobs.release(file_key).await;
                return Err(err);
            }
        };
        self.jobs.insert_pending(&outcome.job_id, file_key).await;

        let background = tokio::spawn({
            let service = self.clone();
            let job_id = outcome.job_id.clone();
            let file_key = file_key.to_string();
            let labels = outcome.labels.clone();
            async move { service.complete_analysis(&job_id, &file_key, &labels).await }
        });

        let report = AnalysisReport {
            job_id: outcome.job_id,
            file_key: file_key.to_string(),
            moderation_labels: outcome.labels,
            transcript: String::new(),
            detected_languages: Vec::new(),
            toxic_labels: Vec::new(),
            transcript_bad_words_result: BadWordsResult::in_progress(),
            progress: AnalysisProgress {
                rekognition_status: ModerationJobStatus::InProgress.to_string(),
                transcription_status: PENDING.to_string(),
                comprehend_status: PENDING.to_string(),
                job_status: JobStatus::InProgress,
            },
            error: None,
        };
        Ok((report, background))
    }

    async fn moderate(&self, file_key: &str) -> Result<ModerationOutcome, AppError> {
        let copy = self.media.create_moderation_version(file_key).await?;
        let moderated = self
            .moderation
            .start_and_wait(self.storage.bucket_name(), &copy.file_key)
            .await;
        if let Some(task_id) = &copy.task_id {
            self.media.cleanup(task_id).await;
        }
        moderated
    }

    async fn complete_analysis(&self, job_id: &str, file_key: &str, moderation_labels: &[ToxicLabel]) {
        let (stage, result) = match self.transcription.process_video(file_key).await {
            Ok(analysis) => {
                let result = summarize(moderation_labels, analysis, self.toxicity_threshold);
                info!(
                    "Background analysis of {file_key} finished with {} ({})",
                    result.job_status.as_str(),
                    result.bad_words.status
                );
                (Stage::Analyzed, result)
            }
            Err(err) => {
                error!("Error processing background transcription for {file_key}: {err}");
                let mut result = JobResult::pending();
                result.job_status = JobStatus::Failed;
                result.error = Some(err.to_string());
                (Stage::Failed, result)
            }
        };

        if !self.jobs.finish(job_id, stage, result).await {
            info!("Analysis job {job_id} expired before its results were stored");
        }
    }

    pub async fn check_moderation_progress(&self, job_id: &str) -> Result<AnalysisReport, AppError> {
        let job = self
            .jobs
            .get(job_id)
            .await
            .ok_or_else(|| AppError::NotFound("Job not found for moderation".to_string()))?;
        let moderation = self.moderation.progress(job_id).await?;

        let (transcription_status, comprehend_status) = match job.stage {
            Stage::Transcribing => (JobStatus::InProgress.as_str(), PENDING),
            Stage::Analyzed => (JobStatus::Completed.as_str(), JobStatus::Completed.as_str()),
            Stage::Failed => (JobStatus::Failed.as_str(), JobStatus::Failed.as_str()),
        };

        let transcript = if moderation.status == ModerationJobStatus::Succeeded {
            job.result.transcript
        } else {
            MODERATION_IN_PROGRESS_TRANSCRIPT.to_string()
        };

        Ok(AnalysisReport {
            job_id: job_id.to_string(),
            file_key: job.file_key,
            moderation_labels: moderation.labels,
            transcript,
            detected_languages: job.result.detected_languages,
            toxic_labels: job.result.toxic_labels,
            transcript_bad_words_result: job.result.bad_words,
            progress: AnalysisProgress {
                rekognition_status: moderation.status.to_string(),
                transcription_status: transcription_status.to_string(),
                comprehend_status: comprehend_status.to_string(),
                job_status: job.result.job_status,
            },
            error: job.result.error,
        })
    }
}
