//! Speech transcription of uploaded videos and the text checks that follow it.

use std::sync::Arc;

use moderation_adapters::{
    AdapterError, ObjectStorage, Transcription, TranscriptionJobStatus, TranscriptionRequest,
};
use serde::{Deserialize, Serialize};
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{
    bad_words::{BadWordsResult, BadWordsService, FALLBACK_LANGUAGE},
    content_analysis::{ContentAnalysisService, Finding},
};
use crate::{config::PollSettings, errors::AppError};

/// Languages the transcription job may identify.
pub const LANGUAGE_OPTIONS: &[&str] = &["en-US", "es-US", "es-ES", "fr-FR", "fr-CA"];

const DEFAULT_ANALYSIS_LANGUAGE: &str = "en";

const LANGUAGE_CODE_MAPPING: &[(&str, &str)] = &[
    ("en-US", "en"),
    ("es-US", "es"),
    ("es-ES", "es"),
    ("fr-FR", "fr"),
    ("fr-CA", "fr"),
    ("hu-HU", "hu"),
    ("de-DE", "de"),
    ("ro-RO", "ro"),
    ("nl-NL", "nl"),
    ("cs-CZ", "cs"),
    ("sk-SK", "sk"),
    ("da-DK", "da"),
    ("th-TH", "th"),
    ("ms-MY", "ms"),
    ("pt-BR", "pt"),
    ("pt-PT", "pt"),
];

/// Maps a transcription language (`fr-CA`) onto a text-analysis language (`fr`).
pub fn analysis_language(transcribe_code: &str) -> Option<&'static str> {
    LANGUAGE_CODE_MAPPING
        .iter()
        .find(|(code, _)| *code == transcribe_code)
        .map(|(_, mapped)| *mapped)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectedLanguage {
    pub language_code: String,
    pub confidence: f32,
}

#[derive(Debug, Clone)]
pub struct TranscriptionJob {
    pub job_name: String,
    pub transcript_key: String,
}

#[derive(Debug, Clone)]
pub struct TranscriptionResult {
    pub transcript: String,
    pub detected_languages: Vec<DetectedLanguage>,
}

/// Everything learned from the audio track of one video.
#[derive(Debug, Clone)]
pub struct TranscriptAnalysis {
    pub transcript: String,
    pub detected_languages: Vec<DetectedLanguage>,
    pub findings: Vec<Finding>,
    pub bad_words: BadWordsResult,
}

#[derive(Deserialize)]
struct TranscriptDocument {
    results: TranscriptResults,
}

#[derive(Deserialize)]
struct TranscriptResults {
    #[serde(default)]
    transcripts: Vec<TranscriptText>,
}

#[derive(Deserialize)]
struct TranscriptText {
    transcript: String,
}

#[derive(Clone)]
pub struct TranscriptionService {
    transcription: Arc<dyn Transcription>,
    storage: Arc<dyn ObjectStorage>,
    bad_words: BadWordsService,
    content: ContentAnalysisService,
    poll: PollSettings,
}

impl TranscriptionService {
    pub fn new(
        transcription: Arc<dyn Transcription>,
        storage: Arc<dyn ObjectStorage>,
        bad_words: BadWordsService,
        content: ContentAnalysisService,
        poll: PollSettings,
    ) -> Self {
        Self {
            transcription,
            storage,
            bad_words,
            content,
            poll,
        }
    }

    pub async fn start_job(&self, file_key: &str) -> Result<TranscriptionJob, AppError> {
        let bucket = self.storage.bucket_name().to_string();
        let job = TranscriptionJob {
            job_name: format!("transcription-{}", Uuid::new_v4()),
            transcript_key: format!("{file_key}-transcript"),
        };

        let request = TranscriptionRequest {
            job_name: job.job_name.clone(),
            media_uri: format!("s3://{bucket}/{file_key}"),
            output_bucket: bucket,
            output_key: job.transcript_key.clone(),
            language_options: LANGUAGE_OPTIONS.iter().map(|code| code.to_string()).collect(),
        };
        self.transcription.start_transcription(&request).await?;

        info!("Started transcription job {} for {file_key}", job.job_name);
        Ok(job)
    }

    pub async fn wait_for_result(&self, job: &TranscriptionJob) -> Result<TranscriptionResult, AppError> {
        let started = Instant::now();

        loop {
            let state = self.transcription.transcription_job(&job.job_name).await?;
            debug!(
                "Transcription job {} status {} language {:?} score {:?}",
                job.job_name,
                state.status.as_str(),
                state.language_code,
                state.identified_language_score
            );

            match state.status {
                TranscriptionJobStatus::Completed => {
                    sleep(self.poll.transcript_settle).await;
                    let transcript = self.read_transcript(&job.transcript_key).await?;
                    let detected_languages = state
                        .language_code
                        .map(|language_code| DetectedLanguage {
                            language_code,
                            confidence: state.identified_language_score.unwrap_or(1.0),
                        })
                        .into_iter()
                        .collect();

                    return Ok(TranscriptionResult {
                        transcript,
                        detected_languages,
                    });
                }
                TranscriptionJobStatus::Failed => {
                    let reason = state.failure_reason.unwrap_or_else(|| "Unknown reason".to_string());
                    return Err(AdapterError::Transcription(format!("Transcription failed: {reason}")).into());
                }
                _ => {}
            }

            if started.elapsed() >= self.poll.transcription_timeout {
                return Err(AppError::Internal(format!(
                    "Transcription job {} did not finish within {:?}",
                    job.job_name, self.poll.transcription_timeout
                )));
            }
            sleep(self.poll.transcription_interval).await;
        }
    }

    async fn read_transcript(&self, key: &str) -> Result<String, AppError> {
        let body = self.storage.get_object(key).await?;
        let document: TranscriptDocument = serde_json::from_slice(&body)
            .map_err(|err| AppError::Internal(format!("Failed to retrieve transcript: {err}")))?;

        document
            .results
            .transcripts
            .into_iter()
            .next()
            .map(|t| t.transcript)
            .ok_or_else(|| AppError::Internal("No transcript data found".to_string()))
    }

    /// Transcribes the video, then runs the profanity scan and text analysis on the transcript.
    pub async fn process_video(&self, file_key: &str) -> Result<TranscriptAnalysis, AppError> {
        let job = self.start_job(file_key).await?;
        let mut result = self.wait_for_result(&job).await?;

        result
            .detected_languages
            .sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
        let transcribe_language = result.detected_languages.first().map(|l| l.language_code.clone());

        let language = match transcribe_language.as_deref().and_then(analysis_language) {
            Some(language) => language,
            None => {
                warn!(
                    "No text-analysis language for {:?}, defaulting to {DEFAULT_ANALYSIS_LANGUAGE}",
                    transcribe_language
                );
                DEFAULT_ANALYSIS_LANGUAGE
            }
        };
        info!("Analyzing transcript of {file_key} as {language}");

        let bad_words = self
            .bad_words
            .check_transcription(
                transcribe_language.as_deref().unwrap_or(FALLBACK_LANGUAGE),
                &result.transcript,
            )
            .await?;
        let findings = self.content.analyze_mixed_content(&result.transcript, language).await;

        Ok(TranscriptAnalysis {
            transcript: result.transcript,
            detected_languages: result.detected_languages,
            findings,
            bad_words,
        })
    }
}
