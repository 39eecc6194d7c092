//! Transcribe-specific adapter for batch speech transcription.
//!
//! Jobs identify the spoken language among the requested options and write the
//! transcript JSON back into the upload bucket; reading that file is the object
//! storage adapter's job.

use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_transcribe::{
    types::{LanguageCode, Media, Settings, VocabularyFilterMethod},
    Client,
};

use crate::{
    AdapterError, Transcription, TranscriptionJobState, TranscriptionJobStatus, TranscriptionRequest,
};

const CONNECTIVITY_JOB_NAME: &str = "__connectivity_check__";

pub struct TranscribeService {
    client: Client,
}

impl TranscribeService {
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            client: Client::new(config),
        }
    }
}

#[async_trait]
impl Transcription for TranscribeService {
    async fn start_transcription(&self, request: &TranscriptionRequest) -> Result<(), AdapterError> {
        let language_options = request
            .language_options
            .iter()
            .map(|code| LanguageCode::from(code.as_str()))
            .collect::<Vec<_>>();

        let settings = Settings::builder()
            .show_speaker_labels(true)
            .max_speaker_labels(2)
            .show_alternatives(true)
            .max_alternatives(4)
            .vocabulary_filter_method(VocabularyFilterMethod::Mask)
            .build();

        log::info!(
            "Starting transcription job {} for {} (languages: {})",
            request.job_name,
            request.media_uri,
            request.language_options.join(", ")
        );

        self.client
            .start_transcription_job()
            .transcription_job_name(&request.job_name)
            .identify_language(true)
            .set_language_options(Some(language_options))
            .settings(settings)
            .media(Media::builder().media_file_uri(&request.media_uri).build())
            .output_bucket_name(&request.output_bucket)
            .output_key(&request.output_key)
            .send()
            .await
            .map_err(|err| {
                AdapterError::Transcription(format!("Cannot start job {}: {err}", request.job_name))
            })?;

        Ok(())
    }

    async fn transcription_job(&self, job_name: &str) -> Result<TranscriptionJobState, AdapterError> {
        let output = self
            .client
            .get_transcription_job()
            .transcription_job_name(job_name)
            .send()
            .await
            .map_err(|err| AdapterError::Transcription(format!("Cannot read job {job_name}: {err}")))?;

        let job = output
            .transcription_job()
            .ok_or_else(|| AdapterError::NotFound(format!("transcription job {job_name}")))?;

        Ok(TranscriptionJobState {
            status: job
                .transcription_job_status()
                .map(|s| TranscriptionJobStatus::from(s.as_str()))
                .unwrap_or(TranscriptionJobStatus::Queued),
            language_code: job.language_code().map(|code| code.as_str().to_string()),
            identified_language_score: job.identified_language_score(),
            failure_reason: job.failure_reason().map(str::to_string),
        })
    }

    async fn check_connectivity(&self) -> Result<(), AdapterError> {
        match self
            .client
            .get_transcription_job()
            .transcription_job_name(CONNECTIVITY_JOB_NAME)
            .send()
            .await
        {
            Ok(_) => Ok(()),
            // An unknown job is reported as a bad request, which proves the service answered.
            Err(err) if err.as_service_error().map(|e| e.is_bad_request_exception()).unwrap_or(false) => Ok(()),
            Err(err) => Err(AdapterError::Transcription(format!("Transcribe unreachable: {err}"))),
        }
    }
}
