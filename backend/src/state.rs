//! Shared application state handed to every handler.

use std::sync::Arc;

use moderation_adapters::{load_sdk_config, AdapterSet};
use tracing::info;

use crate::{
    config::Config,
    database::{self, DocumentStore, StoreError},
    services::{
        bad_words::BadWordsService, content_analysis::ContentAnalysisService, job_cache::JobCache,
        media::MediaStandardizer, moderation::ModerationService, sandbox::SandboxService,
        transcription::TranscriptionService, video_analyzer::VideoAnalyzerService,
    },
};

pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn DocumentStore>,
    pub adapters: AdapterSet,
    pub analyzer: VideoAnalyzerService,
    pub bad_words: BadWordsService,
    pub sandbox: SandboxService,
}

impl AppState {
    pub async fn new(config: Config) -> Result<Arc<Self>, StoreError> {
        config.database.log_selection();
        let store = database::connect(&config.database, &config.database_name, &config.docdb_ca_file).await?;

        let sdk_config = load_sdk_config(config.aws_region.clone()).await;
        let adapters = AdapterSet::from_sdk_config(&sdk_config, config.s3_bucket_name.clone());

        info!("Using {} storage and bucket {}", store.kind().as_str(), config.s3_bucket_name);
        Ok(Self::from_parts(config, store, adapters))
    }

    /// Wires the services on top of an already connected store and adapter set.
    pub fn from_parts(config: Config, store: Arc<dyn DocumentStore>, adapters: AdapterSet) -> Arc<Self> {
        let bad_words = BadWordsService::new(store.clone());
        let content = ContentAnalysisService::new(adapters.text.clone(), config.aws_region.clone());
        let transcription = TranscriptionService::new(
            adapters.transcription.clone(),
            adapters.storage.clone(),
            bad_words.clone(),
            content,
            config.poll.clone(),
        );
        let media = MediaStandardizer::new(
            adapters.storage.clone(),
            config.media_work_dir.clone(),
            config.ffmpeg_path.clone(),
        );
        let analyzer = VideoAnalyzerService::new(
            adapters.storage.clone(),
            media,
            ModerationService::new(adapters.moderation.clone(), config.poll.clone()),
            transcription,
            Arc::new(JobCache::new(config.job_ttl)),
            config.upload.clone(),
            config.toxicity_threshold,
        );

        Arc::new(Self {
            sandbox: SandboxService::new(store.clone()),
            bad_words,
            analyzer,
            adapters,
            store,
            config,
        })
    }
}
