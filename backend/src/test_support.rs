//! In-process fakes for the external service adapters, shared by the unit tests.

use std::{
    collections::{BTreeMap, HashMap, VecDeque},
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use async_trait::async_trait;
use moderation_adapters::{
    AdapterError, AdapterSet, ModerationJob, ObjectMetadata, ObjectStorage, SentimentScores, TextAnalysis,
    ToxicContent, Transcription, TranscriptionJobState, TranscriptionJobStatus, TranscriptionRequest,
    VideoModeration,
};

use tempfile::TempDir;

use crate::{
    config::{Config, DatabaseKind},
    database::{memory::InMemoryStore, Document, DocumentStore, FindOptions, StoreError},
    state::AppState,
};

pub const TEST_BUCKET: &str = "test-bucket";

pub struct FakeStorage {
    objects: Mutex<BTreeMap<String, (Vec<u8>, String)>>,
    metadata: Mutex<HashMap<String, ObjectMetadata>>,
    reachable: AtomicBool,
}

impl Default for FakeStorage {
    fn default() -> Self {
        Self {
            objects: Mutex::new(BTreeMap::new()),
            metadata: Mutex::new(HashMap::new()),
            reachable: AtomicBool::new(true),
        }
    }
}

impl FakeStorage {
    pub fn insert(&self, key: &str, body: Vec<u8>, content_type: &str) {
        self.objects
            .lock()
            .unwrap()
            .insert(key.to_string(), (body, content_type.to_string()));
    }

    /// Overrides what `head_object` reports for `key`, whether or not it is stored.
    pub fn set_metadata(&self, key: &str, metadata: ObjectMetadata) {
        self.metadata.lock().unwrap().insert(key.to_string(), metadata);
    }

    pub fn keys(&self) -> Vec<String> {
        self.objects.lock().unwrap().keys().cloned().collect()
    }

    pub fn set_reachable(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::SeqCst);
    }
}

#[async_trait]
impl ObjectStorage for FakeStorage {
    fn bucket_name(&self) -> &str {
        TEST_BUCKET
    }

    async fn presign_upload(
        &self,
        key: &str,
        _content_type: &str,
        expires_in: Duration,
    ) -> Result<String, AdapterError> {
        Ok(format!(
            "https://{TEST_BUCKET}.s3.test/{key}?X-Amz-Expires={}",
            expires_in.as_secs()
        ))
    }

    async fn delete_object(&self, key: &str) -> Result<(), AdapterError> {
        self.objects.lock().unwrap().remove(key);
        self.metadata.lock().unwrap().remove(key);
        Ok(())
    }

    async fn head_object(&self, key: &str) -> Result<ObjectMetadata, AdapterError> {
        if let Some(metadata) = self.metadata.lock().unwrap().get(key) {
            return Ok(metadata.clone());
        }
        self.objects
            .lock()
            .unwrap()
            .get(key)
            .map(|(body, content_type)| ObjectMetadata {
                content_type: Some(content_type.clone()),
                content_length: Some(body.len() as i64),
            })
            .ok_or_else(|| AdapterError::NotFound(key.to_string()))
    }

    async fn get_object(&self, key: &str) -> Result<Vec<u8>, AdapterError> {
        self.objects
            .lock()
            .unwrap()
            .get(key)
            .map(|(body, _)| body.clone())
            .ok_or_else(|| AdapterError::NotFound(key.to_string()))
    }

    async fn put_object(&self, key: &str, body: Vec<u8>, content_type: &str) -> Result<(), AdapterError> {
        self.insert(key, body, content_type);
        Ok(())
    }

    async fn check_connectivity(&self) -> Result<(), AdapterError> {
        if self.reachable.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(AdapterError::Storage("bucket unreachable".into()))
        }
    }
}

/// Replays scripted job states. The last state repeats once the script runs dry.
#[derive(Default)]
pub struct FakeModeration {
    jobs: Mutex<VecDeque<ModerationJob>>,
    start_error: Mutex<Option<AdapterError>>,
    starts: AtomicUsize,
    polls: AtomicUsize,
}

impl FakeModeration {
    pub fn scripted(jobs: Vec<ModerationJob>) -> Self {
        Self {
            jobs: Mutex::new(jobs.into()),
            ..Self::default()
        }
    }

    pub fn failing_start(err: AdapterError) -> Self {
        Self {
            start_error: Mutex::new(Some(err)),
            ..Self::default()
        }
    }

    pub fn push(&self, job: ModerationJob) {
        self.jobs.lock().unwrap().push_back(job);
    }

    pub fn start_count(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    pub fn poll_count(&self) -> usize {
        self.polls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VideoModeration for FakeModeration {
    async fn start_moderation(&self, _bucket: &str, _key: &str) -> Result<String, AdapterError> {
        self.starts.fetch_add(1, Ordering::SeqCst);
        match self.start_error.lock().unwrap().take() {
            Some(err) => Err(err),
            None => Ok("job-1".to_string()),
        }
    }

    async fn moderation_job(&self, job_id: &str) -> Result<ModerationJob, AdapterError> {
        self.polls.fetch_add(1, Ordering::SeqCst);
        next_scripted(&self.jobs).ok_or_else(|| AdapterError::NotFound(job_id.to_string()))
    }

    async fn check_connectivity(&self) -> Result<(), AdapterError> {
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeTranscription {
    states: Mutex<VecDeque<TranscriptionJobState>>,
    requests: Mutex<Vec<TranscriptionRequest>>,
}

impl FakeTranscription {
    pub fn scripted(states: Vec<TranscriptionJobState>) -> Self {
        Self {
            states: Mutex::new(states.into()),
            ..Self::default()
        }
    }

    pub fn last_request(&self) -> Option<TranscriptionRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl Transcription for FakeTranscription {
    async fn start_transcription(&self, request: &TranscriptionRequest) -> Result<(), AdapterError> {
        self.requests.lock().unwrap().push(request.clone());
        Ok(())
    }

    async fn transcription_job(&self, _job_name: &str) -> Result<TranscriptionJobState, AdapterError> {
        Ok(next_scripted(&self.states).unwrap_or(TranscriptionJobState {
            status: TranscriptionJobStatus::InProgress,
            language_code: None,
            identified_language_score: None,
            failure_reason: None,
        }))
    }

    async fn check_connectivity(&self) -> Result<(), AdapterError> {
        Ok(())
    }
}

fn next_scripted<T: Clone>(script: &Mutex<VecDeque<T>>) -> Option<T> {
    let mut script = script.lock().unwrap();
    if script.len() > 1 {
        script.pop_front()
    } else {
        script.front().cloned()
    }
}

#[derive(Default)]
pub struct FakeTextAnalysis {
    toxicity: Vec<ToxicContent>,
    failing: bool,
    toxicity_calls: AtomicUsize,
}

impl FakeTextAnalysis {
    pub fn with_toxicity(labels: &[(&str, f32)]) -> Self {
        Self {
            toxicity: labels
                .iter()
                .map(|(name, score)| ToxicContent {
                    name: name.to_string(),
                    score: *score,
                })
                .collect(),
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn toxicity_calls(&self) -> usize {
        self.toxicity_calls.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<(), AdapterError> {
        if self.failing {
            return Err(AdapterError::TextAnalysis("throttled".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl TextAnalysis for FakeTextAnalysis {
    async fn detect_toxic_content(&self, _text: &str, _language_code: &str) -> Result<Vec<ToxicContent>, AdapterError> {
        self.toxicity_calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(self.toxicity.clone())
    }

    async fn detect_sentiment(&self, _text: &str, _language_code: &str) -> Result<SentimentScores, AdapterError> {
        self.check()?;
        Ok(SentimentScores {
            sentiment: "NEUTRAL".into(),
            mixed: 0.0,
            negative: 0.05,
            neutral: 0.9,
            positive: 0.05,
        })
    }

    async fn check_connectivity(&self) -> Result<(), AdapterError> {
        self.check()
    }
}

/// Concrete handles to the fakes behind an [`AdapterSet`].
pub struct FakeAdapters {
    pub storage: Arc<FakeStorage>,
    pub moderation: Arc<FakeModeration>,
    pub transcription: Arc<FakeTranscription>,
    pub text: Arc<FakeTextAnalysis>,
}

impl FakeAdapters {
    pub fn set(&self) -> AdapterSet {
        AdapterSet {
            storage: self.storage.clone(),
            moderation: self.moderation.clone(),
            transcription: self.transcription.clone(),
            text: self.text.clone(),
        }
    }
}

pub fn fake_adapters() -> FakeAdapters {
    FakeAdapters {
        storage: Arc::new(FakeStorage::default()),
        moderation: Arc::new(FakeModeration::default()),
        transcription: Arc::new(FakeTranscription::default()),
        text: Arc::new(FakeTextAnalysis::default()),
    }
}

pub const TEST_API_SECRET: &str = "test-secret";

/// Application state over fake adapters. The scratch directory lives as long as the app.
pub struct TestApp {
    pub state: Arc<AppState>,
    _scratch: TempDir,
}

pub fn test_app(fakes: &FakeAdapters) -> TestApp {
    test_app_with_store(fakes, Arc::new(InMemoryStore::new()))
}

pub fn test_app_with_store(fakes: &FakeAdapters, store: Arc<dyn DocumentStore>) -> TestApp {
    let scratch = tempfile::tempdir().unwrap();
    let mut config = Config::from_lookup(|_| None).unwrap();
    config.api_key_secret = TEST_API_SECRET.to_string();
    config.media_work_dir = scratch.path().to_path_buf();
    TestApp {
        state: AppState::from_parts(config, store, fakes.set()),
        _scratch: scratch,
    }
}

/// In-memory documents reported as a document database, for kind-dependent behavior.
#[derive(Default)]
pub struct DocumentDbLikeStore {
    inner: InMemoryStore,
}

#[async_trait]
impl DocumentStore for DocumentDbLikeStore {
    fn kind(&self) -> DatabaseKind {
        DatabaseKind::DocumentDb
    }

    async fn insert(&self, collection: &str, fields: Document) -> Result<Document, StoreError> {
        self.inner.insert(collection, fields).await
    }

    async fn find(
        &self,
        collection: &str,
        filter: &Document,
        options: &FindOptions,
    ) -> Result<Vec<Document>, StoreError> {
        self.inner.find(collection, filter, options).await
    }

    async fn find_one(&self, collection: &str, filter: &Document) -> Result<Option<Document>, StoreError> {
        self.inner.find_one(collection, filter).await
    }

    async fn find_by_id(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        self.inner.find_by_id(collection, id).await
    }

    async fn update_by_id(
        &self,
        collection: &str,
        id: &str,
        fields: Document,
    ) -> Result<Option<Document>, StoreError> {
        self.inner.update_by_id(collection, id, fields).await
    }

    async fn upsert_one(
        &self,
        collection: &str,
        filter: &Document,
        fields: Document,
    ) -> Result<Document, StoreError> {
        self.inner.upsert_one(collection, filter, fields).await
    }

    async fn delete_by_id(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        self.inner.delete_by_id(collection, id).await
    }

    async fn count(&self, collection: &str, filter: &Document) -> Result<u64, StoreError> {
        self.inner.count(collection, filter).await
    }

    async fn clear(&self) -> Result<(), StoreError> {
        Err(StoreError::Unsupported("clear"))
    }
}
