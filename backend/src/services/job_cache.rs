//! Process-local cache of analysis jobs keyed by moderation job id.
//!
//! Entries hold the background transcription results until the client polls
//! for them. While moderation is still running, the file key is held as a
//! reservation so a second analysis of the same file is refused. Entries and
//! reservations expire after a fixed time-to-live; the server runs
//! [`JobCache::purge_expired`] periodically.

use std::{collections::HashMap, time::Duration};

use serde::Serialize;
use tokio::{sync::RwLock, time::Instant};
use tracing::debug;

use super::{bad_words::BadWordsResult, content_analysis::Finding, transcription::DetectedLanguage};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    InProgress,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::InProgress => "IN_PROGRESS",
            JobStatus::Completed => "COMPLETED",
            JobStatus::Failed => "FAILED",
        }
    }
}

/// How far the background transcription and text analysis got.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Transcribing,
    Analyzed,
    Failed,
}

#[derive(Debug, Clone)]
pub struct JobResult {
    pub transcript: String,
    pub detected_languages: Vec<DetectedLanguage>,
    pub toxic_labels: Vec<Finding>,
    pub bad_words: BadWordsResult,
    pub job_status: JobStatus,
    pub error: Option<String>,
}

impl JobResult {
    pub fn pending() -> Self {
        Self {
            transcript: String::new(),
            detected_languages: Vec::new(),
            toxic_labels: Vec::new(),
            bad_words: BadWordsResult::in_progress(),
            job_status: JobStatus::InProgress,
            error: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CachedJob {
    pub file_key: String,
    pub stage: Stage,
    pub result: JobResult,
    created: Instant,
}

#[derive(Default)]
struct Entries {
    jobs: HashMap<String, CachedJob>,
    /// File keys claimed by an analysis that has no moderation job id yet.
    reservations: HashMap<String, Instant>,
}

pub struct JobCache {
    entries: RwLock<Entries>,
    ttl: Duration,
}

impl JobCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(Entries::default()),
            ttl,
        }
    }

    fn is_live(&self, created: Instant) -> bool {
        created.elapsed() < self.ttl
    }

    fn busy(&self, entries: &Entries, file_key: &str) -> bool {
        let reserved = entries
            .reservations
            .get(file_key)
            .is_some_and(|created| self.is_live(*created));
        reserved
            || entries.jobs.values().any(|job| {
                job.file_key == file_key && job.result.job_status == JobStatus::InProgress && self.is_live(job.created)
            })
    }

    pub async fn has_job_in_progress(&self, file_key: &str) -> bool {
        self.busy(&*self.entries.read().await, file_key)
    }

    /// Claims `file_key` for a new analysis. Returns false when another
    /// analysis of the same file holds a reservation or a live in-progress job.
    pub async fn try_reserve(&self, file_key: &str) -> bool {
        let mut entries = self.entries.write().await;
        if self.busy(&entries, file_key) {
            return false;
        }
        entries.reservations.insert(file_key.to_string(), Instant::now());
        true
    }

    pub async fn release(&self, file_key: &str) {
        self.entries.write().await.reservations.remove(file_key);
    }

    /// Caches a pending job, replacing any reservation held for its file.
    pub async fn insert_pending(&self, job_id: &str, file_key: &str) {
        let job = CachedJob {
            file_key: file_key.to_string(),
            stage: Stage::Transcribing,
            result: JobResult::pending(),
            created: Instant::now(),
        };
        let mut entries = self.entries.write().await;
        entries.reservations.remove(file_key);
        entries.jobs.insert(job_id.to_string(), job);
    }

    pub async fn get(&self, job_id: &str) -> Option<CachedJob> {
        self.entries
            .read()
            .await
            .jobs
            .get(job_id)
            .filter(|job| self.is_live(job.created))
            .cloned()
    }

    /// Stores the final result. Returns false when the entry has already expired.
    pub async fn finish(&self, job_id: &str, stage: Stage, result: JobResult) -> bool {
        match self.entries.write().await.jobs.get_mut(job_id) {
            Some(job) => {
                job.stage = stage;
                job.result = result;
                true
            }
            None => false,
        }
    }

    pub async fn purge_expired(&self) -> usize {
        let mut entries = self.entries.write().await;
        let before = entries.jobs.len();
        entries.jobs.retain(|_, job| job.created.elapsed() < self.ttl);
        entries.reservations.retain(|_, created| created.elapsed() < self.ttl);

        let purged = before - entries.jobs.len();
        if purged > 0 {
            debug!("Purged {purged} expired analysis jobs");
        }
        purged
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.jobs.len()
    }
}
