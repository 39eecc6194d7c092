//! Profanity lists per transcription language and the transcript scan against them.

use std::sync::Arc;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::{
    database::{
        models::BadWords,
        queries::{Record, Repository},
        Document, DocumentStore,
    },
    errors::AppError,
};

pub const STATUS_IN_PROGRESS: &str = "IN_PROGRESS";
pub const STATUS_CLEAN: &str = "No bad words found";
pub const STATUS_DETECTED: &str = "One or more bad words detected";

pub const FALLBACK_LANGUAGE: &str = "en-US";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BadWordsResult {
    pub status: String,
    pub detected_bad_words: Vec<String>,
}

impl BadWordsResult {
    pub fn in_progress() -> Self {
        Self {
            status: STATUS_IN_PROGRESS.to_string(),
            detected_bad_words: Vec::new(),
        }
    }

    pub fn from_matches(detected_bad_words: Vec<String>) -> Self {
        let status = if detected_bad_words.is_empty() {
            STATUS_CLEAN
        } else {
            STATUS_DETECTED
        };
        Self {
            status: status.to_string(),
            detected_bad_words,
        }
    }
}

#[derive(Clone)]
pub struct BadWordsService {
    lists: Repository<BadWords>,
}

fn language_filter(language: &str) -> Document {
    let mut filter = Document::new();
    filter.insert("language".to_string(), Value::String(language.to_lowercase()));
    filter
}

/// Splits a comma-separated word list, trimming entries and dropping blanks.
pub fn parse_word_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|word| !word.is_empty())
        .map(str::to_string)
        .collect()
}

fn contains_whole_word(haystack: &str, word: &str) -> bool {
    if word.is_empty() {
        return false;
    }
    match Regex::new(&format!(r"(?i)\b{}\b", regex::escape(word))) {
        Ok(pattern) => pattern.is_match(haystack),
        Err(err) => {
            warn!("Could not build a word pattern for {word:?}: {err}");
            false
        }
    }
}

/// Keeps the candidates that really occur in the transcript. Phrases may appear
/// anywhere; single words must stand on their own.
pub fn confirm_matches(transcript: &str, candidates: &[String]) -> Vec<String> {
    let transcript = transcript.to_lowercase();
    candidates
        .iter()
        .filter(|candidate| {
            let needle = candidate.trim().to_lowercase();
            if needle.contains(char::is_whitespace) {
                transcript.contains(&needle)
            } else {
                contains_whole_word(&transcript, &needle)
            }
        })
        .cloned()
        .collect()
}

impl BadWordsService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            lists: Repository::new(store),
        }
    }

    pub async fn get_list(&self, language: &str) -> Result<Option<Record<BadWords>>, AppError> {
        Ok(self.lists.find_one(&language_filter(language)).await?)
    }

    pub async fn upsert_list(&self, language: &str, comma_separated: &str) -> Result<Record<BadWords>, AppError> {
        let list = BadWords {
            language: language.to_lowercase(),
            swear_words: parse_word_list(comma_separated),
        };
        let record = self.lists.upsert(&language_filter(language), &list).await?;
        info!(
            "Saved {} bad words for language {}",
            record.data.swear_words.len(),
            record.data.language
        );
        Ok(record)
    }

    /// Candidate matches: every listed word found as a case-insensitive substring.
    pub async fn check_transcription(&self, language: &str, transcript: &str) -> Result<BadWordsResult, AppError> {
        let list = match self.get_list(language).await? {
            Some(list) => Some(list),
            None if !language.eq_ignore_ascii_case(FALLBACK_LANGUAGE) => {
                debug!("No bad words list for {language}, falling back to {FALLBACK_LANGUAGE}");
                self.get_list(FALLBACK_LANGUAGE).await?
            }
            None => None,
        };

        let Some(list) = list else {
            return Ok(BadWordsResult::from_matches(Vec::new()));
        };

        let transcript = transcript.to_lowercase();
        let found = list
            .data
            .swear_words
            .into_iter()
            .filter(|word| {
                let needle = word.trim().to_lowercase();
                !needle.is_empty() && transcript.contains(&needle)
            })
            .collect();

        Ok(BadWordsResult::from_matches(found))
    }

    pub async fn count(&self) -> Result<u64, AppError> {
        Ok(self.lists.count(&Document::new()).await?)
    }
}
