//! Text analysis of transcripts: toxicity labels and sentiment.
//!
//! Toxicity detection is only offered by the text-analysis service for English
//! and in a handful of regions; sentiment covers more languages. Both checks are
//! best-effort: a failing call is logged and left out of the findings.

use std::sync::Arc;

use moderation_adapters::TextAnalysis;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::errors::AppError;

pub const MAX_TEXT_LENGTH: usize = 5000;
pub const CONTENT_CHECK_LABEL: &str = "CONTENT_CHECK";

const SUPPORTED_LANGUAGES: &[&str] = &["en", "es", "fr", "de", "it", "pt", "ar", "hi", "ja", "ko", "zh", "zh-TW"];
const TOXICITY_REGIONS: &[&str] = &["us-east-1", "us-west-2", "eu-west-1", "ap-southeast-2"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    High,
    Medium,
    Low,
}

pub fn determine_severity(score: f32) -> Severity {
    if score >= 0.8 {
        Severity::High
    } else if score >= 0.5 {
        Severity::Medium
    } else {
        Severity::Low
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ToxicLabel {
    pub name: String,
    pub score: f32,
    pub severity: Severity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ToxicLabel {
    /// Placeholder label reported when a check ran and found nothing.
    pub fn content_check(details: &str) -> Self {
        Self {
            name: CONTENT_CHECK_LABEL.to_string(),
            score: 0.0,
            severity: Severity::Low,
            details: Some(details.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SentimentScore {
    pub mixed: f32,
    pub negative: f32,
    pub neutral: f32,
    pub positive: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SentimentResult {
    pub sentiment: String,
    pub sentiment_score: Vec<SentimentScore>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Finding {
    Toxic(ToxicLabel),
    Sentiment(SentimentResult),
}

impl Finding {
    pub fn as_toxic(&self) -> Option<&ToxicLabel> {
        match self {
            Finding::Toxic(label) => Some(label),
            Finding::Sentiment(_) => None,
        }
    }
}

#[derive(Clone)]
pub struct ContentAnalysisService {
    text: Arc<dyn TextAnalysis>,
    region: Option<String>,
}

impl ContentAnalysisService {
    pub fn new(text: Arc<dyn TextAnalysis>, region: Option<String>) -> Self {
        Self { text, region }
    }

    pub async fn detect_toxic_content(&self, text: &str, language: &str) -> Result<Vec<ToxicLabel>, AppError> {
        if text.trim().is_empty() {
            return Ok(vec![ToxicLabel::content_check(
                "No toxic or inappropriate content detected (Empty text)",
            )]);
        }
        ensure_length(text)?;

        let labels = self.text.detect_toxic_content(text, language).await?;
        if labels.is_empty() {
            return Ok(vec![ToxicLabel::content_check(
                "No toxic or inappropriate content detected",
            )]);
        }

        Ok(labels
            .into_iter()
            .map(|label| ToxicLabel {
                details: Some(format!(
                    "AWS Comprehend detected {} with {:.1}% confidence",
                    label.name,
                    label.score * 100.0
                )),
                severity: determine_severity(label.score),
                score: label.score,
                name: label.name,
            })
            .collect())
    }

    pub async fn detect_sentiment(&self, text: &str, language: &str) -> Result<SentimentResult, AppError> {
        if text.trim().is_empty() {
            return Err(AppError::BadRequest("Text cannot be empty".to_string()));
        }
        ensure_length(text)?;

        let scores = self.text.detect_sentiment(text, language).await?;
        Ok(SentimentResult {
            sentiment: scores.sentiment,
            sentiment_score: vec![SentimentScore {
                mixed: scores.mixed,
                negative: scores.negative,
                neutral: scores.neutral,
                positive: scores.positive,
            }],
        })
    }

    /// Runs every check available for `language` in the configured region.
    pub async fn analyze_mixed_content(&self, text: &str, language: &str) -> Vec<Finding> {
        let region = self.region.as_deref().unwrap_or("None");
        if !SUPPORTED_LANGUAGES.contains(&language) || !TOXICITY_REGIONS.contains(&region) {
            info!("Skipping text analysis for unsupported language or region: language: {language} region: {region}");
            return Vec::new();
        }

        let mut findings = Vec::new();

        if language == "en" {
            match self.detect_toxic_content(text, language).await {
                Ok(labels) => findings.extend(labels.into_iter().map(Finding::Toxic)),
                Err(err) => error!("Toxicity analysis failed: {err}"),
            }
        } else {
            info!("Skipping toxic check for unsupported language: {language}");
        }

        if !text.trim().is_empty() {
            match self.detect_sentiment(text, language).await {
                Ok(sentiment) => findings.push(Finding::Sentiment(sentiment)),
                Err(err) => error!("Sentiment analysis failed: {err}"),
            }
        }

        findings
    }
}

/// The provider limit counts UTF-8 bytes, not characters.
fn ensure_length(text: &str) -> Result<(), AppError> {
    if text.len() > MAX_TEXT_LENGTH {
        return Err(AppError::BadRequest(format!(
            "Text exceeds maximum length of {MAX_TEXT_LENGTH} bytes"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::test_support::FakeTextAnalysis;

    fn service(text: Arc<FakeTextAnalysis>, region: &str) -> ContentAnalysisService {
        ContentAnalysisService::new(text, Some(region.to_string()))
    }

    #[test]
    fn severity_thresholds() {
        assert_eq!(determine_severity(0.95), Severity::High);
        assert_eq!(determine_severity(0.8), Severity::High);
        assert_eq!(determine_severity(0.6), Severity::Medium);
        assert_eq!(determine_severity(0.1), Severity::Low);
    }

    #[test]
    fn findings_serialize_with_pascal_case_keys() {
        let toxic = Finding::Toxic(ToxicLabel::content_check("nothing"));
        let json = serde_json::to_value(&toxic).unwrap();
        assert_eq!(json["Name"], "CONTENT_CHECK");
        assert_eq!(json["Severity"], "Low");

        let sentiment = Finding::Sentiment(SentimentResult {
            sentiment: "NEUTRAL".into(),
            sentiment_score: vec![SentimentScore { mixed: 0.0, negative: 0.1, neutral: 0.8, positive: 0.1 }],
        });
        let json = serde_json::to_value(&sentiment).unwrap();
        assert_eq!(json["Sentiment"], "NEUTRAL");
        assert_eq!(json["SentimentScore"][0]["Neutral"], json!(0.8f32));
    }

    #[tokio::test]
    async fn blank_text_short_circuits_toxicity() {
        let text = Arc::new(FakeTextAnalysis::default());
        let labels = service(text.clone(), "us-east-1")
            .detect_toxic_content("   ", "en")
            .await
            .unwrap();

        assert_eq!(labels.len(), 1);
        assert_eq!(labels[0].name, CONTENT_CHECK_LABEL);
        assert_eq!(text.toxicity_calls(), 0);
    }

    #[tokio::test]
    async fn oversized_text_is_rejected() {
        let text = Arc::new(FakeTextAnalysis::default());
        let long = "a".repeat(MAX_TEXT_LENGTH + 1);
        let err = service(text, "us-east-1").detect_toxic_content(&long, "en").await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn length_limit_counts_bytes() {
        let text = Arc::new(FakeTextAnalysis::default());
        let accented = "é".repeat(MAX_TEXT_LENGTH / 2 + 1);
        assert!(accented.chars().count() < MAX_TEXT_LENGTH);

        let err = service(text.clone(), "us-east-1").detect_sentiment(&accented, "fr").await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
        assert_eq!(text.toxicity_calls(), 0);
    }

    #[tokio::test]
    async fn provider_labels_gain_severity_and_details() {
        let text = Arc::new(FakeTextAnalysis::with_toxicity(&[("PROFANITY", 0.91), ("INSULT", 0.55)]));
        let labels = service(text, "us-east-1").detect_toxic_content("some words", "en").await.unwrap();

        assert_eq!(labels[0].severity, Severity::High);
        assert_eq!(
            labels[0].details.as_deref(),
            Some("AWS Comprehend detected PROFANITY with 91.0% confidence")
        );
        assert_eq!(labels[1].severity, Severity::Medium);
    }

    #[tokio::test]
    async fn english_runs_toxicity_and_sentiment() {
        let text = Arc::new(FakeTextAnalysis::with_toxicity(&[("INSULT", 0.3)]));
        let findings = service(text, "eu-west-1").analyze_mixed_content("hello there", "en").await;

        assert_eq!(findings.len(), 2);
        assert!(findings[0].as_toxic().is_some());
        assert!(matches!(findings[1], Finding::Sentiment(_)));
    }

    #[tokio::test]
    async fn other_languages_only_get_sentiment() {
        let text = Arc::new(FakeTextAnalysis::default());
        let findings = service(text.clone(), "us-west-2").analyze_mixed_content("hola", "es").await;

        assert_eq!(findings.len(), 1);
        assert_eq!(text.toxicity_calls(), 0);
    }

    #[tokio::test]
    async fn unsupported_region_skips_everything() {
        let text = Arc::new(FakeTextAnalysis::default());
        let findings = service(text.clone(), "sa-east-1").analyze_mixed_content("hello", "en").await;

        assert!(findings.is_empty());
        assert_eq!(text.toxicity_calls(), 0);
    }

    #[tokio::test]
    async fn provider_failures_are_skipped() {
        let text = Arc::new(FakeTextAnalysis::failing());
        let findings = service(text, "us-east-1").analyze_mixed_content("hello", "en").await;
        assert!(findings.is_empty());
    }
}
