//! Comprehend-specific adapter for toxicity and sentiment detection on text.

use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_comprehend::{
    types::{LanguageCode, TextSegment},
    Client,
};

use crate::{AdapterError, SentimentScores, TextAnalysis, ToxicContent};

pub struct ComprehendAnalysis {
    client: Client,
}

impl ComprehendAnalysis {
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            client: Client::new(config),
        }
    }
}

#[async_trait]
impl TextAnalysis for ComprehendAnalysis {
    async fn detect_toxic_content(
        &self,
        text: &str,
        language_code: &str,
    ) -> Result<Vec<ToxicContent>, AdapterError> {
        let segment = TextSegment::builder()
            .text(text)
            .build()
            .map_err(|err| AdapterError::InvalidInput(err.to_string()))?;

        let output = self
            .client
            .detect_toxic_content()
            .text_segments(segment)
            .language_code(LanguageCode::from(language_code))
            .send()
            .await
            .map_err(|err| AdapterError::TextAnalysis(format!("Toxicity detection failed: {err}")))?;

        let labels = output
            .result_list()
            .first()
            .map(|result| {
                result
                    .labels()
                    .iter()
                    .filter_map(|label| {
                        Some(ToxicContent {
                            name: label.name()?.as_str().to_string(),
                            score: label.score().unwrap_or_default(),
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(labels)
    }

    async fn detect_sentiment(
        &self,
        text: &str,
        language_code: &str,
    ) -> Result<SentimentScores, AdapterError> {
        let output = self
            .client
            .detect_sentiment()
            .text(text)
            .language_code(LanguageCode::from(language_code))
            .send()
            .await
            .map_err(|err| AdapterError::TextAnalysis(format!("Sentiment detection failed: {err}")))?;

        let sentiment = output
            .sentiment()
            .map(|s| s.as_str().to_string())
            .ok_or_else(|| AdapterError::TextAnalysis("Comprehend returned no sentiment".to_string()))?;
        let score = output.sentiment_score();

        Ok(SentimentScores {
            sentiment,
            mixed: score.and_then(|s| s.mixed()).unwrap_or_default(),
            negative: score.and_then(|s| s.negative()).unwrap_or_default(),
            neutral: score.and_then(|s| s.neutral()).unwrap_or_default(),
            positive: score.and_then(|s| s.positive()).unwrap_or_default(),
        })
    }

    async fn check_connectivity(&self) -> Result<(), AdapterError> {
        self.client
            .detect_dominant_language()
            .text("Hello world")
            .send()
            .await
            .map_err(|err| AdapterError::TextAnalysis(format!("Comprehend unreachable: {err}")))?;

        Ok(())
    }
}
