//! Module for core business logic services.
//!
//! This module encapsulates the services behind the HTTP handlers: video
//! moderation and transcription against the managed cloud APIs, transcript text
//! analysis, profanity lists, scratch-file transcoding and the sample-data sandbox.

pub mod bad_words;
pub mod connectivity;
pub mod content_analysis;
pub mod job_cache;
pub mod media;
pub mod moderation;
pub mod sandbox;
pub mod transcription;
pub mod video_analyzer;
