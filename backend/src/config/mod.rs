//! Central module for application-wide configuration settings.
//!
//! This module handles loading and managing configuration parameters such as
//! the server port, the shared API secret, the upload bucket, database selection,
//! media scratch space and the polling bounds used for the external jobs.

pub mod database;

use std::{env, fmt::Display, path::PathBuf, str::FromStr, time::Duration};

use thiserror::Error;
use tracing::{info, warn};

pub use database::{DatabaseEnv, DatabaseKind, DatabaseSelection};

const DEFAULT_API_SECRET: &str = "secret2";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid {key} value {value:?}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Intervals and bounds for the polling loops against the external job APIs.
#[derive(Debug, Clone)]
pub struct PollSettings {
    pub moderation_interval: Duration,
    pub moderation_max_interval: Duration,
    pub moderation_timeout: Duration,
    pub transcription_interval: Duration,
    pub transcription_timeout: Duration,
    /// Wait between a transcription job reporting COMPLETED and reading its output.
    pub transcript_settle: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            moderation_interval: Duration::from_secs(2),
            moderation_max_interval: Duration::from_secs(5),
            moderation_timeout: Duration::from_secs(120),
            transcription_interval: Duration::from_secs(2),
            transcription_timeout: Duration::from_secs(15 * 60),
            transcript_settle: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Clone)]
pub struct UploadPolicy {
    pub max_size_bytes: u64,
    pub url_expiry: Duration,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            max_size_bytes: 15 * 1024 * 1024,
            url_expiry: Duration::from_secs(900),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub api_key_secret: String,
    pub s3_bucket_name: String,
    pub aws_region: Option<String>,
    pub database: DatabaseSelection,
    pub database_name: String,
    pub docdb_ca_file: PathBuf,
    pub media_work_dir: PathBuf,
    pub ffmpeg_path: PathBuf,
    pub toxicity_threshold: f32,
    pub job_ttl: Duration,
    pub poll: PollSettings,
    pub upload: UploadPolicy,
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key_secret = lookup("API_KEY_SECRET").unwrap_or_else(|| {
            warn!("API_KEY_SECRET not set, protected routes use the built-in development secret");
            DEFAULT_API_SECRET.to_string()
        });

        let database = DatabaseSelection::determine(&DatabaseEnv {
            environment: lookup("APP_ENV")
                .or_else(|| lookup("NODE_ENV"))
                .unwrap_or_else(|| "development".to_string()),
            branch: lookup("GITHUB_REF_NAME"),
            database_type: lookup("DATABASE_TYPE"),
            force_in_memory: try_load(&lookup, "FORCE_IN_MEMORY_DB", "false")?,
            connection_string: lookup("MONGODB_CONNECTION_STRING").filter(|s| !s.trim().is_empty()),
        });

        let poll = PollSettings {
            moderation_timeout: Duration::from_secs(try_load(&lookup, "MODERATION_TIMEOUT_SECS", "120")?),
            transcription_timeout: Duration::from_secs(try_load(
                &lookup,
                "TRANSCRIPTION_TIMEOUT_SECS",
                "900",
            )?),
            ..PollSettings::default()
        };

        Ok(Self {
            port: try_load(&lookup, "API_PORT", "3001")?,
            api_key_secret,
            s3_bucket_name: try_load(&lookup, "S3_BUCKET_NAME", "total-ctl-s3-storage")?,
            aws_region: lookup("AWS_REGION"),
            database,
            database_name: try_load(&lookup, "DATABASE_NAME", "video_moderation")?,
            docdb_ca_file: try_load(&lookup, "DOCDB_CA_FILE", "global-bundle.pem")?,
            media_work_dir: lookup("MEDIA_WORK_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| env::temp_dir().join("video-moderation")),
            ffmpeg_path: try_load(&lookup, "FFMPEG_PATH", "ffmpeg")?,
            toxicity_threshold: try_load(&lookup, "TOXICITY_THRESHOLD", "0.8")?,
            job_ttl: Duration::from_secs(try_load(&lookup, "JOB_CACHE_TTL_SECS", "1800")?),
            poll,
            upload: UploadPolicy::default(),
        })
    }
}

fn try_load<F, T>(lookup: &F, key: &'static str, default: &str) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    let value = lookup(key).unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });

    value.parse().map_err(|e: T::Err| ConfigError::Invalid {
        key,
        reason: e.to_string(),
        value,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_environment_is_empty() {
        let config = Config::from_lookup(lookup_from(&[])).unwrap();

        assert_eq!(config.port, 3001);
        assert_eq!(config.api_key_secret, "secret2");
        assert_eq!(config.s3_bucket_name, "total-ctl-s3-storage");
        assert_eq!(config.database.kind, DatabaseKind::InMemory);
        assert_eq!(config.toxicity_threshold, 0.8);
        assert_eq!(config.job_ttl, Duration::from_secs(1800));
        assert_eq!(config.poll.moderation_timeout, Duration::from_secs(120));
        assert_eq!(config.upload.max_size_bytes, 15 * 1024 * 1024);
    }

    #[test]
    fn explicit_values_override_defaults() {
        let config = Config::from_lookup(lookup_from(&[
            ("API_PORT", "8080"),
            ("API_KEY_SECRET", "hunter2"),
            ("S3_BUCKET_NAME", "uploads"),
            ("AWS_REGION", "eu-west-1"),
            ("TOXICITY_THRESHOLD", "0.5"),
        ]))
        .unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.api_key_secret, "hunter2");
        assert_eq!(config.s3_bucket_name, "uploads");
        assert_eq!(config.aws_region.as_deref(), Some("eu-west-1"));
        assert_eq!(config.toxicity_threshold, 0.5);
    }

    #[test]
    fn malformed_port_is_rejected() {
        let err = Config::from_lookup(lookup_from(&[("API_PORT", "not-a-port")])).unwrap_err();
        assert!(err.to_string().contains("API_PORT"));
    }

    #[test]
    fn node_env_is_used_when_app_env_is_missing() {
        let config = Config::from_lookup(lookup_from(&[("NODE_ENV", "staging")])).unwrap();
        assert_eq!(config.database.environment, "staging");
    }
}
