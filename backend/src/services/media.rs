//! Produces a moderation-friendly copy of an upload.
//!
//! MP4 uploads up to 50 MiB go to moderation as they are. Anything else is
//! downloaded into a per-task scratch directory, transcoded with `ffmpeg` and
//! uploaded next to the original under `analysis/<task>/`.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use moderation_adapters::ObjectStorage;
use tokio::{fs, process::Command};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::{
    errors::AppError,
    utils::file::{clean_directory, extension_for_mime, mime_from_filename},
};

const DIRECT_MODERATION_TYPE: &str = "video/mp4";
const MAX_DIRECT_MODERATION_SIZE: i64 = 50 * 1024 * 1024;
const MODERATION_FILE_NAME: &str = "for_moderation.mp4";

const MODERATION_WIDTH: u32 = 512;
const MODERATION_FPS: u32 = 30;

/// Where the moderation job should read the video from.
#[derive(Debug, Clone, PartialEq)]
pub struct ModerationCopy {
    pub file_key: String,
    /// Scratch task to clean up, when a transcoded copy was produced.
    pub task_id: Option<String>,
}

/// Whether a stored object must be transcoded before moderation.
pub fn conversion_required(content_type: &str, size: i64) -> bool {
    let content_type = content_type.to_lowercase();
    if !content_type.starts_with(DIRECT_MODERATION_TYPE) {
        return true;
    }
    size > MAX_DIRECT_MODERATION_SIZE
}

fn moderation_output_args() -> Vec<String> {
    let filter = format!("scale={MODERATION_WIDTH}:trunc(ow/a/2)*2,fps={MODERATION_FPS}");
    [
        "-vf",
        filter.as_str(),
        "-c:v",
        "libx264",
        "-preset",
        "veryfast",
        "-threads",
        "2",
        "-b:v",
        "3M",
        "-minrate",
        "1.5M",
        "-maxrate",
        "4M",
        "-bufsize",
        "5M",
        "-pix_fmt",
        "yuv420p",
        "-profile:v",
        "main",
        "-movflags",
        "+faststart",
        "-c:a",
        "aac",
        "-b:a",
        "128k",
    ]
    .iter()
    .map(|arg| arg.to_string())
    .collect()
}

#[derive(Clone)]
pub struct MediaStandardizer {
    storage: Arc<dyn ObjectStorage>,
    work_dir: PathBuf,
    ffmpeg: PathBuf,
}

impl MediaStandardizer {
    pub fn new(storage: Arc<dyn ObjectStorage>, work_dir: PathBuf, ffmpeg: PathBuf) -> Self {
        Self {
            storage,
            work_dir,
            ffmpeg,
        }
    }

    fn input_dir(&self, task_id: &str) -> PathBuf {
        self.work_dir.join("input").join(task_id)
    }

    fn output_dir(&self, task_id: &str) -> PathBuf {
        self.work_dir.join("output").join(task_id)
    }

    async fn needs_conversion(&self, file_key: &str) -> bool {
        match self.storage.head_object(file_key).await {
            Ok(metadata) => {
                let content_type = metadata
                    .content_type
                    .unwrap_or_else(|| mime_from_filename(file_key).to_string());
                let size = metadata.content_length.unwrap_or(0);
                let required = conversion_required(&content_type, size);
                debug!("{file_key} is {content_type} ({size} bytes), conversion required: {required}");
                required
            }
            Err(err) => {
                error!("Error checking content type of {file_key}: {err}");
                true
            }
        }
    }

    pub async fn create_moderation_version(&self, file_key: &str) -> Result<ModerationCopy, AppError> {
        if !self.needs_conversion(file_key).await {
            info!("{file_key} already in a suitable format, skipping transcoding");
            return Ok(ModerationCopy {
                file_key: file_key.to_string(),
                task_id: None,
            });
        }

        let content_type = mime_from_filename(file_key);
        let extension = extension_for_mime(content_type)
            .ok_or_else(|| AppError::BadRequest(format!("Unsupported file type: {content_type}")))?;

        let task_id = Uuid::new_v4().to_string();
        match self.convert(file_key, extension, &task_id).await {
            Ok(moderation_key) => {
                info!("Uploaded moderation version of {file_key} to {moderation_key}");
                Ok(ModerationCopy {
                    file_key: moderation_key,
                    task_id: Some(task_id),
                })
            }
            Err(err) => {
                self.cleanup(&task_id).await;
                Err(err)
            }
        }
    }

    async fn convert(&self, file_key: &str, extension: &str, task_id: &str) -> Result<String, AppError> {
        let stem = Path::new(file_key)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("upload");

        let input_dir = self.input_dir(task_id);
        let output_dir = self.output_dir(task_id);
        fs::create_dir_all(&input_dir).await.map_err(media_error)?;
        fs::create_dir_all(&output_dir).await.map_err(media_error)?;

        let input_path = input_dir.join(format!("{stem}.{extension}"));
        let body = self.storage.get_object(file_key).await?;
        fs::write(&input_path, body).await.map_err(media_error)?;
        debug!("Downloaded {file_key} to {}", input_path.display());

        let output_path = output_dir.join(MODERATION_FILE_NAME);
        self.transcode(&input_path, &output_path).await?;

        let moderation_key = format!("analysis/{task_id}/{MODERATION_FILE_NAME}");
        let converted = fs::read(&output_path).await.map_err(media_error)?;
        self.storage
            .put_object(&moderation_key, converted, DIRECT_MODERATION_TYPE)
            .await?;

        Ok(moderation_key)
    }

    async fn transcode(&self, input: &Path, output: &Path) -> Result<(), AppError> {
        info!(
            "Transcoding {} for moderation at {MODERATION_WIDTH}px {MODERATION_FPS}fps",
            input.display()
        );

        let result = Command::new(&self.ffmpeg)
            .arg("-y")
            .args(["-fflags", "+genpts"])
            .arg("-i")
            .arg(input)
            .args(moderation_output_args())
            .arg(output)
            .output()
            .await
            .map_err(|err| AppError::Media(format!("Failed to run {}: {err}", self.ffmpeg.display())))?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            let tail: String = stderr.lines().rev().take(5).collect::<Vec<_>>().join(" | ");
            return Err(AppError::Media(format!("ffmpeg exited with {}: {tail}", result.status)));
        }

        Ok(())
    }

    pub async fn cleanup(&self, task_id: &str) {
        clean_directory(&self.input_dir(task_id)).await;
        clean_directory(&self.output_dir(task_id)).await;
        debug!("Cleaned up scratch files for task {task_id}");
    }
}

fn media_error(err: std::io::Error) -> AppError {
    warn!("Scratch file operation failed: {err}");
    AppError::Media(err.to_string())
}
