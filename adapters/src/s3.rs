//! S3-backed implementation of the `ObjectStorage` trait.
//!
//! Uploads never stream through the backend: clients receive a presigned `PUT`
//! URL. The backend itself only reads objects (transcripts, videos that need a
//! moderation copy) and writes derived files.

use std::time::Duration;

use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_s3::{presigning::PresigningConfig, primitives::ByteStream, Client};

use crate::{AdapterError, ObjectMetadata, ObjectStorage};

pub struct S3Storage {
    client: Client,
    bucket_name: String,
}

impl S3Storage {
    pub fn new(config: &SdkConfig, bucket_name: impl Into<String>) -> Self {
        Self {
            client: Client::new(config),
            bucket_name: bucket_name.into(),
        }
    }
}

#[async_trait]
impl ObjectStorage for S3Storage {
    fn bucket_name(&self) -> &str {
        &self.bucket_name
    }

    async fn presign_upload(
        &self,
        key: &str,
        content_type: &str,
        expires_in: Duration,
    ) -> Result<String, AdapterError> {
        let presigning = PresigningConfig::expires_in(expires_in)
            .map_err(|err| AdapterError::InvalidInput(err.to_string()))?;

        let request = self
            .client
            .put_object()
            .bucket(&self.bucket_name)
            .key(key)
            .content_type(content_type)
            .presigned(presigning)
            .await
            .map_err(|err| AdapterError::Storage(format!("Cannot presign upload for {key}: {err}")))?;

        Ok(request.uri().to_string())
    }

    async fn delete_object(&self, key: &str) -> Result<(), AdapterError> {
        self.client
            .delete_object()
            .bucket(&self.bucket_name)
            .key(key)
            .send()
            .await
            .map_err(|err| AdapterError::Storage(format!("Cannot delete {key}: {err}")))?;

        log::debug!("Deleted s3://{}/{}", self.bucket_name, key);
        Ok(())
    }

    async fn head_object(&self, key: &str) -> Result<ObjectMetadata, AdapterError> {
        let output = self
            .client
            .head_object()
            .bucket(&self.bucket_name)
            .key(key)
            .send()
            .await
            .map_err(|err| {
                if err.as_service_error().map(|e| e.is_not_found()).unwrap_or(false) {
                    AdapterError::NotFound(key.to_string())
                } else {
                    AdapterError::Storage(format!("Cannot read metadata for {key}: {err}"))
                }
            })?;

        Ok(ObjectMetadata {
            content_type: output.content_type().map(str::to_string),
            content_length: output.content_length(),
        })
    }

    async fn get_object(&self, key: &str) -> Result<Vec<u8>, AdapterError> {
        let output = self
            .client
            .get_object()
            .bucket(&self.bucket_name)
            .key(key)
            .send()
            .await
            .map_err(|err| {
                if err.as_service_error().map(|e| e.is_no_such_key()).unwrap_or(false) {
                    AdapterError::NotFound(key.to_string())
                } else {
                    AdapterError::Storage(format!("Cannot download {key}: {err}"))
                }
            })?;

        let bytes = output
            .body
            .collect()
            .await
            .map_err(|err| AdapterError::Storage(format!("Cannot read body of {key}: {err}")))?
            .into_bytes();

        Ok(bytes.to_vec())
    }

    async fn put_object(
        &self,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<(), AdapterError> {
        let size = body.len();
        self.client
            .put_object()
            .bucket(&self.bucket_name)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|err| AdapterError::Storage(format!("Cannot upload {key}: {err}")))?;

        log::debug!("Uploaded {size} bytes to s3://{}/{}", self.bucket_name, key);
        Ok(())
    }

    async fn check_connectivity(&self) -> Result<(), AdapterError> {
        self.client
            .head_bucket()
            .bucket(&self.bucket_name)
            .send()
            .await
            .map_err(|err| AdapterError::Storage(format!("Bucket {} unreachable: {err}", self.bucket_name)))?;

        Ok(())
    }
}
