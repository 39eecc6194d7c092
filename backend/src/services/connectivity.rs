//! Reachability of each managed service, as reported by `/api/moderation/video/status`.

use moderation_adapters::{AdapterError, AdapterSet};
use serde::Serialize;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectivityStatus {
    pub s3_client: bool,
    pub rekognition: bool,
    pub transcribe: bool,
    pub comprehend: bool,
}

fn reachable(service: &str, result: Result<(), AdapterError>) -> bool {
    match result {
        Ok(()) => true,
        Err(err) => {
            warn!("{service} connectivity check failed: {err}");
            false
        }
    }
}

pub async fn status(adapters: &AdapterSet) -> ConnectivityStatus {
    let (s3, rekognition, transcribe, comprehend) = tokio::join!(
        adapters.storage.check_connectivity(),
        adapters.moderation.check_connectivity(),
        adapters.transcription.check_connectivity(),
        adapters.text.check_connectivity(),
    );

    ConnectivityStatus {
        s3_client: reachable("S3", s3),
        rekognition: reachable("Rekognition", rekognition),
        transcribe: reachable("Transcribe", transcribe),
        comprehend: reachable("Comprehend", comprehend),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::fake_adapters;

    #[tokio::test]
    async fn each_service_is_reported_separately() {
        let fakes = fake_adapters();
        fakes.storage.set_reachable(false);

        let status = status(&fakes.set()).await;
        assert_eq!(
            status,
            ConnectivityStatus {
                s3_client: false,
                rekognition: true,
                transcribe: true,
                comprehend: true,
            }
        );

        let json = serde_json::to_value(status).unwrap();
        assert_eq!(json["s3Client"], false);
    }
}
