use crate::api::{ApiError, TokenCache};
use crate::app_config::AppConfig;
use crate::domain::Sample;
use reqwest::{Client, StatusCode};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Outcome of a single ingestion attempt. A non-2xx status is data here,
/// not an error; the caller decides whether to reschedule.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadResponse {
    pub is_success: bool,
    pub status: StatusCode,
    pub message: Option<String>,
}

/// Stateless transport wrapper around the bulk ingestion endpoint. One
/// network attempt per call, token acquisition included; it never touches
/// the sample buffer.
#[derive(Debug)]
pub struct UploadClient {
    client: Client,
    config: Arc<AppConfig>,
    tokens: TokenCache,
}

impl UploadClient {
    pub fn new(client: Client, config: Arc<AppConfig>, tokens: TokenCache) -> Self {
        UploadClient { client, config, tokens }
    }

    #[instrument(skip_all, fields(samples = samples.len()))]
    pub async fn upload(&self, samples: &[Sample]) -> Result<UploadResponse, ApiError> {
        let token = self.tokens.get_valid_token().await?;

        info!("📤 Uploading {} sample(s)...", samples.len());
        let response = self
            .client
            .post(format!("{}/api/GPSEntries/bulk", self.config.api().base_url()))
            .bearer_auth(token.value())
            .json(&samples)
            .send()
            .await?;

        let status = response.status();
        let message = response.text().await.ok().filter(|text| !text.is_empty());

        if status.is_success() {
            info!(status = %status, "📤 Uploading sample(s)... OK");
        } else {
            warn!(status = %status, "📤 Uploading sample(s)... rejected");
        }

        Ok(UploadResponse {
            is_success: status.is_success(),
            status,
            message,
        })
    }
}
