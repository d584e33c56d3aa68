use crate::api::ApiError;
use crate::app_config::AppConfig;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, instrument};

const GRANT_TYPE: &str = "client_credentials";

/// Bearer credential with its expiry. Replaced wholesale on refresh, never
/// mutated in place.
#[derive(Clone, Debug)]
pub struct Token {
    value: String,
    expires_at: DateTime<Utc>,
}

impl Token {
    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    fn is_valid(&self) -> bool {
        self.expires_at > Utc::now()
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

/// Expiry-aware cache around the OAuth client-credentials grant. The cache
/// slot sits behind an async mutex that is held for the whole acquisition,
/// so callers arriving during a refresh wait for the in-flight grant and
/// then hit the cache. Exactly one grant request goes out per expiry
/// window, no matter how many uploads race for a token.
#[derive(Debug)]
pub struct TokenCache {
    client: Client,
    config: Arc<AppConfig>,
    cached: Mutex<Option<Token>>,
}

impl TokenCache {
    pub fn new(client: Client, config: Arc<AppConfig>) -> Self {
        TokenCache {
            client,
            config,
            cached: Mutex::new(None),
        }
    }

    /// Returns the cached token while it is still valid, refreshing it
    /// through the token endpoint otherwise. Grant failures are handed
    /// back untouched; whether to retry is the caller's call.
    #[instrument(skip(self))]
    pub async fn get_valid_token(&self) -> Result<Token, ApiError> {
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref() {
            if token.is_valid() {
                return Ok(token.clone());
            }
        }

        debug!("🔑 Requesting a fresh access token...");
        let token = self.fetch_token().await?;
        debug!("🔑 Requesting a fresh access token... OK, valid until {}", token.expires_at);
        *cached = Some(token.clone());
        Ok(token)
    }

    async fn fetch_token(&self) -> Result<Token, ApiError> {
        let api = self.config.api();
        let form = [
            ("grant_type", GRANT_TYPE),
            ("client_id", api.client_id()),
            ("client_secret", api.client_secret()),
        ];

        let response = self
            .client
            .post(format!("{}/connect/token", api.base_url()))
            .form(&form)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ApiError::TokenRejected(response.status()));
        }

        let body = response.json::<TokenResponse>().await.map_err(ApiError::MalformedTokenResponse)?;
        Ok(Token {
            value: body.access_token,
            expires_at: Utc::now() + chrono::Duration::seconds(body.expires_in),
        })
    }
}
