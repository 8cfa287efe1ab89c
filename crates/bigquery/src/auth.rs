//! OAuth access tokens for the BigQuery API.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

use crate::client::BigQueryError;

const METADATA_TOKEN_URL: &str =
    "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token";

/// Tokens are refreshed this long before they expire.
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// Lifetime assumed when the advertised `expires_in` does not fit an `Instant`.
const FALLBACK_LIFETIME: Duration = Duration::from_secs(300);

/// Source of bearer tokens for API calls.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn access_token(&self) -> Result<String, BigQueryError>;
}

/// A fixed token, e.g. from `gcloud auth print-access-token`.
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

#[async_trait]
impl TokenProvider for StaticToken {
    async fn access_token(&self) -> Result<String, BigQueryError> {
        Ok(self.0.clone())
    }
}

#[derive(Deserialize)]
struct MetadataTokenResponse {
    access_token: String,
    expires_in: u64,
}

struct CachedToken {
    value: String,
    expires_at: Instant,
}

/// Tokens for the attached service account, read from the GCE/Cloud Run
/// metadata server and cached until shortly before expiry.
pub struct MetadataServerToken {
    http: reqwest::Client,
    url: String,
    cached: Mutex<Option<CachedToken>>,
}

impl MetadataServerToken {
    pub fn new(http: reqwest::Client) -> Self {
        Self::with_url(http, METADATA_TOKEN_URL)
    }

    pub fn with_url(http: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            http,
            url: url.into(),
            cached: Mutex::new(None),
        }
    }

    async fn fetch(&self) -> Result<CachedToken, BigQueryError> {
        let response = self
            .http
            .get(&self.url)
            .header("Metadata-Flavor", "Google")
            .send()
            .await
            .map_err(|e| BigQueryError::Auth(format!("metadata server unreachable: {e}")))?;

        let status = response.status().as_u16();
        if status != 200 {
            let body = response.text().await.unwrap_or_default();
            return Err(BigQueryError::Auth(format!(
                "metadata server returned {status}: {body}"
            )));
        }

        let token: MetadataTokenResponse = response
            .json()
            .await
            .map_err(|e| BigQueryError::Auth(format!("bad token response: {e}")))?;

        debug!(expires_in = token.expires_in, "Fetched access token from metadata server");

        Ok(CachedToken {
            value: token.access_token,
            expires_at: expiry_after(token.expires_in),
        })
    }
}

fn expiry_after(expires_in: u64) -> Instant {
    let now = Instant::now();
    now.checked_add(Duration::from_secs(expires_in))
        .unwrap_or(now + FALLBACK_LIFETIME)
}

#[async_trait]
impl TokenProvider for MetadataServerToken {
    async fn access_token(&self) -> Result<String, BigQueryError> {
        let mut cached = self.cached.lock().await;

        if let Some(token) = cached.as_ref() {
            if token.expires_at > Instant::now() + EXPIRY_MARGIN {
                return Ok(token.value.clone());
            }
        }

        let token = self.fetch().await?;
        let value = token.value.clone();
        *cached = Some(token);
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expiry_follows_expires_in() {
        let before = Instant::now();
        let expires_at = expiry_after(3599);
        assert!(expires_at >= before + Duration::from_secs(3599));
    }

    #[test]
    fn oversized_expires_in_uses_fallback_lifetime() {
        let before = Instant::now();
        let expires_at = expiry_after(u64::MAX);
        assert!(expires_at >= before + FALLBACK_LIFETIME);
        assert!(expires_at <= Instant::now() + FALLBACK_LIFETIME);
    }
}
