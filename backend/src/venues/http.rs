use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use super::{VenueCredentials, VenueError, VenueIntegration};

/// Venue client backed by a JSON currency endpoint.
///
/// The endpoint is expected to answer with the venue's currency table
/// (`{CODE: {"networks": {...}}}`). Credentials, when present, are forwarded
/// as request headers.
pub struct HttpVenue {
    name: String,
    api_url: String,
    request_timeout: Duration,
}

impl HttpVenue {
    pub fn new(name: impl Into<String>, api_url: impl Into<String>, request_timeout: Duration) -> Self {
        Self {
            name: name.into(),
            api_url: api_url.into(),
            request_timeout,
        }
    }
}

#[async_trait]
impl VenueIntegration for HttpVenue {
    async fn fetch_currencies(
        &self,
        credentials: Option<&VenueCredentials>,
    ) -> Result<Value, VenueError> {
        // Per-call client: its connection pool is released when this future
        // completes or is dropped.
        let client = Client::builder().timeout(self.request_timeout).build()?;

        let mut request = client
            .get(&self.api_url)
            .header("Content-Type", "application/json");
        if let Some(credentials) = credentials {
            request = request
                .header("X-API-KEY", &credentials.api_key)
                .header("X-API-SECRET", &credentials.secret_key);
            if let Some(passphrase) = &credentials.passphrase {
                request = request.header("X-API-PASSPHRASE", passphrase);
            }
        }

        debug!(venue = %self.name, url = %self.api_url, "Requesting currencies");
        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                VenueError::Timeout(format!("{} did not answer within {:?}", self.name, self.request_timeout))
            } else {
                VenueError::NetworkError(e)
            }
        })?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(VenueError::AuthError(format!(
                    "{} rejected credentials with HTTP {}",
                    self.name,
                    response.status()
                )))
            }
            status if !status.is_success() => {
                return Err(VenueError::ApiError(format!("{} returned HTTP {}", self.name, status)))
            }
            _ => {}
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    fn get_name(&self) -> &str {
        &self.name
    }
}
