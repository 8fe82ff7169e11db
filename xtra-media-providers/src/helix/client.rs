//! Helix HTTP client

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use super::request::HelixRequest;
use crate::credentials::Credentials;
use crate::error::{ProviderClientError, check_response, json_with_limit};

pub const DEFAULT_HELIX_URL: &str = "https://api.twitch.tv/helix";

/// Transport for Helix requests
#[async_trait]
pub trait RestClient: Send + Sync {
    /// Send `request` and return the decoded JSON body.
    async fn send(&self, request: &HelixRequest, credentials: &Credentials) -> Result<Value, ProviderClientError>;
}

/// reqwest-backed [`RestClient`]
#[derive(Debug, Clone)]
pub struct HelixClient {
    client: Client,
    base_url: String,
}

impl HelixClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration, connect_timeout: Duration) -> Result<Self, ProviderClientError> {
        let base_url = base_url.into();
        url::Url::parse(&base_url)
            .map_err(|e| ProviderClientError::Validation(format!("invalid base_url `{base_url}`: {e}")))?;
        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(timeout)
            .pool_max_idle_per_host(10)
            .build()?;
        Ok(Self::with_client(base_url, client))
    }

    #[must_use]
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

#[async_trait]
impl RestClient for HelixClient {
    async fn send(&self, request: &HelixRequest, credentials: &Credentials) -> Result<Value, ProviderClientError> {
        let headers = request_headers(credentials)?;
        debug!(path = request.path, "sending Helix request");

        let resp = self
            .client
            .get(self.url(request.path))
            .headers(headers)
            .query(&request.query)
            .send()
            .await?;
        let resp = check_response(resp)?;
        json_with_limit(resp).await
    }
}

/// Helix requires both an app client id and a bearer token on every call.
pub fn request_headers(credentials: &Credentials) -> Result<HeaderMap, ProviderClientError> {
    let client_id = Credentials::non_blank(credentials.client_id.as_ref())
        .ok_or(ProviderClientError::MissingCredential("Client-Id"))?;
    let token = credentials
        .bare_token()
        .ok_or(ProviderClientError::MissingCredential("Authorization"))?;

    let mut headers = HeaderMap::new();
    headers.insert("Client-Id", HeaderValue::from_str(client_id)?);
    headers.insert(AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {token}"))?);
    Ok(headers)
}
