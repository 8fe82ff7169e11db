//! GraphQL HTTP client

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use super::request::GqlRequest;
use crate::credentials::Credentials;
use crate::error::{ProviderClientError, check_response, json_with_limit};

/// Public GraphQL endpoint
pub const DEFAULT_GQL_URL: &str = "https://gql.twitch.tv/gql";

/// Client id of the first-party web player
pub const WEB_CLIENT_ID: &str = "kimne78kx3ncx6brgo4mv6wki5h1ko";

/// Error messages the server uses for rejected credentials
const AUTH_ERROR_MARKERS: &[&str] = &["unauthorized", "unauthenticated", "failed integrity check"];

/// Transport for persisted-query requests
#[async_trait]
pub trait GraphClient: Send + Sync {
    /// Send `request` and return the `data` object of the response.
    async fn send(&self, request: &GqlRequest, credentials: &Credentials) -> Result<Value, ProviderClientError>;
}

/// reqwest-backed [`GraphClient`]
#[derive(Debug, Clone)]
pub struct GqlClient {
    client: Client,
    endpoint: String,
}

impl GqlClient {
    pub fn new(endpoint: impl Into<String>, timeout: Duration, connect_timeout: Duration) -> Result<Self, ProviderClientError> {
        let endpoint = endpoint.into();
        url::Url::parse(&endpoint)
            .map_err(|e| ProviderClientError::Validation(format!("invalid endpoint `{endpoint}`: {e}")))?;
        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(timeout)
            .pool_max_idle_per_host(10)
            .build()?;
        Ok(Self::with_client(endpoint, client))
    }

    /// Wrap an existing reqwest client (shares its connection pool)
    #[must_use]
    pub fn with_client(endpoint: impl Into<String>, client: Client) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl GraphClient for GqlClient {
    async fn send(&self, request: &GqlRequest, credentials: &Credentials) -> Result<Value, ProviderClientError> {
        let headers = request_headers(request, credentials)?;
        let body = request.body()?;
        debug!(operation = request.operation_name, mutating = request.is_mutating(), "sending GraphQL request");

        let resp = self
            .client
            .post(&self.endpoint)
            .headers(headers)
            .json(&body)
            .send()
            .await?;
        let resp = check_response(resp)?;
        let json: Value = json_with_limit(resp).await?;
        extract_data(json, request.batched)
    }
}

/// Build headers, failing before dispatch when a required one is missing.
///
/// `Client-ID` is always required. Mutations additionally require the
/// user token, device id and integrity token; for queries those are
/// attached only when present.
pub fn request_headers(request: &GqlRequest, credentials: &Credentials) -> Result<HeaderMap, ProviderClientError> {
    let mut headers = HeaderMap::new();
    let client_id = Credentials::non_blank(credentials.client_id.as_ref())
        .ok_or(ProviderClientError::MissingCredential("Client-ID"))?;
    headers.insert("Client-ID", HeaderValue::from_str(client_id)?);

    let token = credentials.bare_token();
    let device_id = Credentials::non_blank(credentials.device_id.as_ref());
    let integrity = Credentials::non_blank(credentials.integrity_token.as_ref());

    if request.is_mutating() {
        if token.is_none() {
            return Err(ProviderClientError::MissingCredential("Authorization"));
        }
        if device_id.is_none() {
            return Err(ProviderClientError::MissingCredential("X-Device-Id"));
        }
        if integrity.is_none() {
            return Err(ProviderClientError::MissingCredential("Client-Integrity"));
        }
    }

    if let Some(token) = token {
        headers.insert(AUTHORIZATION, HeaderValue::from_str(&format!("OAuth {token}"))?);
    }
    if let Some(device_id) = device_id {
        headers.insert("X-Device-Id", HeaderValue::from_str(device_id)?);
    }
    if let Some(integrity) = integrity {
        headers.insert("Client-Integrity", HeaderValue::from_str(integrity)?);
    }
    Ok(headers)
}

/// Unwrap the response envelope into its `data` object.
pub fn extract_data(json: Value, batched: bool) -> Result<Value, ProviderClientError> {
    let mut envelope = match json {
        Value::Array(mut items) if batched => {
            if items.is_empty() {
                return Err(ProviderClientError::Malformed("empty batch response".to_string()));
            }
            items.swap_remove(0)
        }
        other => other,
    };

    if let Some(errors) = envelope.get("errors").and_then(Value::as_array) {
        if !errors.is_empty() {
            let messages: Vec<String> = errors
                .iter()
                .map(|e| {
                    e.get("message")
                        .and_then(Value::as_str)
                        .unwrap_or("unknown error")
                        .to_string()
                })
                .collect();
            let rejected = messages.iter().any(|m| {
                let lower = m.to_ascii_lowercase();
                AUTH_ERROR_MARKERS.iter().any(|marker| lower.contains(marker))
            });
            if rejected {
                return Err(ProviderClientError::Auth(messages.join("; ")));
            }
            return Err(ProviderClientError::GraphQl(messages));
        }
    }

    match envelope.get_mut("data").map(Value::take) {
        Some(data @ Value::Object(_)) => Ok(data),
        _ => Err(ProviderClientError::Malformed("response has no data object".to_string())),
    }
}

/// Deserialize a `data` object into one of the raw shapes in [`super::types`].
pub fn decode<T: DeserializeOwned>(data: Value) -> Result<T, ProviderClientError> {
    serde_json::from_value(data).map_err(Into::into)
}
