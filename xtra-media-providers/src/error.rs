//! Shared provider client error types
//!
//! Common error enum used by both upstream clients (GraphQL and Helix), plus
//! the response helpers that classify HTTP failures.

use thiserror::Error;

/// Maximum response body size for upstream HTTP calls (16 MB).
pub const MAX_RESPONSE_SIZE: usize = 16 * 1024 * 1024;

/// Coarse failure class of a transport error.
///
/// `Network` failures are worth retrying by the caller; `Auth` and
/// `Malformed` are not (the same request would fail the same way).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportErrorKind {
    Network,
    Auth,
    Malformed,
}

impl TransportErrorKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Auth => "auth",
            Self::Malformed => "malformed",
        }
    }
}

impl std::fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Common error type for the upstream HTTP clients and request builders.
#[derive(Debug, Error)]
pub enum ProviderClientError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("HTTP error {status} for {url}")]
    Http { status: reqwest::StatusCode, url: String },

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Missing required credential: {0}")]
    MissingCredential(&'static str),

    #[error("Malformed response: {0}")]
    Malformed(String),

    #[error("GraphQL errors: {}", .0.join("; "))]
    GraphQl(Vec<String>),

    #[error("Invalid header value: {0}")]
    InvalidHeader(String),

    #[error("Response too large ({size} bytes, max {MAX_RESPONSE_SIZE})")]
    ResponseTooLarge { size: u64 },

    #[error("Validation error: {0}")]
    Validation(String),
}

impl ProviderClientError {
    /// Classify this error for fallback and retry decisions.
    ///
    /// `Validation` never reaches the wire and is reported as `Malformed`
    /// here; callers that care about it match on the variant directly.
    #[must_use]
    pub fn kind(&self) -> TransportErrorKind {
        match self {
            Self::Network(_) | Self::Timeout(_) => TransportErrorKind::Network,
            Self::Http { status, .. } => {
                if *status == reqwest::StatusCode::UNAUTHORIZED
                    || *status == reqwest::StatusCode::FORBIDDEN
                {
                    TransportErrorKind::Auth
                } else if status.is_server_error()
                    || *status == reqwest::StatusCode::TOO_MANY_REQUESTS
                    || *status == reqwest::StatusCode::REQUEST_TIMEOUT
                {
                    TransportErrorKind::Network
                } else {
                    TransportErrorKind::Malformed
                }
            }
            Self::Auth(_) | Self::MissingCredential(_) => TransportErrorKind::Auth,
            Self::Malformed(_)
            | Self::GraphQl(_)
            | Self::InvalidHeader(_)
            | Self::ResponseTooLarge { .. }
            | Self::Validation(_) => TransportErrorKind::Malformed,
        }
    }

    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.kind() == TransportErrorKind::Network
    }

    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

/// Read a response body with size limit and deserialize as JSON.
///
/// Checks `Content-Length` hint first (if available), then enforces the
/// limit on the actual body bytes before deserializing.
pub async fn json_with_limit<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, ProviderClientError> {
    if let Some(cl) = response.content_length() {
        if cl as usize > MAX_RESPONSE_SIZE {
            return Err(ProviderClientError::ResponseTooLarge { size: cl });
        }
    }
    let bytes = response.bytes().await?;
    if bytes.len() > MAX_RESPONSE_SIZE {
        return Err(ProviderClientError::ResponseTooLarge { size: bytes.len() as u64 });
    }
    serde_json::from_slice(&bytes).map_err(Into::into)
}

/// Check HTTP response status before processing body.
pub fn check_response(resp: reqwest::Response) -> Result<reqwest::Response, ProviderClientError> {
    let status = resp.status();
    if status.is_client_error() || status.is_server_error() {
        return Err(ProviderClientError::Http {
            status,
            url: resp.url().to_string(),
        });
    }
    Ok(resp)
}

impl From<reqwest::Error> for ProviderClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else if err.is_decode() {
            Self::Malformed(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ProviderClientError {
    fn from(err: serde_json::Error) -> Self {
        Self::Malformed(err.to_string())
    }
}

impl From<reqwest::header::InvalidHeaderValue> for ProviderClientError {
    fn from(err: reqwest::header::InvalidHeaderValue) -> Self {
        Self::InvalidHeader(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_network() {
        let err = ProviderClientError::Network("connection refused".to_string());
        assert_eq!(err.to_string(), "Network error: connection refused");
    }

    #[test]
    fn test_error_display_http() {
        let err = ProviderClientError::Http {
            status: reqwest::StatusCode::NOT_FOUND,
            url: "https://example.com/api".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP error 404 Not Found for https://example.com/api");
    }

    #[test]
    fn test_error_display_graphql() {
        let err = ProviderClientError::GraphQl(vec!["PersistedQueryNotFound".to_string(), "boom".to_string()]);
        assert_eq!(err.to_string(), "GraphQL errors: PersistedQueryNotFound; boom");
    }

    #[test]
    fn test_kind_http_status() {
        let http = |status| ProviderClientError::Http { status, url: String::new() };
        assert_eq!(http(reqwest::StatusCode::UNAUTHORIZED).kind(), TransportErrorKind::Auth);
        assert_eq!(http(reqwest::StatusCode::FORBIDDEN).kind(), TransportErrorKind::Auth);
        assert_eq!(http(reqwest::StatusCode::BAD_GATEWAY).kind(), TransportErrorKind::Network);
        assert_eq!(http(reqwest::StatusCode::TOO_MANY_REQUESTS).kind(), TransportErrorKind::Network);
        assert_eq!(http(reqwest::StatusCode::BAD_REQUEST).kind(), TransportErrorKind::Malformed);
    }

    #[test]
    fn test_kind_other_variants() {
        assert_eq!(ProviderClientError::Timeout("t".into()).kind(), TransportErrorKind::Network);
        assert_eq!(ProviderClientError::MissingCredential("Client-Id").kind(), TransportErrorKind::Auth);
        assert_eq!(ProviderClientError::GraphQl(vec![]).kind(), TransportErrorKind::Malformed);
        assert!(ProviderClientError::Network("x".into()).is_retryable());
        assert!(!ProviderClientError::Auth("x".into()).is_retryable());
        assert!(ProviderClientError::Validation("x".into()).is_validation());
    }

    #[test]
    fn test_error_from_serde_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let err: ProviderClientError = json_err.into();
        assert!(matches!(err, ProviderClientError::Malformed(_)));
    }

    #[test]
    fn test_error_display_response_too_large() {
        let err = ProviderClientError::ResponseTooLarge { size: 20_000_000 };
        let msg = err.to_string();
        assert!(msg.contains("20000000"));
        assert!(msg.contains(&MAX_RESPONSE_SIZE.to_string()));
    }
}
