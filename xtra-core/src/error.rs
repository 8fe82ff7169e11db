use thiserror::Error;
use xtra_media_providers::{ProviderClientError, TransportErrorKind};

use crate::backend::BackendKind;

#[derive(Error, Debug, Clone)]
pub enum Error {
    /// Missing or malformed caller input; never retried
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("{backend} {kind} error: {message}")]
    Transport {
        backend: BackendKind,
        kind: TransportErrorKind,
        message: String,
    },

    #[error("{backend} cannot serve {query}")]
    Unsupported { backend: BackendKind, query: String },

    #[error(transparent)]
    Aggregate(#[from] AggregateFailure),

    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Every handle was dropped, or the leading request was abandoned,
    /// before the result arrived
    #[error("Closed before the request completed")]
    Closed,
}

impl Error {
    /// Convert a client error raised while talking to `backend`.
    #[must_use]
    pub fn from_provider(backend: BackendKind, err: ProviderClientError) -> Self {
        if let ProviderClientError::Validation(message) = err {
            return Self::Validation(message);
        }
        Self::Transport {
            backend,
            kind: err.kind(),
            message: err.to_string(),
        }
    }

    /// Whether the listing engine may move on to the next backend
    #[must_use]
    pub const fn allows_fallback(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::Unsupported { .. })
    }

    #[must_use]
    pub const fn transport_kind(&self) -> Option<TransportErrorKind> {
        match self {
            Self::Transport { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

/// One backend's reason for failing a load
#[derive(Debug, Clone)]
pub struct BackendFailure {
    pub backend: BackendKind,
    pub error: Error,
}

/// Every backend in the preference list failed
#[derive(Debug, Clone, Default)]
pub struct AggregateFailure {
    pub failures: Vec<BackendFailure>,
}

impl AggregateFailure {
    #[must_use]
    pub fn backends(&self) -> Vec<BackendKind> {
        self.failures.iter().map(|f| f.backend).collect()
    }
}

impl std::fmt::Display for AggregateFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "All backends failed")?;
        for (i, failure) in self.failures.iter().enumerate() {
            let sep = if i == 0 { ": " } else { "; " };
            write!(f, "{sep}[{}] {}", failure.backend, failure.error)?;
        }
        Ok(())
    }
}

impl std::error::Error for AggregateFailure {}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_provider_keeps_validation() {
        let err = Error::from_provider(BackendKind::Gql, ProviderClientError::Validation("no login".into()));
        assert!(matches!(err, Error::Validation(_)));
        assert!(!err.allows_fallback());
    }

    #[test]
    fn test_from_provider_classifies_transport() {
        let err = Error::from_provider(BackendKind::Helix, ProviderClientError::MissingCredential("Authorization"));
        assert_eq!(err.transport_kind(), Some(TransportErrorKind::Auth));
        assert!(err.allows_fallback());
        assert!(err.to_string().starts_with("helix auth error"));
    }

    #[test]
    fn test_aggregate_display_lists_every_backend() {
        let agg = AggregateFailure {
            failures: vec![
                BackendFailure {
                    backend: BackendKind::Gql,
                    error: Error::Transport {
                        backend: BackendKind::Gql,
                        kind: TransportErrorKind::Network,
                        message: "timeout".into(),
                    },
                },
                BackendFailure {
                    backend: BackendKind::Helix,
                    error: Error::Unsupported {
                        backend: BackendKind::Helix,
                        query: "followed videos".into(),
                    },
                },
            ],
        };
        let text = Error::from(agg).to_string();
        assert!(text.contains("[gql] gql network error: timeout"));
        assert!(text.contains("[helix] helix cannot serve followed videos"));
    }
}
