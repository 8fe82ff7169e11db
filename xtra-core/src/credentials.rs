//! Credential collaborator
//!
//! Token acquisition and storage live outside this crate. The core only
//! asks, per backend, which credentials to attach to the next call.

use std::sync::Arc;

use parking_lot::RwLock;
use xtra_media_providers::Credentials;

use crate::backend::BackendKind;

/// Supplies credentials per backend. Read on every request, so a provider
/// may rotate tokens between pages.
#[cfg_attr(test, mockall::automock)]
pub trait CredentialProvider: Send + Sync {
    fn credentials(&self, backend: BackendKind) -> Credentials;
}

/// In-memory credentials, replaceable at runtime
#[derive(Debug, Default)]
pub struct StaticCredentials {
    gql: RwLock<Credentials>,
    helix: RwLock<Credentials>,
}

impl StaticCredentials {
    #[must_use]
    pub fn new(gql: Credentials, helix: Credentials) -> Self {
        Self {
            gql: RwLock::new(gql),
            helix: RwLock::new(helix),
        }
    }

    #[must_use]
    pub fn shared(gql: Credentials, helix: Credentials) -> Arc<Self> {
        Arc::new(Self::new(gql, helix))
    }

    pub fn set(&self, backend: BackendKind, credentials: Credentials) {
        *self.slot(backend).write() = credentials;
    }

    fn slot(&self, backend: BackendKind) -> &RwLock<Credentials> {
        match backend {
            BackendKind::Gql => &self.gql,
            BackendKind::Helix => &self.helix,
        }
    }
}

impl CredentialProvider for StaticCredentials {
    fn credentials(&self, backend: BackendKind) -> Credentials {
        self.slot(backend).read().clone()
    }
}

/// Whether a REST (Helix) token is available
pub fn has_rest_token(provider: &dyn CredentialProvider) -> bool {
    provider.credentials(BackendKind::Helix).bare_token().is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_credentials_per_backend() {
        let creds = StaticCredentials::new(Credentials::new("web"), Credentials::new("app"));
        assert_eq!(creds.credentials(BackendKind::Gql).client_id.as_deref(), Some("web"));
        assert_eq!(creds.credentials(BackendKind::Helix).client_id.as_deref(), Some("app"));
        assert!(!has_rest_token(&creds));

        creds.set(BackendKind::Helix, Credentials::new("app").with_token("Bearer t"));
        assert!(has_rest_token(&creds));
    }

    #[test]
    fn test_mock_provider() {
        let mut mock = MockCredentialProvider::new();
        mock.expect_credentials()
            .returning(|_| Credentials::new("id").with_token("tok"));
        assert!(has_rest_token(&mock));
    }
}
