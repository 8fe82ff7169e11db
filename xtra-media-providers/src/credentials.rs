//! Per-request credentials attached by the clients

/// Credentials for one backend call.
///
/// Acquisition and storage happen elsewhere; clients only read these.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub client_id: Option<String>,
    pub token: Option<String>,
    pub device_id: Option<String>,
    pub integrity_token: Option<String>,
}

impl Credentials {
    #[must_use]
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            client_id: Some(client_id.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    #[must_use]
    pub fn with_device_id(mut self, device_id: impl Into<String>) -> Self {
        self.device_id = Some(device_id.into());
        self
    }

    #[must_use]
    pub fn with_integrity_token(mut self, integrity_token: impl Into<String>) -> Self {
        self.integrity_token = Some(integrity_token.into());
        self
    }

    /// Token with surrounding whitespace and any `OAuth `/`Bearer ` prefix removed
    #[must_use]
    pub fn bare_token(&self) -> Option<&str> {
        let token = self.token.as_deref()?.trim();
        let token = token
            .strip_prefix("OAuth ")
            .or_else(|| token.strip_prefix("Bearer "))
            .unwrap_or(token)
            .trim();
        (!token.is_empty()).then_some(token)
    }

    pub(crate) fn non_blank(value: Option<&String>) -> Option<&str> {
        value.map(|v| v.trim()).filter(|v| !v.is_empty())
    }
}

// Secrets stay out of logs.
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("device_id", &self.device_id)
            .field("integrity_token", &self.integrity_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_token_strips_prefix() {
        assert_eq!(Credentials::new("id").with_token("OAuth abc").bare_token(), Some("abc"));
        assert_eq!(Credentials::new("id").with_token("Bearer  xyz ").bare_token(), Some("xyz"));
        assert_eq!(Credentials::new("id").with_token("plain").bare_token(), Some("plain"));
        assert_eq!(Credentials::new("id").with_token("  ").bare_token(), None);
        assert_eq!(Credentials::new("id").bare_token(), None);
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let creds = Credentials::new("id").with_token("secret").with_integrity_token("also-secret");
        let printed = format!("{creds:?}");
        assert!(!printed.contains("secret"));
        assert!(printed.contains("<redacted>"));
    }
}
