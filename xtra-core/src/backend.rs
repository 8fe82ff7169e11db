//! Backend identity and caller-declared fallback order

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Upstream API a page can be fetched from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Persisted-query GraphQL endpoint
    Gql,
    /// Helix REST endpoint
    Helix,
}

impl BackendKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Gql => "gql",
            Self::Helix => "helix",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "gql" | "graphql" => Some(Self::Gql),
            "helix" | "rest" => Some(Self::Helix),
            _ => None,
        }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for BackendKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s).ok_or_else(|| Error::Validation(format!("unknown backend `{s}`")))
    }
}

/// Ordered, non-empty list of backends to try for one listing.
///
/// Repeated entries are collapsed to their first position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackendPreference(Vec<BackendKind>);

impl BackendPreference {
    pub fn new(order: impl IntoIterator<Item = BackendKind>) -> Result<Self> {
        let mut backends = Vec::new();
        for kind in order {
            if !backends.contains(&kind) {
                backends.push(kind);
            }
        }
        if backends.is_empty() {
            return Err(Error::Validation(
                "backend preference must contain at least one backend".to_string(),
            ));
        }
        Ok(Self(backends))
    }

    /// Single-backend preference
    #[must_use]
    pub fn only(kind: BackendKind) -> Self {
        Self(vec![kind])
    }

    #[must_use]
    pub fn as_slice(&self) -> &[BackendKind] {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Never true for a constructed preference
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = BackendKind> + '_ {
        self.0.iter().copied()
    }
}

impl Default for BackendPreference {
    fn default() -> Self {
        Self(vec![BackendKind::Gql, BackendKind::Helix])
    }
}

impl<'de> Deserialize<'de> for BackendPreference {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let order = Vec::<BackendKind>::deserialize(deserializer)?;
        Self::new(order).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_preference_rejected() {
        let err = BackendPreference::new(Vec::new()).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_duplicates_collapse() {
        let pref = BackendPreference::new([BackendKind::Helix, BackendKind::Gql, BackendKind::Helix]).unwrap();
        assert_eq!(pref.as_slice(), &[BackendKind::Helix, BackendKind::Gql]);
    }

    #[test]
    fn test_parse() {
        assert_eq!("GQL".parse::<BackendKind>().unwrap(), BackendKind::Gql);
        assert_eq!(BackendKind::parse("rest"), Some(BackendKind::Helix));
        assert!("kraken".parse::<BackendKind>().is_err());
    }

    #[test]
    fn test_deserialize_rejects_empty() {
        assert!(serde_json::from_str::<BackendPreference>("[]").is_err());
        let pref: BackendPreference = serde_json::from_str(r#"["helix"]"#).unwrap();
        assert_eq!(pref, BackendPreference::only(BackendKind::Helix));
    }
}
