//! Pages and continuation cursors

use serde::{Deserialize, Serialize};

use crate::backend::BackendKind;

/// Opaque continuation token, valid only for the backend that issued it
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cursor(String);

impl Cursor {
    /// `None` for blank tokens, which upstreams use to mean "no more"
    #[must_use]
    pub fn new(token: impl Into<String>) -> Option<Self> {
        let token = token.into();
        (!token.trim().is_empty()).then_some(Self(token))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// One page of a listing.
///
/// `cursor` is present exactly when `has_more` is true. `skipped` counts
/// upstream entries that could not be normalized; a non-zero value marks
/// the page as degraded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub cursor: Option<Cursor>,
    pub has_more: bool,
    pub skipped: usize,
    pub backend: BackendKind,
}

impl<T> Page<T> {
    /// Build a page, keeping `cursor` and `has_more` consistent.
    #[must_use]
    pub fn new(backend: BackendKind, items: Vec<T>, cursor: Option<Cursor>, has_more: bool) -> Self {
        let cursor = if has_more { cursor } else { None };
        Self {
            items,
            has_more: cursor.is_some(),
            cursor,
            skipped: 0,
            backend,
        }
    }

    /// Terminal empty page
    #[must_use]
    pub fn end(backend: BackendKind) -> Self {
        Self::new(backend, Vec::new(), None, false)
    }

    #[must_use]
    pub fn with_skipped(mut self, skipped: usize) -> Self {
        self.skipped = skipped;
        self
    }

    #[must_use]
    pub const fn is_degraded(&self) -> bool {
        self.skipped > 0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Map items, keeping pagination and degradation
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            cursor: self.cursor,
            has_more: self.has_more,
            skipped: self.skipped,
            backend: self.backend,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_cursor_is_none() {
        assert!(Cursor::new("").is_none());
        assert!(Cursor::new("  ").is_none());
        assert_eq!(Cursor::new("abc").unwrap().as_str(), "abc");
    }

    #[test]
    fn test_cursor_dropped_without_has_more() {
        let page = Page::new(BackendKind::Gql, vec![1, 2], Cursor::new("c"), false);
        assert!(page.cursor.is_none());
        assert!(!page.has_more);
    }

    #[test]
    fn test_has_more_needs_cursor() {
        let page: Page<u8> = Page::new(BackendKind::Helix, vec![], None, true);
        assert!(!page.has_more);
    }

    #[test]
    fn test_degraded() {
        let page = Page::new(BackendKind::Gql, vec!["a"], None, false).with_skipped(2);
        assert!(page.is_degraded());
        assert_eq!(page.map(str::len).items, vec![1]);
    }
}
