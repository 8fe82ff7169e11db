//! Response normalizers
//!
//! Map each backend's raw `data` object onto domain records plus the
//! continuation cursor. Entries missing their identity field are counted
//! in `Page::skipped` rather than dropped silently.

pub mod gql;
pub mod helix;

use crate::models::{Cursor, DomainRecord, Page};
use crate::backend::BackendKind;

/// Normalize `entries`, counting the ones `f` rejects.
pub(crate) fn collect<T, R>(entries: impl IntoIterator<Item = T>, mut f: impl FnMut(T) -> Option<R>) -> (Vec<DomainRecord>, usize)
where
    R: Into<DomainRecord>,
{
    let mut items = Vec::new();
    let mut skipped = 0;
    for entry in entries {
        match f(entry) {
            Some(record) => items.push(record.into()),
            None => skipped += 1,
        }
    }
    (items, skipped)
}

pub(crate) fn page(
    backend: BackendKind,
    (items, skipped): (Vec<DomainRecord>, usize),
    cursor: Option<&str>,
    has_more: bool,
) -> Page<DomainRecord> {
    Page::new(backend, items, cursor.and_then(Cursor::new), has_more).with_skipped(skipped)
}

pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
