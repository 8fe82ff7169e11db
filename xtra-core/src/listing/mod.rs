//! Listing engine
//!
//! A listing pages through one logical query, trying backends in the
//! caller's preference order:
//!
//! ```text
//! Idle -> Loading -> Ready -> Loading -> ... -> Exhausted
//!            \-> (backend fails) -> Loading on next backend, fresh cursor
//!            \-> (all backends fail) -> Failed --retry--> Loading
//! ```
//!
//! A cursor is only ever sent back to the backend that issued it. The
//! in-flight load is shared, so concurrent `load_more` calls resolve to the
//! same page from one upstream request. Loads hold only a weak reference to
//! the listing; once every handle is dropped a late result is discarded.

pub mod source;

pub use source::{GqlSource, HelixSource, PageSource};

use std::sync::{Arc, Weak};

use futures::future::{self, BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use tracing::{info, warn};

use crate::backend::BackendKind;
use crate::error::{AggregateFailure, BackendFailure, Error, Result};
use crate::models::{Cursor, DomainRecord, LogicalQuery, Page};

/// Default number of records requested per page
pub const DEFAULT_PAGE_SIZE: u32 = 30;

/// Largest page size any backend accepts
pub const MAX_PAGE_SIZE: u32 = 100;

/// Resolves to the next page; clones resolve to the same page.
pub type PageFuture = Shared<BoxFuture<'static, Result<Page<DomainRecord>>>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingStatus {
    Idle,
    Loading,
    Ready,
    Exhausted,
    Failed,
}

/// Caller's handle on one listing. Clones share the same listing.
#[derive(Clone)]
pub struct ListingHandle {
    inner: Arc<Inner>,
}

struct Inner {
    query: LogicalQuery,
    sources: Vec<Arc<dyn PageSource>>,
    page_size: u32,
    state: Mutex<State>,
}

struct State {
    status: ListingStatus,
    /// Index of the backend currently serving the listing
    position: usize,
    /// Continuation token, tagged with the backend that issued it
    cursor: Option<(BackendKind, Cursor)>,
    /// Where the current load started; `retry` rewinds here
    anchor: (usize, Option<(BackendKind, Cursor)>),
    failures: Vec<BackendFailure>,
    last_error: Option<Error>,
    in_flight: Option<PageFuture>,
    pages: usize,
}

impl State {
    fn cursor_for(&self, backend: BackendKind) -> Option<Cursor> {
        match &self.cursor {
            Some((issuer, cursor)) if *issuer == backend => Some(cursor.clone()),
            _ => None,
        }
    }

    fn fail(&mut self, err: Error) -> Error {
        self.status = ListingStatus::Failed;
        self.last_error = Some(err.clone());
        self.in_flight = None;
        err
    }
}

impl ListingHandle {
    /// Open a listing over `sources`, tried in order.
    ///
    /// Fails fast on an invalid query or an empty source list.
    pub fn open(query: LogicalQuery, sources: Vec<Arc<dyn PageSource>>, page_size: u32) -> Result<Self> {
        query.validate()?;
        if sources.is_empty() {
            return Err(Error::Validation(
                "backend preference must contain at least one backend".to_string(),
            ));
        }
        Ok(Self {
            inner: Arc::new(Inner {
                query,
                sources,
                page_size: page_size.clamp(1, MAX_PAGE_SIZE),
                state: Mutex::new(State {
                    status: ListingStatus::Idle,
                    position: 0,
                    cursor: None,
                    anchor: (0, None),
                    failures: Vec::new(),
                    last_error: None,
                    in_flight: None,
                    pages: 0,
                }),
            }),
        })
    }

    /// Fetch the next page.
    ///
    /// While a load is running this returns that same load. Once the
    /// listing is exhausted it yields empty final pages; once it has
    /// failed it yields the failure until [`retry`](Self::retry).
    pub fn load_more(&self) -> PageFuture {
        let mut state = self.inner.state.lock();
        match state.status {
            ListingStatus::Loading => {
                if let Some(in_flight) = &state.in_flight {
                    return in_flight.clone();
                }
            }
            ListingStatus::Exhausted => {
                let backend = self.inner.sources[state.position].kind();
                return ready(Ok(Page::end(backend)));
            }
            ListingStatus::Failed => {
                return ready(Err(state.last_error.clone().unwrap_or(Error::Closed)));
            }
            ListingStatus::Idle | ListingStatus::Ready => {}
        }
        self.start(&mut state)
    }

    /// Re-attempt a failed load, starting again from the backend and
    /// cursor the failed load started from. Otherwise same as `load_more`.
    pub fn retry(&self) -> PageFuture {
        {
            let mut state = self.inner.state.lock();
            if state.status == ListingStatus::Failed {
                let (position, cursor) = state.anchor.clone();
                info!(query = %self.inner.query.describe(), backend = %self.inner.sources[position].kind(), "Retrying listing");
                state.position = position;
                state.cursor = cursor;
                state.last_error = None;
                return self.start(&mut state);
            }
        }
        self.load_more()
    }

    fn start(&self, state: &mut State) -> PageFuture {
        state.status = ListingStatus::Loading;
        state.anchor = (state.position, state.cursor.clone());
        state.failures.clear();
        let load = run(Arc::downgrade(&self.inner)).boxed().shared();
        state.in_flight = Some(load.clone());
        load
    }

    #[must_use]
    pub fn status(&self) -> ListingStatus {
        self.inner.state.lock().status
    }

    #[must_use]
    pub fn query(&self) -> &LogicalQuery {
        &self.inner.query
    }

    /// Backend that served, or will serve, the next page
    #[must_use]
    pub fn backend(&self) -> BackendKind {
        let position = self.inner.state.lock().position;
        self.inner.sources[position].kind()
    }

    /// Backend failures recorded during the most recent load
    #[must_use]
    pub fn failures(&self) -> Vec<BackendFailure> {
        self.inner.state.lock().failures.clone()
    }

    #[must_use]
    pub fn last_error(&self) -> Option<Error> {
        self.inner.state.lock().last_error.clone()
    }

    /// Pages delivered so far
    #[must_use]
    pub fn pages_loaded(&self) -> usize {
        self.inner.state.lock().pages
    }
}

impl std::fmt::Debug for ListingHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("ListingHandle")
            .field("query", &self.inner.query)
            .field("status", &state.status)
            .field("position", &state.position)
            .field("pages", &state.pages)
            .finish_non_exhaustive()
    }
}

fn ready(result: Result<Page<DomainRecord>>) -> PageFuture {
    future::ready(result).boxed().shared()
}

/// One load: walk the preference list from the current position until a
/// backend yields a page or every remaining backend has failed.
async fn run(listing: Weak<Inner>) -> Result<Page<DomainRecord>> {
    loop {
        let (source, query, cursor, page_size) = {
            let inner = listing.upgrade().ok_or(Error::Closed)?;
            let state = inner.state.lock();
            let source = Arc::clone(&inner.sources[state.position]);
            let cursor = state.cursor_for(source.kind());
            (source, inner.query.clone(), cursor, inner.page_size)
        };
        let backend = source.kind();

        let result = source.fetch(&query, cursor.as_ref(), page_size).await;

        // Dropped while the request was out: discard the result.
        let inner = listing.upgrade().ok_or(Error::Closed)?;
        let mut state = inner.state.lock();

        let err = match result {
            Ok(page) => return Ok(accept(&mut state, &query, cursor, page)),
            Err(err) if err.allows_fallback() => err,
            Err(err) => {
                info!(query = %query.describe(), backend = %backend, error = %err, "Listing failed");
                return Err(state.fail(err));
            }
        };

        state.failures.push(BackendFailure { backend, error: err.clone() });
        state.cursor = None;
        state.position += 1;
        if state.position >= inner.sources.len() {
            state.position = inner.sources.len() - 1;
            let aggregate = Error::from(AggregateFailure { failures: state.failures.clone() });
            info!(query = %query.describe(), error = %aggregate, "Listing failed on every backend");
            return Err(state.fail(aggregate));
        }
        warn!(
            query = %query.describe(),
            failed = %backend,
            next = %inner.sources[state.position].kind(),
            error = %err,
            "Backend failed, falling back"
        );
    }
}

fn accept(state: &mut State, query: &LogicalQuery, sent: Option<Cursor>, page: Page<DomainRecord>) -> Page<DomainRecord> {
    let backend = page.backend;
    state.pages += 1;
    state.in_flight = None;
    state.failures.clear();

    if page.is_degraded() {
        warn!(
            query = %query.describe(),
            backend = %backend,
            skipped = page.skipped,
            "Page degraded: some entries could not be normalized"
        );
    }

    let stalled = page.has_more && page.cursor.is_some() && page.cursor == sent;
    if stalled {
        warn!(query = %query.describe(), backend = %backend, "Backend returned the cursor it was given, ending listing");
    }

    match page.cursor.clone() {
        Some(next) if !stalled => {
            state.cursor = Some((backend, next));
            state.status = ListingStatus::Ready;
            page
        }
        _ => {
            state.cursor = None;
            state.status = ListingStatus::Exhausted;
            info!(query = %query.describe(), backend = %backend, pages = state.pages, "Listing exhausted");
            Page {
                cursor: None,
                has_more: false,
                ..page
            }
        }
    }
}
