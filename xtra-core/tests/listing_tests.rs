//! Listing engine behaviour across backends
//!
//! Run with: cargo test --test listing_tests

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{RngExt, SeedableRng};
use tokio::sync::Notify;
use xtra_core::models::Game;
use xtra_core::{BackendKind, Cursor, DomainRecord, Error, ListingHandle, ListingStatus, LogicalQuery, Page, PageSource};
use xtra_media_providers::TransportErrorKind;

fn game(name: &str) -> DomainRecord {
    DomainRecord::Game(Game {
        id: None,
        name: name.to_string(),
        box_art_url: None,
        viewer_count: None,
        broadcaster_count: None,
        tags: Vec::new(),
    })
}

fn network(backend: BackendKind) -> Error {
    Error::Transport {
        backend,
        kind: TransportErrorKind::Network,
        message: "connection reset".to_string(),
    }
}

fn top_games() -> LogicalQuery {
    LogicalQuery::TopGames { tags: Vec::new() }
}

/// Serves a fixed script of results and records the cursors it receives
struct Scripted {
    kind: BackendKind,
    script: Mutex<Vec<Result<Page<DomainRecord>, Error>>>,
    seen: Mutex<Vec<Option<String>>>,
}

impl Scripted {
    fn new(kind: BackendKind, mut script: Vec<Result<Page<DomainRecord>, Error>>) -> Arc<Self> {
        script.reverse();
        Arc::new(Self {
            kind,
            script: Mutex::new(script),
            seen: Mutex::new(Vec::new()),
        })
    }

    fn page(kind: BackendKind, name: &str, cursor: Option<&str>) -> Result<Page<DomainRecord>, Error> {
        Ok(Page::new(kind, vec![game(name)], cursor.and_then(Cursor::new), cursor.is_some()))
    }
}

#[async_trait]
impl PageSource for Scripted {
    fn kind(&self) -> BackendKind {
        self.kind
    }

    async fn fetch(&self, _query: &LogicalQuery, cursor: Option<&Cursor>, _page_size: u32) -> Result<Page<DomainRecord>, Error> {
        self.seen.lock().push(cursor.map(|c| c.as_str().to_string()));
        self.script.lock().pop().unwrap_or_else(|| Ok(Page::end(self.kind)))
    }
}

/// Holds every fetch until the test opens the gate
struct Gated {
    calls: AtomicUsize,
    started: Notify,
    gate: Notify,
}

impl Gated {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            started: Notify::new(),
            gate: Notify::new(),
        })
    }
}

#[async_trait]
impl PageSource for Gated {
    fn kind(&self) -> BackendKind {
        BackendKind::Gql
    }

    async fn fetch(&self, _query: &LogicalQuery, _cursor: Option<&Cursor>, _page_size: u32) -> Result<Page<DomainRecord>, Error> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        self.started.notify_one();
        self.gate.notified().await;
        Ok(Page::new(
            BackendKind::Gql,
            vec![game(&format!("game-{call}"))],
            Cursor::new(format!("c{call}")),
            true,
        ))
    }
}

/// Issues `<backend>-<n>` cursors and fails at random
struct Flaky {
    kind: BackendKind,
    rng: Mutex<StdRng>,
    pages: usize,
    seen: Mutex<Vec<String>>,
}

impl Flaky {
    fn new(kind: BackendKind, seed: u64, pages: usize) -> Arc<Self> {
        Arc::new(Self {
            kind,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
            pages,
            seen: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl PageSource for Flaky {
    fn kind(&self) -> BackendKind {
        self.kind
    }

    async fn fetch(&self, _query: &LogicalQuery, cursor: Option<&Cursor>, _page_size: u32) -> Result<Page<DomainRecord>, Error> {
        let served = match cursor {
            Some(cursor) => {
                self.seen.lock().push(cursor.as_str().to_string());
                let (_, n) = cursor.as_str().rsplit_once('-').unwrap_or_default();
                n.parse::<usize>().unwrap_or(0)
            }
            None => 0,
        };
        if self.rng.lock().random_bool(0.3) {
            return Err(network(self.kind));
        }
        let next = served + 1;
        let cursor = (next < self.pages).then(|| format!("{}-{next}", self.kind));
        Ok(Page::new(
            self.kind,
            vec![game(&format!("{}-{served}", self.kind))],
            cursor.and_then(Cursor::new),
            next < self.pages,
        ))
    }
}

fn source<S: PageSource + 'static>(source: &Arc<S>) -> Arc<dyn PageSource> {
    source.clone()
}

#[tokio::test]
async fn test_fallback_restarts_next_backend_from_first_page() {
    let gql = Scripted::new(
        BackendKind::Gql,
        vec![
            Scripted::page(BackendKind::Gql, "gql-page-1", Some("g1")),
            Err(network(BackendKind::Gql)),
        ],
    );
    let helix = Scripted::new(
        BackendKind::Helix,
        vec![Scripted::page(BackendKind::Helix, "helix-page-1", Some("h1"))],
    );
    let listing = ListingHandle::open(top_games(), vec![source(&gql), source(&helix)], 30).unwrap();

    let first = listing.load_more().await.unwrap();
    assert_eq!(first.backend, BackendKind::Gql);
    assert_eq!(listing.status(), ListingStatus::Ready);

    let second = listing.load_more().await.unwrap();
    assert_eq!(second.backend, BackendKind::Helix);
    assert_eq!(listing.status(), ListingStatus::Ready);
    assert_eq!(listing.backend(), BackendKind::Helix);

    assert_eq!(*gql.seen.lock(), vec![None, Some("g1".to_string())]);
    // the GraphQL cursor never reaches Helix
    assert_eq!(*helix.seen.lock(), vec![None]);

    // and the listing stays on Helix afterwards
    listing.load_more().await.unwrap();
    assert_eq!(*helix.seen.lock(), vec![None, Some("h1".to_string())]);
    assert_eq!(gql.seen.lock().len(), 2);
}

#[tokio::test]
async fn test_concurrent_loads_share_one_request() {
    let gated = Gated::new();
    let listing = ListingHandle::open(top_games(), vec![source(&gated)], 30).unwrap();

    let a = listing.load_more();
    let b = listing.load_more();
    assert_eq!(listing.status(), ListingStatus::Loading);
    let both = tokio::spawn(async move { futures::join!(a, b) });

    gated.started.notified().await;
    let c = listing.load_more();
    gated.gate.notify_one();

    let (a, b) = both.await.unwrap();
    let c = c.await;
    assert_eq!(gated.calls.load(Ordering::SeqCst), 1);
    assert_eq!(a.unwrap(), b.unwrap());
    assert_eq!(c.unwrap().items, vec![game("game-0")]);
    assert_eq!(listing.pages_loaded(), 1);
}

#[tokio::test]
async fn test_result_after_drop_is_discarded() {
    let gated = Gated::new();
    let listing = ListingHandle::open(top_games(), vec![source(&gated)], 30).unwrap();

    let load = tokio::spawn(listing.load_more());
    gated.started.notified().await;
    drop(listing);
    gated.gate.notify_one();

    let result = load.await.unwrap();
    assert!(matches!(result, Err(Error::Closed)));
    assert_eq!(gated.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_every_backend_failing_is_aggregate() {
    let gql = Scripted::new(BackendKind::Gql, vec![Err(network(BackendKind::Gql))]);
    let helix = Scripted::new(
        BackendKind::Helix,
        vec![Err(Error::Transport {
            backend: BackendKind::Helix,
            kind: TransportErrorKind::Auth,
            message: "missing token".to_string(),
        })],
    );
    let listing = ListingHandle::open(top_games(), vec![source(&gql), source(&helix)], 30).unwrap();

    let err = listing.load_more().await.unwrap_err();
    let Error::Aggregate(aggregate) = &err else {
        panic!("expected aggregate failure, got {err:?}");
    };
    assert_eq!(aggregate.backends(), vec![BackendKind::Gql, BackendKind::Helix]);
    assert_eq!(aggregate.failures[1].error.transport_kind(), Some(TransportErrorKind::Auth));
    assert_eq!(listing.status(), ListingStatus::Failed);

    // retry starts over from the first backend
    let page = listing.retry().await.unwrap();
    assert_eq!(page.backend, BackendKind::Gql);
    assert_eq!(listing.status(), ListingStatus::Exhausted);
}

#[tokio::test]
async fn test_random_failures_never_leak_cursors() {
    for seed in 0..64u64 {
        let gql = Flaky::new(BackendKind::Gql, seed, 4);
        let helix = Flaky::new(BackendKind::Helix, seed.wrapping_mul(7919) + 1, 6);
        let listing = ListingHandle::open(top_games(), vec![source(&gql), source(&helix)], 10).unwrap();

        let mut loads = 0;
        let mut retries = 0;
        loop {
            loads += 1;
            assert!(loads < 200, "seed {seed}: listing did not terminate");
            match listing.status() {
                ListingStatus::Exhausted => break,
                ListingStatus::Failed if retries == 3 => break,
                ListingStatus::Failed => {
                    retries += 1;
                    let _ = listing.retry().await;
                }
                _ => {
                    let _ = listing.load_more().await;
                }
            }
        }

        assert!(
            gql.seen.lock().iter().all(|c| c.starts_with("gql-")),
            "seed {seed}: foreign cursor sent to gql"
        );
        assert!(
            helix.seen.lock().iter().all(|c| c.starts_with("helix-")),
            "seed {seed}: foreign cursor sent to helix"
        );
    }
}

#[tokio::test]
async fn test_exhausted_listing_makes_no_more_requests() {
    let gql = Scripted::new(BackendKind::Gql, vec![Scripted::page(BackendKind::Gql, "only", None)]);
    let listing = ListingHandle::open(top_games(), vec![source(&gql)], 30).unwrap();

    let page = listing.load_more().await.unwrap();
    assert!(!page.has_more);
    for _ in 0..3 {
        let tail = listing.load_more().await.unwrap();
        assert!(tail.is_empty());
    }
    assert_eq!(gql.seen.lock().len(), 1);
}

#[test]
fn test_open_rejects_empty_backend_list() {
    let err = ListingHandle::open(top_games(), Vec::new(), 30).unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
}
