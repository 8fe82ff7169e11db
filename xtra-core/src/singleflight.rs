//! Request coalescing
//!
//! Wraps `async_singleflight` so that concurrent loads of the same key
//! share one upstream round-trip.

use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;

use crate::error::{Error, Result};

#[derive(Clone)]
pub struct SingleFlight<K, V>
where
    K: Hash + Eq + Clone + Debug + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    group: Arc<async_singleflight::Group<K, V, Error>>,
}

impl<K, V> SingleFlight<K, V>
where
    K: Hash + Eq + Clone + Debug + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    #[must_use]
    pub fn new() -> Self {
        Self {
            group: Arc::new(async_singleflight::Group::new()),
        }
    }

    /// Run `f` unless a call for `key` is already running, in which case
    /// wait for that call's result.
    pub async fn do_work<Fut>(&self, key: K, f: Fut) -> Result<V>
    where
        Fut: std::future::Future<Output = Result<V>> + Send,
    {
        // Err(None): the leader was dropped without producing a result
        self.group.work(&key, f).await.map_err(|err| err.unwrap_or(Error::Closed))
    }
}

impl<K, V> Default for SingleFlight<K, V>
where
    K: Hash + Eq + Clone + Debug + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::{sleep, Duration};

    #[tokio::test]
    async fn test_concurrent_loads_share_one_call() {
        let sf: SingleFlight<(String, bool), u32> = SingleFlight::new();
        let calls = Arc::new(AtomicU32::new(0));

        let mut handles = vec![];
        for _ in 0..8 {
            let sf = sf.clone();
            let calls = calls.clone();
            handles.push(tokio::spawn(async move {
                sf.do_work(("shroud".to_string(), false), async move {
                    sleep(Duration::from_millis(50)).await;
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(7)
                })
                .await
            }));
        }
        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), 7);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_error_reaches_caller() {
        let sf: SingleFlight<String, u32> = SingleFlight::default();
        let err = sf
            .do_work("global".to_string(), async { Err(Error::Configuration("unreachable".into())) })
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }
}
