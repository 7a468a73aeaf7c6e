//! Concurrency-safe memoization of discovery, fetch and decision work.
//!
//! Each [`Cache`] keys shared computations by a deterministic string. A
//! slot is explicitly tri-state: absent, in-flight, or resolved — a
//! legitimately cached negative value (such as a denial, or "no ACL link")
//! is a resolved value, never a miss. Claiming a slot is a single
//! indivisible step under the cache lock, so at most one computation runs
//! per key no matter how many callers race for it.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use tokio::sync::Mutex;
use url::Url;

use crate::{AccessControlError, AccessVerdict, FetchedDocument};

type SharedComputation<T> = Shared<BoxFuture<'static, Result<T, AccessControlError>>>;

struct Slot<T>
where
    T: Clone,
{
    /// Identifies the computation occupying this slot, so that eviction of
    /// a failed computation never clobbers a fresher retry.
    generation: u64,
    computation: SharedComputation<T>,
}

/// A keyed memoization table whose entries are shared computations.
///
/// Cloning the cache produces another handle onto the same table; a cache
/// may be shared across concurrent requests, and that is its purpose. A
/// computation that terminates in error is evicted so a later call can
/// retry; successful completions remain for the cache's lifetime.
#[derive(Clone)]
pub struct Cache<T>
where
    T: Clone,
{
    slots: Arc<Mutex<HashMap<String, Slot<T>>>>,
    generation: Arc<AtomicU64>,
}

impl<T> Cache<T>
where
    T: Clone,
{
    /// Create a new empty cache.
    pub fn new() -> Self {
        Self {
            slots: Arc::new(Mutex::new(HashMap::new())),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// The number of occupied slots, in-flight or resolved.
    pub async fn len(&self) -> usize {
        self.slots.lock().await.len()
    }

    /// Whether the cache has no occupied slots.
    pub async fn is_empty(&self) -> bool {
        self.slots.lock().await.is_empty()
    }
}

impl<T> Default for Cache<T>
where
    T: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Cache<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Return the computation stored under `key`, starting `compute` only
    /// when the slot is empty. Every concurrent caller for the same key
    /// observes the output of the single underlying computation.
    pub async fn apply<F>(&self, key: &str, compute: F) -> Result<T, AccessControlError>
    where
        F: Future<Output = Result<T, AccessControlError>> + Send + 'static,
    {
        let (generation, computation) = {
            let mut slots = self.slots.lock().await;
            match slots.get(key) {
                Some(slot) => (slot.generation, slot.computation.clone()),
                None => {
                    let generation = self.generation.fetch_add(1, Ordering::Relaxed);
                    let computation = compute.boxed().shared();
                    slots.insert(
                        key.to_owned(),
                        Slot {
                            generation,
                            computation: computation.clone(),
                        },
                    );
                    (generation, computation)
                }
            }
        };

        let result = computation.await;

        if result.is_err() {
            let mut slots = self.slots.lock().await;
            if slots.get(key).map(|slot| slot.generation) == Some(generation) {
                slots.remove(key);
            }
        }

        result
    }
}

/// Memoize `compute` under `key` when a cache is supplied; compute directly
/// without recording anything when it is not.
pub async fn memoize<T, F>(
    cache: Option<&Cache<T>>,
    key: &str,
    compute: F,
) -> Result<T, AccessControlError>
where
    T: Clone + Send + Sync + 'static,
    F: Future<Output = Result<T, AccessControlError>> + Send + 'static,
{
    match cache {
        Some(cache) => cache.apply(key, compute).await,
        None => compute.await,
    }
}

/// The caller-owned bundle of the three independently-keyed caches used at
/// different layers of resolution. Any of the three may be absent, which
/// disables caching for that layer. The bundle has no built-in teardown;
/// its lifetime (process-wide, per-connection, or otherwise) is the
/// caller's choice.
#[derive(Clone, Default)]
pub struct CacheBundle {
    /// ACL-location discoveries, keyed by probed resource. A cached `None`
    /// records that no ACL link was advertised.
    pub locations: Option<Cache<Option<Url>>>,
    /// Fetched document bodies, keyed by `GET:<url>`.
    pub documents: Option<Cache<FetchedDocument>>,
    /// Access verdicts, keyed by `(modes, resource, agent-or-anonymous)`.
    pub decisions: Option<Cache<AccessVerdict>>,
}

impl CacheBundle {
    /// A bundle with all three caches enabled, ready to be shared across
    /// requests.
    pub fn enabled() -> Self {
        Self {
            locations: Some(Cache::new()),
            documents: Some(Cache::new()),
            decisions: Some(Cache::new()),
        }
    }

    /// A bundle that caches nothing. Equivalent to [`CacheBundle::default`].
    pub fn disabled() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;
    use std::sync::atomic::Ordering::SeqCst;

    use super::*;

    #[tokio::test]
    async fn it_runs_one_computation_for_concurrent_callers() {
        let cache = Cache::<u32>::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let (gate, gated) = tokio::sync::oneshot::channel::<()>();

        let first = {
            let cache = cache.clone();
            let calls = calls.clone();
            tokio::spawn(async move {
                cache
                    .apply("key", async move {
                        calls.fetch_add(1, SeqCst);
                        gated.await.ok();
                        Ok(7)
                    })
                    .await
            })
        };

        // Wait until the first computation is claimed and in flight.
        while calls.load(SeqCst) == 0 {
            tokio::task::yield_now().await;
        }

        let second = {
            let cache = cache.clone();
            let calls = calls.clone();
            tokio::spawn(async move {
                cache
                    .apply("key", async move {
                        calls.fetch_add(1, SeqCst);
                        Ok(9)
                    })
                    .await
            })
        };

        gate.send(()).unwrap();

        assert_eq!(first.await.unwrap().unwrap(), 7);
        assert_eq!(second.await.unwrap().unwrap(), 7);
        assert_eq!(calls.load(SeqCst), 1);
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn it_keeps_resolved_values_for_the_cache_lifetime() {
        let cache = Cache::new();

        let value = cache.apply("key", async { Ok(3u32) }).await.unwrap();
        assert_eq!(value, 3);

        // A later computation for the same key never runs.
        let value = cache.apply("key", async { Ok(4u32) }).await.unwrap();
        assert_eq!(value, 3);
    }

    #[tokio::test]
    async fn it_evicts_failed_computations_so_retries_can_succeed() {
        let cache = Cache::new();

        let result = cache
            .apply("key", async {
                Err::<u32, _>(AccessControlError::Transport("connection reset".into()))
            })
            .await;
        assert!(result.is_err());
        assert!(cache.is_empty().await);

        let value = cache.apply("key", async { Ok(11u32) }).await.unwrap();
        assert_eq!(value, 11);
    }

    #[tokio::test]
    async fn it_keeps_a_fresh_retry_when_a_stale_eviction_arrives_late() {
        let cache = Cache::<u32>::new();
        let claimed = Arc::new(AtomicUsize::new(0));
        let (gate, gated) = tokio::sync::oneshot::channel::<()>();

        // A waiter that claims the slot with a computation that will fail,
        // and whose eviction attempt runs only after the retry below has
        // already reoccupied the slot.
        let late_waiter = {
            let cache = cache.clone();
            let claimed = claimed.clone();
            tokio::spawn(async move {
                cache
                    .apply("key", async move {
                        claimed.fetch_add(1, SeqCst);
                        gated.await.ok();
                        Err::<u32, _>(AccessControlError::Transport("connection reset".into()))
                    })
                    .await
            })
        };

        while claimed.load(SeqCst) == 0 {
            tokio::task::yield_now().await;
        }

        gate.send(()).unwrap();

        // Join the failed computation, observe its error, and evict.
        let shared = cache.apply("key", async { Ok(0u32) }).await;
        assert!(shared.is_err());

        // Retry into the now-empty slot.
        let retried = cache.apply("key", async { Ok(42u32) }).await.unwrap();
        assert_eq!(retried, 42);

        // The spawned waiter now observes the old failure and attempts its
        // own eviction, which must not remove the fresh slot.
        assert!(late_waiter.await.unwrap().is_err());

        let value = cache.apply("key", async { Ok(99u32) }).await.unwrap();
        assert_eq!(value, 42);
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn it_isolates_computations_by_key() {
        let cache = Cache::new();

        assert_eq!(cache.apply("a", async { Ok(1u32) }).await.unwrap(), 1);
        assert_eq!(cache.apply("b", async { Ok(2u32) }).await.unwrap(), 2);
        assert_eq!(cache.len().await, 2);
    }

    #[tokio::test]
    async fn it_computes_directly_when_caching_is_disabled() {
        let calls = Arc::new(AtomicUsize::new(0));

        for _ in 0..2 {
            let calls = calls.clone();
            let value = memoize(None::<&Cache<u32>>, "key", async move {
                calls.fetch_add(1, SeqCst);
                Ok(5)
            })
            .await
            .unwrap();
            assert_eq!(value, 5);
        }

        assert_eq!(calls.load(SeqCst), 2);
    }
}
