// -------------------------------------------------------------------------------------------------
//  Copyright (C) 2025 Centrifuge Network Foundation. All rights reserved.
//  https://centrifuge.io
//
//  Licensed under the GNU Lesser General Public License Version 3.0 (the "License");
//  You may not use this file except in compliance with the License.
//  You may obtain a copy of the License at https://www.gnu.org/licenses/lgpl-3.0.en.html
//
//  Unless required by applicable law or agreed to in writing, software
//  distributed under the License is distributed on an "AS IS" BASIS,
//  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//  See the License for the specific language governing permissions and
//  limitations under the License.
// -------------------------------------------------------------------------------------------------

//! Deduplicating, replaying query cache.
//!
//! Each cache key maps to one reference-counted shared subject: a multicast point holding the
//! latest emitted value, the set of live subscriber channels, the driver task running the
//! caller-supplied factory stream, and a reset-delay timer that tears the entry down once the
//! last subscriber detaches. All concurrent callers of the same key share a single factory
//! invocation and observe the same value sequence in the same order.

use std::{
    any::Any,
    future::IntoFuture,
    pin::Pin,
    sync::{Arc, Mutex},
    task::{Context, Poll},
    time::Duration,
};

use ahash::AHashMap;
use futures::{Stream, StreamExt, future::BoxFuture, stream::BoxStream};
use tokio::{sync::mpsc, task::JoinHandle, time::Instant};

use crate::query::{error::QueryError, key::CacheKey};

/// A push-based stream of values produced by a query factory.
pub type FactoryStream<T> = BoxStream<'static, anyhow::Result<T>>;

type SharedFactory<T> = Arc<dyn Fn() -> FactoryStream<T> + Send + Sync>;

/// Options controlling a cached query's lifetime.
#[derive(Debug, Clone, Default)]
pub struct QueryOptions {
    /// Bounds how long a cached value is considered valid after computation, independent of
    /// subscriber presence. `None` means no hard expiry: the value persists as long as the entry
    /// is kept warm by subscribers or the reset-delay grace window.
    pub value_cache_time: Option<Duration>,
}

impl QueryOptions {
    /// Sets a hard expiry on cached values.
    #[must_use]
    pub fn with_value_cache_time(mut self, duration: Duration) -> Self {
        self.value_cache_time = Some(duration);
        self
    }
}

/// Deduplicates and caches observable-producing read operations keyed by a composite key.
///
/// Constructed once per SDK client and passed by reference to consumers; never global state, so
/// tests can reset it by constructing a fresh instance.
#[derive(Debug)]
pub struct QueryCache {
    /// Cache entries keyed by the canonical form of their cache key.
    entries: Mutex<AHashMap<String, Arc<dyn Any + Send + Sync>>>,
    /// How long an entry survives after its last subscriber detaches.
    reset_delay: Duration,
}

impl QueryCache {
    /// Creates a new [`QueryCache`] with the given reset delay.
    #[must_use]
    pub fn new(reset_delay: Duration) -> Self {
        Self {
            entries: Mutex::new(AHashMap::new()),
            reset_delay,
        }
    }

    /// Returns a [`Query`] for the given key and factory.
    ///
    /// Concurrent calls with equal keys share one underlying computation; a `None` key opts the
    /// call out of caching entirely, giving every invocation an independent stream.
    pub fn query<T, F>(&self, key: Option<CacheKey>, factory: F, options: QueryOptions) -> Query<T>
    where
        T: Clone + Send + Sync + 'static,
        F: Fn() -> FactoryStream<T> + Send + Sync + 'static,
    {
        let factory: SharedFactory<T> = Arc::new(factory);

        let Some(key) = key else {
            return Query { shared: None, factory };
        };

        let canonical = key.canonical();
        let mut entries = self.entries.lock().expect("cache lock poisoned");

        if let Some(entry) = entries.get(&canonical)
            && let Ok(subject) = Arc::clone(entry).downcast::<SharedSubject<T>>()
        {
            return Query {
                shared: Some(subject),
                factory,
            };
        }

        let subject = Arc::new(SharedSubject::new(
            Arc::clone(&factory),
            options.value_cache_time,
            self.reset_delay,
        ));
        entries.insert(canonical, Arc::clone(&subject) as Arc<dyn Any + Send + Sync>);

        Query {
            shared: Some(subject),
            factory,
        }
    }

    /// Returns the number of live cache entries (for diagnostics and tests).
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().expect("cache lock poisoned").len()
    }

    /// Returns whether the cache holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A cached computation handle supporting both repeated subscription and one-shot await.
///
/// Cloning is cheap; all clones for the same cache key share the same underlying subject.
pub struct Query<T> {
    shared: Option<Arc<SharedSubject<T>>>,
    factory: SharedFactory<T>,
}

impl<T> Clone for Query<T> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
            factory: Arc::clone(&self.factory),
        }
    }
}

impl<T> std::fmt::Debug for Query<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Query")
            .field("cached", &self.shared.is_some())
            .finish()
    }
}

impl<T: Clone + Send + Sync + 'static> Query<T> {
    /// Subscribes to the query, receiving the buffered value (if fresh) followed by every
    /// subsequent emission.
    #[must_use]
    pub fn subscribe(&self) -> QueryStream<T> {
        match &self.shared {
            Some(subject) => SharedSubject::subscribe(subject),
            None => QueryStream {
                kind: StreamKind::Direct(
                    (self.factory)().map(|item| item.map_err(QueryError::factory)).boxed(),
                ),
            },
        }
    }
}

impl<T: Clone + Send + Sync + 'static> IntoFuture for Query<T> {
    type Output = Result<T, QueryError>;
    type IntoFuture = BoxFuture<'static, Self::Output>;

    /// Resolves with the first emitted value and unsubscribes immediately after.
    fn into_future(self) -> Self::IntoFuture {
        Box::pin(async move {
            let mut stream = self.subscribe();
            match stream.next().await {
                Some(item) => item,
                None => Err(QueryError::Completed),
            }
        })
    }
}

/// A live subscription to a [`Query`].
pub struct QueryStream<T: Send + 'static> {
    kind: StreamKind<T>,
}

enum StreamKind<T> {
    Shared {
        rx: mpsc::UnboundedReceiver<Result<T, QueryError>>,
        subject: Arc<SharedSubject<T>>,
        subscriber_id: u64,
    },
    Direct(BoxStream<'static, Result<T, QueryError>>),
}

impl<T: Send + 'static> std::fmt::Debug for QueryStream<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self.kind {
            StreamKind::Shared { .. } => "shared",
            StreamKind::Direct(_) => "direct",
        };
        f.debug_struct("QueryStream").field("kind", &kind).finish()
    }
}

impl<T: Clone + Send + 'static> Stream for QueryStream<T> {
    type Item = Result<T, QueryError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        match &mut self.get_mut().kind {
            StreamKind::Shared { rx, .. } => rx.poll_recv(cx),
            StreamKind::Direct(stream) => stream.as_mut().poll_next(cx),
        }
    }
}

impl<T: Send + 'static> Drop for QueryStream<T> {
    fn drop(&mut self) {
        if let StreamKind::Shared {
            subject,
            subscriber_id,
            ..
        } = &self.kind
        {
            subject.detach(*subscriber_id);
        }
    }
}

/// A buffered value and the instant it was computed.
struct CachedValue<T> {
    value: T,
    computed_at: Instant,
}

/// Mutable state of a shared subject, guarded by one lock.
struct SubjectState<T> {
    latest: Option<CachedValue<T>>,
    subscribers: Vec<(u64, mpsc::UnboundedSender<Result<T, QueryError>>)>,
    next_subscriber_id: u64,
    /// Driver task currently running the factory stream, if any.
    driver: Option<JoinHandle<()>>,
    /// Incremented on every (re)start so emissions of aborted drivers are discarded.
    generation: u64,
    /// Pending reset-delay teardown timer, if any.
    teardown: Option<TeardownTimer>,
}

/// Pending teardown of an unwatched entry.
///
/// The deadline is recorded separately from the timer task: a subscriber arriving after the
/// deadline but before the timer task was scheduled must still observe the entry as torn down.
struct TeardownTimer {
    deadline: Instant,
    task: JoinHandle<()>,
}

/// The reference-counted multicast point behind one cache entry.
struct SharedSubject<T> {
    factory: SharedFactory<T>,
    value_cache_time: Option<Duration>,
    reset_delay: Duration,
    state: Mutex<SubjectState<T>>,
}

impl<T: Clone + Send + Sync + 'static> SharedSubject<T> {
    fn new(
        factory: SharedFactory<T>,
        value_cache_time: Option<Duration>,
        reset_delay: Duration,
    ) -> Self {
        Self {
            factory,
            value_cache_time,
            reset_delay,
            state: Mutex::new(SubjectState {
                latest: None,
                subscribers: Vec::new(),
                next_subscriber_id: 0,
                driver: None,
                generation: 0,
                teardown: None,
            }),
        }
    }

    fn subscribe(self: &Arc<Self>) -> QueryStream<T> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut state = self.state.lock().expect("subject lock poisoned");

        if let Some(timer) = state.teardown.take() {
            timer.task.abort();
            // An elapsed deadline counts as torn down even if the timer task lost the race to
            // this subscriber
            if Instant::now() >= timer.deadline {
                Self::teardown(&mut state);
            }
        }

        let subscriber_id = state.next_subscriber_id;
        state.next_subscriber_id += 1;

        match self.replay(&state) {
            Ok(Some(value)) => {
                let _ = tx.send(Ok(value));
                if state.driver.is_none() {
                    // Factory already ran to completion: replay the warm value and end the
                    // stream instead of keeping the subscriber waiting
                    drop(tx);
                    return QueryStream {
                        kind: StreamKind::Shared {
                            rx,
                            subject: Arc::clone(self),
                            subscriber_id,
                        },
                    };
                }
            }
            Ok(None) => {
                if state.driver.is_none() {
                    self.start_driver(&mut state);
                }
            }
            // The stale-value marker never escapes: it is caught right here and converted into
            // a fresh computation, keeping it distinguishable from a genuine upstream failure
            Err(QueryError::StaleValue) => {
                state.latest = None;
                if let Some(driver) = state.driver.take() {
                    driver.abort();
                }
                self.start_driver(&mut state);
            }
            Err(_) => unreachable!("replay only raises the stale-value marker"),
        }

        state.subscribers.push((subscriber_id, tx));

        QueryStream {
            kind: StreamKind::Shared {
                rx,
                subject: Arc::clone(self),
                subscriber_id,
            },
        }
    }

    /// Returns the buffered value if present and fresh, or the internal stale-value marker when
    /// the buffer exists but has outlived its hard expiry.
    fn replay(&self, state: &SubjectState<T>) -> Result<Option<T>, QueryError> {
        let Some(cached) = &state.latest else {
            return Ok(None);
        };
        if let Some(value_cache_time) = self.value_cache_time
            && cached.computed_at.elapsed() >= value_cache_time
        {
            return Err(QueryError::StaleValue);
        }
        Ok(Some(cached.value.clone()))
    }

    /// Restarts the factory stream from scratch; computations are never resumed.
    fn start_driver(self: &Arc<Self>, state: &mut SubjectState<T>) {
        state.generation += 1;
        let generation = state.generation;
        let subject = Arc::clone(self);

        state.driver = Some(tokio::spawn(async move {
            let mut stream = (subject.factory)();
            while let Some(item) = stream.next().await {
                match item {
                    Ok(value) => subject.publish(generation, value),
                    Err(error) => {
                        subject.publish_error(generation, error);
                        return;
                    }
                }
            }
            subject.driver_finished(generation);
        }));
    }

    fn publish(&self, generation: u64, value: T) {
        let mut state = self.state.lock().expect("subject lock poisoned");
        if state.generation != generation {
            return;
        }
        state.latest = Some(CachedValue {
            value: value.clone(),
            computed_at: Instant::now(),
        });
        state
            .subscribers
            .retain(|(_, tx)| tx.send(Ok(value.clone())).is_ok());
    }

    fn publish_error(&self, generation: u64, error: anyhow::Error) {
        let mut state = self.state.lock().expect("subject lock poisoned");
        if state.generation != generation {
            return;
        }
        tracing::debug!("Query computation failed, discarding buffered value: {error:?}");
        state.latest = None;
        state.driver = None;
        let shared = QueryError::factory(error);
        // The error terminates every live stream; dropping the senders ends them after the
        // error is delivered
        for (_, tx) in state.subscribers.drain(..) {
            let _ = tx.send(Err(shared.clone()));
        }
    }

    fn driver_finished(&self, generation: u64) {
        let mut state = self.state.lock().expect("subject lock poisoned");
        if state.generation == generation {
            state.driver = None;
            // Completion ends every live stream; the buffered value stays warm for future
            // subscribers until teardown
            state.subscribers.clear();
        }
    }

}

impl<T: Send + 'static> SharedSubject<T> {
    fn detach(self: &Arc<Self>, subscriber_id: u64) {
        let mut state = self.state.lock().expect("subject lock poisoned");
        state.subscribers.retain(|(id, _)| *id != subscriber_id);
        if !state.subscribers.is_empty() {
            return;
        }

        // Last subscriber gone: arm the reset-delay timer; a new subscriber within the window
        // cancels it and keeps the buffered value warm
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            Self::teardown(&mut state);
            return;
        };
        let subject = Arc::clone(self);
        let reset_delay = self.reset_delay;
        state.teardown = Some(TeardownTimer {
            deadline: Instant::now() + reset_delay,
            task: handle.spawn(async move {
                tokio::time::sleep(reset_delay).await;
                let mut state = subject.state.lock().expect("subject lock poisoned");
                if state.subscribers.is_empty() {
                    Self::teardown(&mut state);
                }
            }),
        });
    }

    fn teardown(state: &mut SubjectState<T>) {
        if let Some(driver) = state.driver.take() {
            driver.abort();
        }
        state.latest = None;
        state.generation += 1;
    }
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use rstest::rstest;

    use super::*;
    use crate::cache_key;

    /// A factory that emits a single incrementing value and then stays silent.
    fn counting_factory(
        counter: Arc<AtomicUsize>,
    ) -> impl Fn() -> FactoryStream<usize> + Send + Sync + 'static {
        move || {
            let counter = Arc::clone(&counter);
            Box::pin(async_stream::stream! {
                let run = counter.fetch_add(1, Ordering::SeqCst);
                yield Ok(run);
                futures::future::pending::<()>().await;
            })
        }
    }

    fn test_cache() -> QueryCache {
        QueryCache::new(Duration::from_secs(1))
    }

    #[rstest]
    #[tokio::test]
    async fn test_concurrent_subscribers_share_one_computation() {
        let cache = test_cache();
        let counter = Arc::new(AtomicUsize::new(0));

        let query = cache.query(
            Some(cache_key!("pool", 1u64)),
            counting_factory(Arc::clone(&counter)),
            QueryOptions::default(),
        );
        let mut a = query.subscribe();
        let mut b = query.subscribe();

        assert_eq!(a.next().await.unwrap().unwrap(), 0);
        assert_eq!(b.next().await.unwrap().unwrap(), 0);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[rstest]
    #[tokio::test]
    async fn test_equal_keys_share_entry_across_calls() {
        let cache = test_cache();
        let counter = Arc::new(AtomicUsize::new(0));

        let first = cache.query(
            Some(cache_key!("pool", 1u64)),
            counting_factory(Arc::clone(&counter)),
            QueryOptions::default(),
        );
        let second = cache.query(
            Some(cache_key!("pool", 1u64)),
            counting_factory(Arc::clone(&counter)),
            QueryOptions::default(),
        );

        let _held = first.subscribe();
        let value_a = first.await.unwrap();
        let value_b = second.await.unwrap();
        assert_eq!(value_a, value_b);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);
    }

    #[rstest]
    #[tokio::test]
    async fn test_null_key_bypasses_cache() {
        let cache = test_cache();
        let counter = Arc::new(AtomicUsize::new(0));

        let query = cache.query(None, counting_factory(Arc::clone(&counter)), QueryOptions::default());
        let mut a = query.subscribe();
        let mut b = query.subscribe();

        assert_eq!(a.next().await.unwrap().unwrap(), 0);
        assert_eq!(b.next().await.unwrap().unwrap(), 1);
        assert_eq!(counter.load(Ordering::SeqCst), 2);
        assert!(cache.is_empty());
    }

    #[rstest]
    #[tokio::test]
    async fn test_subscribers_observe_identical_sequences() {
        let cache = test_cache();

        let query = cache.query(
            Some(cache_key!("sequence")),
            || {
                Box::pin(async_stream::stream! {
                    for value in 1..=3u64 {
                        yield Ok(value);
                        tokio::task::yield_now().await;
                    }
                    futures::future::pending::<()>().await;
                })
            },
            QueryOptions::default(),
        );

        let a = query.subscribe();
        let b = query.subscribe();
        let collected_a: Vec<_> = a.take(3).map(Result::unwrap).collect().await;
        let collected_b: Vec<_> = b.take(3).map(Result::unwrap).collect().await;
        assert_eq!(collected_a, vec![1, 2, 3]);
        assert_eq!(collected_b, collected_a);
    }

    #[rstest]
    #[tokio::test(start_paused = true)]
    async fn test_value_cache_time_expiry_triggers_recompute() {
        let cache = QueryCache::new(Duration::from_secs(3600));
        let counter = Arc::new(AtomicUsize::new(0));
        let options = QueryOptions::default().with_value_cache_time(Duration::from_secs(60));

        let query = cache.query(
            Some(cache_key!("expiring")),
            counting_factory(Arc::clone(&counter)),
            options,
        );

        assert_eq!(query.clone().await.unwrap(), 0);

        // Before expiry the buffered value is replayed without recomputation
        tokio::time::advance(Duration::from_secs(59)).await;
        assert_eq!(query.clone().await.unwrap(), 0);
        assert_eq!(counter.load(Ordering::SeqCst), 1);

        // Past expiry the next subscription recomputes from scratch
        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(query.clone().await.unwrap(), 1);
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[rstest]
    #[tokio::test(start_paused = true)]
    async fn test_resubscribe_within_reset_delay_replays() {
        let cache = QueryCache::new(Duration::from_secs(5));
        let counter = Arc::new(AtomicUsize::new(0));

        let query = cache.query(
            Some(cache_key!("warm")),
            counting_factory(Arc::clone(&counter)),
            QueryOptions::default(),
        );

        assert_eq!(query.clone().await.unwrap(), 0);
        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(query.clone().await.unwrap(), 0);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[rstest]
    #[tokio::test(start_paused = true)]
    async fn test_resubscribe_after_reset_delay_recomputes() {
        let cache = QueryCache::new(Duration::from_secs(5));
        let counter = Arc::new(AtomicUsize::new(0));

        let query = cache.query(
            Some(cache_key!("cold")),
            counting_factory(Arc::clone(&counter)),
            QueryOptions::default(),
        );

        assert_eq!(query.clone().await.unwrap(), 0);
        tokio::time::advance(Duration::from_secs(6)).await;
        // Resubscribe immediately, without letting the armed timer task run: the elapsed
        // deadline alone must force a fresh computation
        assert_eq!(query.clone().await.unwrap(), 1);
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[rstest]
    #[tokio::test]
    async fn test_factory_error_does_not_poison_cache() {
        let cache = test_cache();
        let counter = Arc::new(AtomicUsize::new(0));

        let query = cache.query(
            Some(cache_key!("flaky")),
            {
                let counter = Arc::clone(&counter);
                move || {
                    let counter = Arc::clone(&counter);
                    Box::pin(async_stream::stream! {
                        if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                            yield Err(anyhow::anyhow!("transient upstream failure"));
                        } else {
                            yield Ok(7usize);
                        }
                    })
                }
            },
            QueryOptions::default(),
        );

        let first = query.clone().await;
        assert!(matches!(first, Err(QueryError::Factory(_))));

        let second = query.clone().await.unwrap();
        assert_eq!(second, 7);
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[rstest]
    #[tokio::test]
    async fn test_one_shot_await_on_empty_factory_completes() {
        let cache = test_cache();

        let query = cache.query::<u64, _>(
            Some(cache_key!("empty")),
            || Box::pin(futures::stream::empty()),
            QueryOptions::default(),
        );

        assert!(matches!(query.await, Err(QueryError::Completed)));
    }

    #[rstest]
    #[tokio::test]
    async fn test_error_fans_out_to_all_subscribers() {
        let cache = test_cache();

        let query = cache.query(
            Some(cache_key!("broken")),
            || {
                Box::pin(async_stream::stream! {
                    yield Ok(1u64);
                    tokio::task::yield_now().await;
                    yield Err(anyhow::anyhow!("upstream gone"));
                })
            },
            QueryOptions::default(),
        );

        let a: Vec<_> = query.subscribe().take(2).collect().await;
        assert!(a[0].is_ok());
        assert!(a[1].is_err());
    }
}
