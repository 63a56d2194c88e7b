//! ReliableDispatcher - transactional enqueue onto a replicated queue

use std::marker::PhantomData;
use std::sync::Arc;

use contracts::{QueueResolver, ReliableDispatch, ReliableQueue, StoreError, TransactionFactory};
use tracing::{debug, instrument, warn};

use crate::lazy::LazyQueue;
use crate::metrics::DispatchMetrics;
use crate::scope::TransactionScope;

/// Builder for creating a ReliableDispatcher
///
/// Both collaborators are required; `build` names the first one missing.
pub struct ReliableDispatcherBuilder<T, R, F> {
    reliable_queue: Option<R>,
    transaction_factory: Option<F>,
    metrics: Option<Arc<DispatchMetrics>>,
    _item: PhantomData<fn(T)>,
}

impl<T, R, F> Default for ReliableDispatcherBuilder<T, R, F> {
    fn default() -> Self {
        Self {
            reliable_queue: None,
            transaction_factory: None,
            metrics: None,
            _item: PhantomData,
        }
    }
}

impl<T, R, F> ReliableDispatcherBuilder<T, R, F>
where
    R: QueueResolver,
    F: TransactionFactory,
{
    /// Create an empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolver for the target queue (resolved lazily, on first enqueue)
    pub fn reliable_queue(mut self, resolver: R) -> Self {
        self.reliable_queue = Some(resolver);
        self
    }

    /// Factory opening one transaction per enqueue
    pub fn transaction_factory(mut self, factory: F) -> Self {
        self.transaction_factory = Some(factory);
        self
    }

    /// Share an existing metrics instance
    pub fn metrics(mut self, metrics: Arc<DispatchMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Build the dispatcher
    ///
    /// # Errors
    /// `InvalidArgument` naming `reliable_queue` or `transaction_factory`
    /// when it was not supplied.
    pub fn build(self) -> Result<ReliableDispatcher<T, R, F>, StoreError> {
        let resolver = self
            .reliable_queue
            .ok_or_else(|| StoreError::invalid_argument("reliable_queue"))?;
        let factory = self
            .transaction_factory
            .ok_or_else(|| StoreError::invalid_argument("transaction_factory"))?;
        let metrics = self.metrics.unwrap_or_default();

        Ok(ReliableDispatcher {
            queue: LazyQueue::new(resolver, Arc::clone(&metrics)),
            factory,
            metrics,
            _item: PhantomData,
        })
    }
}

/// Places items of type `T` onto a replicated queue, one transaction per item
///
/// Calls are independent: the dispatcher takes no lock of its own and any
/// cross-call ordering is left to the store.
pub struct ReliableDispatcher<T, R: QueueResolver, F> {
    queue: LazyQueue<R>,
    factory: F,
    metrics: Arc<DispatchMetrics>,
    _item: PhantomData<fn(T)>,
}

impl<T, R, F> ReliableDispatcher<T, R, F>
where
    R: QueueResolver,
    R::Queue: ReliableQueue<T, F::Transaction>,
    F: TransactionFactory,
{
    /// Create a dispatcher from its two collaborators
    pub fn new(resolver: R, factory: F) -> Self {
        let metrics = Arc::new(DispatchMetrics::new());
        Self {
            queue: LazyQueue::new(resolver, Arc::clone(&metrics)),
            factory,
            metrics,
            _item: PhantomData,
        }
    }

    /// Start building a dispatcher
    pub fn builder() -> ReliableDispatcherBuilder<T, R, F> {
        ReliableDispatcherBuilder::new()
    }

    /// Name of the target queue
    pub fn queue_name(&self) -> &str {
        self.queue.name()
    }

    /// Whether the queue handle has been resolved
    pub fn is_resolved(&self) -> bool {
        self.queue.is_resolved()
    }

    /// Shared metrics
    pub fn metrics(&self) -> &Arc<DispatchMetrics> {
        &self.metrics
    }

    /// Durably enqueue `item`
    ///
    /// `None` is rejected before a transaction is opened. Otherwise the item
    /// is written under a fresh transaction which is committed, and the
    /// transaction is released whatever the outcome.
    ///
    /// # Errors
    /// - `InvalidArgument { param: "item" }` for `None`
    /// - any resolver, factory, queue or commit error, unchanged
    #[instrument(
        name = "reliable_dispatcher_enqueue",
        skip(self, item),
        fields(queue = %self.queue_name())
    )]
    pub async fn enqueue<I>(&self, item: I) -> Result<(), StoreError>
    where
        I: Into<Option<T>>,
    {
        let Some(item) = item.into() else {
            self.metrics.inc_invalid_count();
            return Err(StoreError::invalid_argument("item"));
        };

        match self.dispatch(item).await {
            Ok(()) => {
                self.metrics.inc_committed_count();
                Ok(())
            }
            Err(e) => {
                self.metrics.inc_failure_count();
                warn!(
                    queue = %self.queue_name(),
                    kind = e.kind(),
                    error = %e,
                    "Enqueue failed"
                );
                Err(e)
            }
        }
    }

    async fn dispatch(&self, item: T) -> Result<(), StoreError> {
        let queue = self.queue.get().await?;

        let txn = self.factory.create().await?;
        let mut scope = TransactionScope::begin(txn, &self.metrics);

        queue.enqueue(scope.transaction(), item).await?;
        debug!(txn = %scope.id(), "Item written");

        scope.commit().await?;
        debug!(txn = %scope.id(), "Transaction committed");

        Ok(())
    }
}

impl<T, R, F> ReliableDispatch<T> for ReliableDispatcher<T, R, F>
where
    T: Send,
    R: QueueResolver + Sync,
    R::Queue: ReliableQueue<T, F::Transaction> + Send + Sync,
    F: TransactionFactory + Sync,
    F::Transaction: Sync,
{
    async fn enqueue<I>(&self, item: I) -> Result<(), StoreError>
    where
        I: Into<Option<T>> + Send,
    {
        ReliableDispatcher::enqueue(self, item).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{
        Event, Fault, MockQueueResolver, MockStore, MockTransactionFactory, Schedule, Stage,
    };
    use contracts::TransactionId;
    use std::time::Duration;

    type TestDispatcher = ReliableDispatcher<
        &'static str,
        MockQueueResolver<&'static str>,
        MockTransactionFactory<&'static str>,
    >;

    fn dispatcher(store: &MockStore<&'static str>) -> TestDispatcher {
        TestDispatcher::builder()
            .reliable_queue(store.queue_resolver())
            .transaction_factory(store.transaction_factory())
            .build()
            .unwrap()
    }

    #[test]
    fn test_build_requires_reliable_queue() {
        let store = MockStore::new("orders");
        let err = TestDispatcher::builder()
            .transaction_factory(store.transaction_factory())
            .build()
            .err()
            .unwrap();

        assert_eq!(err.param(), Some("reliable_queue"));
        assert!(store.events().is_empty());
    }

    #[test]
    fn test_build_requires_transaction_factory() {
        let store = MockStore::new("orders");
        let err = TestDispatcher::builder()
            .reliable_queue(store.queue_resolver())
            .build()
            .err()
            .unwrap();

        assert_eq!(err.param(), Some("transaction_factory"));
        assert_eq!(store.calls(Stage::Resolve), 0);
    }

    #[tokio::test]
    async fn test_enqueue_requires_item() {
        let store = MockStore::new("orders");
        let dispatcher = dispatcher(&store);

        let err = dispatcher.enqueue(None::<&str>).await.unwrap_err();

        assert_eq!(err.param(), Some("item"));
        assert_eq!(store.calls(Stage::Create), 0);
        assert_eq!(dispatcher.metrics().invalid_count(), 1);
    }

    #[tokio::test]
    async fn test_enqueue_commits_then_releases() {
        let store = MockStore::new("orders");
        let dispatcher = dispatcher(&store);

        dispatcher.enqueue("x").await.unwrap();

        let t1 = TransactionId::new(1);
        assert_eq!(
            store.events(),
            vec![
                Event::Resolve {
                    queue: "orders".to_string()
                },
                Event::Create(t1),
                Event::Enqueue {
                    txn: t1,
                    item: "\"x\"".to_string()
                },
                Event::Commit(t1),
                Event::Release(t1),
            ]
        );
        assert_eq!(store.committed(), vec!["x"]);
        assert_eq!(dispatcher.metrics().committed_count(), 1);
    }

    #[tokio::test]
    async fn test_queue_failure_releases_without_commit() {
        let store = MockStore::new("orders");
        let dispatcher = dispatcher(&store);
        store.fail_next(Stage::Enqueue, Fault::Fail);

        let err = dispatcher.enqueue("x").await.unwrap_err();

        assert!(matches!(err, StoreError::QueueWrite { .. }));
        assert_eq!(store.release_count(TransactionId::new(1)), 1);
        assert_eq!(store.calls(Stage::Commit), 0);
        assert_eq!(store.committed_len(), 0);
        assert_eq!(dispatcher.metrics().failure_count(), 1);
    }

    #[tokio::test]
    async fn test_commit_failure_releases() {
        let store = MockStore::new("orders");
        let dispatcher = dispatcher(&store);
        store.fail_next(Stage::Commit, Fault::Fail);

        let err = dispatcher.enqueue("x").await.unwrap_err();

        assert!(matches!(err, StoreError::Commit { .. }));
        assert_eq!(store.calls(Stage::Commit), 1);
        assert_eq!(store.release_count(TransactionId::new(1)), 1);
        assert_eq!(store.committed_len(), 0);
    }

    #[tokio::test]
    async fn test_factory_failure_skips_write() {
        let store = MockStore::new("orders");
        let dispatcher = dispatcher(&store);
        store.fail_next(Stage::Create, Fault::Unavailable);

        let err = dispatcher.enqueue("x").await.unwrap_err();

        assert!(matches!(err, StoreError::Unavailable { .. }));
        assert_eq!(store.calls(Stage::Enqueue), 0);
        assert_eq!(dispatcher.metrics().opened_count(), 0);
    }

    #[tokio::test]
    async fn test_resolution_failure_creates_no_transaction() {
        let store = MockStore::new("orders");
        let dispatcher = dispatcher(&store);
        store.fail_next(Stage::Resolve, Fault::Fail);

        let err = dispatcher.enqueue("x").await.unwrap_err();

        assert!(matches!(err, StoreError::QueueResolution { .. }));
        assert_eq!(store.calls(Stage::Create), 0);
        assert!(!dispatcher.is_resolved());

        // next call resolves again
        dispatcher.enqueue("y").await.unwrap();
        assert!(dispatcher.is_resolved());
        assert_eq!(store.calls(Stage::Resolve), 2);
        assert_eq!(store.committed(), vec!["y"]);
    }

    #[tokio::test]
    async fn test_resolves_once_across_calls() {
        let store = MockStore::new("orders");
        let dispatcher = dispatcher(&store);

        for item in ["a", "b", "c", "d"] {
            dispatcher.enqueue(item).await.unwrap();
        }

        assert_eq!(store.calls(Stage::Resolve), 1);
        assert_eq!(store.calls(Stage::Create), 4);
        assert_eq!(store.committed(), vec!["a", "b", "c", "d"]);
    }

    #[tokio::test]
    async fn test_cancelled_enqueue_releases() {
        let store = MockStore::new("orders");
        let dispatcher = dispatcher(&store);
        store.inject(Stage::Enqueue, Fault::Hang, Schedule::Always);

        let result =
            tokio::time::timeout(Duration::from_millis(20), dispatcher.enqueue("x")).await;

        assert!(result.is_err());
        assert_eq!(store.release_count(TransactionId::new(1)), 1);
        assert_eq!(store.calls(Stage::Commit), 0);
        assert!(store.unreleased().is_empty());
        assert_eq!(dispatcher.metrics().in_flight(), 0);
    }

    #[tokio::test]
    async fn test_new_without_builder() {
        let store = MockStore::new("orders");
        let dispatcher: TestDispatcher =
            ReliableDispatcher::new(store.queue_resolver(), store.transaction_factory());

        dispatcher.enqueue("x").await.unwrap();

        assert_eq!(dispatcher.queue_name(), "orders");
        let snapshot = dispatcher.metrics().snapshot();
        assert_eq!(snapshot.released_count, 1);
        assert_eq!(snapshot.resolution_attempts, 1);
    }

    #[tokio::test]
    async fn test_dispatch_trait() {
        async fn send_all<D: ReliableDispatch<&'static str>>(
            dispatcher: &D,
            items: &[&'static str],
        ) -> Result<(), StoreError> {
            for item in items {
                dispatcher.enqueue(*item).await?;
            }
            Ok(())
        }

        let store = MockStore::new("orders");
        let dispatcher = dispatcher(&store);

        send_all(&dispatcher, &["a", "b"]).await.unwrap();

        assert_eq!(store.committed(), vec!["a", "b"]);
    }
}
