//! Queue contracts
//!
//! `ReliableQueue` is the durable, replicated container; `QueueResolver`
//! materializes a handle to it on demand.

use std::future::Future;

use crate::StoreError;

/// Durable, ordered, replicated queue of `T`, written under transactions of type `X`
#[trait_variant::make(ReliableQueue: Send)]
pub trait LocalReliableQueue<T, X> {
    /// Append `item` within `txn`.
    ///
    /// The write becomes durable only when `txn` commits.
    ///
    /// # Errors
    /// Must fail (never silently no-op) when the transaction is invalid or
    /// expired, or the store is unreachable.
    async fn enqueue(&self, txn: &X, item: T) -> Result<(), StoreError>;
}

/// Materializes a queue handle
///
/// Resolution usually hits the state manager (`get or add` by name), so the
/// dispatcher calls it lazily and memoizes the result.
#[trait_variant::make(QueueResolver: Send)]
pub trait LocalQueueResolver {
    /// Handle type produced by the resolver
    type Queue;

    /// Name of the queue being resolved (used for logs/metrics)
    fn queue_name(&self) -> &str;

    /// Resolve the queue handle
    ///
    /// # Errors
    /// Returns `QueueResolution` (or a store error) when the handle cannot be materialized
    async fn resolve(&self) -> Result<Self::Queue, StoreError>;
}

/// Resolver backed by an async closure
pub struct FnResolver<F> {
    name: String,
    resolve: F,
}

/// Build a resolver for queue `name` from an async closure
///
/// ```ignore
/// let resolver = contracts::resolve_with("orders", || async { state.get_or_add("orders").await });
/// ```
pub fn resolve_with<F>(name: impl Into<String>, resolve: F) -> FnResolver<F> {
    FnResolver {
        name: name.into(),
        resolve,
    }
}

impl<F, Fut, Q> QueueResolver for FnResolver<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<Q, StoreError>> + Send,
{
    type Queue = Q;

    fn queue_name(&self) -> &str {
        &self.name
    }

    async fn resolve(&self) -> Result<Q, StoreError> {
        (self.resolve)().await
    }
}
