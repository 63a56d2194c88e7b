//! ReliableDispatch trait - application-facing enqueue interface

use crate::StoreError;

/// Places items onto a durable queue with atomic commit semantics.
///
/// `None` stands for a missing item and is rejected with
/// `StoreError::InvalidArgument { param: "item" }` before any transaction is opened.
#[trait_variant::make(ReliableDispatch: Send)]
pub trait LocalReliableDispatch<T> {
    /// Durably enqueue `item`.
    ///
    /// Returns once the transaction carrying the write has committed.
    ///
    /// # Errors
    /// Any error raised by the resolver, the transaction factory, the queue or
    /// the commit, unchanged.
    async fn enqueue<I>(&self, item: I) -> Result<(), StoreError>
    where
        I: Into<Option<T>> + Send;
}
