//! TransactionScope - guarantees a transaction is released on every exit path

use contracts::{StoreError, Transaction, TransactionId};
use tracing::debug;

use crate::metrics::DispatchMetrics;

/// Scoped acquisition of a transaction
///
/// `release` runs exactly once, when the scope is dropped: after a commit,
/// after an error returned with `?`, or when the enclosing future is
/// cancelled mid-flight.
pub struct TransactionScope<'m, X: Transaction> {
    txn: X,
    committed: bool,
    metrics: &'m DispatchMetrics,
}

impl<'m, X: Transaction> TransactionScope<'m, X> {
    /// Take ownership of a freshly created transaction
    pub fn begin(txn: X, metrics: &'m DispatchMetrics) -> Self {
        metrics.inc_opened_count();
        debug!(txn = %txn.id(), "Transaction opened");
        Self {
            txn,
            committed: false,
            metrics,
        }
    }

    /// Transaction id
    pub fn id(&self) -> TransactionId {
        self.txn.id()
    }

    /// Borrow the transaction for writes
    pub fn transaction(&self) -> &X {
        &self.txn
    }

    /// Whether `commit` succeeded
    pub fn is_committed(&self) -> bool {
        self.committed
    }

    /// Commit the transaction
    ///
    /// # Errors
    /// The store's commit error, unchanged. The transaction is still released
    /// when the scope drops.
    pub async fn commit(&mut self) -> Result<(), StoreError> {
        self.txn.commit().await?;
        self.committed = true;
        Ok(())
    }
}

impl<X: Transaction> Drop for TransactionScope<'_, X> {
    fn drop(&mut self) {
        self.txn.release();
        self.metrics.inc_released_count();
        debug!(
            txn = %self.txn.id(),
            committed = self.committed,
            "Transaction released"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{Event, Fault, MockStore, Stage};
    use contracts::TransactionFactory;

    #[tokio::test]
    async fn test_release_on_drop_after_commit() {
        let store = MockStore::<u32>::new("orders");
        let metrics = DispatchMetrics::new();
        let txn = store.transaction_factory().create().await.unwrap();
        let id = txn.id();

        {
            let mut scope = TransactionScope::begin(txn, &metrics);
            scope.commit().await.unwrap();
            assert!(scope.is_committed());
        }

        assert_eq!(
            store.events(),
            vec![Event::Create(id), Event::Commit(id), Event::Release(id)]
        );
        assert_eq!(metrics.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_release_on_commit_error() {
        let store = MockStore::<u32>::new("orders");
        let metrics = DispatchMetrics::new();
        let txn = store.transaction_factory().create().await.unwrap();
        let id = txn.id();
        store.fail_next(Stage::Commit, Fault::Conflict);

        let result = async {
            let mut scope = TransactionScope::begin(txn, &metrics);
            scope.commit().await?;
            Ok::<_, StoreError>(())
        }
        .await;

        assert!(matches!(result, Err(StoreError::Conflict { .. })));
        assert_eq!(store.release_count(id), 1);
        assert_eq!(metrics.released_count(), 1);
    }

    #[tokio::test]
    async fn test_release_without_commit() {
        let store = MockStore::<u32>::new("orders");
        let metrics = DispatchMetrics::new();
        let txn = store.transaction_factory().create().await.unwrap();
        let id = txn.id();

        drop(TransactionScope::begin(txn, &metrics));

        assert_eq!(store.release_count(id), 1);
        assert_eq!(store.calls(Stage::Commit), 0);
    }
}
