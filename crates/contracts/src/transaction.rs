//! Transaction contracts - the unit of atomic work against the store
//!
//! A transaction is created per enqueue, used for a single queue write,
//! committed on success and released on every exit path.

use std::fmt;

use crate::StoreError;

/// Identifier of a transaction, unique per factory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransactionId(u64);

impl TransactionId {
    /// Wrap a raw id
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw numeric id
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "txn-{}", self.0)
    }
}

/// A scoped unit of work against the replicated store.
#[trait_variant::make(Transaction: Send)]
pub trait LocalTransaction {
    /// Transaction id (used for logging/assertions)
    fn id(&self) -> TransactionId;

    /// Durably finalize every write performed under this transaction
    ///
    /// # Errors
    /// Conflict, timeout or disconnection reported by the store
    async fn commit(&mut self) -> Result<(), StoreError>;

    /// Free the resources held by this transaction.
    ///
    /// Must be idempotent and safe after a successful or failed commit.
    /// Uncommitted writes are rolled back by the store.
    fn release(&mut self);
}

/// Creates transactions on demand
#[trait_variant::make(TransactionFactory: Send)]
pub trait LocalTransactionFactory {
    /// Transaction type produced by this factory
    type Transaction: Transaction;

    /// Create a new transaction
    ///
    /// # Errors
    /// Returns `TransactionCreate` (or a store error) when no transaction can be opened
    async fn create(&self) -> Result<Self::Transaction, StoreError>;
}
