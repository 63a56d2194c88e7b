//! # Contracts
//!
//! Frozen interface contracts between the dispatcher and the replicated store.
//! All business crates depend on this crate only; reverse dependencies are prohibited.
//!
//! ## Enqueue protocol
//! - `QueueResolver` materializes the queue handle (once per dispatcher)
//! - `TransactionFactory` hands out one `Transaction` per enqueue
//! - `ReliableQueue::enqueue` writes under that transaction
//! - `Transaction::commit` is the durability boundary, `Transaction::release` always runs

mod config;
mod dispatch;
mod error;
mod queue;
mod transaction;

pub use config::*;
pub use dispatch::{LocalReliableDispatch, ReliableDispatch};
pub use error::*;
pub use queue::{
    resolve_with, FnResolver, LocalQueueResolver, LocalReliableQueue, QueueResolver, ReliableQueue,
};
pub use transaction::{
    LocalTransaction, LocalTransactionFactory, Transaction, TransactionFactory, TransactionId,
};
