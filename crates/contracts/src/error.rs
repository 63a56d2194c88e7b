//! Layered error definitions
//!
//! Categorized by source: argument / queue / transaction / store / config

use thiserror::Error;

use crate::TransactionId;

/// Unified error type
///
/// Collaborators return this type and the dispatcher hands it back to the
/// caller unchanged.
#[derive(Debug, Error)]
pub enum StoreError {
    // ===== Argument Errors =====
    /// A required argument or collaborator was not supplied
    #[error("invalid argument: '{param}' is required")]
    InvalidArgument { param: &'static str },

    // ===== Queue Errors =====
    /// The queue reference could not be materialized
    #[error("failed to resolve queue '{queue}': {message}")]
    QueueResolution { queue: String, message: String },

    /// The queue rejected a write under the active transaction
    #[error("queue '{queue}' rejected write in {txn}: {message}")]
    QueueWrite {
        queue: String,
        txn: TransactionId,
        message: String,
    },

    // ===== Transaction Errors =====
    /// The factory could not produce a transaction
    #[error("failed to create transaction: {message}")]
    TransactionCreate { message: String },

    /// The store could not durably finalize the transaction
    #[error("commit of {txn} failed: {message}")]
    Commit { txn: TransactionId, message: String },

    /// The transaction is no longer usable (already committed or released)
    #[error("{txn} is no longer active")]
    TransactionInactive { txn: TransactionId },

    // ===== Store Errors =====
    /// Write conflict detected by the store
    #[error("conflict: {message}")]
    Conflict { message: String },

    /// The store did not answer in time
    #[error("timed out after {waited_ms}ms: {operation}")]
    Timeout { operation: String, waited_ms: u64 },

    /// The operation was cancelled by the store
    #[error("operation cancelled: {operation}")]
    Cancelled { operation: String },

    /// The store (or this replica) is not reachable / not primary
    #[error("store unavailable: {message}")]
    Unavailable { message: String },

    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl StoreError {
    /// Create invalid argument error
    pub fn invalid_argument(param: &'static str) -> Self {
        Self::InvalidArgument { param }
    }

    /// Create queue resolution error
    pub fn queue_resolution(queue: impl Into<String>, message: impl Into<String>) -> Self {
        Self::QueueResolution {
            queue: queue.into(),
            message: message.into(),
        }
    }

    /// Create queue write error
    pub fn queue_write(
        queue: impl Into<String>,
        txn: TransactionId,
        message: impl Into<String>,
    ) -> Self {
        Self::QueueWrite {
            queue: queue.into(),
            txn,
            message: message.into(),
        }
    }

    /// Create transaction creation error
    pub fn transaction_create(message: impl Into<String>) -> Self {
        Self::TransactionCreate {
            message: message.into(),
        }
    }

    /// Create commit error
    pub fn commit(txn: TransactionId, message: impl Into<String>) -> Self {
        Self::Commit {
            txn,
            message: message.into(),
        }
    }

    /// Create conflict error
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    /// Create unavailable error
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Name of the missing parameter, for `InvalidArgument`
    pub fn param(&self) -> Option<&'static str> {
        match self {
            Self::InvalidArgument { param } => Some(*param),
            _ => None,
        }
    }

    /// Whether a caller-side retry may succeed.
    ///
    /// The dispatcher itself never retries.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Conflict { .. } | Self::Timeout { .. } | Self::Unavailable { .. }
        )
    }

    /// Short, stable label used for metrics and summaries
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidArgument { .. } => "invalid_argument",
            Self::QueueResolution { .. } => "queue_resolution",
            Self::QueueWrite { .. } => "queue_write",
            Self::TransactionCreate { .. } => "transaction_create",
            Self::Commit { .. } => "commit",
            Self::TransactionInactive { .. } => "transaction_inactive",
            Self::Conflict { .. } => "conflict",
            Self::Timeout { .. } => "timeout",
            Self::Cancelled { .. } => "cancelled",
            Self::Unavailable { .. } => "unavailable",
            Self::ConfigParse { .. } => "config_parse",
            Self::ConfigValidation { .. } => "config_validation",
            Self::Io(_) => "io",
            Self::Other(_) => "other",
        }
    }
}
