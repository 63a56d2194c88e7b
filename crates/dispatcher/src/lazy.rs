//! LazyQueue - resolves the queue handle on first use and memoizes it

use std::sync::Arc;

use contracts::{QueueResolver, StoreError};
use tokio::sync::OnceCell;
use tracing::{info, instrument, warn};

use crate::metrics::DispatchMetrics;

/// Deferred queue handle
///
/// The first successful resolution is cached for the lifetime of the holder.
/// Failed resolutions are not cached: the next `get` resolves again.
/// Concurrent first callers wait on a single in-progress resolution.
pub struct LazyQueue<R: QueueResolver> {
    resolver: R,
    cell: OnceCell<R::Queue>,
    metrics: Arc<DispatchMetrics>,
}

impl<R: QueueResolver> LazyQueue<R> {
    /// Wrap a resolver; nothing is resolved yet
    pub fn new(resolver: R, metrics: Arc<DispatchMetrics>) -> Self {
        Self {
            resolver,
            cell: OnceCell::new(),
            metrics,
        }
    }

    /// Queue name
    pub fn name(&self) -> &str {
        self.resolver.queue_name()
    }

    /// Whether the handle has been resolved
    pub fn is_resolved(&self) -> bool {
        self.cell.initialized()
    }

    /// Get the queue handle, resolving it on first access
    ///
    /// # Errors
    /// The resolver's error, unchanged
    pub async fn get(&self) -> Result<&R::Queue, StoreError> {
        if let Some(queue) = self.cell.get() {
            return Ok(queue);
        }
        self.cell.get_or_try_init(|| self.resolve()).await
    }

    #[instrument(name = "lazy_queue_resolve", skip(self), fields(queue = %self.name()))]
    async fn resolve(&self) -> Result<R::Queue, StoreError> {
        self.metrics.inc_resolution_attempts();

        match self.resolver.resolve().await {
            Ok(queue) => {
                info!(queue = %self.name(), "Queue resolved");
                Ok(queue)
            }
            Err(e) => {
                self.metrics.inc_resolution_failures();
                warn!(queue = %self.name(), error = %e, "Queue resolution failed");
                Err(e)
            }
        }
    }
}
