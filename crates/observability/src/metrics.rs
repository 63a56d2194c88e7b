//! enqueue 指标记录
//!
//! 通过 `metrics` facade 记录；安装了 Prometheus recorder 时导出，否则为空操作。

use std::time::Duration;

use contracts::StoreError;
use metrics::{counter, gauge, histogram};

/// 单次 enqueue 的结果标签
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueOutcome {
    Committed,
    Rejected,
    Failed,
}

impl EnqueueOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Committed => "committed",
            Self::Rejected => "rejected",
            Self::Failed => "failed",
        }
    }
}

/// enqueue 结果分类
///
/// 参数非法记为 `rejected`，其他错误记为 `failed`。
pub fn outcome_label(result: &Result<(), StoreError>) -> EnqueueOutcome {
    match result {
        Ok(()) => EnqueueOutcome::Committed,
        Err(StoreError::InvalidArgument { .. }) => EnqueueOutcome::Rejected,
        Err(_) => EnqueueOutcome::Failed,
    }
}

/// 记录一次 enqueue：次数、错误类型、延迟 (ms)
pub fn record_enqueue(queue: &str, result: &Result<(), StoreError>, elapsed: Duration) {
    let outcome = outcome_label(result);
    counter!(
        "reliable_dispatch_enqueue_total",
        "queue" => queue.to_string(),
        "outcome" => outcome.as_str()
    )
    .increment(1);

    if let Err(e) = result {
        counter!(
            "reliable_dispatch_errors_total",
            "queue" => queue.to_string(),
            "kind" => e.kind()
        )
        .increment(1);
    }

    histogram!(
        "reliable_dispatch_enqueue_latency_ms",
        "queue" => queue.to_string()
    )
    .record(elapsed.as_secs_f64() * 1000.0);
}

/// 记录已打开但尚未释放的事务数
pub fn record_in_flight(queue: &str, in_flight: u64) {
    gauge!(
        "reliable_dispatch_transactions_in_flight",
        "queue" => queue.to_string()
    )
    .set(in_flight as f64);
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::TransactionId;

    #[test]
    fn test_outcome_label() {
        assert_eq!(outcome_label(&Ok(())), EnqueueOutcome::Committed);
        assert_eq!(
            outcome_label(&Err(StoreError::invalid_argument("item"))),
            EnqueueOutcome::Rejected
        );
        assert_eq!(
            outcome_label(&Err(StoreError::commit(TransactionId::new(1), "conflict"))),
            EnqueueOutcome::Failed
        );
    }

    #[test]
    fn test_record_without_recorder_is_noop() {
        record_enqueue("orders", &Ok(()), Duration::from_millis(3));
        record_in_flight("orders", 0);
    }
}
