//! # Integration Tests
//!
//! 跨 crate 集成测试。
//!
//! 覆盖：
//! - 契约测试（错误类型、参数名）
//! - 配置文件 -> dispatcher 端到端运行
//! - 并发、失败与取消下的 enqueue 协议

#[cfg(test)]
mod contract_tests {
    use contracts::{StoreError, TransactionId};

    #[test]
    fn test_invalid_argument_names_parameter() {
        for param in ["reliable_queue", "transaction_factory", "item"] {
            let err = StoreError::invalid_argument(param);
            assert_eq!(err.param(), Some(param));
            assert!(err.to_string().contains(param));
            assert!(!err.is_transient());
        }
    }

    #[test]
    fn test_error_kinds_are_stable() {
        assert_eq!(StoreError::invalid_argument("item").kind(), "invalid_argument");
        assert_eq!(
            StoreError::commit(TransactionId::new(1), "conflict").kind(),
            "commit"
        );
        assert_eq!(
            StoreError::queue_resolution("orders", "not primary").kind(),
            "queue_resolution"
        );
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::io::Write;
    use std::sync::Arc;
    use std::time::Duration;

    use config_loader::ConfigLoader;
    use contracts::{resolve_with, ReliableDispatch, StoreError, TransactionId};
    use dispatcher::mock::{Event, Fault, Schedule, Stage};
    use dispatcher::{MockQueueResolver, MockStore, MockTransactionFactory, ReliableDispatcher};

    type StringDispatcher =
        ReliableDispatcher<String, MockQueueResolver<String>, MockTransactionFactory<String>>;

    fn string_dispatcher(store: &MockStore<String>) -> StringDispatcher {
        StringDispatcher::builder()
            .reliable_queue(store.queue_resolver())
            .transaction_factory(store.transaction_factory())
            .build()
            .unwrap()
    }

    /// 配置文件 -> ConfigLoader -> ReliableDispatcher -> MockStore
    #[tokio::test]
    async fn test_e2e_config_to_commit() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(b"[queue]\nname = \"orders\"\n").unwrap();

        let config = ConfigLoader::load_from_path(file.path()).unwrap();
        let store = MockStore::<String>::new(&config.queue.name);
        let dispatcher = string_dispatcher(&store);

        for i in 0..5 {
            dispatcher.enqueue(format!("order-{i}")).await.unwrap();
        }

        assert_eq!(dispatcher.queue_name(), "orders");
        assert_eq!(store.committed_len(), 5);
        assert_eq!(store.calls(Stage::Resolve), 1);
        assert!(store.unreleased().is_empty());
    }

    /// 队列与事务工厂均为桩实现，事务为 T1；enqueue("x")
    #[tokio::test]
    async fn test_enqueue_protocol_order() {
        let store = MockStore::<String>::new("orders");
        let dispatcher = string_dispatcher(&store);

        dispatcher.enqueue("x".to_string()).await.unwrap();

        let t1 = TransactionId::new(1);
        let steps: Vec<_> = store
            .events()
            .into_iter()
            .filter(|e| !matches!(e, Event::Resolve { .. }))
            .collect();
        assert_eq!(
            steps,
            vec![
                Event::Create(t1),
                Event::Enqueue {
                    txn: t1,
                    item: "\"x\"".to_string()
                },
                Event::Commit(t1),
                Event::Release(t1),
            ]
        );
    }

    /// 队列写入失败：仍然 release，不会 commit
    #[tokio::test]
    async fn test_queue_failure_propagates_after_release() {
        let store = MockStore::<String>::new("orders");
        let dispatcher = string_dispatcher(&store);
        store.fail_next(Stage::Enqueue, Fault::Fail);

        let err = dispatcher.enqueue("x".to_string()).await.unwrap_err();

        assert!(matches!(err, StoreError::QueueWrite { .. }));
        assert_eq!(store.release_count(TransactionId::new(1)), 1);
        assert_eq!(store.calls(Stage::Commit), 0);
    }

    #[tokio::test]
    async fn test_none_item_never_opens_transaction() {
        let store = MockStore::<String>::new("orders");
        let dispatcher = string_dispatcher(&store);

        let err = dispatcher.enqueue(None::<String>).await.unwrap_err();

        assert_eq!(err.param(), Some("item"));
        assert_eq!(store.calls(Stage::Create), 0);
        assert_eq!(store.calls(Stage::Resolve), 0);
    }

    #[tokio::test]
    async fn test_concurrent_enqueues_resolve_once() {
        let store = MockStore::<String>::new("orders");
        let dispatcher = Arc::new(string_dispatcher(&store));

        let mut handles = Vec::new();
        for worker in 0..4 {
            let dispatcher = Arc::clone(&dispatcher);
            handles.push(tokio::spawn(async move {
                for i in 0..10 {
                    dispatcher.enqueue(format!("w{worker}-{i}")).await?;
                }
                Ok::<_, StoreError>(())
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(store.calls(Stage::Resolve), 1);
        assert_eq!(store.committed_len(), 40);
        assert_eq!(dispatcher.metrics().in_flight(), 0);
    }

    #[tokio::test]
    async fn test_cancellation_mid_commit_releases() {
        let store = MockStore::<String>::new("orders");
        let dispatcher = string_dispatcher(&store);
        store.inject(Stage::Commit, Fault::Hang, Schedule::Always);

        let result = tokio::time::timeout(
            Duration::from_millis(20),
            dispatcher.enqueue("x".to_string()),
        )
        .await;

        assert!(result.is_err());
        assert_eq!(store.calls(Stage::Commit), 1);
        assert_eq!(store.release_count(TransactionId::new(1)), 1);
        assert_eq!(store.committed_len(), 0);
        assert_eq!(store.staged_len(), 0);
    }

    #[tokio::test]
    async fn test_transient_errors_surface_unchanged() {
        let store = MockStore::<String>::new("orders");
        let dispatcher = string_dispatcher(&store);
        store.fail_next(Stage::Commit, Fault::Conflict);

        let err = dispatcher.enqueue("x".to_string()).await.unwrap_err();
        assert!(err.is_transient());

        // dispatcher 不重试，由调用方决定
        dispatcher.enqueue("x".to_string()).await.unwrap();
        assert_eq!(store.committed(), vec!["x".to_string()]);
        assert_eq!(store.calls(Stage::Create), 2);
    }

    /// 由闭包构造的 resolver
    #[tokio::test]
    async fn test_closure_resolver() {
        let store = MockStore::<String>::new("orders");
        let backing = store.clone();
        let resolver = resolve_with("orders", move || {
            let backing = backing.clone();
            async move {
                use contracts::QueueResolver;
                backing.queue_resolver().resolve().await
            }
        });

        let dispatcher = ReliableDispatcher::<String, _, _>::new(
            resolver,
            store.transaction_factory(),
        );
        dispatcher.enqueue("x".to_string()).await.unwrap();

        assert!(dispatcher.is_resolved());
        assert_eq!(store.committed(), vec!["x".to_string()]);
    }

    /// 通过 ReliableDispatch trait 使用 dispatcher
    #[tokio::test]
    async fn test_dispatch_capability() {
        async fn publish<D>(dispatcher: &D) -> Result<(), StoreError>
        where
            D: ReliableDispatch<String>,
        {
            dispatcher.enqueue("a".to_string()).await?;
            dispatcher.enqueue(None::<String>).await
        }

        let store = MockStore::<String>::new("orders");
        let dispatcher = string_dispatcher(&store);

        let err = publish(&dispatcher).await.unwrap_err();

        assert!(matches!(err, StoreError::InvalidArgument { param: "item" }));
        assert_eq!(store.committed_len(), 1);
    }

    #[test]
    fn test_observability_outcome_labels() {
        let ok: Result<(), StoreError> = Ok(());
        assert_eq!(
            observability::outcome_label(&ok),
            observability::EnqueueOutcome::Committed
        );
    }
}
