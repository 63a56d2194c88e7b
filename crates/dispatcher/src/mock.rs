//! Mock 存储
//!
//! 用于无副本存储环境的测试与 `simulate`。每个协议步骤按顺序写入事件日志，
//! 每个阶段都可以按需注入失败或挂起。

use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use contracts::{
    QueueResolver, ReliableQueue, StoreError, Transaction, TransactionFactory, TransactionId,
};
use tracing::trace;

/// 观测到的协议步骤
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// 队列句柄已解析
    Resolve { queue: String },
    /// 事务已创建
    Create(TransactionId),
    /// 尝试写入队列（条目以 `Debug` 渲染）
    Enqueue { txn: TransactionId, item: String },
    /// 尝试提交
    Commit(TransactionId),
    /// 调用了 release
    Release(TransactionId),
}

/// 可注入故障的协议阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Resolve,
    Create,
    Enqueue,
    Commit,
}

/// 注入故障的行为
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// Fail with the stage's own error (`QueueResolution`, `TransactionCreate`, ...)
    Fail,
    /// Fail with `Conflict`
    Conflict,
    /// Fail with `Unavailable`
    Unavailable,
    /// 永不完成（用于取消测试）
    Hang,
}

/// 注入故障的触发时机
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schedule {
    /// 接下来的 `n` 次调用
    Times(u32),
    /// 每第 `n` 次调用（从 1 计数）
    Every(u64),
    /// 每次调用
    Always,
}

#[derive(Debug, Clone, Copy)]
struct FaultRule {
    fault: Fault,
    schedule: Schedule,
}

impl FaultRule {
    /// Decide whether call number `call` (1-based) is hit, consuming a `Times` budget
    fn fires(&mut self, call: u64) -> bool {
        match &mut self.schedule {
            Schedule::Times(0) => false,
            Schedule::Times(n) => {
                *n -= 1;
                true
            }
            Schedule::Every(0) => false,
            Schedule::Every(n) => call % *n == 0,
            Schedule::Always => true,
        }
    }
}

#[derive(Debug)]
struct StoreState<T> {
    events: Vec<Event>,
    staged: HashMap<TransactionId, Vec<T>>,
    committed: Vec<T>,
    rules: HashMap<Stage, FaultRule>,
    calls: HashMap<Stage, u64>,
}

impl<T> Default for StoreState<T> {
    fn default() -> Self {
        Self {
            events: Vec::new(),
            staged: HashMap::new(),
            committed: Vec::new(),
            rules: HashMap::new(),
            calls: HashMap::new(),
        }
    }
}

/// Mock 存储，提供 resolver、事务工厂及其事务
///
/// clone 之间共享状态。
pub struct MockStore<T> {
    name: Arc<str>,
    state: Arc<Mutex<StoreState<T>>>,
    next_txn: Arc<AtomicU64>,
}

impl<T> Debug for MockStore<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockStore")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl<T> Clone for MockStore<T> {
    fn clone(&self) -> Self {
        Self {
            name: Arc::clone(&self.name),
            state: Arc::clone(&self.state),
            next_txn: Arc::clone(&self.next_txn),
        }
    }
}

impl<T> MockStore<T> {
    /// 创建包含队列 `name` 的空存储
    pub fn new(name: &str) -> Self {
        Self {
            name: Arc::from(name),
            state: Arc::new(Mutex::new(StoreState::default())),
            next_txn: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Queue name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Resolver for this store's queue
    pub fn queue_resolver(&self) -> MockQueueResolver<T> {
        MockQueueResolver {
            store: self.clone(),
        }
    }

    /// Transaction factory bound to this store
    pub fn transaction_factory(&self) -> MockTransactionFactory<T> {
        MockTransactionFactory {
            store: self.clone(),
        }
    }

    /// 在 `stage` 注入故障，替换该阶段原有规则
    pub fn inject(&self, stage: Stage, fault: Fault, schedule: Schedule) {
        self.lock()
            .rules
            .insert(stage, FaultRule { fault, schedule });
    }

    /// 让 `stage` 的下一次调用失败
    pub fn fail_next(&self, stage: Stage, fault: Fault) {
        self.inject(stage, fault, Schedule::Times(1));
    }

    /// 清除所有注入的故障
    pub fn clear_faults(&self) {
        self.lock().rules.clear();
    }

    /// 有序的协议事件日志
    pub fn events(&self) -> Vec<Event> {
        self.lock().events.clone()
    }

    /// Number of times `stage` was invoked (successful or not)
    pub fn calls(&self, stage: Stage) -> u64 {
        self.lock().calls.get(&stage).copied().unwrap_or(0)
    }

    /// Number of `Release` events recorded for `txn`
    pub fn release_count(&self, txn: TransactionId) -> usize {
        self.lock()
            .events
            .iter()
            .filter(|e| **e == Event::Release(txn))
            .count()
    }

    /// 已创建但从未释放的事务
    pub fn unreleased(&self) -> Vec<TransactionId> {
        let state = self.lock();
        state
            .events
            .iter()
            .filter_map(|e| match e {
                Event::Create(id) if !state.events.contains(&Event::Release(*id)) => Some(*id),
                _ => None,
            })
            .collect()
    }

    /// Number of committed items
    pub fn committed_len(&self) -> usize {
        self.lock().committed.len()
    }

    /// Items written under transactions that are still open
    pub fn staged_len(&self) -> usize {
        self.lock().staged.values().map(Vec::len).sum()
    }

    fn lock(&self) -> MutexGuard<'_, StoreState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, event: Event) {
        trace!(queue = %self.name, event = ?event, "mock store event");
        self.lock().events.push(event);
    }

    /// Count a call to `stage` and return the fault to apply, if any
    fn check(&self, stage: Stage) -> Option<Fault> {
        let mut state = self.lock();
        let call = {
            let calls = state.calls.entry(stage).or_insert(0);
            *calls += 1;
            *calls
        };
        let rule = state.rules.get_mut(&stage)?;
        rule.fires(call).then_some(rule.fault)
    }

    /// Apply a fault, turning it into the error `fail` builds for this stage
    async fn apply(
        &self,
        fault: Option<Fault>,
        fail: impl FnOnce() -> StoreError,
    ) -> Result<(), StoreError> {
        match fault {
            None => Ok(()),
            Some(Fault::Fail) => Err(fail()),
            Some(Fault::Conflict) => Err(StoreError::conflict(format!(
                "injected conflict on '{}'",
                self.name
            ))),
            Some(Fault::Unavailable) => Err(StoreError::unavailable(format!(
                "injected outage on '{}'",
                self.name
            ))),
            Some(Fault::Hang) => std::future::pending().await,
        }
    }
}

impl<T: Clone> MockStore<T> {
    /// Committed items in commit order
    pub fn committed(&self) -> Vec<T> {
        self.lock().committed.clone()
    }
}

/// Resolver returning a `MockQueue`
#[derive(Debug)]
pub struct MockQueueResolver<T> {
    store: MockStore<T>,
}

impl<T: Send> QueueResolver for MockQueueResolver<T> {
    type Queue = MockQueue<T>;

    fn queue_name(&self) -> &str {
        self.store.name()
    }

    async fn resolve(&self) -> Result<MockQueue<T>, StoreError> {
        let fault = self.store.check(Stage::Resolve);
        self.store
            .apply(fault, || {
                StoreError::queue_resolution(self.store.name(), "injected resolution failure")
            })
            .await?;

        self.store.record(Event::Resolve {
            queue: self.store.name().to_string(),
        });
        Ok(MockQueue {
            store: self.store.clone(),
        })
    }
}

/// Queue handle over a `MockStore`
#[derive(Debug)]
pub struct MockQueue<T> {
    store: MockStore<T>,
}

impl<T: Debug + Send> ReliableQueue<T, MockTransaction<T>> for MockQueue<T> {
    async fn enqueue(&self, txn: &MockTransaction<T>, item: T) -> Result<(), StoreError> {
        let id = txn.id();
        self.store.record(Event::Enqueue {
            txn: id,
            item: format!("{item:?}"),
        });

        let fault = self.store.check(Stage::Enqueue);
        self.store
            .apply(fault, || {
                StoreError::queue_write(self.store.name(), id, "injected write failure")
            })
            .await?;

        if txn.state != TxnState::Active {
            return Err(StoreError::queue_write(
                self.store.name(),
                id,
                "transaction is not active",
            ));
        }

        self.store.lock().staged.entry(id).or_default().push(item);
        Ok(())
    }
}

/// Factory producing `MockTransaction`s with increasing ids
#[derive(Debug)]
pub struct MockTransactionFactory<T> {
    store: MockStore<T>,
}

impl<T: Send> TransactionFactory for MockTransactionFactory<T> {
    type Transaction = MockTransaction<T>;

    async fn create(&self) -> Result<MockTransaction<T>, StoreError> {
        let fault = self.store.check(Stage::Create);
        self.store
            .apply(fault, || {
                StoreError::transaction_create("injected transaction failure")
            })
            .await?;

        let id = TransactionId::new(self.store.next_txn.fetch_add(1, Ordering::Relaxed));
        self.store.record(Event::Create(id));
        Ok(MockTransaction {
            id,
            state: TxnState::Active,
            store: self.store.clone(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TxnState {
    Active,
    Committed,
    Released,
}

/// Transaction over a `MockStore`
///
/// Commit moves staged items to the committed list; release drops whatever
/// is still staged.
#[derive(Debug)]
pub struct MockTransaction<T> {
    id: TransactionId,
    state: TxnState,
    store: MockStore<T>,
}

impl<T: Send> Transaction for MockTransaction<T> {
    fn id(&self) -> TransactionId {
        self.id
    }

    async fn commit(&mut self) -> Result<(), StoreError> {
        self.store.record(Event::Commit(self.id));

        let fault = self.store.check(Stage::Commit);
        let id = self.id;
        self.store
            .apply(fault, || StoreError::commit(id, "injected commit failure"))
            .await?;

        if self.state != TxnState::Active {
            return Err(StoreError::TransactionInactive { txn: self.id });
        }

        let mut state = self.store.lock();
        let staged = state.staged.remove(&self.id).unwrap_or_default();
        state.committed.extend(staged);
        drop(state);

        self.state = TxnState::Committed;
        Ok(())
    }

    fn release(&mut self) {
        self.store.record(Event::Release(self.id));
        self.store.lock().staged.remove(&self.id);
        self.state = TxnState::Released;
    }
}
