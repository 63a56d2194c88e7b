//! # Dispatcher
//!
//! 事务化 enqueue 模块。
//!
//! 负责：
//! - 首次使用时解析队列句柄，之后复用
//! - 每个条目一个事务：写入、提交
//! - 任何退出路径（包括取消）都释放事务
//! - 协作方的错误原样返回

pub mod dispatcher;
pub mod lazy;
pub mod metrics;
pub mod mock;
pub mod scope;

pub use contracts::{ReliableDispatch, StoreError};
pub use dispatcher::{ReliableDispatcher, ReliableDispatcherBuilder};
pub use lazy::LazyQueue;
pub use metrics::{DispatchMetrics, MetricsSnapshot};
pub use mock::{MockQueue, MockQueueResolver, MockStore, MockTransaction, MockTransactionFactory};
pub use scope::TransactionScope;
