//! DispatchConfig - Config Loader 输出
//!
//! 描述目标队列、可观测性设置以及内存模拟参数。

use serde::{Deserialize, Serialize};
use validator::Validate;

/// 配置版本
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// 完整的 dispatcher 配置
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DispatchConfig {
    /// 配置版本
    #[serde(default)]
    pub version: ConfigVersion,

    /// 目标队列
    #[validate(nested)]
    pub queue: QueueConfig,

    /// 日志 / 指标
    #[serde(default)]
    #[validate(nested)]
    pub observability: ObservabilitySettings,

    /// 内存模拟参数
    #[serde(default)]
    #[validate(nested)]
    pub simulation: SimulationConfig,
}

/// 目标队列
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct QueueConfig {
    /// 在状态管理器中注册的队列名
    #[validate(length(min = 1, max = 256))]
    pub name: String,
}

/// 日志输出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// JSON 结构化日志
    #[default]
    Json,
    /// 人类可读
    Pretty,
    /// 单行
    Compact,
}

/// 可观测性设置
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ObservabilitySettings {
    /// 日志格式
    #[serde(default)]
    pub log_format: LogFormat,

    /// 默认日志级别（`RUST_LOG` 优先）
    #[serde(default = "default_log_level")]
    #[validate(length(min = 1))]
    pub log_level: String,

    /// Prometheus 端口 (None = 不启用)
    #[serde(default)]
    #[validate(range(min = 1))]
    pub metrics_port: Option<u16>,
}

impl Default for ObservabilitySettings {
    fn default() -> Self {
        Self {
            log_format: LogFormat::default(),
            log_level: default_log_level(),
            metrics_port: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// `simulate` 的负载与故障注入参数
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SimulationConfig {
    /// enqueue 的条目数
    #[serde(default = "default_items")]
    #[validate(range(min = 1))]
    pub items: u64,

    /// 并发调用方数量
    #[serde(default = "default_concurrency")]
    #[validate(range(min = 1, max = 1024))]
    pub concurrency: usize,

    /// 前 N 次队列解析失败
    #[serde(default)]
    pub fail_resolve: u32,

    /// 每第 N 次队列写入失败 (0 = 从不)
    #[serde(default)]
    pub fail_enqueue_every: u64,

    /// 每第 N 次提交失败 (0 = 从不)
    #[serde(default)]
    pub fail_commit_every: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            items: default_items(),
            concurrency: default_concurrency(),
            fail_resolve: 0,
            fail_enqueue_every: 0,
            fail_commit_every: 0,
        }
    }
}

fn default_items() -> u64 {
    100
}

fn default_concurrency() -> usize {
    4
}
