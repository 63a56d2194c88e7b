//! # Observability
//!
//! 可观测性模块：Tracing + Prometheus 指标。
//!
//! ## 功能
//!
//! - Tracing 初始化 (JSON/Pretty/Compact)，级别与格式来自配置文件 `[observability]`
//! - Prometheus 指标导出
//! - enqueue 结果与延迟记录
//!
//! ## 使用示例
//!
//! ```ignore
//! use observability::{init_with_config, metrics, ObservabilityConfig};
//!
//! // 按配置初始化
//! init_with_config(ObservabilityConfig::from(&config.observability))?;
//!
//! let started = std::time::Instant::now();
//! let result = dispatcher.enqueue(item).await;
//! metrics::record_enqueue("orders", &result, started.elapsed());
//! ```

pub mod metrics;

use anyhow::{Context, Result};
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

pub use contracts::LogFormat;

// Re-exports
pub use crate::metrics::{outcome_label, record_enqueue, record_in_flight, EnqueueOutcome};

/// 可观测性配置
///
/// 由 `[observability]` 配置段转换而来，调用方可在初始化前覆盖任一字段。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservabilityConfig {
    /// 日志格式
    pub log_format: LogFormat,
    /// Prometheus 端口 (None = 不启用)
    pub metrics_port: Option<u16>,
    /// 默认日志级别，设置了 `RUST_LOG` 时以其为准
    pub default_log_level: String,
}

impl From<&contracts::ObservabilitySettings> for ObservabilityConfig {
    fn from(settings: &contracts::ObservabilitySettings) -> Self {
        Self {
            log_format: settings.log_format,
            metrics_port: settings.metrics_port,
            default_log_level: settings.log_level.clone(),
        }
    }
}

/// 初始化 Tracing，并在配置了端口时启动 Prometheus exporter
///
/// 全局 subscriber 只能安装一次，重复调用返回错误。
pub fn init_with_config(config: ObservabilityConfig) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.default_log_level)
            .with_context(|| format!("Invalid log level '{}'", config.default_log_level))?,
    };

    let fmt_layer = match config.log_format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .boxed(),
        LogFormat::Pretty => fmt::layer().pretty().boxed(),
        LogFormat::Compact => fmt::layer().compact().boxed(),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .context("Failed to initialize tracing subscriber")?;

    if let Some(port) = config.metrics_port {
        init_metrics_only(port)?;
    }

    tracing::info!(
        log_format = ?config.log_format,
        log_level = %config.default_log_level,
        metrics_port = ?config.metrics_port,
        "Observability initialized"
    );

    Ok(())
}

/// 仅初始化 Prometheus 指标（不安装 tracing subscriber）
pub fn init_metrics_only(port: u16) -> Result<()> {
    PrometheusBuilder::new()
        .with_http_listener(([0, 0, 0, 0], port))
        .install()
        .context("Failed to install Prometheus recorder")?;

    tracing::info!(port = port, "Prometheus metrics endpoint initialized");
    Ok(())
}
