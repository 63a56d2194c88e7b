//! 日志初始化参数
//!
//! 以配置文件的 `[observability]` 为基础，命令行参数优先：
//! - `--log-format` 覆盖 `log_format`
//! - `-q` / `-v` / `-vv` 覆盖 `log_level`
//! - `simulate --metrics-port` 覆盖 `metrics_port`，0 表示关闭
//!
//! `RUST_LOG` 仍然优先于以上所有级别设置。

use std::path::Path;

use config_loader::ConfigLoader;
use contracts::ObservabilitySettings;
use observability::ObservabilityConfig;

use crate::cli::{Cli, Commands};

/// 读取配置文件中的可观测性设置
///
/// 此时日志尚未初始化，加载失败时退回默认值，错误由命令自身报告。
pub fn settings_from_config(path: &Path) -> ObservabilitySettings {
    ConfigLoader::load_from_path(path)
        .map(|config| config.observability)
        .unwrap_or_default()
}

/// 合并配置与命令行参数
pub fn observability_config(cli: &Cli, settings: &ObservabilitySettings) -> ObservabilityConfig {
    let mut config = ObservabilityConfig::from(settings);

    if let Some(format) = cli.log_format {
        config.log_format = format.into();
    }

    if cli.quiet {
        config.default_log_level = "warn".to_string();
    } else if cli.verbose > 0 {
        let level = if cli.verbose == 1 { "debug" } else { "trace" };
        config.default_log_level = level.to_string();
    }

    // 只有 simulate 会产生指标
    config.metrics_port = match &cli.command {
        Commands::Simulate(args) => args.metrics_port.or(settings.metrics_port),
        Commands::Validate(_) | Commands::Info(_) => None,
    }
    .filter(|port| *port != 0);

    config
}
