//! # Reliable Dispatch CLI
//!
//! 命令行接口入口点。
//!
//! 提供：
//! - 配置校验与查看
//! - 基于内存存储的 enqueue 协议模拟（可注入故障）

mod cli;
mod commands;
mod logging;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use cli::{Cli, Commands};
use commands::{run_info, run_simulate, run_validate};

#[tokio::main]
async fn main() -> Result<()> {
    // 加载 .env（如果存在）
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // 日志配置来自命令读取的同一份配置文件，命令行参数优先
    let settings = logging::settings_from_config(cli.command.config_path());
    observability::init_with_config(logging::observability_config(&cli, &settings))?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %cli.command.config_path().display(),
        "Reliable Dispatch CLI starting"
    );

    let result = match &cli.command {
        Commands::Validate(args) => run_validate(args),
        Commands::Info(args) => run_info(args),
        Commands::Simulate(args) => run_simulate(args).await,
    };

    if let Err(ref e) = result {
        tracing::error!(error = %e, "Command failed");
    }

    result
}
