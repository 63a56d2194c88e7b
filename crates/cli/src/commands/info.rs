//! `info` 命令实现
//!
//! 打印生效的配置。

use anyhow::{Context, Result};
use tracing::info;

use crate::cli::InfoArgs;

/// 执行 `info` 命令
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    let config = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    if args.json {
        let json = config_loader::ConfigLoader::to_json(&config)
            .context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&config);
    }

    Ok(())
}

fn print_config_info(config: &contracts::DispatchConfig) {
    println!("Configuration ({:?})", config.version);

    println!("\nQueue");
    println!("   └─ Name: {}", config.queue.name);

    let obs = &config.observability;
    println!("\nObservability");
    println!("   ├─ Log format: {:?}", obs.log_format);
    println!("   ├─ Log level: {}", obs.log_level);
    match obs.metrics_port {
        Some(port) => println!("   └─ Metrics port: {}", port),
        None => println!("   └─ Metrics port: disabled"),
    }

    let sim = &config.simulation;
    println!("\nSimulation");
    println!("   ├─ Items: {}", sim.items);
    println!("   ├─ Concurrency: {}", sim.concurrency);
    println!("   ├─ Failed resolutions: {}", sim.fail_resolve);
    println!("   ├─ Fail every Nth write: {}", every(sim.fail_enqueue_every));
    println!("   └─ Fail every Nth commit: {}", every(sim.fail_commit_every));
}

fn every(n: u64) -> String {
    if n == 0 {
        "never".to_string()
    } else {
        n.to_string()
    }
}
