//! `validate` command implementation.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// 校验结果（JSON 输出）
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    queue: String,
    log_format: String,
    metrics_port: Option<u16>,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(config) => {
            let warnings = collect_warnings(&config);
            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                summary: Some(ConfigSummary {
                    version: format!("{:?}", config.version),
                    queue: config.queue.name.clone(),
                    log_format: format!("{:?}", config.observability.log_format),
                    metrics_port: config.observability.metrics_port,
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// 收集配置警告（非致命问题）
fn collect_warnings(config: &contracts::DispatchConfig) -> Vec<String> {
    let mut warnings = Vec::new();
    let sim = &config.simulation;

    if sim.fail_enqueue_every == 1 || sim.fail_commit_every == 1 {
        warnings.push("simulation fails every call - nothing will be committed".to_string());
    }

    if u64::from(sim.fail_resolve) >= sim.items {
        warnings.push(format!(
            "simulation.fail_resolve ({}) >= items ({}) - queue never resolves",
            sim.fail_resolve, sim.items
        ));
    }

    if sim.concurrency as u64 > sim.items {
        warnings.push(format!(
            "simulation.concurrency ({}) exceeds items ({})",
            sim.concurrency, sim.items
        ));
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Queue: {}", summary.queue);
            println!("  Log format: {}", summary.log_format);
            match summary.metrics_port {
                Some(port) => println!("  Metrics port: {}", port),
                None => println!("  Metrics port: disabled"),
            }
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}
