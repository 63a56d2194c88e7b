//! `simulate` command implementation.
//!
//! Drives the dispatcher against the in-memory store with the configured
//! fault injection and reports what was committed.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use config_loader::ConfigLoader;
use contracts::{DispatchConfig, SimulationConfig};
use dispatcher::mock::{Fault, Schedule, Stage};
use dispatcher::{MetricsSnapshot, MockStore, ReliableDispatcher};
use serde::Serialize;
use tracing::{info, warn};

use crate::cli::SimulateArgs;

/// Simulation report
#[derive(Debug, Serialize)]
struct SimulationReport {
    queue: String,
    items: u64,
    concurrency: usize,
    committed: usize,
    failures: BTreeMap<String, u64>,
    unreleased_transactions: usize,
    duration_ms: f64,
    metrics: MetricsSnapshot,
}

/// Execute the `simulate` command
pub async fn run_simulate(args: &SimulateArgs) -> Result<()> {
    let config = load_config(args)?;
    let report = simulate(&config).await?;

    if args.json {
        let json =
            serde_json::to_string_pretty(&report).context("Failed to serialize report")?;
        println!("{}", json);
    } else {
        print_report(&report);
    }

    if report.unreleased_transactions > 0 {
        anyhow::bail!(
            "{} transaction(s) were never released",
            report.unreleased_transactions
        );
    }
    Ok(())
}

/// Load the config file and apply the command-line overrides
///
/// The overridden config goes through the same validation as the file.
fn load_config(args: &SimulateArgs) -> Result<DispatchConfig> {
    info!(config = %args.config.display(), "Loading configuration");

    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    let mut config = ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;
    apply_overrides(&mut config, args);
    ConfigLoader::validate(&config).context("Invalid command-line overrides")?;

    Ok(config)
}

fn apply_overrides(config: &mut DispatchConfig, args: &SimulateArgs) {
    if let Some(items) = args.items {
        info!(items, "Overriding item count from CLI");
        config.simulation.items = items;
    }
    if let Some(concurrency) = args.concurrency {
        info!(concurrency, "Overriding concurrency from CLI");
        config.simulation.concurrency = concurrency;
    }
}

/// Install the configured faults on the store
fn inject_faults(store: &MockStore<u64>, sim: &SimulationConfig) {
    if sim.fail_resolve > 0 {
        store.inject(
            Stage::Resolve,
            Fault::Unavailable,
            Schedule::Times(sim.fail_resolve),
        );
    }
    if sim.fail_enqueue_every > 0 {
        store.inject(
            Stage::Enqueue,
            Fault::Fail,
            Schedule::Every(sim.fail_enqueue_every),
        );
    }
    if sim.fail_commit_every > 0 {
        store.inject(
            Stage::Commit,
            Fault::Conflict,
            Schedule::Every(sim.fail_commit_every),
        );
    }
}

async fn simulate(config: &DispatchConfig) -> Result<SimulationReport> {
    let sim = &config.simulation;
    let store = MockStore::<u64>::new(&config.queue.name);
    inject_faults(&store, sim);

    let dispatcher = Arc::new(
        ReliableDispatcher::<u64, _, _>::builder()
            .reliable_queue(store.queue_resolver())
            .transaction_factory(store.transaction_factory())
            .build()?,
    );

    info!(
        queue = %config.queue.name,
        items = sim.items,
        concurrency = sim.concurrency,
        "Starting simulation"
    );

    let started = Instant::now();
    let next = Arc::new(AtomicU64::new(0));
    let mut workers = Vec::with_capacity(sim.concurrency);

    for _ in 0..sim.concurrency {
        let dispatcher = Arc::clone(&dispatcher);
        let next = Arc::clone(&next);
        let total = sim.items;

        workers.push(tokio::spawn(async move {
            let mut failures: BTreeMap<String, u64> = BTreeMap::new();
            loop {
                let item = next.fetch_add(1, Ordering::Relaxed);
                if item >= total {
                    break;
                }

                let call_started = Instant::now();
                let result = dispatcher.enqueue(item).await;
                observability::record_enqueue(
                    dispatcher.queue_name(),
                    &result,
                    call_started.elapsed(),
                );

                if let Err(e) = result {
                    *failures.entry(e.kind().to_string()).or_insert(0) += 1;
                }
            }
            failures
        }));
    }

    let mut failures = BTreeMap::new();
    for worker in workers {
        let worker_failures = worker.await.context("Simulation worker panicked")?;
        for (kind, count) in worker_failures {
            *failures.entry(kind).or_insert(0) += count;
        }
    }

    let metrics = dispatcher.metrics().snapshot();
    observability::record_in_flight(dispatcher.queue_name(), dispatcher.metrics().in_flight());

    let unreleased = store.unreleased();
    if !unreleased.is_empty() {
        warn!(count = unreleased.len(), "Transactions left unreleased");
    }

    Ok(SimulationReport {
        queue: config.queue.name.clone(),
        items: sim.items,
        concurrency: sim.concurrency,
        committed: store.committed_len(),
        failures,
        unreleased_transactions: unreleased.len(),
        duration_ms: duration_ms(started.elapsed()),
        metrics,
    })
}

fn duration_ms(elapsed: Duration) -> f64 {
    elapsed.as_secs_f64() * 1000.0
}

fn print_report(report: &SimulationReport) {
    println!("\nSimulation of '{}'", report.queue);
    println!("   ├─ Items: {}", report.items);
    println!("   ├─ Concurrency: {}", report.concurrency);
    println!("   ├─ Duration: {:.2}ms", report.duration_ms);
    println!("   ├─ Committed: {}", report.committed);
    println!(
        "   └─ Unreleased transactions: {}",
        report.unreleased_transactions
    );

    if !report.failures.is_empty() {
        println!("\nFailures");
        for (kind, count) in &report.failures {
            println!("   - {}: {}", kind, count);
        }
    }

    let m = &report.metrics;
    println!("\nDispatcher metrics");
    println!(
        "   ├─ Transactions opened/released: {}/{}",
        m.opened_count, m.released_count
    );
    println!(
        "   └─ Resolutions attempted/failed: {}/{}",
        m.resolution_attempts, m.resolution_failures
    );
}
