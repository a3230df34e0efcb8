// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
ecobot collection node

Resumes or opens a work period, then runs the ingest pipeline until Ctrl+C.

Usage:
  cargo run --bin ecobot-node -- --config ecobot_configuration.toml
  cargo run --bin ecobot-node -- --offline --simulate --debug-ecobot-correlator

Type `recharge` on stdin to close the running period and open the next one.
*/

use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tokio::sync::watch;
use tracing::{info, warn};

use ecobot::agent::{
    spawn_ingest, spawn_line_reader, spawn_recharge_listener, spawn_simulation, CollectionPipeline,
    SimulationConfig,
};
use ecobot::config::{
    apply_cli_overrides, apply_environment_overrides, load_config, validate_config, ConfigError,
    EcobotConfig,
};
use ecobot::correlator::EventCorrelator;
use ecobot::ledger::{run_startup_backup, HttpLedgerClient, InMemoryLedger, RemoteLedger, RetryPolicy};
use ecobot::observability::parse_debug_flags;
use ecobot::services::PeriodLifecycleManager;
use ecobot::structures::LoadCellCalibration;
use ecobot::transports::ResilientPublisher;

const INGEST_CAPACITY: usize = 64;

/// ecobot collection node - detection/weight fusion with durable work-period accounting
#[derive(Parser, Debug)]
#[command(name = "ecobot-node", version, long_about = None)]
struct Args {
    /// Path to ecobot_configuration.toml (searched for when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Configuration override, e.g. `--set device_id=bot-3` (repeatable)
    #[arg(long = "set", value_name = "KEY=VALUE")]
    overrides: Vec<String>,

    /// Keep the ledger in memory instead of calling the accounting service
    #[arg(long, default_value_t = false)]
    offline: bool,

    /// Drive the pipeline from simulated producers
    #[arg(long, default_value_t = false)]
    simulate: bool,

    /// Tick of the simulated producers in milliseconds
    #[arg(long, default_value_t = 1000)]
    sim_tick_ms: u64,

    /// Seed for reproducible simulations
    #[arg(long)]
    sim_seed: Option<u64>,
}

fn parse_overrides(pairs: &[String]) -> Result<HashMap<String, String>> {
    let mut overrides = HashMap::new();
    for pair in pairs {
        let Some((key, value)) = pair.split_once('=') else {
            bail!("Invalid override '{}', expected KEY=VALUE", pair);
        };
        overrides.insert(key.trim().to_string(), value.trim().to_string());
    }
    Ok(overrides)
}

/// Load the TOML file; without an explicit path a missing file means defaults
fn resolve_config(args: &Args, overrides: &HashMap<String, String>) -> Result<(EcobotConfig, bool)> {
    match load_config(args.config.as_deref(), Some(overrides)) {
        Ok(config) => Ok((config, true)),
        Err(ConfigError::FileNotFound(_)) if args.config.is_none() => {
            let mut config = EcobotConfig::default();
            apply_environment_overrides(&mut config);
            apply_cli_overrides(&mut config, overrides);
            Ok((config, false))
        }
        Err(e) => Err(e).context("Failed to load configuration"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // --debug-<crate> flags belong to the logging setup, not to clap
    let args = Args::parse_from(env::args().filter(|arg| !arg.starts_with("--debug-")));
    let overrides = parse_overrides(&args.overrides)?;
    let (config, from_file) = resolve_config(&args, &overrides)?;
    validate_config(&config).context("Invalid configuration")?;

    let debug_flags = parse_debug_flags();
    #[cfg(feature = "file-logging")]
    let _log_guard = ecobot::observability::init_file_logging(
        &debug_flags,
        &config.logging.level,
        std::path::Path::new(&config.logging.log_dir),
        None,
        None,
    )?;
    #[cfg(not(feature = "file-logging"))]
    ecobot::observability::init_logging(&debug_flags, &config.logging.level)?;

    info!("ecobot-node v{} starting (device {})", ecobot::VERSION, config.device.device_id);
    if !from_file {
        warn!("No configuration file found, running on defaults");
    }

    // Ledger
    let ledger: Arc<dyn RemoteLedger> = if args.offline {
        warn!("[LEDGER] Offline mode: accounting kept in memory only");
        Arc::new(InMemoryLedger::new())
    } else {
        info!("[LEDGER] Accounting service at {}", config.ledger.base_url);
        Arc::new(
            HttpLedgerClient::new(&config.ledger, config.device.device_id.clone())
                .context("Failed to build ledger client")?,
        )
    };

    if config.ledger.backup_enabled && !args.offline {
        run_startup_backup(
            ledger.as_ref(),
            &config.ledger.connectivity_probe,
            config.ledger.connectivity_timeout(),
        )
        .await;
    }

    // Bus
    let publisher = Arc::new(ResilientPublisher::connect(&config.bus, config.device.device_id.clone()).await);

    // Periods: failing here is fatal
    let periods = Arc::new(PeriodLifecycleManager::new(
        Arc::clone(&ledger),
        RetryPolicy::from_config(&config.ledger),
    ));
    periods
        .initialize()
        .await
        .context("Could not resume or open a work period")?;
    periods
        .open_waste_counters()
        .await
        .context("Could not open waste counters")?;

    // Pipeline
    let calibration = LoadCellCalibration::new(config.load_cell.offset, config.load_cell.scale)
        .context("Invalid load cell calibration")?;
    let pipeline = Arc::new(CollectionPipeline::new(
        EventCorrelator::new((&config.correlation).into()),
        Arc::clone(&periods),
        Arc::clone(&ledger),
        Arc::clone(&publisher),
        config.bus.topics.clone(),
        config.ledger.request_timeout(),
    ));
    let (senders, ingest) = spawn_ingest(Arc::clone(&pipeline), calibration, INGEST_CAPACITY);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let producers = if args.simulate {
        spawn_simulation(
            senders.clone(),
            SimulationConfig {
                tick: Duration::from_millis(args.sim_tick_ms.max(10)),
                calibration,
                samples_per_reading: config.load_cell.samples_per_reading,
                seed: args.sim_seed,
                ..SimulationConfig::default()
            },
            shutdown_rx,
        )
    } else {
        info!("[INGEST] Waiting for sensor producers");
        Vec::new()
    };

    let control = spawn_line_reader(std::io::BufReader::new(std::io::stdin()));
    let recharge = spawn_recharge_listener(control, Arc::clone(&periods));

    info!("Collecting (Ctrl+C to stop, 'recharge' to rotate the period)");
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;
    info!("Shutdown signal received");

    // Producers first, then the ingest loops drain their channels
    let _ = shutdown_tx.send(true);
    for producer in producers {
        let _ = producer.await;
    }
    drop(senders);
    if tokio::time::timeout(Duration::from_secs(5), ingest.join()).await.is_err() {
        warn!("[INGEST] Ingest tasks did not drain in time");
    }
    recharge.abort();

    publisher.close().await;
    let stats = publisher.stats();
    info!(
        "[PUBLISHER] {} sent, {} skipped, {} failed",
        stats.sent, stats.skipped, stats.failed
    );
    if let Some(period_id) = periods.current_period_id() {
        info!("[PERIODS] Period {} stays open until the next start", period_id);
    }
    info!("ecobot-node stopped");
    Ok(())
}
