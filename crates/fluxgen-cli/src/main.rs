// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Fluxgen CLI
//!
//! Command-line tool that drives synthetic telemetry streams into InfluxDB.
//!
//! # Usage
//!
//! ```bash
//! # Run against a local InfluxDB with the stock streams
//! fluxgen --token my-token --org factory --bucket telemetry
//!
//! # Using a configuration file
//! fluxgen --config fluxgen.toml
//!
//! # Exercise the engine without a server
//! fluxgen --dry-run
//!
//! # Generate an example configuration file
//! fluxgen gen-config --output fluxgen.toml
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use fluxgen::broker::{
    run_publish_reporter, BlackholePublisher, PublishDriver, PublishStats, Publisher,
};
use fluxgen::config::{SimulatorConfig, StreamKind, StreamSettings};
use fluxgen::generate::{FacilitySource, TransportSource, VehicleSource};
use fluxgen::scheduler::StreamDriver;
use fluxgen::sink::{MemorySink, PointSink};
use fluxgen::stats::{run_reporter, ThroughputCounter};
use fluxgen_influx::{InfluxClient, InfluxConfig};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Fluxgen synthetic telemetry load generator
#[derive(Parser, Debug)]
#[command(name = "fluxgen")]
#[command(about = "Fluxgen - synthetic telemetry load generator for InfluxDB")]
#[command(version)]
struct Args {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// InfluxDB URL
    #[arg(long)]
    url: Option<String>,

    /// InfluxDB organization
    #[arg(long)]
    org: Option<String>,

    /// InfluxDB bucket
    #[arg(long)]
    bucket: Option<String>,

    /// InfluxDB API token
    #[arg(long)]
    token: Option<String>,

    /// Only run the named streams (comma-separated)
    #[arg(long, value_delimiter = ',')]
    streams: Option<Vec<String>>,

    /// Points generated per cycle (applies to every stream)
    #[arg(long)]
    points: Option<usize>,

    /// Maximum points per write call (applies to every stream)
    #[arg(long)]
    batch_capacity: Option<usize>,

    /// Inter-cycle delay in milliseconds (applies to every stream)
    #[arg(long)]
    delay_ms: Option<u64>,

    /// Throughput report interval (seconds)
    #[arg(long)]
    report_interval: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Run against an in-memory sink instead of InfluxDB
    #[arg(long)]
    dry_run: bool,

    /// Drive the broker publish loops instead of the InfluxDB write path
    #[arg(long, conflicts_with = "dry_run")]
    publish: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate example configuration file
    GenConfig {
        /// Output file path
        #[arg(short, long, default_value = "fluxgen.toml")]
        output: PathBuf,
    },

    /// Validate a configuration file
    Validate {
        /// Configuration file path
        #[arg(short, long)]
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    let filter = EnvFilter::try_new(&args.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    // Handle subcommands
    if let Some(cmd) = args.command {
        return match cmd {
            Commands::GenConfig { output } => cmd_gen_config(output),
            Commands::Validate { config } => cmd_validate(config),
        };
    }

    let config = build_config(&args)?;

    if args.publish {
        return run_publish_mode(&config).await;
    }

    // Sink: real client unless --dry-run
    let sink: Arc<dyn PointSink> = if args.dry_run {
        tracing::info!("dry run: writing to in-memory sink");
        Arc::new(MemorySink::new())
    } else {
        let client = InfluxClient::new(&InfluxConfig {
            url: config.influx.url.clone(),
            org: config.influx.org.clone(),
            bucket: config.influx.bucket.clone(),
            token: config.influx.token.clone(),
            timeout: Duration::from_secs(config.influx.timeout_secs),
        })?;

        // An unreachable server is a startup failure, not a per-cycle one.
        client
            .health()
            .await
            .with_context(|| format!("InfluxDB health check failed for {}", config.influx.url))?;
        tracing::info!(url = %config.influx.url, bucket = %config.influx.bucket, "connected to InfluxDB");
        Arc::new(client)
    };

    println!("Fluxgen v{}", env!("CARGO_PKG_VERSION"));
    println!("==================================");
    for stream in &config.streams {
        println!(
            "Stream: {} ({:?}) - {} points/cycle, batches of {}, every {} ms",
            stream.name, stream.kind, stream.points_per_cycle, stream.batch_capacity, stream.delay_ms
        );
    }
    println!();
    println!("Press Ctrl+C to stop...");
    println!();

    let counter = Arc::new(ThroughputCounter::new());
    let shutdown = CancellationToken::new();

    let reporter = tokio::spawn(run_reporter(
        Arc::clone(&counter),
        Duration::from_secs(config.report_interval_secs),
        shutdown.clone(),
    ));

    let mut drivers = Vec::new();
    for stream in &config.streams {
        drivers.push(spawn_stream(
            stream,
            Arc::clone(&sink),
            Arc::clone(&counter),
            shutdown.clone(),
        ));
    }

    // Wait for Ctrl+C
    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for ctrl-c")?;
    println!("\nShutting down...");
    shutdown.cancel();

    for driver in drivers {
        let _ = driver.await;
    }
    let _ = reporter.await;

    Ok(())
}

/// Drive the broker publish loops until Ctrl+C.
///
/// Broker connectivity lives behind the `Publisher` trait; this mode uses
/// the counting blackhole, which measures the generator-side message and
/// byte rates without a broker attached.
async fn run_publish_mode(config: &SimulatorConfig) -> anyhow::Result<()> {
    println!("Fluxgen v{} (publish mode)", env!("CARGO_PKG_VERSION"));
    println!("==================================");
    println!("Press Ctrl+C to stop...");
    println!();

    let publisher: Arc<dyn Publisher> = Arc::new(BlackholePublisher::new());
    let shutdown = CancellationToken::new();
    let interval = Duration::from_secs(config.report_interval_secs);

    let mut tasks = Vec::new();
    for stream in &config.streams {
        let topic = format!("fluxgen/{}", stream.name);
        let stats = Arc::new(PublishStats::new());
        let delay = Duration::from_millis(stream.delay_ms);

        tasks.push(tokio::spawn(run_publish_reporter(
            topic.clone(),
            Arc::clone(&stats),
            interval,
            shutdown.clone(),
        )));
        tasks.push(match stream.kind {
            StreamKind::Vehicle => tokio::spawn(
                PublishDriver::new(
                    topic,
                    stream.points_per_cycle,
                    delay,
                    VehicleSource,
                    Arc::clone(&publisher),
                    stats,
                    shutdown.clone(),
                )
                .run(),
            ),
            StreamKind::Transport => tokio::spawn(
                PublishDriver::new(
                    topic,
                    stream.points_per_cycle,
                    delay,
                    TransportSource,
                    Arc::clone(&publisher),
                    stats,
                    shutdown.clone(),
                )
                .run(),
            ),
            StreamKind::Facility => tokio::spawn(
                PublishDriver::new(
                    topic,
                    stream.points_per_cycle,
                    delay,
                    FacilitySource,
                    Arc::clone(&publisher),
                    stats,
                    shutdown.clone(),
                )
                .run(),
            ),
        });
    }

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for ctrl-c")?;
    println!("\nShutting down...");
    shutdown.cancel();
    for task in tasks {
        let _ = task.await;
    }
    Ok(())
}

/// Spawn one stream's cycle loop, dispatched by record kind.
fn spawn_stream(
    stream: &StreamSettings,
    sink: Arc<dyn PointSink>,
    counter: Arc<ThroughputCounter>,
    shutdown: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    let config = stream.to_stream_config();
    match stream.kind {
        StreamKind::Vehicle => {
            tokio::spawn(StreamDriver::new(config, VehicleSource, sink, counter, shutdown).run())
        }
        StreamKind::Transport => {
            tokio::spawn(StreamDriver::new(config, TransportSource, sink, counter, shutdown).run())
        }
        StreamKind::Facility => {
            tokio::spawn(StreamDriver::new(config, FacilitySource, sink, counter, shutdown).run())
        }
    }
}

/// Build the effective configuration: file if given, stock streams plus CLI
/// overrides otherwise.
fn build_config(args: &Args) -> anyhow::Result<SimulatorConfig> {
    let mut config = if let Some(ref path) = args.config {
        SimulatorConfig::from_file(path)
            .with_context(|| format!("failed to load {}", path.display()))?
    } else {
        SimulatorConfig::example()
    };

    if let Some(ref url) = args.url {
        config.influx.url = url.clone();
    }
    if let Some(ref org) = args.org {
        config.influx.org = org.clone();
    }
    if let Some(ref bucket) = args.bucket {
        config.influx.bucket = bucket.clone();
    }
    if let Some(ref token) = args.token {
        config.influx.token = token.clone();
    }

    if let Some(interval) = args.report_interval {
        config.report_interval_secs = interval;
    }
    if let Some(ref names) = args.streams {
        for name in names {
            if !config.streams.iter().any(|s| &s.name == name) {
                anyhow::bail!("unknown stream '{}'", name);
            }
        }
        config.streams.retain(|s| names.contains(&s.name));
    }
    for stream in &mut config.streams {
        if let Some(points) = args.points {
            stream.points_per_cycle = points;
        }
        if let Some(capacity) = args.batch_capacity {
            stream.batch_capacity = capacity;
        }
        if let Some(delay) = args.delay_ms {
            stream.delay_ms = delay;
        }
    }

    config.validate()?;
    Ok(config)
}

fn cmd_gen_config(output: PathBuf) -> anyhow::Result<()> {
    let config = SimulatorConfig::example();
    std::fs::write(&output, config.to_toml())
        .with_context(|| format!("failed to write {}", output.display()))?;
    println!("Wrote example configuration to {}", output.display());
    Ok(())
}

fn cmd_validate(config: PathBuf) -> anyhow::Result<()> {
    SimulatorConfig::from_file(&config)
        .with_context(|| format!("{} is not valid", config.display()))?;
    println!("{} is valid", config.display());
    Ok(())
}
