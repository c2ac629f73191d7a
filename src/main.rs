//! Weather Impact - asset risk prediction from historical weather analogues
//!
//! # Usage
//!
//! ```bash
//! # One-off assessment against the sample dataset
//! weather-impact assess --temperature 9 --wind 98 --precipitation 7 --humidity 80 --duration 6
//!
//! # Stream QueryEvent JSON lines, hot-reloading data/ while running
//! cat queries.jsonl | weather-impact watch
//!
//! # Summarize a detector payload
//! weather-impact detections result.json
//! ```
//!
//! # Environment Variables
//!
//! - `WEATHER_IMPACT_CONFIG`: Path to a TOML config file
//! - `RUST_LOG`: Logging level (default: info)
//!
//! Logs go to stderr; stdout carries only JSON or report text.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use tokio::io::AsyncBufReadExt;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use weather_impact::config::AnalysisConfig;
use weather_impact::dataset::watcher::{run_dataset_watcher, DatasetEvent};
use weather_impact::detection::{CategoryResolver, DetectionResponse, DetectionSummary};
use weather_impact::engine::ImpactEngine;
use weather_impact::types::{QueryEvent, WeatherFeatures};

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "weather-impact")]
#[command(about = "Predict at-risk infrastructure assets from similar historical weather events")]
#[command(version)]
struct CliArgs {
    /// Path to a TOML config file (overrides WEATHER_IMPACT_CONFIG lookup)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding the three input tables
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Number of similar historical events to match
    #[arg(long, global = true)]
    k: Option<usize>,

    #[command(subcommand)]
    command: SubCommand,
}

#[derive(clap::Subcommand, Debug)]
enum SubCommand {
    /// Assess a single weather event and print the report as JSON
    Assess {
        /// Air temperature (°C)
        #[arg(long, allow_hyphen_values = true)]
        temperature: f64,
        /// Wind speed (km/h)
        #[arg(long)]
        wind: f64,
        /// Precipitation (mm)
        #[arg(long)]
        precipitation: f64,
        /// Relative humidity (%)
        #[arg(long)]
        humidity: f64,
        /// Duration (hours)
        #[arg(long)]
        duration: f64,
        #[arg(long)]
        event_type: Option<String>,
        #[arg(long)]
        severity: Option<String>,
        #[arg(long)]
        location: Option<String>,
    },

    /// Read QueryEvent JSON lines on stdin, print one assessment per line
    Watch,

    /// Summarize an image-detector JSON payload
    Detections {
        /// Detector response file
        file: PathBuf,
        /// Classifier label to map onto a configured image category
        #[arg(long)]
        label: Option<String>,
    },
}

// ============================================================================
// Configuration
// ============================================================================

fn resolve_config(args: &CliArgs) -> Result<AnalysisConfig> {
    let mut config = match &args.config {
        Some(path) => AnalysisConfig::load_from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => AnalysisConfig::load(),
    };

    if let Some(dir) = &args.data_dir {
        config.data.dir = dir.clone();
    }
    if let Some(k) = args.k {
        config.knn.k = k;
    }
    config.validate().context("Invalid configuration after CLI overrides")?;
    Ok(config)
}

// ============================================================================
// Subcommands
// ============================================================================

fn run_assess(config: &AnalysisConfig, query: QueryEvent) -> Result<()> {
    let engine = ImpactEngine::load(config).context("Failed to load historical dataset")?;
    let report = engine.assess(&query);
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

async fn run_watch(config: &AnalysisConfig, cancel: CancellationToken) -> Result<()> {
    let engine = ImpactEngine::load(config).context("Failed to load historical dataset")?;

    let (tx, mut rx) = mpsc::channel::<DatasetEvent>(8);
    let watcher = tokio::spawn(run_dataset_watcher(
        engine.dataset().clone(),
        config.data.paths(),
        config.watcher.poll_interval(),
        config.watcher.debounce(),
        tx,
        cancel.clone(),
    ));

    info!("Reading query events from stdin (one JSON object per line)");
    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            () = cancel.cancelled() => break,
            Some(event) = rx.recv() => match event {
                DatasetEvent::Reloaded(stats) => info!(
                    events = stats.events,
                    assets = stats.assets,
                    incidents = stats.incidents,
                    "Dataset reloaded"
                ),
                DatasetEvent::Error(e) => warn!(error = %e, "Dataset reload failed, still serving previous snapshot"),
            },
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read stdin")? else {
                    info!("stdin closed");
                    break;
                };
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                match serde_json::from_str::<QueryEvent>(line) {
                    Ok(query) => {
                        let report = engine.assess(&query);
                        println!("{}", serde_json::to_string(&report)?);
                    }
                    // Skip malformed lines and keep reading
                    Err(e) => warn!(error = %e, "Failed to parse query event"),
                }
            }
        }
    }

    cancel.cancel();
    watcher.await.context("Dataset watcher task panicked")?;
    Ok(())
}

fn run_detections(config: &AnalysisConfig, file: &Path, label: Option<&str>) -> Result<()> {
    let payload = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let response = DetectionResponse::from_json(&payload)?;
    let summary = DetectionSummary::from_response(&response);

    println!("{}", summary.summarize());
    println!();
    println!("Ranked classes:");
    for r in summary.ranked_classes() {
        println!(" - {}: count={} max_confidence={:.2}", r.class, r.count, r.max_confidence);
    }

    if let Some(label) = label {
        let resolver = CategoryResolver::new(&config.detection);
        let category = resolver.resolve(label);
        match resolver.model_id_for(&category) {
            Ok(model) => println!("\nCategory: {category} (model {model})"),
            Err(e) => warn!(error = %e, "Label does not map to a configured detector"),
        }
    }
    Ok(())
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging on stderr so stdout stays machine-readable
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let args = CliArgs::parse();
    let config = resolve_config(&args)?;

    match args.command {
        SubCommand::Assess {
            temperature,
            wind,
            precipitation,
            humidity,
            duration,
            event_type,
            severity,
            location,
        } => {
            let query = QueryEvent {
                features: WeatherFeatures {
                    temperature_c: temperature,
                    wind_speed_kmh: wind,
                    precipitation_mm: precipitation,
                    humidity_percent: humidity,
                    duration_hours: duration,
                },
                event_type,
                severity,
                location,
            };
            run_assess(&config, query)?;
        }
        SubCommand::Watch => {
            // Graceful shutdown via Ctrl+C
            let cancel_token = CancellationToken::new();
            let shutdown_token = cancel_token.clone();
            tokio::spawn(async move {
                tokio::signal::ctrl_c().await.ok();
                info!("Received Ctrl+C, shutting down");
                shutdown_token.cancel();
            });
            run_watch(&config, cancel_token).await?;
        }
        SubCommand::Detections { file, label } => {
            run_detections(&config, &file, label.as_deref())?;
        }
    }

    Ok(())
}
