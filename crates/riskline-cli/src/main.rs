//! Riskline - Agentic PFMEA Validation CLI
//!
//! The `riskline` command drives a local model through failure-mode
//! analysis of manufacturing operations.
//!
//! ## Commands
//!
//! - `analyze`: run the full pipeline over an operations file
//! - `classify`: classify one severity/occurrence pair deterministically
//! - `scales`: print the rating scale catalog
//! - `check`: probe the model service

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use riskline_core::{scales, EventStatus, Operation, ProgressEvent, RiskLevel, RiskMatrix, METRICS};
use riskline_llm::{ModelClient, ModelConfig, OllamaClient};
use riskline_pipeline::{AnalysisOrchestrator, BroadcastSink, CancelHandle};
use riskline_state::{AnalysisStore, MemoryAnalysisStore};
use serde::Deserialize;
use tokio::sync::broadcast::error::RecvError;
use tracing::Level;

mod export;

#[derive(Parser)]
#[command(name = "riskline")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Agentic PFMEA validation pipeline", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines and progress events
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full PFMEA pipeline over an operations file
    Analyze {
        /// Path to operations JSON: an array of {process, subprocess?, control_point?}
        operations: PathBuf,

        /// Export format for the finalized results
        #[arg(long, value_enum)]
        export: Option<ExportFormat>,

        /// Output path for the export
        #[arg(long)]
        out: Option<PathBuf>,

        /// Model service base URL
        #[arg(long, env = "RISKLINE_MODEL_URL")]
        model_url: Option<String>,

        /// Model name to request
        #[arg(long, env = "RISKLINE_MODEL")]
        model: Option<String>,

        /// Per-request timeout in seconds
        #[arg(long, env = "RISKLINE_MODEL_TIMEOUT_SECS")]
        timeout_secs: Option<u64>,
    },

    /// Classify one severity/occurrence pair through the risk matrix
    Classify {
        /// Severity rating (1-5)
        severity: u8,

        /// Occurrence rating (1-5)
        occurrence: u8,
    },

    /// Print the severity and occurrence rating scales
    Scales,

    /// Probe the model service and report reachability
    Check {
        /// Model service base URL
        #[arg(long, env = "RISKLINE_MODEL_URL")]
        model_url: Option<String>,

        /// Model name to request
        #[arg(long, env = "RISKLINE_MODEL")]
        model: Option<String>,

        /// Per-request timeout in seconds
        #[arg(long, env = "RISKLINE_MODEL_TIMEOUT_SECS")]
        timeout_secs: Option<u64>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ExportFormat {
    Csv,
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    riskline_core::init_tracing(cli.json, level);

    match cli.command {
        Commands::Analyze {
            operations,
            export,
            out,
            model_url,
            model,
            timeout_secs,
        } => {
            let config = model_config(model_url.as_deref(), model.as_deref(), timeout_secs);
            cmd_analyze(&operations, export, out.as_deref(), config, cli.json).await
        }
        Commands::Classify {
            severity,
            occurrence,
        } => cmd_classify(severity, occurrence),
        Commands::Scales => cmd_scales(),
        Commands::Check {
            model_url,
            model,
            timeout_secs,
        } => {
            let config = model_config(model_url.as_deref(), model.as_deref(), timeout_secs);
            cmd_check(config).await
        }
    }
}

/// Layer CLI flags over the environment-derived model configuration.
fn model_config(
    base_url: Option<&str>,
    model: Option<&str>,
    timeout_secs: Option<u64>,
) -> ModelConfig {
    let mut config = ModelConfig::from_env();
    if let Some(base_url) = base_url {
        config.base_url = base_url.to_string();
    }
    if let Some(model) = model {
        config.model = model.to_string();
    }
    if let Some(timeout_secs) = timeout_secs {
        config = config.with_timeout_secs(timeout_secs);
    }
    config
}

/// Operations file shape used by extraction tools.
#[derive(Deserialize)]
struct OperationsFile {
    operations: Vec<Operation>,
}

/// Read operations from JSON: either a bare array or `{"operations": [...]}`.
fn read_operations(path: &Path) -> Result<Vec<Operation>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read operations file: {:?}", path))?;

    if let Ok(operations) = serde_json::from_str::<Vec<Operation>>(&content) {
        return Ok(operations);
    }
    let file: OperationsFile = serde_json::from_str(&content)
        .with_context(|| format!("Invalid operations JSON in {:?}", path))?;
    Ok(file.operations)
}

/// Run the full pipeline over an operations file
async fn cmd_analyze(
    operations_path: &Path,
    export: Option<ExportFormat>,
    out: Option<&Path>,
    config: ModelConfig,
    json_events: bool,
) -> Result<()> {
    if export.is_some() && out.is_none() {
        anyhow::bail!("--export requires --out <path>");
    }

    let operations = read_operations(operations_path)?;
    if operations.is_empty() {
        anyhow::bail!("Operations file contains no operations: {:?}", operations_path);
    }

    println!(
        "Analyzing {} operation(s) with model '{}' at {}",
        operations.len(),
        config.model,
        config.base_url
    );

    let store = Arc::new(MemoryAnalysisStore::new());
    let client = Arc::new(OllamaClient::new(config));
    let sink = Arc::new(BroadcastSink::default());

    // Drain progress events until the pipeline drops its sender.
    let mut events = sink.subscribe();
    let printer = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => print_event(&event, json_events),
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => break,
            }
        }
    });

    let record = store.create_job(operations).await?;
    let analysis_id = record.job.analysis_id.clone();

    let orchestrator = AnalysisOrchestrator::new(store.clone(), client, sink);
    let run_result = orchestrator.run(&analysis_id, &CancelHandle::new()).await;
    drop(orchestrator);
    printer.await.ok();

    let report = run_result?;
    let record = store.get_job(&analysis_id).await?;

    println!();
    println!("Analysis {} {}", analysis_id, record.job.status);
    println!(
        "{} result(s), {} operation(s) failed, {} ms",
        report.results.len(),
        report.failures.len(),
        report.duration_ms
    );
    if let Some(summary) = &record.job.error_summary {
        println!("Warnings: {}", summary);
    }

    for result in &report.results {
        println!(
            "  RPN {:>2} [{:<6}] {}: {}",
            result.rpn, result.risk_level, result.process, result.failure_mode
        );
    }
    let high = report
        .results
        .iter()
        .filter(|r| r.risk_level == RiskLevel::High)
        .count();
    if high > 0 {
        println!("{} high-risk failure mode(s) need action", high);
    }

    if let (Some(format), Some(path)) = (export, out) {
        let results = store.results(&analysis_id).await?;
        match format {
            ExportFormat::Csv => export::write_csv(&results, path)?,
            ExportFormat::Json => export::write_json(&results, path)?,
        }
        println!("Exported {} result(s) to {:?}", results.len(), path);
    }

    METRICS.flush();
    Ok(())
}

fn print_event(event: &ProgressEvent, json: bool) {
    if json {
        if let Ok(line) = serde_json::to_string(event) {
            println!("{}", line);
        }
        return;
    }
    match event.status {
        EventStatus::Error => println!("  [{}] error: {}", event.stage, event.message),
        _ => println!("  [{}] {}", event.stage, event.message),
    }
}

/// Classify one severity/occurrence pair through the risk matrix
fn cmd_classify(severity: u8, occurrence: u8) -> Result<()> {
    let classification = RiskMatrix::classify_values(severity, occurrence)
        .context("ratings must be between 1 and 5")?;

    println!("Severity:    {}", severity);
    println!("Occurrence:  {}", occurrence);
    println!("RPN:         {}", classification.rpn);
    println!("Risk Level:  {}", classification.level);
    println!("Action Req:  {}", classification.action);

    Ok(())
}

/// Print the rating scale catalog
fn cmd_scales() -> Result<()> {
    print!("{}", scales::prompt_block());
    Ok(())
}

/// Probe the model service
async fn cmd_check(config: ModelConfig) -> Result<()> {
    let client = OllamaClient::new(config);
    let reachable = client.check_connection().await;

    println!("Model URL: {}", client.config().base_url);
    println!("Model:     {}", client.config().model);
    println!("Reachable: {}", if reachable { "yes" } else { "no" });

    if !reachable {
        anyhow::bail!("model service unreachable");
    }
    Ok(())
}
