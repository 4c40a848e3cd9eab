//! # RC Calibrator
//!
//! Replays a recorded remote-controller calibration session through the
//! calibration model against a simulated hardware link.
//!
//! # Usage
//!
//! ```bash
//! rc-calibrator [config.toml]
//! ```
//!
//! The configuration path defaults to `config/default.toml`. The session file,
//! link behaviour and logging are all taken from the configuration. When the
//! replay finishes (or Ctrl+C is pressed) a JSON report is printed to stdout.
//!
//! Expected output:
//! ```text
//! INFO rc_calibrator: RC Calibrator v0.1.0 starting...
//! INFO rc_calibrator: Replaying 42 records from sessions/default_rc.jsonl
//! INFO rc_calibrator::telemetry::replay: Advance at 500ms: calibration phase is MIDDLE
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use rc_calibrator::calibration::model::{CalibrationModel, CalibrationView};
use rc_calibrator::config::{Config, LoggingConfig};
use rc_calibrator::link::SimulatedLink;
use rc_calibrator::telemetry::replay::{load_session, replay, ReplaySummary};

/// Configuration file used when none is given on the command line
const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// File name prefix for the daily-rolling log
const LOG_FILE_PREFIX: &str = "rc-calibrator.log";

/// Final report printed after a replay
#[derive(Debug, Serialize)]
struct SessionReport {
    session: String,
    started_at: DateTime<Utc>,
    finished_at: DateTime<Utc>,
    interrupted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ReplaySummary>,
    final_view: CalibrationView,
}

/// Picks the configuration path from the command-line arguments.
fn config_path<I: IntoIterator<Item = String>>(args: I) -> PathBuf {
    args.into_iter()
        .next()
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from)
}

/// Installs the tracing subscriber.
///
/// `RUST_LOG` overrides the configured level. The returned guard must be held
/// for the life of the program when file logging is enabled.
fn init_logging(config: &LoggingConfig) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    if config.file_logging {
        let appender = tracing_appender::rolling::daily(&config.log_dir, LOG_FILE_PREFIX);
        let (writer, guard) = tracing_appender::non_blocking(appender);
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(writer)
            .with_ansi(false)
            .init();
        Some(guard)
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
        None
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let path = config_path(std::env::args().skip(1));
    let config = Config::load(&path).with_context(|| format!("Failed to load {}", path.display()))?;
    let _log_guard = init_logging(&config.logging);

    info!("RC Calibrator v{} starting...", env!("CARGO_PKG_VERSION"));

    let records = load_session(&config.replay.path)
        .await
        .with_context(|| format!("Failed to read session {}", config.replay.path))?;
    info!("Replaying {} records from {}", records.len(), config.replay.path);

    let link = Arc::new(SimulatedLink::from_config(&config.link));
    let (handle, task) = CalibrationModel::spawn(link, &config.session);

    let started_at = Utc::now();
    let (summary, interrupted) = tokio::select! {
        result = replay(&handle, &records, config.replay.pace) => (Some(result?), false),

        // Handle Ctrl+C for graceful shutdown
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, stopping replay...");
            (None, true)
        }
    };

    let final_view = handle.snapshot().await?;
    let report = SessionReport {
        session: config.replay.path.clone(),
        started_at,
        finished_at: Utc::now(),
        interrupted,
        summary,
        final_view,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);

    drop(handle);
    task.await.context("Calibration model task failed")?;
    info!("Final calibration phase: {}", report.final_view.phase);

    Ok(())
}
