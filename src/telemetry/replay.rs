//! # Session Replay
//!
//! Recorded calibration sessions as JSON Lines, one record per line:
//!
//! ```text
//! {"at_ms": 0, "kind": "event", "event": {"key": "display_name", "value": "Mavic 2"}}
//! {"at_ms": 40, "kind": "event", "event": {"key": "left_stick", "value": {"horizontal": -660, "vertical": 0}}}
//! {"at_ms": 500, "kind": "advance"}
//! ```
//!
//! `at_ms` is the offset from the start of the session. Blank lines are skipped.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::calibration::machine::CalibrationPhase;
use crate::calibration::model::CalibrationHandle;
use crate::error::{CalibratorError, Result};
use crate::telemetry::TelemetryEvent;

/// One line of a recorded session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReplayRecord {
    /// A telemetry update from the hardware layer
    Event { at_ms: u64, event: TelemetryEvent },
    /// The operator pressing the advance control
    Advance { at_ms: u64 },
}

impl ReplayRecord {
    #[must_use]
    pub fn at_ms(&self) -> u64 {
        match self {
            Self::Event { at_ms, .. } | Self::Advance { at_ms } => *at_ms,
        }
    }

    /// Offset of this record from the start of the session
    #[must_use]
    pub fn offset(&self) -> Duration {
        Duration::from_millis(self.at_ms())
    }
}

/// Result of one replayed advance
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdvanceOutcome {
    pub at_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase: Option<CalibrationPhase>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// What happened while replaying a session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReplaySummary {
    pub events: usize,
    pub advances: Vec<AdvanceOutcome>,
}

impl ReplaySummary {
    /// Number of advances that were refused or failed
    #[must_use]
    pub fn failed_advances(&self) -> usize {
        self.advances.iter().filter(|a| a.error.is_some()).count()
    }
}

/// Parses a JSONL session.
///
/// # Errors
///
/// Returns `Replay` with the 1-based line number of the first malformed record.
///
/// # Examples
///
/// ```
/// use rc_calibrator::telemetry::replay::{parse_session, ReplayRecord};
///
/// let records = parse_session("{\"at_ms\": 5, \"kind\": \"advance\"}\n\n").unwrap();
/// assert_eq!(records, vec![ReplayRecord::Advance { at_ms: 5 }]);
/// ```
pub fn parse_session(contents: &str) -> Result<Vec<ReplayRecord>> {
    contents
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| {
            serde_json::from_str(line).map_err(|source| CalibratorError::Replay {
                line: index + 1,
                source,
            })
        })
        .collect()
}

/// Reads and parses a JSONL session file.
///
/// # Errors
///
/// Returns `Io` if the file cannot be read, `Replay` if a line is malformed.
pub async fn load_session<P: AsRef<Path>>(path: P) -> Result<Vec<ReplayRecord>> {
    let contents = tokio::fs::read_to_string(path).await?;
    parse_session(&contents)
}

/// Feeds `records` through the model.
///
/// With `pace` set, each record waits until its `at_ms` offset from the start
/// of the replay. Refused advances are logged and recorded in the summary; the
/// replay carries on.
///
/// # Errors
///
/// Returns `ModelStopped` if the model task exits mid-replay.
pub async fn replay(handle: &CalibrationHandle, records: &[ReplayRecord], pace: bool) -> Result<ReplaySummary> {
    let start = Instant::now();
    let mut summary = ReplaySummary::default();

    for record in records {
        if pace {
            tokio::time::sleep_until(start + record.offset()).await;
        }

        match record {
            ReplayRecord::Event { event, .. } => {
                debug!("Replaying {} at {}ms", event.key(), record.at_ms());
                handle.publish(event.clone()).await?;
                summary.events += 1;
            }
            ReplayRecord::Advance { at_ms } => {
                let outcome = match handle.advance().await {
                    Ok(phase) => {
                        info!("Advance at {}ms: calibration phase is {}", at_ms, phase);
                        AdvanceOutcome {
                            at_ms: *at_ms,
                            phase: Some(phase),
                            error: None,
                        }
                    }
                    Err(e) if e.is_recoverable() => {
                        warn!("Advance at {}ms refused: {}", at_ms, e);
                        AdvanceOutcome {
                            at_ms: *at_ms,
                            phase: None,
                            error: Some(e.to_string()),
                        }
                    }
                    Err(e) => return Err(e),
                };
                summary.advances.push(outcome);
            }
        }
    }

    Ok(summary)
}
