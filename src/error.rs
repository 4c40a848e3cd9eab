//! # Error Types
//!
//! Custom error types for RC Calibrator using `thiserror`.

use std::time::Duration;

use thiserror::Error;

use crate::calibration::machine::CalibrationPhase;

/// Main error type for RC Calibrator
#[derive(Debug, Error)]
pub enum CalibratorError {
    /// An aircraft is linked to the remote controller, calibration is refused.
    #[error("Disconnect aircraft before calibrating remote controller")]
    AircraftConnected,

    /// No remote controller is reachable on its own.
    #[error("No remote controller detected")]
    NoRemoteController,

    /// The hardware refused to enter the requested phase
    #[error("Hardware rejected calibration phase {phase}: {reason}")]
    Rejected {
        phase: CalibrationPhase,
        reason: String,
    },

    /// The hardware did not acknowledge the requested phase in time
    #[error("Timed out after {timeout:?} setting calibration phase {phase}")]
    Timeout {
        phase: CalibrationPhase,
        timeout: Duration,
    },

    /// A phase transition is already waiting for the hardware
    #[error("A calibration phase transition is already in flight")]
    TransitionInFlight,

    /// The coordinating task is gone
    #[error("Calibration model is no longer running")]
    ModelStopped,

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed replay record
    #[error("Replay error at line {line}: {source}")]
    Replay {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

impl CalibratorError {
    /// Whether the operator can simply try `advance()` again.
    ///
    /// Precondition and hardware errors are recoverable; a stopped model is not.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::AircraftConnected
                | Self::NoRemoteController
                | Self::Rejected { .. }
                | Self::Timeout { .. }
                | Self::TransitionInFlight
        )
    }
}

/// Result type alias for RC Calibrator
pub type Result<T> = std::result::Result<T, CalibratorError>;
