//! # Simulated Link
//!
//! A stand-in remote controller used when replaying recorded sessions. It
//! acknowledges phase requests after a fixed delay and refuses any phase listed
//! in its configuration.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::calibration::machine::CalibrationPhase;
use crate::config::LinkConfig;
use crate::error::{CalibratorError, Result};

use super::CalibrationLink;

/// Simulated remote-controller link
#[derive(Debug)]
pub struct SimulatedLink {
    ack_delay: Duration,
    reject_phases: Vec<CalibrationPhase>,
    /// Last phase the simulated hardware accepted
    hardware_phase: Mutex<CalibrationPhase>,
}

impl SimulatedLink {
    /// Create a link with the given latency that rejects `reject_phases`
    ///
    /// # Examples
    ///
    /// ```
    /// use std::time::Duration;
    /// use rc_calibrator::calibration::machine::CalibrationPhase;
    /// use rc_calibrator::link::SimulatedLink;
    ///
    /// let link = SimulatedLink::new(Duration::ZERO, vec![CalibrationPhase::Quit]);
    /// assert_eq!(link.hardware_phase(), CalibrationPhase::Normal);
    /// ```
    #[must_use]
    pub fn new(ack_delay: Duration, reject_phases: Vec<CalibrationPhase>) -> Self {
        Self {
            ack_delay,
            reject_phases,
            hardware_phase: Mutex::new(CalibrationPhase::Normal),
        }
    }

    /// Create a link from the `[link]` configuration section
    #[must_use]
    pub fn from_config(config: &LinkConfig) -> Self {
        Self::new(
            Duration::from_millis(config.ack_delay_ms),
            config.reject_phases.clone(),
        )
    }

    /// Phase the simulated hardware currently holds
    pub fn hardware_phase(&self) -> CalibrationPhase {
        match self.hardware_phase.lock() {
            Ok(phase) => *phase,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

#[async_trait]
impl CalibrationLink for SimulatedLink {
    async fn set_calibration_phase(&self, phase: CalibrationPhase) -> Result<()> {
        if !self.ack_delay.is_zero() {
            tokio::time::sleep(self.ack_delay).await;
        }

        if self.reject_phases.contains(&phase) {
            warn!("Simulated hardware refusing calibration phase {}", phase);
            return Err(CalibratorError::Rejected {
                phase,
                reason: "refused by simulated hardware".to_string(),
            });
        }

        match self.hardware_phase.lock() {
            Ok(mut current) => *current = phase,
            Err(poisoned) => *poisoned.into_inner() = phase,
        }
        debug!("Simulated hardware entered calibration phase {}", phase);
        Ok(())
    }
}
