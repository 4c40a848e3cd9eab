//! # Hardware Link Module
//!
//! The write side of the hardware boundary: asking the remote controller to
//! enter a calibration phase.
//!
//! The call is a single asynchronous round trip that either acknowledges the
//! phase or fails. Callers bound it with a timeout; a timeout is treated the
//! same as a rejection.

pub mod simulated;

use async_trait::async_trait;

use crate::calibration::machine::CalibrationPhase;
use crate::error::Result;

pub use simulated::SimulatedLink;

/// Trait for the "set calibration phase" hardware operation
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CalibrationLink: Send + Sync {
    /// Persist `phase` on the remote controller.
    ///
    /// # Errors
    ///
    /// Returns `Rejected` when the hardware refuses the phase.
    async fn set_calibration_phase(&self, phase: CalibrationPhase) -> Result<()>;
}
