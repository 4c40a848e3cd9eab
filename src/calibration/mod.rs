//! # Calibration Module
//!
//! Connection gating, per-axis progress, the phase state machine and the
//! coordinating model task that ties them to live telemetry.

pub mod connection;
pub mod machine;
pub mod model;
pub mod progress;
