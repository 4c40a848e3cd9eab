//! # Controller Module
//!
//! Remote-controller input handling.
//!
//! This module handles:
//! - Folding raw telemetry into the latest per-axis snapshot
//! - Normalizing stick, dial and lever values to edge percentages
//! - Resolving the calibration profile of the connected controller model

pub mod mapper;
pub mod position;
pub mod profile;
