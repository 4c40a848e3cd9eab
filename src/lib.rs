//! # RC Calibrator Library
//!
//! Walks an operator through calibrating a drone remote controller's sticks,
//! dials and levers.
//!
//! This library consumes raw hardware-axis telemetry, tracks which limits have
//! been reached, and drives the hardware calibration phase sequence
//! (NORMAL -> MIDDLE -> LIMITS -> QUIT -> NORMAL) only while it is safe to do so.

pub mod config;
pub mod error;
pub mod calibration;
pub mod controller;
pub mod link;
pub mod telemetry;
