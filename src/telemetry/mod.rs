//! # Telemetry Module
//!
//! The vocabulary of push updates the hardware layer sends to the calibration
//! model. Each [`TelemetryEvent`] variant corresponds to one telemetry key that
//! updates independently of the others.
//!
//! This module handles:
//! - Raw stick, dial and lever values
//! - Professional-RC customizable button events (dials and levers on Cendence-class controllers)
//! - Display name and product connection changes
//! - The eight segment-fill bitmasks (A-H) used by MAVIC-style controllers
//! - The calibration phase reported by the hardware
//!
//! Recorded sessions of these events can be replayed with [`replay`].

pub mod replay;

use serde::{Deserialize, Serialize};

use crate::calibration::connection::Product;
use crate::calibration::machine::CalibrationPhase;
use crate::controller::position::StickSample;

/// Customizable buttons on professional remote controllers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CustomizableButton {
    /// Left wheel (left dial).
    Lw,
    /// Right wheel (right dial).
    Rw,
    /// Left slider (left lever).
    Ls,
    /// Right slider (right lever).
    Rs,
    /// Any other button; not relevant to calibration.
    #[serde(other)]
    Other,
}

/// Button event from a professional remote controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProRcEvent {
    pub button: CustomizableButton,
    /// Current raw value of the wheel or slider (-660..=660).
    pub value: i32,
}

/// Raw right dial reading.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RightDialSample {
    pub value: i32,
    /// Hardware state bits (present, turned, clockwise). Not used for calibration.
    #[serde(default)]
    pub flags: u8,
}

/// One of the eight per-edge segment status channels.
///
/// A-D describe the right stick, E-H the left stick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SegmentAxis {
    A,
    B,
    C,
    D,
    E,
    F,
    G,
    H,
}

impl SegmentAxis {
    /// All channels, A through H.
    pub const ALL: [SegmentAxis; 8] = [
        SegmentAxis::A,
        SegmentAxis::B,
        SegmentAxis::C,
        SegmentAxis::D,
        SegmentAxis::E,
        SegmentAxis::F,
        SegmentAxis::G,
        SegmentAxis::H,
    ];

    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }
}

/// Segment-fill bitmask update for one edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentStatus {
    pub axis: SegmentAxis,
    pub mask: u16,
}

/// One push update from the hardware layer.
///
/// Serialized adjacently tagged: `{"key": "left_dial", "value": -330}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "key", content = "value", rename_all = "snake_case")]
pub enum TelemetryEvent {
    LeftStick(StickSample),
    RightStick(StickSample),
    LeftDial(i32),
    RightDial(RightDialSample),
    ProRcButton(ProRcEvent),
    DisplayName(String),
    Product(Product),
    SegmentStatus(SegmentStatus),
    HardwarePhase(CalibrationPhase),
}

impl TelemetryEvent {
    /// Short name of the telemetry key, for logging.
    #[must_use]
    pub fn key(&self) -> &'static str {
        match self {
            Self::LeftStick(_) => "left_stick",
            Self::RightStick(_) => "right_stick",
            Self::LeftDial(_) => "left_dial",
            Self::RightDial(_) => "right_dial",
            Self::ProRcButton(_) => "pro_rc_button",
            Self::DisplayName(_) => "display_name",
            Self::Product(_) => "product",
            Self::SegmentStatus(_) => "segment_status",
            Self::HardwarePhase(_) => "hardware_phase",
        }
    }
}
