//! # Telemetry Mapper Module
//!
//! Folds individual [`TelemetryEvent`]s into a [`RawAxisState`] snapshot that
//! always holds the latest value of every telemetry key.
//!
//! ## Axis Sources
//!
//! | Axis | Telemetry key | Professional-RC button |
//! |------|---------------|------------------------|
//! | Left stick | `left_stick` | - |
//! | Right stick | `right_stick` | - |
//! | Left dial | `left_dial` | LW |
//! | Right dial | `right_dial` | RW |
//! | Left lever | - | LS |
//! | Right lever | - | RS |
//!
//! ## Usage
//!
//! ```
//! use rc_calibrator::controller::mapper::{AxisChange, TelemetryMapper};
//! use rc_calibrator::telemetry::TelemetryEvent;
//!
//! let mut mapper = TelemetryMapper::new();
//! let change = mapper.process_event(&TelemetryEvent::LeftDial(-330));
//! assert_eq!(change, Some(AxisChange::LeftDial));
//! assert_eq!(mapper.state().left_dial, -330);
//! ```

use crate::calibration::connection::Product;
use crate::calibration::machine::CalibrationPhase;
use crate::controller::position::StickSample;
use crate::telemetry::{CustomizableButton, TelemetryEvent};

/// Latest raw value of every telemetry key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawAxisState {
    pub left_stick: StickSample,
    pub right_stick: StickSample,
    pub left_dial: i32,
    pub right_dial: i32,
    pub left_lever: i32,
    pub right_lever: i32,
    /// Segment-fill bitmasks indexed by [`crate::telemetry::SegmentAxis::index`].
    pub segments: [u16; 8],
    pub display_name: String,
    pub product: Product,
}

/// What a processed event changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisChange {
    LeftStick,
    RightStick,
    LeftDial,
    RightDial,
    LeftLever,
    RightLever,
    Segments,
    DisplayName,
    Product,
    /// The hardware reported its calibration phase. Not stored in the snapshot.
    HardwarePhase(CalibrationPhase),
}

/// Maintains the latest raw telemetry snapshot.
///
/// Not thread-safe; owned by the calibration model task.
#[derive(Debug, Default)]
pub struct TelemetryMapper {
    state: RawAxisState,
}

impl TelemetryMapper {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current snapshot.
    #[must_use]
    pub fn state(&self) -> &RawAxisState {
        &self.state
    }

    /// Forgets the segment masks of a finished run.
    pub fn clear_segments(&mut self) {
        self.state.segments = [0; 8];
    }

    /// Applies one event and reports which part of the snapshot it touched.
    ///
    /// Returns `None` for events that carry nothing relevant (professional-RC
    /// buttons other than the wheels and sliders).
    pub fn process_event(&mut self, event: &TelemetryEvent) -> Option<AxisChange> {
        match event {
            TelemetryEvent::LeftStick(sample) => {
                self.state.left_stick = *sample;
                Some(AxisChange::LeftStick)
            }
            TelemetryEvent::RightStick(sample) => {
                self.state.right_stick = *sample;
                Some(AxisChange::RightStick)
            }
            TelemetryEvent::LeftDial(value) => {
                self.state.left_dial = *value;
                Some(AxisChange::LeftDial)
            }
            TelemetryEvent::RightDial(sample) => {
                self.state.right_dial = sample.value;
                Some(AxisChange::RightDial)
            }
            TelemetryEvent::ProRcButton(pro) => self.process_button(pro.button, pro.value),
            TelemetryEvent::DisplayName(name) => {
                self.state.display_name = name.clone();
                Some(AxisChange::DisplayName)
            }
            TelemetryEvent::Product(product) => {
                self.state.product = *product;
                Some(AxisChange::Product)
            }
            TelemetryEvent::SegmentStatus(status) => {
                self.state.segments[status.axis.index()] = status.mask;
                Some(AxisChange::Segments)
            }
            TelemetryEvent::HardwarePhase(phase) => Some(AxisChange::HardwarePhase(*phase)),
        }
    }

    /// Routes a professional-RC wheel or slider to its axis.
    fn process_button(&mut self, button: CustomizableButton, value: i32) -> Option<AxisChange> {
        match button {
            CustomizableButton::Lw => {
                self.state.left_dial = value;
                Some(AxisChange::LeftDial)
            }
            CustomizableButton::Rw => {
                self.state.right_dial = value;
                Some(AxisChange::RightDial)
            }
            CustomizableButton::Ls => {
                self.state.left_lever = value;
                Some(AxisChange::LeftLever)
            }
            CustomizableButton::Rs => {
                self.state.right_lever = value;
                Some(AxisChange::RightLever)
            }
            CustomizableButton::Other => None,
        }
    }
}
