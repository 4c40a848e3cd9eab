//! # Position Module
//!
//! Converts raw remote-controller axis values into "pull toward an edge"
//! percentages.
//!
//! ## Raw Range
//!
//! Every stick, dial and lever reports a signed value in `-660..=660`
//! ([`MAX_POSITION`]), with 0 at rest. Each direction of an axis is exposed as a
//! separate 0-100 percentage:
//!
//! | Axis | Negative raw | Positive raw |
//! |------|--------------|--------------|
//! | Stick horizontal | left | right |
//! | Stick vertical | bottom | top |
//! | Dial | left | right |
//! | Lever | top | bottom |
//!
//! The scaling uses integer division truncating toward zero, so `-330` maps to
//! exactly 50 and `660` to exactly 100. Out-of-range raw values are clamped to
//! 100 instead of overflowing.
//!
//! ## Usage
//!
//! ```
//! use rc_calibrator::controller::position::{StickPosition, StickSample};
//!
//! let pos = StickPosition::from_sample(StickSample::new(-330, 660));
//! assert_eq!(pos.left, 50);
//! assert_eq!(pos.top, 100);
//! assert_eq!(pos.right, 0);
//! assert_eq!(pos.bottom, 0);
//! ```

use serde::{Deserialize, Serialize};

/// Full-travel magnitude reported by the hardware for any axis.
pub const MAX_POSITION: i32 = 660;

/// Largest percentage any direction can report.
pub const MAX_PERCENT: u8 = 100;

/// Raw joystick reading.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StickSample {
    /// Horizontal travel. Negative = left.
    pub horizontal: i32,
    /// Vertical travel. Positive = up.
    pub vertical: i32,
}

impl StickSample {
    #[must_use]
    pub fn new(horizontal: i32, vertical: i32) -> Self {
        Self {
            horizontal,
            vertical,
        }
    }
}

/// Four-direction stick deflection, each field 0-100.
///
/// At most one of `left`/`right` and one of `top`/`bottom` is nonzero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StickPosition {
    pub left: u8,
    pub top: u8,
    pub right: u8,
    pub bottom: u8,
}

impl StickPosition {
    /// Normalizes one stick sample.
    ///
    /// # Examples
    ///
    /// ```
    /// use rc_calibrator::controller::position::{StickPosition, StickSample};
    ///
    /// let pos = StickPosition::from_sample(StickSample::new(330, -660));
    /// assert_eq!((pos.left, pos.top, pos.right, pos.bottom), (0, 0, 50, 100));
    /// ```
    #[must_use]
    pub fn from_sample(sample: StickSample) -> Self {
        let (left, right) = split_axis(sample.horizontal);
        let (bottom, top) = split_axis(sample.vertical);
        Self {
            left,
            top,
            right,
            bottom,
        }
    }
}

/// Two-direction dial deflection, each field 0-100.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DialPosition {
    pub left: u8,
    pub right: u8,
}

impl DialPosition {
    /// Normalizes one dial value. Negative raw values turn left.
    ///
    /// # Examples
    ///
    /// ```
    /// use rc_calibrator::controller::position::DialPosition;
    ///
    /// let pos = DialPosition::from_raw(-330);
    /// assert_eq!((pos.left, pos.right), (50, 0));
    /// ```
    #[must_use]
    pub fn from_raw(raw: i32) -> Self {
        let (left, right) = split_axis(raw);
        Self { left, right }
    }
}

/// Two-direction lever deflection, each field 0-100.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LeverPosition {
    pub top: u8,
    pub bottom: u8,
}

impl LeverPosition {
    /// Normalizes one lever value. Negative raw values push toward the top.
    #[must_use]
    pub fn from_raw(raw: i32) -> Self {
        let (top, bottom) = split_axis(raw);
        Self { top, bottom }
    }
}

/// Scales a raw axis value to a signed percentage (-100..=100).
///
/// Truncates toward zero and saturates for malformed input.
///
/// # Examples
///
/// ```
/// use rc_calibrator::controller::position::to_percent;
///
/// assert_eq!(to_percent(-330), -50);
/// assert_eq!(to_percent(660), 100);
/// assert_eq!(to_percent(13), 1);
/// assert_eq!(to_percent(5000), 100);
/// ```
#[must_use]
pub fn to_percent(raw: i32) -> i32 {
    let max = i32::from(MAX_PERCENT);
    (raw.saturating_mul(max) / MAX_POSITION).clamp(-max, max)
}

/// Splits a raw value into its (negative, positive) direction percentages.
#[inline]
fn split_axis(raw: i32) -> (u8, u8) {
    let ratio = to_percent(raw);
    // |ratio| <= 100 after clamping, so both conversions are lossless
    let negative = u8::try_from((-ratio).max(0)).unwrap_or(MAX_PERCENT);
    let positive = u8::try_from(ratio.max(0)).unwrap_or(MAX_PERCENT);
    (negative, positive)
}
