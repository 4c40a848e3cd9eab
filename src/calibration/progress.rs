//! # Calibration Progress Module
//!
//! Records, per axis and direction, whether the operator has pushed that
//! direction to its limit since the last reset, and decides whether the current
//! phase is complete.
//!
//! ## Limit Detection
//!
//! - DEFAULT controllers: a direction is recorded once its 0-100 percentage
//!   exceeds the profile threshold.
//! - MAVIC-style sticks: a direction is recorded only once its segment bitmask
//!   is completely filled ([`MAX_CALIBRATION_STATUS`]). Partially filled masks
//!   (1, 3, 7, ...) never count.
//! - MAVIC-style left dial: threshold-based, and ignored entirely during the
//!   stick step.
//!
//! Flags only ever go from `false` to `true`; [`ProgressTracker::reset`] clears
//! all sixteen at once.

use serde::Serialize;

use crate::calibration::machine::MavicStep;
use crate::controller::position::{DialPosition, LeverPosition, StickPosition};
use crate::controller::profile::{CalibrationType, ControllerProfile};
use crate::telemetry::SegmentAxis;

/// Bitmask value of a fully filled edge (15 segments).
pub const MAX_CALIBRATION_STATUS: u16 = 0x7FFF;

/// Which of a pair of identical controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

/// Segment-fill bitmasks for the four edges of one stick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StickCalibrationStatus {
    pub top: u16,
    pub bottom: u16,
    pub right: u16,
    pub left: u16,
}

impl StickCalibrationStatus {
    /// Assembles one stick's status from the eight segment channels.
    ///
    /// The right stick reads A-D and the left stick E-H, each in
    /// (top, bottom, right, left) order.
    ///
    /// # Examples
    ///
    /// ```
    /// use rc_calibrator::calibration::progress::{Side, StickCalibrationStatus};
    ///
    /// let segments = [1, 2, 3, 4, 5, 6, 7, 8];
    /// let left = StickCalibrationStatus::for_stick(Side::Left, &segments);
    /// assert_eq!((left.top, left.bottom, left.right, left.left), (5, 6, 7, 8));
    /// ```
    #[must_use]
    pub fn for_stick(side: Side, segments: &[u16; 8]) -> Self {
        let [top, bottom, right, left] = match side {
            Side::Right => [SegmentAxis::A, SegmentAxis::B, SegmentAxis::C, SegmentAxis::D],
            Side::Left => [SegmentAxis::E, SegmentAxis::F, SegmentAxis::G, SegmentAxis::H],
        };
        Self {
            top: segments[top.index()],
            bottom: segments[bottom.index()],
            right: segments[right.index()],
            left: segments[left.index()],
        }
    }
}

/// Limit flags for one stick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StickLimits {
    pub left: bool,
    pub right: bool,
    pub top: bool,
    pub bottom: bool,
}

impl StickLimits {
    #[must_use]
    pub fn all(&self) -> bool {
        self.left && self.right && self.top && self.bottom
    }
}

/// Limit flags for one dial.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DialLimits {
    pub left: bool,
    pub right: bool,
}

impl DialLimits {
    #[must_use]
    pub fn all(&self) -> bool {
        self.left && self.right
    }
}

/// Limit flags for one lever.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LeverLimits {
    pub top: bool,
    pub bottom: bool,
}

impl LeverLimits {
    #[must_use]
    pub fn all(&self) -> bool {
        self.top && self.bottom
    }
}

/// The sixteen "limit recorded" flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CalibrationProgress {
    pub left_stick: StickLimits,
    pub right_stick: StickLimits,
    pub left_dial: DialLimits,
    pub right_dial: DialLimits,
    pub left_lever: LeverLimits,
    pub right_lever: LeverLimits,
}

impl CalibrationProgress {
    #[must_use]
    pub fn sticks_complete(&self) -> bool {
        self.left_stick.all() && self.right_stick.all()
    }

    #[must_use]
    pub fn levers_complete(&self) -> bool {
        self.left_lever.all() && self.right_lever.all()
    }

    /// Completion policy for the active profile and MAVIC step.
    ///
    /// # Examples
    ///
    /// ```
    /// use rc_calibrator::calibration::machine::MavicStep;
    /// use rc_calibrator::calibration::progress::CalibrationProgress;
    /// use rc_calibrator::controller::profile::ControllerProfile;
    ///
    /// let progress = CalibrationProgress::default();
    /// assert!(!progress.is_complete(&ControllerProfile::default(), MavicStep::Stick));
    /// ```
    #[must_use]
    pub fn is_complete(&self, profile: &ControllerProfile, step: MavicStep) -> bool {
        let sticks = self.sticks_complete();
        let left_dial = self.left_dial.all();
        let right_dial = self.right_dial.all();

        match profile.calibration_type {
            CalibrationType::Mavic => match step {
                MavicStep::Stick => sticks,
                MavicStep::Dial => left_dial,
            },
            CalibrationType::Default => {
                if profile.has_levers {
                    sticks && left_dial && right_dial && self.levers_complete()
                } else if profile.has_right_dial {
                    sticks && left_dial && right_dial
                } else {
                    sticks && left_dial
                }
            }
        }
    }
}

/// Owns the [`CalibrationProgress`] and applies the recording rules.
///
/// The active profile and MAVIC step are passed in on every call rather than
/// stored, so the tracker never acts on a stale profile.
#[derive(Debug, Default)]
pub struct ProgressTracker {
    progress: CalibrationProgress,
}

impl ProgressTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn progress(&self) -> &CalibrationProgress {
        &self.progress
    }

    /// Clears every flag.
    pub fn reset(&mut self) {
        self.progress = CalibrationProgress::default();
    }

    #[must_use]
    pub fn is_complete(&self, profile: &ControllerProfile, step: MavicStep) -> bool {
        self.progress.is_complete(profile, step)
    }

    /// Records stick limits.
    ///
    /// DEFAULT profiles look at `position`; MAVIC profiles look only at the
    /// segment `status`.
    pub fn record_stick(
        &mut self,
        side: Side,
        position: &StickPosition,
        status: &StickCalibrationStatus,
        profile: &ControllerProfile,
    ) {
        let limits = match side {
            Side::Left => &mut self.progress.left_stick,
            Side::Right => &mut self.progress.right_stick,
        };

        match profile.calibration_type {
            CalibrationType::Default => {
                limits.left |= profile.reaches_limit(position.left);
                limits.right |= profile.reaches_limit(position.right);
                limits.top |= profile.reaches_limit(position.top);
                limits.bottom |= profile.reaches_limit(position.bottom);
            }
            CalibrationType::Mavic => {
                limits.left |= status.left == MAX_CALIBRATION_STATUS;
                limits.right |= status.right == MAX_CALIBRATION_STATUS;
                limits.top |= status.top == MAX_CALIBRATION_STATUS;
                limits.bottom |= status.bottom == MAX_CALIBRATION_STATUS;
            }
        }
    }

    /// Records dial limits.
    ///
    /// The left dial is inert during a MAVIC stick step and is skipped.
    /// Returns `false` when the sample was ignored.
    pub fn record_dial(
        &mut self,
        side: Side,
        position: &DialPosition,
        profile: &ControllerProfile,
        step: MavicStep,
    ) -> bool {
        if side == Side::Left && profile.is_mavic() && step == MavicStep::Stick {
            return false;
        }

        let limits = match side {
            Side::Left => &mut self.progress.left_dial,
            Side::Right => &mut self.progress.right_dial,
        };
        limits.left |= profile.reaches_limit(position.left);
        limits.right |= profile.reaches_limit(position.right);
        true
    }

    /// Records lever limits.
    pub fn record_lever(&mut self, side: Side, position: &LeverPosition, profile: &ControllerProfile) {
        let limits = match side {
            Side::Left => &mut self.progress.left_lever,
            Side::Right => &mut self.progress.right_lever,
        };
        limits.top |= profile.reaches_limit(position.top);
        limits.bottom |= profile.reaches_limit(position.bottom);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::position::StickSample;
    use crate::controller::profile::display_names;

    const FULL: StickCalibrationStatus = StickCalibrationStatus {
        top: MAX_CALIBRATION_STATUS,
        bottom: MAX_CALIBRATION_STATUS,
        right: MAX_CALIBRATION_STATUS,
        left: MAX_CALIBRATION_STATUS,
    };

    fn stick(h: i32, v: i32) -> StickPosition {
        StickPosition::from_sample(StickSample::new(h, v))
    }

    /// Sweeps both sticks through all four corners.
    fn sweep_sticks(tracker: &mut ProgressTracker, profile: &ControllerProfile) {
        let status = StickCalibrationStatus::default();
        for (h, v) in [(-660, 660), (660, -660)] {
            tracker.record_stick(Side::Left, &stick(h, v), &status, profile);
            tracker.record_stick(Side::Right, &stick(h, v), &status, profile);
        }
    }

    fn sweep_dial(tracker: &mut ProgressTracker, side: Side, profile: &ControllerProfile, step: MavicStep) {
        tracker.record_dial(side, &DialPosition::from_raw(-660), profile, step);
        tracker.record_dial(side, &DialPosition::from_raw(660), profile, step);
    }

    fn sweep_lever(tracker: &mut ProgressTracker, side: Side, profile: &ControllerProfile) {
        tracker.record_lever(side, &LeverPosition::from_raw(-660), profile);
        tracker.record_lever(side, &LeverPosition::from_raw(660), profile);
    }

    // ==================== Status Assembly Tests ====================

    #[test]
    fn test_right_stick_reads_a_to_d() {
        let segments = [10, 20, 30, 40, 50, 60, 70, 80];
        let right = StickCalibrationStatus::for_stick(Side::Right, &segments);
        assert_eq!(
            right,
            StickCalibrationStatus {
                top: 10,
                bottom: 20,
                right: 30,
                left: 40
            }
        );
    }

    // ==================== DEFAULT Profile Tests ====================

    #[test]
    fn test_threshold_is_exclusive() {
        let profile = ControllerProfile::default();
        let mut tracker = ProgressTracker::new();

        // 100 raw -> 15%, not above the threshold
        tracker.record_stick(Side::Left, &stick(-100, 0), &FULL, &profile);
        assert!(!tracker.progress().left_stick.left);

        // 106 raw -> 16%
        tracker.record_stick(Side::Left, &stick(-106, 0), &FULL, &profile);
        assert!(tracker.progress().left_stick.left);
    }

    #[test]
    fn test_flags_are_monotonic() {
        let profile = ControllerProfile::default();
        let mut tracker = ProgressTracker::new();
        tracker.record_stick(Side::Right, &stick(660, 0), &FULL, &profile);
        tracker.record_stick(Side::Right, &stick(0, 0), &FULL, &profile);
        assert!(tracker.progress().right_stick.right);
    }

    #[test]
    fn test_default_needs_sticks_and_left_dial() {
        let profile = ControllerProfile::default();
        let mut tracker = ProgressTracker::new();

        sweep_sticks(&mut tracker, &profile);
        assert!(tracker.progress().sticks_complete());
        assert!(!tracker.is_complete(&profile, MavicStep::Stick));

        tracker.record_dial(Side::Left, &DialPosition::from_raw(-660), &profile, MavicStep::Stick);
        assert!(!tracker.is_complete(&profile, MavicStep::Stick));

        tracker.record_dial(Side::Left, &DialPosition::from_raw(660), &profile, MavicStep::Stick);
        assert!(tracker.is_complete(&profile, MavicStep::Stick));
    }

    #[test]
    fn test_default_missing_any_stick_direction_is_incomplete() {
        let profile = ControllerProfile::default();
        let status = StickCalibrationStatus::default();

        // Each corner sweep below skips exactly one direction of one stick
        let partial_sweeps: [(Side, [(i32, i32); 2]); 4] = [
            (Side::Left, [(0, 660), (660, -660)]),   // no left
            (Side::Left, [(-660, 0), (660, -660)]),  // no top
            (Side::Right, [(-660, 660), (0, -660)]), // no right
            (Side::Right, [(-660, 660), (660, 0)]),  // no bottom
        ];

        for (partial_side, corners) in partial_sweeps {
            let mut tracker = ProgressTracker::new();
            for side in [Side::Left, Side::Right] {
                let sweep = if side == partial_side {
                    corners
                } else {
                    [(-660, 660), (660, -660)]
                };
                for (h, v) in sweep {
                    tracker.record_stick(side, &stick(h, v), &status, &profile);
                }
            }
            sweep_dial(&mut tracker, Side::Left, &profile, MavicStep::Stick);
            assert!(!tracker.is_complete(&profile, MavicStep::Stick), "{:?} {:?}", partial_side, corners);
        }
    }

    #[test]
    fn test_right_dial_profile_needs_right_dial() {
        let profile = ControllerProfile::resolve(display_names::MAVIC_2);
        let mut tracker = ProgressTracker::new();
        sweep_sticks(&mut tracker, &profile);
        sweep_dial(&mut tracker, Side::Left, &profile, MavicStep::Stick);
        assert!(!tracker.is_complete(&profile, MavicStep::Stick));

        sweep_dial(&mut tracker, Side::Right, &profile, MavicStep::Stick);
        assert!(tracker.is_complete(&profile, MavicStep::Stick));
    }

    #[test]
    fn test_lever_profile_needs_everything() {
        let profile = ControllerProfile::resolve(display_names::CENDENCE);
        let mut tracker = ProgressTracker::new();
        sweep_sticks(&mut tracker, &profile);
        sweep_dial(&mut tracker, Side::Left, &profile, MavicStep::Stick);
        sweep_dial(&mut tracker, Side::Right, &profile, MavicStep::Stick);
        sweep_lever(&mut tracker, Side::Left, &profile);
        assert!(!tracker.is_complete(&profile, MavicStep::Stick));

        tracker.record_lever(Side::Right, &LeverPosition::from_raw(-660), &profile);
        assert!(!tracker.is_complete(&profile, MavicStep::Stick));

        tracker.record_lever(Side::Right, &LeverPosition::from_raw(660), &profile);
        assert!(tracker.is_complete(&profile, MavicStep::Stick));
    }

    // ==================== MAVIC Profile Tests ====================

    #[test]
    fn test_mavic_sticks_ignore_percentages() {
        let profile = ControllerProfile::resolve(display_names::MAVIC_PRO);
        let mut tracker = ProgressTracker::new();
        sweep_sticks(&mut tracker, &profile);
        assert_eq!(tracker.progress().left_stick, StickLimits::default());
        assert_eq!(tracker.progress().right_stick, StickLimits::default());
    }

    #[test]
    fn test_mavic_partial_masks_never_count() {
        let profile = ControllerProfile::resolve(display_names::SPARK);
        let mut tracker = ProgressTracker::new();
        let partial = StickCalibrationStatus {
            top: 1,
            bottom: 3,
            right: 7,
            left: 15,
        };
        tracker.record_stick(Side::Left, &StickPosition::default(), &partial, &profile);
        assert_eq!(tracker.progress().left_stick, StickLimits::default());

        let almost = StickCalibrationStatus {
            top: MAX_CALIBRATION_STATUS - 1,
            ..FULL
        };
        tracker.record_stick(Side::Left, &StickPosition::default(), &almost, &profile);
        let limits = tracker.progress().left_stick;
        assert!(!limits.top);
        assert!(limits.bottom && limits.right && limits.left);
    }

    #[test]
    fn test_mavic_stick_step_is_sticks_only() {
        let profile = ControllerProfile::resolve(display_names::MAVIC_PRO);
        let mut tracker = ProgressTracker::new();
        tracker.record_stick(Side::Left, &StickPosition::default(), &FULL, &profile);
        assert!(!tracker.is_complete(&profile, MavicStep::Stick));
        tracker.record_stick(Side::Right, &StickPosition::default(), &FULL, &profile);
        assert!(tracker.is_complete(&profile, MavicStep::Stick));
        assert!(!tracker.is_complete(&profile, MavicStep::Dial));
    }

    #[test]
    fn test_mavic_left_dial_ignored_during_stick_step() {
        let profile = ControllerProfile::resolve(display_names::MAVIC_PRO);
        let mut tracker = ProgressTracker::new();
        let recorded = tracker.record_dial(Side::Left, &DialPosition::from_raw(660), &profile, MavicStep::Stick);
        assert!(!recorded);
        assert_eq!(tracker.progress().left_dial, DialLimits::default());
    }

    #[test]
    fn test_mavic_dial_step_uses_high_threshold() {
        let profile = ControllerProfile::resolve(display_names::MAVIC_PRO);
        let mut tracker = ProgressTracker::new();

        // 650 raw -> 98%, below 99
        tracker.record_dial(Side::Left, &DialPosition::from_raw(650), &profile, MavicStep::Dial);
        assert!(!tracker.progress().left_dial.right);

        sweep_dial(&mut tracker, Side::Left, &profile, MavicStep::Dial);
        assert!(tracker.is_complete(&profile, MavicStep::Dial));
    }

    #[test]
    fn test_reset_clears_every_flag() {
        let profile = ControllerProfile::resolve(display_names::CENDENCE);
        let mut tracker = ProgressTracker::new();
        sweep_sticks(&mut tracker, &profile);
        sweep_dial(&mut tracker, Side::Left, &profile, MavicStep::Stick);
        sweep_dial(&mut tracker, Side::Right, &profile, MavicStep::Stick);
        sweep_lever(&mut tracker, Side::Left, &profile);
        sweep_lever(&mut tracker, Side::Right, &profile);
        assert!(tracker.is_complete(&profile, MavicStep::Stick));

        tracker.reset();
        assert_eq!(*tracker.progress(), CalibrationProgress::default());
    }
}
