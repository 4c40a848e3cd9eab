//! # Calibration State Machine Module
//!
//! The phase sequence an operator walks through:
//!
//! ```text
//! NORMAL -> MIDDLE -> LIMITS -> QUIT -> NORMAL
//! ```
//!
//! MAVIC-style controllers split LIMITS into a stick step and a dial step; the
//! first `advance` in LIMITS only switches the step and never reaches the
//! hardware.
//!
//! Transitions are tentative. [`CalibrationStateMachine::begin_advance`] applies
//! the new phase locally right away and returns a [`PendingTransition`]; the
//! caller then persists it and reports back with
//! [`CalibrationStateMachine::commit`] or [`CalibrationStateMachine::roll_back`].
//! Only one transition may be pending at a time.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::calibration::connection::ConnectionState;
use crate::controller::profile::ControllerProfile;
use crate::error::{CalibratorError, Result};

/// Hardware calibration phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CalibrationPhase {
    /// Idle, not calibrating.
    #[default]
    Normal,
    /// Recording stick centers.
    Middle,
    /// Recording limits.
    Limits,
    /// Instruction to leave calibration. Collapses to NORMAL once acknowledged.
    Quit,
}

impl fmt::Display for CalibrationPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Normal => "NORMAL",
            Self::Middle => "MIDDLE",
            Self::Limits => "LIMITS",
            Self::Quit => "QUIT",
        };
        f.write_str(name)
    }
}

impl CalibrationPhase {
    /// Phase requested by a plain `advance` from this phase.
    ///
    /// NORMAL and QUIT are both treated as idle and lead to MIDDLE.
    #[must_use]
    pub fn next(self) -> Self {
        match self {
            Self::Middle => Self::Limits,
            Self::Limits => Self::Quit,
            Self::Normal | Self::Quit => Self::Middle,
        }
    }
}

/// Sub-step of LIMITS for MAVIC-style controllers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MavicStep {
    #[default]
    Stick,
    Dial,
}

/// A phase change applied locally but not yet acknowledged by the hardware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingTransition {
    pub from: CalibrationPhase,
    pub to: CalibrationPhase,
    /// MAVIC step before the transition, restored on rollback.
    pub prior_step: MavicStep,
}

/// Result of starting an `advance`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Advance {
    /// Progress must be cleared before anything else is recorded.
    pub reset_progress: bool,
    /// `None` when the step was handled locally (MAVIC stick -> dial).
    pub pending: Option<PendingTransition>,
}

/// Outcome of a hardware acknowledgement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Committed {
    /// Phase the machine now rests in.
    pub phase: CalibrationPhase,
    /// The run ended; progress must be cleared.
    pub reset_progress: bool,
}

/// Phase and MAVIC step, plus the single pending-transition slot.
#[derive(Debug, Default)]
pub struct CalibrationStateMachine {
    phase: CalibrationPhase,
    mavic_step: MavicStep,
    pending: Option<PendingTransition>,
}

impl CalibrationStateMachine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn phase(&self) -> CalibrationPhase {
        self.phase
    }

    #[must_use]
    pub fn mavic_step(&self) -> MavicStep {
        self.mavic_step
    }

    #[must_use]
    pub fn pending(&self) -> Option<PendingTransition> {
        self.pending
    }

    /// A new controller profile starts a fresh run at the stick step.
    pub fn on_profile_changed(&mut self) {
        self.mavic_step = MavicStep::Stick;
    }

    /// Starts the next transition.
    ///
    /// # Errors
    ///
    /// - `AircraftConnected` / `NoRemoteController` when `connection` is not RC-only
    /// - `TransitionInFlight` when a previous transition is still pending
    ///
    /// No state changes when an error is returned.
    ///
    /// # Examples
    ///
    /// ```
    /// use rc_calibrator::calibration::connection::ConnectionState;
    /// use rc_calibrator::calibration::machine::{CalibrationPhase, CalibrationStateMachine};
    /// use rc_calibrator::controller::profile::ControllerProfile;
    ///
    /// let mut machine = CalibrationStateMachine::new();
    /// let profile = ControllerProfile::default();
    ///
    /// let advance = machine.begin_advance(ConnectionState::RcOnly, &profile).unwrap();
    /// let pending = advance.pending.unwrap();
    /// assert_eq!(pending.to, CalibrationPhase::Middle);
    /// assert_eq!(machine.phase(), CalibrationPhase::Middle);
    ///
    /// machine.commit(pending);
    /// assert!(machine.pending().is_none());
    /// ```
    pub fn begin_advance(&mut self, connection: ConnectionState, profile: &ControllerProfile) -> Result<Advance> {
        if !connection.allows_calibration() {
            return Err(match connection {
                ConnectionState::AircraftAndRc => CalibratorError::AircraftConnected,
                _ => CalibratorError::NoRemoteController,
            });
        }

        if self.pending.is_some() {
            return Err(CalibratorError::TransitionInFlight);
        }

        let from = self.phase;
        let prior_step = self.mavic_step;

        if profile.is_mavic() && from == CalibrationPhase::Limits {
            match self.mavic_step {
                MavicStep::Stick => {
                    self.mavic_step = MavicStep::Dial;
                    info!("Stick limits done, switching to dial calibration");
                    return Ok(Advance {
                        reset_progress: true,
                        pending: None,
                    });
                }
                MavicStep::Dial => self.mavic_step = MavicStep::Stick,
            }
        }

        let to = from.next();
        let reset_progress = match (from, to) {
            (CalibrationPhase::Middle, CalibrationPhase::Limits) => !profile.is_mavic(),
            (CalibrationPhase::Limits, CalibrationPhase::Quit) => true,
            _ => false,
        };

        let pending = PendingTransition { from, to, prior_step };
        self.phase = to;
        self.pending = Some(pending);
        debug!("Calibration phase {} -> {} pending", from, to);

        Ok(Advance {
            reset_progress,
            pending: Some(pending),
        })
    }

    /// Accepts the hardware acknowledgement of `pending`.
    ///
    /// An acknowledged QUIT immediately rests in NORMAL.
    pub fn commit(&mut self, pending: PendingTransition) -> Committed {
        self.pending = None;
        info!("Calibration phase set to {}", pending.to);

        if pending.to == CalibrationPhase::Quit {
            self.phase = CalibrationPhase::Normal;
            return Committed {
                phase: self.phase,
                reset_progress: true,
            };
        }

        Committed {
            phase: self.phase,
            reset_progress: false,
        }
    }

    /// Restores the state from before `pending`.
    pub fn roll_back(&mut self, pending: PendingTransition) {
        warn!(
            "Calibration phase {} was not accepted, reverting to {}",
            pending.to, pending.from
        );
        self.pending = None;
        self.phase = pending.from;
        self.mavic_step = pending.prior_step;
    }

    /// Adopts a phase reported by the hardware itself.
    ///
    /// Ignored while a transition is pending. Returns `true` when progress must
    /// be cleared: the machine left LIMITS or is back at NORMAL. Either way the
    /// next LIMITS run starts at the stick step.
    pub fn adopt_hardware_phase(&mut self, reported: CalibrationPhase) -> bool {
        if self.pending.is_some() || reported == self.phase {
            return false;
        }

        let phase = match reported {
            CalibrationPhase::Quit => CalibrationPhase::Normal,
            other => other,
        };
        if phase == self.phase {
            return false;
        }

        info!("Hardware reports calibration phase {}, was {}", reported, self.phase);
        let left_limits = self.phase == CalibrationPhase::Limits;
        self.phase = phase;
        if left_limits || phase == CalibrationPhase::Normal {
            self.mavic_step = MavicStep::Stick;
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::profile::display_names;

    fn mavic() -> ControllerProfile {
        ControllerProfile::resolve(display_names::MAVIC_PRO)
    }

    /// Runs one advance and commits whatever it left pending.
    fn advance_ok(machine: &mut CalibrationStateMachine, profile: &ControllerProfile) -> Advance {
        let advance = machine.begin_advance(ConnectionState::RcOnly, profile).unwrap();
        if let Some(pending) = advance.pending {
            machine.commit(pending);
        }
        advance
    }

    // ==================== Guard Tests ====================

    #[test]
    fn test_aircraft_and_rc_is_refused() {
        let mut machine = CalibrationStateMachine::new();
        let err = machine
            .begin_advance(ConnectionState::AircraftAndRc, &ControllerProfile::default())
            .unwrap_err();
        assert_eq!(err.to_string(), "Disconnect aircraft before calibrating remote controller");
        assert_eq!(machine.phase(), CalibrationPhase::Normal);
    }

    #[test]
    fn test_other_states_report_no_remote_controller() {
        for state in [
            ConnectionState::Disconnected,
            ConnectionState::AircraftOnly,
            ConnectionState::Other,
        ] {
            let mut machine = CalibrationStateMachine::new();
            let err = machine.begin_advance(state, &ControllerProfile::default()).unwrap_err();
            assert_eq!(err.to_string(), "No remote controller detected", "{:?}", state);
            assert!(machine.pending().is_none());
        }
    }

    #[test]
    fn test_second_transition_while_pending_is_refused() {
        let mut machine = CalibrationStateMachine::new();
        let profile = ControllerProfile::default();
        machine.begin_advance(ConnectionState::RcOnly, &profile).unwrap();
        let err = machine.begin_advance(ConnectionState::RcOnly, &profile).unwrap_err();
        assert!(matches!(err, CalibratorError::TransitionInFlight));
        assert_eq!(machine.phase(), CalibrationPhase::Middle);
    }

    // ==================== DEFAULT Cycle Tests ====================

    #[test]
    fn test_next_phase_mapping() {
        assert_eq!(CalibrationPhase::Normal.next(), CalibrationPhase::Middle);
        assert_eq!(CalibrationPhase::Middle.next(), CalibrationPhase::Limits);
        assert_eq!(CalibrationPhase::Limits.next(), CalibrationPhase::Quit);
        assert_eq!(CalibrationPhase::Quit.next(), CalibrationPhase::Middle);
    }

    #[test]
    fn test_default_full_cycle() {
        let mut machine = CalibrationStateMachine::new();
        let profile = ControllerProfile::default();

        let first = advance_ok(&mut machine, &profile);
        assert!(!first.reset_progress);
        assert_eq!(machine.phase(), CalibrationPhase::Middle);

        let second = advance_ok(&mut machine, &profile);
        assert!(second.reset_progress);
        assert_eq!(machine.phase(), CalibrationPhase::Limits);

        let advance = machine.begin_advance(ConnectionState::RcOnly, &profile).unwrap();
        assert!(advance.reset_progress);
        assert_eq!(machine.phase(), CalibrationPhase::Quit);
        let committed = machine.commit(advance.pending.unwrap());
        assert_eq!(committed.phase, CalibrationPhase::Normal);
        assert!(committed.reset_progress);
        assert_eq!(machine.phase(), CalibrationPhase::Normal);
    }

    #[test]
    fn test_roll_back_restores_phase() {
        let mut machine = CalibrationStateMachine::new();
        let advance = machine
            .begin_advance(ConnectionState::RcOnly, &ControllerProfile::default())
            .unwrap();
        assert_eq!(machine.phase(), CalibrationPhase::Middle);

        machine.roll_back(advance.pending.unwrap());
        assert_eq!(machine.phase(), CalibrationPhase::Normal);
        assert!(machine.pending().is_none());
    }

    // ==================== MAVIC Tests ====================

    #[test]
    fn test_mavic_limits_splits_into_two_steps() {
        let mut machine = CalibrationStateMachine::new();
        let profile = mavic();

        let to_middle = advance_ok(&mut machine, &profile);
        assert!(!to_middle.reset_progress);
        let to_limits = advance_ok(&mut machine, &profile);
        assert!(!to_limits.reset_progress, "MAVIC does not reset on entering LIMITS");
        assert_eq!(machine.phase(), CalibrationPhase::Limits);
        assert_eq!(machine.mavic_step(), MavicStep::Stick);

        let to_dial = machine.begin_advance(ConnectionState::RcOnly, &profile).unwrap();
        assert_eq!(to_dial.pending, None);
        assert!(to_dial.reset_progress);
        assert_eq!(machine.phase(), CalibrationPhase::Limits);
        assert_eq!(machine.mavic_step(), MavicStep::Dial);

        let to_quit = machine.begin_advance(ConnectionState::RcOnly, &profile).unwrap();
        assert_eq!(machine.mavic_step(), MavicStep::Stick);
        let pending = to_quit.pending.unwrap();
        assert_eq!((pending.from, pending.to), (CalibrationPhase::Limits, CalibrationPhase::Quit));
        assert_eq!(machine.commit(pending).phase, CalibrationPhase::Normal);
    }

    #[test]
    fn test_mavic_roll_back_restores_dial_step() {
        let mut machine = CalibrationStateMachine::new();
        let profile = mavic();
        advance_ok(&mut machine, &profile);
        advance_ok(&mut machine, &profile);
        advance_ok(&mut machine, &profile);
        assert_eq!(machine.mavic_step(), MavicStep::Dial);

        let to_quit = machine.begin_advance(ConnectionState::RcOnly, &profile).unwrap();
        machine.roll_back(to_quit.pending.unwrap());
        assert_eq!(machine.phase(), CalibrationPhase::Limits);
        assert_eq!(machine.mavic_step(), MavicStep::Dial);
    }

    #[test]
    fn test_profile_change_resets_step() {
        let mut machine = CalibrationStateMachine::new();
        let profile = mavic();
        advance_ok(&mut machine, &profile);
        advance_ok(&mut machine, &profile);
        advance_ok(&mut machine, &profile);
        assert_eq!(machine.mavic_step(), MavicStep::Dial);

        machine.on_profile_changed();
        assert_eq!(machine.mavic_step(), MavicStep::Stick);
    }

    // ==================== Hardware Phase Tests ====================

    #[test]
    fn test_hardware_quit_collapses_to_normal() {
        let mut machine = CalibrationStateMachine::new();
        let profile = ControllerProfile::default();
        advance_ok(&mut machine, &profile);
        advance_ok(&mut machine, &profile);

        assert!(machine.adopt_hardware_phase(CalibrationPhase::Quit));
        assert_eq!(machine.phase(), CalibrationPhase::Normal);
    }

    #[test]
    fn test_hardware_phase_ignored_while_pending() {
        let mut machine = CalibrationStateMachine::new();
        machine
            .begin_advance(ConnectionState::RcOnly, &ControllerProfile::default())
            .unwrap();
        assert!(!machine.adopt_hardware_phase(CalibrationPhase::Normal));
        assert_eq!(machine.phase(), CalibrationPhase::Middle);
    }

    #[test]
    fn test_hardware_phase_same_as_local_is_noop() {
        let mut machine = CalibrationStateMachine::new();
        assert!(!machine.adopt_hardware_phase(CalibrationPhase::Normal));
        assert!(!machine.adopt_hardware_phase(CalibrationPhase::Quit));
        assert_eq!(machine.phase(), CalibrationPhase::Normal);
    }

    #[test]
    fn test_hardware_middle_from_normal_keeps_progress() {
        let mut machine = CalibrationStateMachine::new();
        assert!(!machine.adopt_hardware_phase(CalibrationPhase::Middle));
        assert_eq!(machine.phase(), CalibrationPhase::Middle);
    }

    #[test]
    fn test_hardware_leaving_limits_restarts_mavic_run() {
        let mut machine = CalibrationStateMachine::new();
        let profile = mavic();
        advance_ok(&mut machine, &profile);
        advance_ok(&mut machine, &profile);
        advance_ok(&mut machine, &profile);
        assert_eq!(machine.mavic_step(), MavicStep::Dial);

        assert!(machine.adopt_hardware_phase(CalibrationPhase::Middle));
        assert_eq!(machine.phase(), CalibrationPhase::Middle);
        assert_eq!(machine.mavic_step(), MavicStep::Stick);

        advance_ok(&mut machine, &profile);
        assert_eq!(machine.phase(), CalibrationPhase::Limits);
        assert_eq!(machine.mavic_step(), MavicStep::Stick);
    }

    #[test]
    fn test_phase_display() {
        assert_eq!(CalibrationPhase::Normal.to_string(), "NORMAL");
        assert_eq!(CalibrationPhase::Quit.to_string(), "QUIT");
    }
}
