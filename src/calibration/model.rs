//! # Calibration Model
//!
//! The coordinating task behind a remote-controller calibration screen.
//!
//! A single task owns every mutable field (raw telemetry snapshot, profile,
//! progress, phase) and processes commands one at a time from a bounded
//! channel. After every command it republishes a complete [`CalibrationView`]
//! on a `watch` channel, so readers always see a consistent snapshot.
//!
//! ## Advancing
//!
//! [`CalibrationHandle::advance`] is single-flight: concurrent callers queue
//! on a gate held for the whole round trip.
//!
//! 1. The task checks the connection, applies the next phase locally and
//!    publishes it.
//! 2. The hardware link is asked to persist the phase, bounded by the
//!    configured timeout. Telemetry keeps flowing meanwhile.
//! 3. The task commits (QUIT collapses to NORMAL) or rolls back to the prior
//!    phase, and the caller gets the resting phase or the error.
//!
//! ## Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use rc_calibrator::calibration::model::CalibrationModel;
//! use rc_calibrator::calibration::connection::Product;
//! use rc_calibrator::config::SessionConfig;
//! use rc_calibrator::link::SimulatedLink;
//! use rc_calibrator::telemetry::TelemetryEvent;
//!
//! # async fn run() -> rc_calibrator::error::Result<()> {
//! let link = Arc::new(SimulatedLink::new(Duration::from_millis(20), vec![]));
//! let (handle, _task) = CalibrationModel::spawn(link, &SessionConfig::default());
//!
//! handle
//!     .publish(TelemetryEvent::Product(Product::Aircraft { connected: false, rc_connected: true }))
//!     .await?;
//! let phase = handle.advance().await?;
//! println!("now in {}", phase);
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{mpsc, oneshot, watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::calibration::connection::ConnectionState;
use crate::calibration::machine::{CalibrationPhase, CalibrationStateMachine, MavicStep, PendingTransition};
use crate::calibration::progress::{CalibrationProgress, ProgressTracker, Side, StickCalibrationStatus};
use crate::config::SessionConfig;
use crate::controller::mapper::{AxisChange, TelemetryMapper};
use crate::controller::position::{DialPosition, LeverPosition, StickPosition};
use crate::controller::profile::{CalibrationType, ControllerProfile};
use crate::error::{CalibratorError, Result};
use crate::link::CalibrationLink;
use crate::telemetry::TelemetryEvent;

/// Everything the presentation layer reads, as one consistent snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CalibrationView {
    pub left_stick: StickPosition,
    pub right_stick: StickPosition,
    pub left_dial: DialPosition,
    pub right_dial: DialPosition,
    pub left_lever: LeverPosition,
    pub right_lever: LeverPosition,
    pub connection: ConnectionState,
    pub phase: CalibrationPhase,
    /// Every axis the active phase requires has reached its limits.
    pub phase_complete: bool,
    pub calibration_type: CalibrationType,
    pub mavic_step: MavicStep,
    pub left_stick_status: StickCalibrationStatus,
    pub right_stick_status: StickCalibrationStatus,
    pub has_right_dial: bool,
    pub has_levers: bool,
    pub progress: CalibrationProgress,
}

enum Command {
    Telemetry(TelemetryEvent),
    Snapshot {
        reply: oneshot::Sender<CalibrationView>,
    },
    BeginAdvance {
        reply: oneshot::Sender<Result<Option<PendingTransition>>>,
    },
    FinishAdvance {
        pending: PendingTransition,
        outcome: Result<()>,
        reply: oneshot::Sender<Result<CalibrationPhase>>,
    },
}

/// State owned by the coordinating task.
pub struct CalibrationModel {
    mapper: TelemetryMapper,
    resolved_name: String,
    profile: ControllerProfile,
    tracker: ProgressTracker,
    machine: CalibrationStateMachine,
    connection: ConnectionState,
    left_stick: StickPosition,
    right_stick: StickPosition,
    left_dial: DialPosition,
    right_dial: DialPosition,
    left_lever: LeverPosition,
    right_lever: LeverPosition,
    left_status: StickCalibrationStatus,
    right_status: StickCalibrationStatus,
    view_tx: watch::Sender<CalibrationView>,
}

impl CalibrationModel {
    /// Starts the coordinating task.
    ///
    /// The task runs until every [`CalibrationHandle`] has been dropped.
    pub fn spawn(link: Arc<dyn CalibrationLink>, config: &SessionConfig) -> (CalibrationHandle, JoinHandle<()>) {
        let (command_tx, command_rx) = mpsc::channel(config.event_buffer);
        let (view_tx, view_rx) = watch::channel(CalibrationView::default());

        let model = Self::new(view_tx);
        let task = tokio::spawn(model.run(command_rx));

        let handle = CalibrationHandle {
            commands: command_tx,
            view: view_rx,
            link,
            phase_timeout: config.phase_timeout(),
            gate: Arc::new(Mutex::new(())),
        };
        (handle, task)
    }

    fn new(view_tx: watch::Sender<CalibrationView>) -> Self {
        Self {
            mapper: TelemetryMapper::new(),
            resolved_name: String::new(),
            profile: ControllerProfile::default(),
            tracker: ProgressTracker::new(),
            machine: CalibrationStateMachine::new(),
            connection: ConnectionState::Disconnected,
            left_stick: StickPosition::default(),
            right_stick: StickPosition::default(),
            left_dial: DialPosition::default(),
            right_dial: DialPosition::default(),
            left_lever: LeverPosition::default(),
            right_lever: LeverPosition::default(),
            left_status: StickCalibrationStatus::default(),
            right_status: StickCalibrationStatus::default(),
            view_tx,
        }
    }

    async fn run(mut self, mut commands: mpsc::Receiver<Command>) {
        while let Some(command) = commands.recv().await {
            match command {
                Command::Telemetry(event) => {
                    self.on_telemetry(&event);
                    self.publish();
                }
                Command::Snapshot { reply } => {
                    let _ = reply.send(self.view());
                }
                Command::BeginAdvance { reply } => {
                    let result = self.begin_advance();
                    self.publish();
                    let _ = reply.send(result);
                }
                Command::FinishAdvance { pending, outcome, reply } => {
                    let result = self.finish_advance(pending, outcome);
                    self.publish();
                    let _ = reply.send(result);
                }
            }
        }
        debug!("Calibration model stopped");
    }

    fn recording(&self) -> bool {
        self.machine.phase() == CalibrationPhase::Limits
    }

    fn on_telemetry(&mut self, event: &TelemetryEvent) {
        if matches!(event, TelemetryEvent::SegmentStatus(_)) && !self.recording() {
            debug!("Ignoring segment status outside LIMITS");
            return;
        }

        let Some(change) = self.mapper.process_event(event) else {
            return;
        };
        let step = self.machine.mavic_step();

        match change {
            AxisChange::LeftStick => {
                self.left_stick = StickPosition::from_sample(self.mapper.state().left_stick);
                self.record_stick(Side::Left);
            }
            AxisChange::RightStick => {
                self.right_stick = StickPosition::from_sample(self.mapper.state().right_stick);
                self.record_stick(Side::Right);
            }
            AxisChange::LeftDial => {
                if self.profile.is_mavic() && step == MavicStep::Stick {
                    return;
                }
                self.left_dial = DialPosition::from_raw(self.mapper.state().left_dial);
                if self.recording() {
                    self.tracker.record_dial(Side::Left, &self.left_dial, &self.profile, step);
                }
            }
            AxisChange::RightDial => {
                self.right_dial = DialPosition::from_raw(self.mapper.state().right_dial);
                if self.recording() {
                    self.tracker.record_dial(Side::Right, &self.right_dial, &self.profile, step);
                }
            }
            AxisChange::LeftLever => {
                self.left_lever = LeverPosition::from_raw(self.mapper.state().left_lever);
                if self.recording() {
                    self.tracker.record_lever(Side::Left, &self.left_lever, &self.profile);
                }
            }
            AxisChange::RightLever => {
                self.right_lever = LeverPosition::from_raw(self.mapper.state().right_lever);
                if self.recording() {
                    self.tracker.record_lever(Side::Right, &self.right_lever, &self.profile);
                }
            }
            AxisChange::Segments => {
                let segments = self.mapper.state().segments;
                self.left_status = StickCalibrationStatus::for_stick(Side::Left, &segments);
                self.right_status = StickCalibrationStatus::for_stick(Side::Right, &segments);
                self.record_stick(Side::Left);
                self.record_stick(Side::Right);
            }
            AxisChange::DisplayName => {
                self.on_display_name();
                self.reclassify();
            }
            AxisChange::Product => self.reclassify(),
            AxisChange::HardwarePhase(phase) => {
                if self.machine.adopt_hardware_phase(phase) {
                    self.end_run();
                }
            }
        }
    }

    fn record_stick(&mut self, side: Side) {
        if !self.recording() {
            return;
        }
        let (position, status) = match side {
            Side::Left => (self.left_stick, self.left_status),
            Side::Right => (self.right_stick, self.right_status),
        };
        self.tracker.record_stick(side, &position, &status, &self.profile);
    }

    fn on_display_name(&mut self) {
        let name = &self.mapper.state().display_name;
        if *name == self.resolved_name {
            return;
        }

        self.resolved_name = name.clone();
        self.profile = ControllerProfile::resolve(name);
        self.tracker.reset();
        self.machine.on_profile_changed();
        info!(
            "Remote controller {:?}: {:?} calibration, right dial: {}, levers: {}",
            self.resolved_name, self.profile.calibration_type, self.profile.has_right_dial, self.profile.has_levers
        );
    }

    fn reclassify(&mut self) {
        let connection = ConnectionState::classify(&self.mapper.state().product);
        if connection != self.connection {
            info!("Connection state {:?} -> {:?}", self.connection, connection);
            self.connection = connection;
        }
    }

    /// Clears everything recorded by the run that just ended.
    fn end_run(&mut self) {
        self.tracker.reset();
        self.mapper.clear_segments();
        self.left_status = StickCalibrationStatus::default();
        self.right_status = StickCalibrationStatus::default();
    }

    fn begin_advance(&mut self) -> Result<Option<PendingTransition>> {
        let advance = self.machine.begin_advance(self.connection, &self.profile)?;
        if advance.reset_progress {
            self.tracker.reset();
        }
        Ok(advance.pending)
    }

    fn finish_advance(&mut self, pending: PendingTransition, outcome: Result<()>) -> Result<CalibrationPhase> {
        match outcome {
            Ok(()) => {
                let committed = self.machine.commit(pending);
                if committed.reset_progress {
                    self.end_run();
                }
                Ok(committed.phase)
            }
            Err(e) => {
                self.machine.roll_back(pending);
                Err(e)
            }
        }
    }

    fn view(&self) -> CalibrationView {
        let step = self.machine.mavic_step();
        CalibrationView {
            left_stick: self.left_stick,
            right_stick: self.right_stick,
            left_dial: self.left_dial,
            right_dial: self.right_dial,
            left_lever: self.left_lever,
            right_lever: self.right_lever,
            connection: self.connection,
            phase: self.machine.phase(),
            phase_complete: self.tracker.is_complete(&self.profile, step),
            calibration_type: self.profile.calibration_type,
            mavic_step: step,
            left_stick_status: self.left_status,
            right_stick_status: self.right_status,
            has_right_dial: self.profile.has_right_dial,
            has_levers: self.profile.has_levers,
            progress: *self.tracker.progress(),
        }
    }

    fn publish(&self) {
        self.view_tx.send_if_modified(|current| {
            let next = self.view();
            if *current == next {
                return false;
            }
            *current = next;
            true
        });
    }
}

/// Cloneable access to a running [`CalibrationModel`].
#[derive(Clone)]
pub struct CalibrationHandle {
    commands: mpsc::Sender<Command>,
    view: watch::Receiver<CalibrationView>,
    link: Arc<dyn CalibrationLink>,
    phase_timeout: Duration,
    gate: Arc<Mutex<()>>,
}

impl std::fmt::Debug for CalibrationHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CalibrationHandle")
            .field("phase_timeout", &self.phase_timeout)
            .finish_non_exhaustive()
    }
}

impl CalibrationHandle {
    /// Feeds one telemetry update to the model.
    ///
    /// # Errors
    ///
    /// Returns `ModelStopped` if the model task has exited.
    pub async fn publish(&self, event: TelemetryEvent) -> Result<()> {
        self.commands
            .send(Command::Telemetry(event))
            .await
            .map_err(|_| CalibratorError::ModelStopped)
    }

    /// Returns the view after every previously published event has been processed.
    ///
    /// # Errors
    ///
    /// Returns `ModelStopped` if the model task has exited.
    pub async fn snapshot(&self) -> Result<CalibrationView> {
        self.request(|reply| Command::Snapshot { reply }).await
    }

    /// Moves calibration to its next phase.
    ///
    /// Returns the phase the model rests in afterwards. Calls are serialized;
    /// dropping the returned future does not abandon a round trip already
    /// handed to the hardware.
    ///
    /// # Errors
    ///
    /// - `AircraftConnected` / `NoRemoteController` if the connection is not RC-only
    /// - `Rejected` / `Timeout` if the hardware did not accept the phase (the
    ///   previous phase is restored)
    /// - `ModelStopped` if the model task has exited
    pub async fn advance(&self) -> Result<CalibrationPhase> {
        let guard = Arc::clone(&self.gate).lock_owned().await;

        let pending = self.request(|reply| Command::BeginAdvance { reply }).await??;
        let Some(pending) = pending else {
            return Ok(self.view.borrow().phase);
        };

        let link = Arc::clone(&self.link);
        let commands = self.commands.clone();
        let phase_timeout = self.phase_timeout;

        let round_trip = tokio::spawn(async move {
            let _guard = guard;
            let outcome = match tokio::time::timeout(phase_timeout, link.set_calibration_phase(pending.to)).await {
                Ok(result) => result,
                Err(_) => {
                    warn!("No acknowledgement for calibration phase {} within {:?}", pending.to, phase_timeout);
                    Err(CalibratorError::Timeout {
                        phase: pending.to,
                        timeout: phase_timeout,
                    })
                }
            };

            let (reply_tx, reply_rx) = oneshot::channel();
            commands
                .send(Command::FinishAdvance {
                    pending,
                    outcome,
                    reply: reply_tx,
                })
                .await
                .map_err(|_| CalibratorError::ModelStopped)?;
            reply_rx.await.map_err(|_| CalibratorError::ModelStopped)?
        });

        round_trip.await.map_err(|_| CalibratorError::ModelStopped)?
    }

    /// Latest published view.
    #[must_use]
    pub fn view(&self) -> CalibrationView {
        self.view.borrow().clone()
    }

    /// Receiver that is notified on every view change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<CalibrationView> {
        self.view.clone()
    }

    #[must_use]
    pub fn left_stick(&self) -> StickPosition {
        self.view.borrow().left_stick
    }

    #[must_use]
    pub fn right_stick(&self) -> StickPosition {
        self.view.borrow().right_stick
    }

    #[must_use]
    pub fn left_dial(&self) -> DialPosition {
        self.view.borrow().left_dial
    }

    #[must_use]
    pub fn right_dial(&self) -> DialPosition {
        self.view.borrow().right_dial
    }

    #[must_use]
    pub fn left_lever(&self) -> LeverPosition {
        self.view.borrow().left_lever
    }

    #[must_use]
    pub fn right_lever(&self) -> LeverPosition {
        self.view.borrow().right_lever
    }

    #[must_use]
    pub fn connection_state(&self) -> ConnectionState {
        self.view.borrow().connection
    }

    #[must_use]
    pub fn phase(&self) -> CalibrationPhase {
        self.view.borrow().phase
    }

    #[must_use]
    pub fn is_phase_complete(&self) -> bool {
        self.view.borrow().phase_complete
    }

    #[must_use]
    pub fn calibration_type(&self) -> CalibrationType {
        self.view.borrow().calibration_type
    }

    #[must_use]
    pub fn mavic_step(&self) -> MavicStep {
        self.view.borrow().mavic_step
    }

    #[must_use]
    pub fn left_stick_status(&self) -> StickCalibrationStatus {
        self.view.borrow().left_stick_status
    }

    #[must_use]
    pub fn right_stick_status(&self) -> StickCalibrationStatus {
        self.view.borrow().right_stick_status
    }

    #[must_use]
    pub fn has_right_dial(&self) -> bool {
        self.view.borrow().has_right_dial
    }

    #[must_use]
    pub fn has_levers(&self) -> bool {
        self.view.borrow().has_levers
    }

    async fn request<T>(&self, command: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.commands
            .send(command(reply_tx))
            .await
            .map_err(|_| CalibratorError::ModelStopped)?;
        reply_rx.await.map_err(|_| CalibratorError::ModelStopped)
    }
}
