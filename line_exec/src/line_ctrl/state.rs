//! LineCtrl state

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{info, trace, warn};
use std::thread;
use std::time::Duration;

// Internal
use super::*;
use crate::marker_det::{self, MarkerDet, MarkerEvent};
use line_if::eqpt::{DriveActuator, DriveDems, ReflectionSource};
use util::params;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Line controller, stepped once per tick by [`LineCtrl::proc`].
#[derive(Debug, Clone)]
pub struct LineCtrl {
    params: Params,

    /// Current mission state
    state: MissionState,

    marker_det: MarkerDet,

    search: RecoverySearch,
}

/// Everything a single tick did, used to build the tick log record.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct TickOutput {
    /// The reflection read at the start of the tick.
    pub reflection: f64,

    /// What the tick did with the sample.
    pub action: TickAction,

    /// The last demand sent to the drive during the tick.
    pub issued_dems: DriveDems,

    /// Time weighted mean of the (left, right) speeds the drive ran at
    /// during the tick. Equal to the resting speeds of `issued_dems` unless a
    /// recovery search ran.
    pub issued_speeds: (f64, f64),

    /// The proportional (left, right) speed demand for the sample, computed
    /// on every tick whether or not it was sent.
    pub demanded_speeds: (f64, f64),

    /// Number of markers accepted so far.
    pub marker_count: u32,

    /// Mission state at the end of the tick.
    pub state: MissionState,
}

/// Detailed status of the controller after a tick.
#[derive(Debug, Default, Copy, Clone)]
pub struct StatusReport {
    /// Target minus measured reflection.
    pub error: f64,

    /// Marker detector status after this tick's sample.
    pub marker: marker_det::StatusReport,

    /// Report of the recovery search, if one was run this tick.
    pub search: Option<SearchReport>,

    /// True if the tick blocked for longer than a normal tick (manouvre,
    /// search or idle).
    pub blocked: bool,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// The branch taken by a tick.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TickAction {
    /// The proportional demand was sent to the drive.
    Follow,

    /// The first marker was seen and the spin manouvre executed.
    FirstMarkerMnvr,

    /// The second marker was seen and the drive stopped.
    SecondMarkerStop,

    /// A marker was seen outside of the expected sequence. The tick continued
    /// as if no marker had been seen.
    UnexpectedMarker,

    /// The line was lost and the recovery search found it again.
    LineRecovered,

    /// The line was lost and the recovery search failed.
    LineNotRecovered,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl LineCtrl {
    /// Initialise the LineCtrl module.
    ///
    /// Expected init data is the path to the parameter file, relative to the
    /// params directory.
    pub fn init(params_path: &str) -> Result<Self, LineCtrlError> {
        let params: Params = params::load(params_path).map_err(LineCtrlError::ParamLoadError)?;

        Self::new(params)
    }

    /// Create a new controller in the `Following` state.
    pub fn new(params: Params) -> Result<Self, LineCtrlError> {
        params.validate()?;

        let marker_det = MarkerDet::new(params.marker.clone())?;
        let search = RecoverySearch::new(
            params.search.clone(),
            params.base_speed,
            params.target_reflection,
        );

        Ok(Self {
            params,
            state: MissionState::Following,
            marker_det,
            search,
        })
    }

    /// Process a single control tick.
    ///
    /// Processing involves:
    ///  1. Reading one reflection sample and feeding it to the marker
    ///     detector.
    ///  2. Handling an accepted marker: spin on the first, stop on the
    ///     second.
    ///  3. Otherwise, if the line is lost, running the recovery search.
    ///  4. Otherwise sending the proportional demand.
    ///
    /// Marker handling takes priority over line loss handling. Equipment
    /// faults are returned immediately without stopping the drive, the
    /// caller is responsible for making the drive safe.
    pub fn proc<S, D>(
        &mut self,
        sensor: &mut S,
        drive: &mut D,
    ) -> Result<(TickOutput, StatusReport), LineCtrlError>
    where
        S: ReflectionSource,
        D: DriveActuator,
    {
        if self.state == MissionState::Stopped {
            return Err(LineCtrlError::MissionStopped);
        }

        let mut report = StatusReport::default();

        // ---- INPUTS ----

        let reflection = sensor.read_reflection()?;
        let event = self.marker_det.observe(reflection);
        report.marker = self.marker_det.report();

        let (error, demanded_speeds) = self.calc_demand(reflection);
        report.error = error;

        // ---- MARKER HANDLING ----

        let marker_action = match event {
            Some(e) => self.handle_marker(e, drive)?,
            None => None,
        };

        // ---- FOLLOWING ----

        let (action, issued_dems, issued_speeds) = match marker_action {
            Some((action, dems)) => (action, dems, dems.resting_speeds()),
            None => {
                if self.params.is_line_lost(reflection) {
                    self.recover(reflection, sensor, drive, &mut report)?
                }
                else {
                    let dems = DriveDems::Speeds {
                        left: demanded_speeds.0,
                        right: demanded_speeds.1,
                    };
                    drive.apply(dems)?;

                    let action = match event {
                        Some(_) => TickAction::UnexpectedMarker,
                        None => TickAction::Follow,
                    };
                    (action, dems, demanded_speeds)
                }
            }
        };

        report.blocked = match action {
            TickAction::Follow | TickAction::UnexpectedMarker | TickAction::SecondMarkerStop => {
                false
            }
            _ => true,
        };

        let output = TickOutput {
            reflection,
            action,
            issued_dems,
            issued_speeds,
            demanded_speeds,
            marker_count: self.marker_det.count(),
            state: self.state,
        };

        trace!("LineCtrl tick: {:?}", output);

        Ok((output, report))
    }

    /// The wheel speeds to record in the tick log for the given tick output.
    pub fn logged_speeds(&self, output: &TickOutput) -> (f64, f64) {
        match self.params.log_speeds {
            LogSpeeds::Issued => output.issued_speeds,
            LogSpeeds::Demanded => output.demanded_speeds,
        }
    }

    pub fn state(&self) -> MissionState {
        self.state
    }

    pub fn marker_count(&self) -> u32 {
        self.marker_det.count()
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Calculate the reflection error and the proportional (left, right)
    /// speed demand.
    pub fn calc_demand(&self, reflection: f64) -> (f64, (f64, f64)) {
        let error = self.params.target_reflection - reflection;
        let turn = self.params.k_p * error;

        (
            error,
            (
                self.params.base_speed + turn,
                self.params.base_speed - turn,
            ),
        )
    }
}

impl LineCtrl {
    /// Act on an accepted marker. Returns `None` if the marker doesn't fit
    /// the mission sequence, in which case the tick carries on as normal.
    fn handle_marker<D: DriveActuator>(
        &mut self,
        event: MarkerEvent,
        drive: &mut D,
    ) -> Result<Option<(TickAction, DriveDems)>, LineCtrlError> {
        drive.stop()?;

        match (event.count, self.state) {
            (1, MissionState::Following) => {
                info!("First marker detected, executing spin manouvre");

                let mnvr = &self.params.mnvr;
                let dems = DriveDems::Rotate {
                    left: mnvr.left_speed,
                    right: mnvr.right_speed,
                    degrees: mnvr.motor_degrees,
                };
                drive.apply(dems)?;

                thread::sleep(Duration::from_secs_f64(mnvr.pause_s));

                self.state = MissionState::FirstMarkerHandled;
                self.marker_det.reset_streak();

                info!("Spin manouvre complete, resuming line following");

                Ok(Some((TickAction::FirstMarkerMnvr, dems)))
            }
            (2, MissionState::FirstMarkerHandled) => {
                info!("Second marker detected, stopping");

                drive.stop()?;
                self.state = MissionState::Stopped;

                Ok(Some((TickAction::SecondMarkerStop, DriveDems::Stop)))
            }
            (count, state) => {
                warn!(
                    "Unexpected marker (count {}) in the {:?} state, ignoring",
                    count, state
                );
                Ok(None)
            }
        }
    }

    /// Stop and run the recovery search. On failure the drive is left
    /// running the last search command and the controller idles.
    ///
    /// Returns the action, the last command and the time weighted mean
    /// speeds over the search and idle.
    fn recover<S, D>(
        &mut self,
        reflection: f64,
        sensor: &mut S,
        drive: &mut D,
        report: &mut StatusReport,
    ) -> Result<(TickAction, DriveDems, (f64, f64)), LineCtrlError>
    where
        S: ReflectionSource,
        D: DriveActuator,
    {
        warn!("Line lost (reflection {:.2}), starting recovery search", reflection);

        drive.stop()?;

        let mut search = self.search.search(sensor, drive)?;

        let action = if search.found {
            TickAction::LineRecovered
        }
        else {
            warn!(
                "Line not found after {} search ticks, idling for {:.2} s",
                search.num_ticks, self.params.search.idle_s
            );
            thread::sleep(Duration::from_secs_f64(self.params.search.idle_s));
            search.hold(search.last_dems, self.params.search.idle_s);

            TickAction::LineNotRecovered
        };

        report.search = Some(search);

        let speeds = search
            .mean_speeds()
            .unwrap_or_else(|| search.last_dems.resting_speeds());

        Ok((action, search.last_dems, speeds))
    }
}
