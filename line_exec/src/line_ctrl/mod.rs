//! # Line control module
//!
//! Line control keeps the robot's light sensor over the edge of the line. The
//! reflection under the sensor rises as the sensor drifts onto the white
//! background and falls as it drifts onto the black line, so the error between
//! a target reflection and the measured one is a usable proxy for the lateral
//! error. A purely proportional controller turns this error into a
//! differential speed about a fixed base speed.
//!
//! Each tick is also fed to the grey marker detector. Markers drive the
//! mission:
//!
//! ```text
//! Following --(1st marker, spin)--> FirstMarkerHandled --(2nd marker)--> Stopped
//! ```
//!
//! If the reflection leaves the plausible range (too dark or saturated) the
//! line is considered lost and a bounded recovery search is run, see
//! [`RecoverySearch`].
//!
//! `LineCtrl::proc` executes a single tick, `run_mission` owns the tick
//! cadence, cancellation and the stop and flush on the way out.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod mission;
mod params;
mod search;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use mission::*;
pub use params::*;
pub use search::*;
pub use state::*;

use crate::marker_det::MarkerDetError;
use line_if::eqpt::EqptError;
use util::params::LoadError;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during LineCtrl processing.
#[derive(Debug, thiserror::Error)]
pub enum LineCtrlError {
    #[error("Could not load parameters: {0}")]
    ParamLoadError(LoadError),

    #[error("Parameter `{name}` is invalid: {reason}")]
    InvalidParam {
        name: &'static str,
        reason: String,
    },

    #[error("Marker detector error: {0}")]
    MarkerDetError(#[from] MarkerDetError),

    /// A sensor read or a drive command failed. Equipment faults are not
    /// recovered from.
    #[error("Equipment fault: {0}")]
    EqptError(#[from] EqptError),

    /// `proc` was called after the mission had already stopped.
    #[error("The mission has already stopped")]
    MissionStopped,
}

/// The mission state machine. Transitions only move forward and `Stopped` is
/// terminal.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MissionState {
    /// Following the line, waiting for the first marker.
    Following,

    /// The first marker manouvre is complete, waiting for the second marker.
    FirstMarkerHandled,

    /// The second marker was seen, the mission is complete.
    Stopped,
}
