//! # Simulation
//!
//! Stand-ins for the light sensor and drive motors so line control can run without the robot.
//!
//! - [`SimRig`] - a kinematic two wheeled robot driving on a circular track with grey marker
//!   stripes. It implements both [`ReflectionSource`](line_if::eqpt::ReflectionSource) and
//!   [`DriveActuator`](line_if::eqpt::DriveActuator), clones share the same world, so one clone
//!   can be given to line control as the sensor and another as the drive.
//! - [`ScriptedSensor`] and [`RecordingDrive`] - replay a fixed sequence of reflections and record
//!   every command issued, used by the tests and for replaying recorded runs.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod params;
mod rig;
mod scripted;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

pub use params::Params;
pub use rig::*;
pub use scripted::*;

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum SimError {
    #[error("Could not load parameters: {0}")]
    ParamLoadError(util::params::LoadError),

    #[error("Parameter `{name}` is invalid: {reason}")]
    InvalidParam {
        name: &'static str,
        reason: String,
    },

    #[error("Could not read the replay file: {0}")]
    ReplayLoadError(std::io::Error),

    #[error("Could not parse the replay file: {0}")]
    ReplayLogError(line_if::tick_log::LogParseError),

    #[error("Line {line} of the replay file is not a reflection value (\"{raw}\")")]
    ReplayValueError { line: usize, raw: String },
}
