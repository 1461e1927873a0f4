//! # Equipment interfaces
//!
//! The drivers behind these traits are owned by the platform, the controller
//! only ever talks to them through [`ReflectionSource`] and [`DriveActuator`].

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

pub mod drive;
pub mod light;

// ------------------------------------------------------------------------------------------------
// EXPORTS
// ------------------------------------------------------------------------------------------------

pub use drive::{DriveActuator, DriveDems};
pub use light::{ReflectionSource, REFLECTION_MAX, REFLECTION_MIN};

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Errors raised by equipment drivers.
///
/// These are not recovered by the controller, they propagate out of the control loop.
#[derive(Debug, thiserror::Error)]
pub enum EqptError {
    #[error("Could not read the reflected light sensor: {0}")]
    SensorReadFailure(String),

    #[error("Could not command the drive motors: {0}")]
    ActuatorCommandFailure(String),
}
