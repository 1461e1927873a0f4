//! # Drive motor interface

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use super::EqptError;

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Demands that can be sent to the two drive motors.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub enum DriveDems {
    /// Run each wheel continuously at the given speed.
    ///
    /// Units: device speed units (percent of maximum motor speed), positive is forwards.
    Speeds {
        left: f64,
        right: f64,
    },

    /// Run each wheel at the given speed until the motors have turned through `degrees`, then
    /// brake. Blocks until the rotation is complete.
    Rotate {
        left: f64,
        right: f64,
        degrees: f64,
    },

    /// Bring both wheels to rest.
    Stop,
}

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// Differential drive with an independent left and right wheel.
pub trait DriveActuator {
    /// Run the wheels continuously at the given speeds.
    fn set_speeds(&mut self, left: f64, right: f64) -> Result<(), EqptError>;

    /// Stop both wheels.
    fn stop(&mut self) -> Result<(), EqptError>;

    /// Rotate both wheels through `degrees` of motor rotation at the given speeds, blocking until
    /// complete.
    fn rotate_for(&mut self, left: f64, right: f64, degrees: f64) -> Result<(), EqptError>;

    /// Execute a [`DriveDems`].
    fn apply(&mut self, dems: DriveDems) -> Result<(), EqptError> {
        match dems {
            DriveDems::Speeds { left, right } => self.set_speeds(left, right),
            DriveDems::Rotate {
                left,
                right,
                degrees,
            } => self.rotate_for(left, right, degrees),
            DriveDems::Stop => self.stop(),
        }
    }
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl DriveDems {
    /// The wheel speeds the drive is left running at once this demand has been executed.
    ///
    /// Timed rotations brake on completion so leave the wheels at rest.
    pub fn resting_speeds(&self) -> (f64, f64) {
        match self {
            DriveDems::Speeds { left, right } => (*left, *right),
            DriveDems::Rotate { .. } | DriveDems::Stop => (0.0, 0.0),
        }
    }
}

impl Default for DriveDems {
    fn default() -> Self {
        DriveDems::Stop
    }
}
