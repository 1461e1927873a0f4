//! Trajectory reconstruction parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use super::ReconError;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for trajectory reconstruction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Params {
    /// Distance between the wheel contact points.
    ///
    /// Units: centimeters
    pub wheel_base_cm: f64,

    /// Wheel surface speed per logged speed unit.
    ///
    /// Units: (centimeters/second)/speed unit
    pub speed_scale_cms: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Params {
    pub fn validate(&self) -> Result<(), ReconError> {
        for &(name, value) in [
            ("wheel_base_cm", self.wheel_base_cm),
            ("speed_scale_cms", self.speed_scale_cms),
        ]
        .iter()
        {
            if !value.is_finite() || value <= 0.0 {
                return Err(ReconError::InvalidParam {
                    name,
                    reason: format!("{} must be positive", value),
                });
            }
        }

        Ok(())
    }
}

impl Default for Params {
    fn default() -> Self {
        Self {
            wheel_base_cm: 5.6,
            speed_scale_cms: 0.2,
        }
    }
}
