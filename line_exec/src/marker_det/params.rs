//! Parameters structure for MarkerDet

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use line_if::eqpt::{REFLECTION_MAX, REFLECTION_MIN};
use serde::Deserialize;

use super::MarkerDetError;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for grey marker detection.
#[derive(Debug, Clone, Deserialize)]
pub struct Params {
    /// Lowest reflection still considered to be on a marker (inclusive).
    ///
    /// Units: percent, valid range [0, 100]
    pub grey_min: f64,

    /// Highest reflection still considered to be on a marker (inclusive).
    ///
    /// Units: percent, valid range [grey_min, 100]
    pub grey_max: f64,

    /// Number of consecutive on marker samples needed to accept a crossing.
    ///
    /// Valid range: 1 or more
    pub streak_required: u32,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Params {
    /// Check the parameters are usable.
    pub fn validate(&self) -> Result<(), MarkerDetError> {
        for &(name, value) in [("grey_min", self.grey_min), ("grey_max", self.grey_max)].iter() {
            if !value.is_finite() || value < REFLECTION_MIN || value > REFLECTION_MAX {
                return Err(MarkerDetError::InvalidParam {
                    name,
                    reason: format!(
                        "{} is outside the sensor range [{}, {}]",
                        value, REFLECTION_MIN, REFLECTION_MAX
                    ),
                });
            }
        }

        if self.grey_min > self.grey_max {
            return Err(MarkerDetError::InvalidParam {
                name: "grey_min",
                reason: format!(
                    "{} is greater than grey_max ({})",
                    self.grey_min, self.grey_max
                ),
            });
        }

        if self.streak_required == 0 {
            return Err(MarkerDetError::InvalidParam {
                name: "streak_required",
                reason: "at least one sample is needed to accept a marker".into(),
            });
        }

        Ok(())
    }

    /// The grey band as an inclusive `(min, max)` pair.
    pub fn grey_band(&self) -> (f64, f64) {
        (self.grey_min, self.grey_max)
    }
}

impl Default for Params {
    fn default() -> Self {
        Self {
            grey_min: 28.0,
            grey_max: 38.0,
            streak_required: 3,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(Params::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_band() {
        let p = Params {
            grey_min: 40.0,
            grey_max: 30.0,
            ..Params::default()
        };
        assert!(matches!(
            p.validate(),
            Err(MarkerDetError::InvalidParam { name: "grey_min", .. })
        ));

        let p = Params {
            grey_max: 120.0,
            ..Params::default()
        };
        assert!(matches!(
            p.validate(),
            Err(MarkerDetError::InvalidParam { name: "grey_max", .. })
        ));
    }

    #[test]
    fn test_validate_rejects_zero_streak() {
        let p = Params {
            streak_required: 0,
            ..Params::default()
        };
        assert!(p.validate().is_err());
    }
}
