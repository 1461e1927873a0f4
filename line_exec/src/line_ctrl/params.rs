//! Line control parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::warn;
use serde::Deserialize;

// Internal
use super::LineCtrlError;
use crate::marker_det;
use line_if::eqpt::{REFLECTION_MAX, REFLECTION_MIN};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for line control
#[derive(Debug, Clone, Deserialize)]
pub struct Params {
    /// Target period of one control tick.
    ///
    /// Units: seconds
    pub cycle_period_s: f64,

    /// Reflection at the edge of the line, the value the controller steers
    /// towards.
    ///
    /// Units: percent, valid range [0, 100]
    pub target_reflection: f64,

    /// Proportional gain from reflection error to differential speed.
    ///
    /// Units: speed units/percent
    pub k_p: f64,

    /// Forward speed of both wheels when on target.
    ///
    /// Units: speed units
    pub base_speed: f64,

    /// Reflections below this mean the sensor is no longer over the track.
    ///
    /// Units: percent, valid range [0, saturation_threshold)
    pub loss_threshold: f64,

    /// Reflections above this mean the sensor is no longer over the track.
    ///
    /// Units: percent, valid range (loss_threshold, 100]
    pub saturation_threshold: f64,

    /// Which wheel speeds are written to the tick log.
    #[serde(default)]
    pub log_speeds: LogSpeeds,

    /// Grey marker detection
    pub marker: marker_det::Params,

    /// Line loss recovery search
    pub search: SearchParams,

    /// Manouvre executed on the first marker
    pub mnvr: MnvrParams,
}

/// Parameters for the line loss recovery search.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchParams {
    /// Speed added to one wheel and removed from the other while searching.
    ///
    /// Units: speed units
    pub bias_speed: f64,

    /// Maximum number of search ticks in each direction.
    pub ticks_per_phase: u32,

    /// Duration of one search tick.
    ///
    /// Units: seconds
    pub tick_period_s: f64,

    /// Half width of the band around the target reflection in which the line
    /// is considered found again (inclusive).
    ///
    /// Units: percent
    pub reacquire_half_band: f64,

    /// Time to wait after an unsuccessful search.
    ///
    /// Units: seconds
    pub idle_s: f64,
}

/// Parameters for the first marker manouvre, a timed differential rotation.
#[derive(Debug, Clone, Deserialize)]
pub struct MnvrParams {
    /// Left wheel speed.
    ///
    /// Units: speed units
    pub left_speed: f64,

    /// Right wheel speed.
    ///
    /// Units: speed units
    pub right_speed: f64,

    /// Rotation of each motor.
    ///
    /// Units: degrees
    pub motor_degrees: f64,

    /// Pause after the rotation completes.
    ///
    /// Units: seconds
    pub pause_s: f64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Selects the wheel speeds recorded in the tick log.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogSpeeds {
    /// The speeds the wheels were left running at by the tick.
    Issued,

    /// The proportional demand, even on ticks where it was never sent.
    Demanded,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for LogSpeeds {
    fn default() -> Self {
        LogSpeeds::Issued
    }
}

impl Params {
    /// Check the parameters are usable.
    ///
    /// Combinations which are legal but probably mistuned, such as a grey
    /// band reaching into the line loss region, are reported as warnings.
    pub fn validate(&self) -> Result<(), LineCtrlError> {
        self.marker.validate()?;

        for &(name, value) in [
            ("target_reflection", self.target_reflection),
            ("loss_threshold", self.loss_threshold),
            ("saturation_threshold", self.saturation_threshold),
        ]
        .iter()
        {
            if !value.is_finite() || value < REFLECTION_MIN || value > REFLECTION_MAX {
                return Err(invalid(
                    name,
                    format!(
                        "{} is outside the sensor range [{}, {}]",
                        value, REFLECTION_MIN, REFLECTION_MAX
                    ),
                ));
            }
        }

        if self.loss_threshold >= self.saturation_threshold {
            return Err(invalid(
                "loss_threshold",
                format!(
                    "{} must be below saturation_threshold ({})",
                    self.loss_threshold, self.saturation_threshold
                ),
            ));
        }

        if !self.cycle_period_s.is_finite() || self.cycle_period_s <= 0.0 {
            return Err(invalid("cycle_period_s", "must be positive".into()));
        }

        for &(name, value) in [
            ("k_p", self.k_p),
            ("base_speed", self.base_speed),
            ("search.bias_speed", self.search.bias_speed),
            ("mnvr.left_speed", self.mnvr.left_speed),
            ("mnvr.right_speed", self.mnvr.right_speed),
        ]
        .iter()
        {
            if !value.is_finite() {
                return Err(invalid(name, "must be a finite number".into()));
            }
        }

        for &(name, value) in [
            ("search.tick_period_s", self.search.tick_period_s),
            ("search.idle_s", self.search.idle_s),
            ("search.reacquire_half_band", self.search.reacquire_half_band),
            ("mnvr.motor_degrees", self.mnvr.motor_degrees),
            ("mnvr.pause_s", self.mnvr.pause_s),
        ]
        .iter()
        {
            if !value.is_finite() || value < 0.0 {
                return Err(invalid(name, "must not be negative".into()));
            }
        }

        if self.search.ticks_per_phase == 0 {
            return Err(invalid(
                "search.ticks_per_phase",
                "at least one tick per phase is required".into(),
            ));
        }

        if self.marker.grey_min < self.loss_threshold
            || self.marker.grey_max > self.saturation_threshold
        {
            warn!(
                "Grey band [{}, {}] overlaps the line loss region (< {} or > {}), marker \
                 detection takes priority",
                self.marker.grey_min,
                self.marker.grey_max,
                self.loss_threshold,
                self.saturation_threshold
            );
        }

        let (lo, hi) = self.reacquire_band();
        if lo < self.loss_threshold || hi > self.saturation_threshold {
            warn!(
                "Reacquire band [{}, {}] reaches into the line loss region",
                lo, hi
            );
        }

        Ok(())
    }

    /// True if the reflection means the sensor is off the track.
    pub fn is_line_lost(&self, reflection: f64) -> bool {
        reflection < self.loss_threshold || reflection > self.saturation_threshold
    }

    /// The band around the target in which a search considers the line found.
    pub fn reacquire_band(&self) -> (f64, f64) {
        (
            self.target_reflection - self.search.reacquire_half_band,
            self.target_reflection + self.search.reacquire_half_band,
        )
    }
}

impl Default for Params {
    fn default() -> Self {
        Self {
            cycle_period_s: 0.05,
            target_reflection: 30.0,
            k_p: 0.5,
            base_speed: 15.0,
            loss_threshold: 5.0,
            saturation_threshold: 90.0,
            log_speeds: LogSpeeds::Issued,
            marker: marker_det::Params::default(),
            search: SearchParams {
                bias_speed: 5.0,
                ticks_per_phase: 10,
                tick_period_s: 0.05,
                reacquire_half_band: 10.0,
                idle_s: 0.2,
            },
            mnvr: MnvrParams {
                left_speed: 20.0,
                right_speed: -20.0,
                motor_degrees: 720.0,
                pause_s: 0.5,
            },
        }
    }
}

fn invalid(name: &'static str, reason: String) -> LineCtrlError {
    LineCtrlError::InvalidParam { name, reason }
}

#[cfg(test)]
mod test {
    use super::*;

    const LINE_CTRL_TOML: &str = r#"
        cycle_period_s = 0.05
        target_reflection = 30.0
        k_p = 0.5
        base_speed = 15.0
        loss_threshold = 5.0
        saturation_threshold = 90.0
        log_speeds = "demanded"

        [marker]
        grey_min = 28.0
        grey_max = 38.0
        streak_required = 3

        [search]
        bias_speed = 5.0
        ticks_per_phase = 10
        tick_period_s = 0.05
        reacquire_half_band = 10.0
        idle_s = 0.2

        [mnvr]
        left_speed = 20.0
        right_speed = -20.0
        motor_degrees = 720.0
        pause_s = 0.5
    "#;

    #[test]
    fn test_parse_params() {
        let p: Params = util::params::parse(LINE_CTRL_TOML).unwrap();

        assert!(p.validate().is_ok());
        assert_eq!(p.log_speeds, LogSpeeds::Demanded);
        assert_eq!(p.marker.streak_required, 3);
        assert_eq!(p.search.ticks_per_phase, 10);
        assert_eq!(p.mnvr.motor_degrees, 720.0);
    }

    #[test]
    fn test_log_speeds_defaults_to_issued() {
        let toml = LINE_CTRL_TOML.replace("log_speeds = \"demanded\"", "");
        let p: Params = util::params::parse(&toml).unwrap();

        assert_eq!(p.log_speeds, LogSpeeds::Issued);
    }

    #[test]
    fn test_validate_thresholds() {
        let mut p = Params::default();
        p.loss_threshold = 95.0;
        assert!(matches!(
            p.validate(),
            Err(LineCtrlError::InvalidParam { name: "loss_threshold", .. })
        ));

        let mut p = Params::default();
        p.target_reflection = -1.0;
        assert!(matches!(
            p.validate(),
            Err(LineCtrlError::InvalidParam { name: "target_reflection", .. })
        ));

        let mut p = Params::default();
        p.search.ticks_per_phase = 0;
        assert!(p.validate().is_err());

        let mut p = Params::default();
        p.marker.grey_min = 50.0;
        assert!(matches!(p.validate(), Err(LineCtrlError::MarkerDetError(_))));
    }

    #[test]
    fn test_overlapping_grey_band_is_allowed() {
        let mut p = Params::default();
        p.marker.grey_min = 2.0;
        p.marker.grey_max = 8.0;

        assert!(p.validate().is_ok());
    }

    #[test]
    fn test_line_lost() {
        let p = Params::default();

        assert!(p.is_line_lost(2.0));
        assert!(p.is_line_lost(95.0));
        assert!(!p.is_line_lost(5.0));
        assert!(!p.is_line_lost(90.0));
        assert!(!p.is_line_lost(50.0));
        assert_eq!(p.reacquire_band(), (20.0, 40.0));
    }
}
