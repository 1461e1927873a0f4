//! Line loss recovery search

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info};
use std::thread;
use std::time::Duration;

// Internal
use super::SearchParams;
use line_if::eqpt::{DriveActuator, DriveDems, EqptError, ReflectionSource};
use util::maths::is_within;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Bounded two phase search for a lost line.
///
/// The robot first sweeps one way by biasing the wheel speeds about the base
/// speed, then sweeps the other way with the opposite bias. After every search
/// tick the sensor is read and the search ends as soon as the reflection is
/// back inside the reacquire band. At most `2 * ticks_per_phase` ticks are
/// executed, so a search always terminates.
#[derive(Debug, Clone)]
pub struct RecoverySearch {
    params: SearchParams,

    /// Forward speed the bias is applied about.
    base_speed: f64,

    /// Inclusive reflection band in which the line is considered found.
    band: (f64, f64),
}

/// Outcome of a single search.
#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct SearchReport {
    /// True if the line was found again.
    pub found: bool,

    /// Number of search ticks executed.
    pub num_ticks: u32,

    /// The phase the line was found in, `None` if it wasn't found.
    pub found_in: Option<SearchPhase>,

    /// The last reflection read by the search.
    pub last_reflection: Option<f64>,

    /// The last command sent to the drive. The drive is left running this
    /// command when the search returns.
    pub last_dems: DriveDems,

    /// Sum of each commanded (left, right) speed multiplied by the nominal
    /// time it was held for.
    ///
    /// Units: speed units * seconds
    pub speed_time: (f64, f64),

    /// Total nominal time the commands were held for.
    ///
    /// Units: seconds
    pub held_s: f64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SearchPhase {
    /// Left wheel slowed, right wheel sped up.
    First,

    /// Left wheel sped up, right wheel slowed.
    Second,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SearchReport {
    /// Record that `dems` were held for `duration_s`.
    pub fn hold(&mut self, dems: DriveDems, duration_s: f64) {
        let (left, right) = dems.resting_speeds();

        self.speed_time.0 += left * duration_s;
        self.speed_time.1 += right * duration_s;
        self.held_s += duration_s;
    }

    /// Time weighted mean of the (left, right) speeds commanded during the
    /// search, or `None` if no time was spent holding any command.
    pub fn mean_speeds(&self) -> Option<(f64, f64)> {
        if self.held_s > 0.0 {
            Some((self.speed_time.0 / self.held_s, self.speed_time.1 / self.held_s))
        }
        else {
            None
        }
    }
}

impl RecoverySearch {
    pub fn new(params: SearchParams, base_speed: f64, target_reflection: f64) -> Self {
        let band = (
            target_reflection - params.reacquire_half_band,
            target_reflection + params.reacquire_half_band,
        );

        Self {
            params,
            base_speed,
            band,
        }
    }

    /// Run the search, blocking until the line is found or both phases are
    /// exhausted.
    ///
    /// Equipment faults abort the search immediately.
    pub fn search<S, D>(&self, sensor: &mut S, drive: &mut D) -> Result<SearchReport, EqptError>
    where
        S: ReflectionSource,
        D: DriveActuator,
    {
        let mut report = SearchReport::default();

        for &phase in [SearchPhase::First, SearchPhase::Second].iter() {
            let dems = self.phase_dems(phase);

            debug!("Recovery search {:?} phase, commanding {:?}", phase, dems);

            for _ in 0..self.params.ticks_per_phase {
                drive.apply(dems)?;
                report.last_dems = dems;

                thread::sleep(Duration::from_secs_f64(self.params.tick_period_s));
                report.hold(dems, self.params.tick_period_s);

                let reflection = sensor.read_reflection()?;
                report.num_ticks += 1;
                report.last_reflection = Some(reflection);

                if is_within(reflection, self.band) {
                    info!(
                        "Line reacquired in the {:?} search phase after {} ticks (reflection {:.2})",
                        phase, report.num_ticks, reflection
                    );

                    report.found = true;
                    report.found_in = Some(phase);
                    return Ok(report);
                }
            }
        }

        Ok(report)
    }

    /// The demand used throughout the given phase.
    pub fn phase_dems(&self, phase: SearchPhase) -> DriveDems {
        let bias = match phase {
            SearchPhase::First => self.params.bias_speed,
            SearchPhase::Second => -self.params.bias_speed,
        };

        DriveDems::Speeds {
            left: self.base_speed - bias,
            right: self.base_speed + bias,
        }
    }

    /// Maximum number of ticks a single search can take.
    pub fn max_ticks(&self) -> u32 {
        self.params.ticks_per_phase.saturating_mul(2)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::sim::{RecordingDrive, ScriptedSensor};

    fn search() -> RecoverySearch {
        RecoverySearch::new(
            SearchParams {
                bias_speed: 5.0,
                ticks_per_phase: 10,
                tick_period_s: 0.0,
                reacquire_half_band: 10.0,
                idle_s: 0.0,
            },
            15.0,
            30.0,
        )
    }

    #[test]
    fn test_found_in_first_phase() {
        let s = search();
        let mut sensor = ScriptedSensor::new(vec![2.0, 2.0, 25.0]);
        let mut drive = RecordingDrive::default();

        let report = s.search(&mut sensor, &mut drive).unwrap();

        assert!(report.found);
        assert_eq!(report.num_ticks, 3);
        assert_eq!(report.found_in, Some(SearchPhase::First));
        assert_eq!(report.last_dems, DriveDems::Speeds { left: 10.0, right: 20.0 });
        assert_eq!(drive.dems.len(), 3);
    }

    #[test]
    fn test_found_in_second_phase() {
        let s = search();
        let mut samples = vec![95.0; 12];
        samples.push(40.0);
        let mut sensor = ScriptedSensor::new(samples);
        let mut drive = RecordingDrive::default();

        let report = s.search(&mut sensor, &mut drive).unwrap();

        assert!(report.found);
        assert_eq!(report.num_ticks, 13);
        assert_eq!(report.found_in, Some(SearchPhase::Second));
        assert_eq!(report.last_dems, DriveDems::Speeds { left: 20.0, right: 10.0 });
    }

    #[test]
    fn test_search_is_bounded() {
        let s = search();
        let mut sensor = ScriptedSensor::new(vec![1.0; 100]);
        let mut drive = RecordingDrive::default();

        let report = s.search(&mut sensor, &mut drive).unwrap();

        assert!(!report.found);
        assert_eq!(report.num_ticks, s.max_ticks());
        assert_eq!(report.num_ticks, 20);
        assert_eq!(sensor.remaining(), 80);
        assert_eq!(report.found_in, None);

        // Ten ticks each way
        let first = DriveDems::Speeds { left: 10.0, right: 20.0 };
        let second = DriveDems::Speeds { left: 20.0, right: 10.0 };
        assert!(drive.dems[..10].iter().all(|d| *d == first));
        assert!(drive.dems[10..].iter().all(|d| *d == second));
    }

    #[test]
    fn test_failed_search_mean_speeds() {
        let mut p = search().params;
        p.tick_period_s = 0.001;
        let s = RecoverySearch::new(p, 15.0, 30.0);
        let mut sensor = ScriptedSensor::new(vec![1.0; 20]);
        let mut drive = RecordingDrive::default();

        let report = s.search(&mut sensor, &mut drive).unwrap();
        let (left, right) = report.mean_speeds().unwrap();

        // The two phases cancel out
        assert!((report.held_s - 0.02).abs() < 1e-12);
        assert!((left - 15.0).abs() < 1e-9);
        assert!((right - 15.0).abs() < 1e-9);
    }

    #[test]
    fn test_no_hold_time_has_no_mean() {
        let s = search();
        let mut sensor = ScriptedSensor::new(vec![25.0]);
        let mut drive = RecordingDrive::default();

        let report = s.search(&mut sensor, &mut drive).unwrap();

        assert_eq!(report.held_s, 0.0);
        assert_eq!(report.mean_speeds(), None);
    }

    #[test]
    fn test_band_is_inclusive() {
        let s = search();

        for &edge in [20.0, 40.0].iter() {
            let mut sensor = ScriptedSensor::new(vec![edge]);
            let mut drive = RecordingDrive::default();

            let report = s.search(&mut sensor, &mut drive).unwrap();
            assert!(report.found);
            assert_eq!(report.num_ticks, 1);
        }
    }

    #[test]
    fn test_sensor_fault_aborts_search() {
        let s = search();
        let mut sensor = ScriptedSensor::new(vec![1.0, 1.0]);
        let mut drive = RecordingDrive::default();

        assert!(s.search(&mut sensor, &mut drive).is_err());
        assert_eq!(drive.dems.len(), 3);
    }
}
