//! # Trajectory reconstruction module
//!
//! Reconstructs the path driven by the robot from its tick log by dead
//! reckoning. Each record's wheel speeds are integrated over the time since
//! the previous record using the differential drive model:
//!
//! ```text
//! v     = (v_left + v_right) / 2
//! omega = (v_right - v_left) / wheel_base
//! ```
//!
//! The heading is updated before the position (forward Euler). The first pose
//! is always the origin, heading along the X axis, so the result is relative
//! to wherever the robot started.
//!
//! Poses where the logged marker count increases are reported as marker
//! points.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::debug;
use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

use line_if::tick_log::LogRecord;
pub use params::Params;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A 2D pose relative to the start of the run.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pose2 {
    /// Units: centimeters
    pub position_cm: Vector2<f64>,

    /// Units: radians, anticlockwise from the X axis. Not wrapped.
    pub heading_rad: f64,
}

/// A point where a marker was accepted.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerPoint {
    /// Index of the record (and pose) the count increased at.
    pub index: usize,

    /// The new marker count.
    pub marker_count: u32,

    /// Units: seconds
    pub timestamp_s: f64,

    pub pose: Pose2,
}

/// A reconstructed trajectory, one pose per log record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Trajectory {
    pub poses: Vec<Pose2>,
    pub markers: Vec<MarkerPoint>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ReconError {
    #[error("Could not load parameters: {0}")]
    ParamLoadError(util::params::LoadError),

    #[error("Parameter `{name}` is invalid: {reason}")]
    InvalidParam {
        name: &'static str,
        reason: String,
    },

    /// Records must be in time order. `record` is the 1-based position of
    /// the offending record, blank lines in the log are not counted.
    #[error("Record {record}: timestamp {timestamp_s:.2} s is earlier than the previous record")]
    TimeReversed { record: usize, timestamp_s: f64 },
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Pose2 {
    pub fn origin() -> Self {
        Self {
            position_cm: Vector2::zeros(),
            heading_rad: 0.0,
        }
    }
}

impl Trajectory {
    pub fn start(&self) -> Option<&Pose2> {
        self.poses.first()
    }

    pub fn end(&self) -> Option<&Pose2> {
        self.poses.last()
    }

    /// Total distance travelled by the axle centre.
    ///
    /// Units: centimeters
    pub fn path_length_cm(&self) -> f64 {
        self.poses
            .windows(2)
            .map(|w| (w[1].position_cm - w[0].position_cm).norm())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.poses.is_empty()
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Reconstruct the trajectory driven during a logged run.
///
/// An empty log gives an empty trajectory and a single record gives only the
/// origin. The result depends only on the records and parameters.
pub fn reconstruct(records: &[LogRecord], params: &Params) -> Result<Trajectory, ReconError> {
    params.validate()?;

    let mut traj = Trajectory::default();

    let first = match records.first() {
        Some(r) => r,
        None => return Ok(traj),
    };

    let mut pose = Pose2::origin();
    traj.poses.push(pose);

    // A log can start with markers already counted, only increases are points
    let mut prev = first;

    for (i, record) in records.iter().enumerate().skip(1) {
        let dt_s = record.timestamp_s - prev.timestamp_s;
        if dt_s < 0.0 {
            return Err(ReconError::TimeReversed {
                record: i + 1,
                timestamp_s: record.timestamp_s,
            });
        }

        let v_l = record.left_speed * params.speed_scale_cms;
        let v_r = record.right_speed * params.speed_scale_cms;
        let v = 0.5 * (v_l + v_r);
        let omega = (v_r - v_l) / params.wheel_base_cm;

        pose.heading_rad += omega * dt_s;
        pose.position_cm +=
            v * dt_s * Vector2::new(pose.heading_rad.cos(), pose.heading_rad.sin());

        traj.poses.push(pose);

        if record.marker_count > prev.marker_count {
            traj.markers.push(MarkerPoint {
                index: i,
                marker_count: record.marker_count,
                timestamp_s: record.timestamp_s,
                pose,
            });
        }

        prev = record;
    }

    debug!(
        "Reconstructed {} poses with {} marker points",
        traj.poses.len(),
        traj.markers.len()
    );

    Ok(traj)
}

#[cfg(test)]
mod test {
    use super::*;
    use std::f64::consts::PI;

    fn rec(t: f64, l: f64, r: f64, c: u32) -> LogRecord {
        LogRecord {
            timestamp_s: t,
            reflection: 30.0,
            left_speed: l,
            right_speed: r,
            marker_count: c,
        }
    }

    #[test]
    fn test_empty_and_single() {
        let p = Params::default();

        let traj = reconstruct(&[], &p).unwrap();
        assert!(traj.is_empty());
        assert!(traj.start().is_none());

        let traj = reconstruct(&[rec(3.0, 15.0, 15.0, 1)], &p).unwrap();
        assert_eq!(traj.poses, vec![Pose2::origin()]);
        assert!(traj.markers.is_empty());
    }

    #[test]
    fn test_straight_line() {
        let p = Params::default();
        let records: Vec<LogRecord> = (0..11).map(|i| rec(i as f64 * 0.5, 10.0, 10.0, 0)).collect();

        let traj = reconstruct(&records, &p).unwrap();

        assert_eq!(traj.poses.len(), 11);
        for pose in traj.poses.iter() {
            assert_eq!(pose.heading_rad, 0.0);
            assert_eq!(pose.position_cm.y, 0.0);
        }

        // 10 units * 0.2 cm/s for 5 s
        let end = traj.end().unwrap();
        assert!((end.position_cm.x - 10.0).abs() < 1e-9);
        assert!((traj.path_length_cm() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_heading_updated_before_position() {
        let p = Params::default();

        // Quarter turn in a single step
        let omega = PI / 2.0;
        let v = 1.0;
        let v_l = (v - omega * p.wheel_base_cm / 2.0) / p.speed_scale_cms;
        let v_r = (v + omega * p.wheel_base_cm / 2.0) / p.speed_scale_cms;

        let traj = reconstruct(&[rec(0.0, 0.0, 0.0, 0), rec(1.0, v_l, v_r, 0)], &p).unwrap();
        let end = traj.end().unwrap();

        assert!((end.heading_rad - PI / 2.0).abs() < 1e-9);
        assert!(end.position_cm.x.abs() < 1e-9);
        assert!((end.position_cm.y - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_first_record_speeds_unused() {
        let p = Params::default();

        let a = reconstruct(&[rec(0.0, 0.0, 0.0, 0), rec(1.0, 5.0, 5.0, 0)], &p).unwrap();
        let b = reconstruct(&[rec(0.0, 99.0, -99.0, 0), rec(1.0, 5.0, 5.0, 0)], &p).unwrap();

        assert_eq!(a, b);
    }

    #[test]
    fn test_marker_points() {
        let p = Params::default();
        let records = vec![
            rec(0.0, 15.0, 15.0, 0),
            rec(0.05, 15.0, 15.0, 0),
            rec(0.10, 0.0, 0.0, 1),
            rec(0.15, 15.0, 15.0, 1),
            rec(0.20, 15.0, 15.0, 1),
            rec(0.25, 0.0, 0.0, 2),
        ];

        let traj = reconstruct(&records, &p).unwrap();

        let indices: Vec<(usize, u32)> =
            traj.markers.iter().map(|m| (m.index, m.marker_count)).collect();
        assert_eq!(indices, vec![(2, 1), (5, 2)]);
        assert_eq!(traj.markers[1].pose, traj.poses[5]);
        assert_eq!(traj.markers[0].timestamp_s, 0.10);
    }

    #[test]
    fn test_deterministic() {
        let p = Params::default();
        let records: Vec<LogRecord> = (0..200)
            .map(|i| {
                let t = i as f64 * 0.05;
                rec(t, 15.0 + 5.0 * (t * 3.0).sin(), 15.0 - 5.0 * (t * 3.0).sin(), i / 80)
            })
            .collect();

        let a = reconstruct(&records, &p).unwrap();
        let b = reconstruct(&records, &p).unwrap();

        assert_eq!(a, b);
        assert_eq!(a.markers.len(), 2);
    }

    #[test]
    fn test_time_reversal_rejected() {
        let p = Params::default();
        let records = vec![rec(0.0, 1.0, 1.0, 0), rec(0.1, 1.0, 1.0, 0), rec(0.05, 1.0, 1.0, 0)];

        assert!(matches!(
            reconstruct(&records, &p),
            Err(ReconError::TimeReversed { record: 3, .. })
        ));
    }

    #[test]
    fn test_time_reversal_counts_records_not_lines() {
        let log = "0.00,30.00,1.00,1.00,0.00\n\n0.10,30.00,1.00,1.00,0.00\n0.05,30.00,1.00,1.00,0.00\n";
        let records = line_if::tick_log::parse_log(log).unwrap();

        assert!(matches!(
            reconstruct(&records, &Params::default()),
            Err(ReconError::TimeReversed { record: 3, .. })
        ));
    }

    #[test]
    fn test_invalid_params() {
        let p = Params {
            wheel_base_cm: 0.0,
            speed_scale_cms: 0.2,
        };

        assert!(matches!(
            reconstruct(&[], &p),
            Err(ReconError::InvalidParam { name: "wheel_base_cm", .. })
        ));
    }
}
