//! Kinematic simulation rig

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::f64::consts::PI;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use log::trace;
use nalgebra::Vector2;
use noise::{NoiseFn, Perlin};

use super::{Params, SimError};
use line_if::eqpt::{DriveActuator, EqptError, ReflectionSource, REFLECTION_MAX, REFLECTION_MIN};
use util::maths::{clamp, rem_euclid};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// The simulated world, stepped explicitly.
pub struct SimWorld {
    params: Params,

    /// Mat texture
    perlin: Perlin,

    /// Position of the centre of the wheel axle.
    ///
    /// Units: centimeters
    pub position_cm: Vector2<f64>,

    /// Units: radians, anticlockwise from the positive X axis
    pub heading_rad: f64,

    /// Commanded (left, right) wheel speeds.
    ///
    /// Units: speed units
    speeds: (f64, f64),

    /// Total simulated time.
    ///
    /// Units: seconds
    pub sim_time_s: f64,
}

/// The simulated world advanced in real time, shared between the sensor and drive handles.
#[derive(Clone)]
pub struct SimRig {
    state: Arc<Mutex<RigState>>,
}

struct RigState {
    world: SimWorld,
    last_update: Instant,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl SimWorld {
    /// Create a new world with the robot at the start position, stationary.
    pub fn new(params: Params) -> Result<Self, SimError> {
        params.validate()?;

        // Sensor on the outer edge of the line, axle behind it
        let position_cm = Vector2::new(-params.sensor_offset_cm, -params.line_width_cm / 2.0);

        Ok(Self {
            params,
            perlin: Perlin::new(),
            position_cm,
            heading_rad: 0.0,
            speeds: (0.0, 0.0),
            sim_time_s: 0.0,
        })
    }

    pub fn set_speeds(&mut self, left: f64, right: f64) {
        self.speeds = (left, right);
    }

    pub fn speeds(&self) -> (f64, f64) {
        self.speeds
    }

    pub fn set_pose(&mut self, position_cm: Vector2<f64>, heading_rad: f64) {
        self.position_cm = position_cm;
        self.heading_rad = heading_rad;
    }

    /// Drive at the current speeds for `dt_s` seconds.
    pub fn advance(&mut self, dt_s: f64) {
        if dt_s <= 0.0 {
            return;
        }

        let dist_l = self.speeds.0 * self.params.speed_scale_cms * dt_s;
        let dist_r = self.speeds.1 * self.params.speed_scale_cms * dt_s;

        self.move_wheels(dist_l, dist_r);
        self.sim_time_s += dt_s;
    }

    /// Turn each motor through `degrees` at the given speeds then brake.
    ///
    /// The wheels travel in the direction of their commanded speed, a wheel with zero speed doesn't
    /// move. Returns the duration of the rotation.
    pub fn rotate_wheels(&mut self, left: f64, right: f64, degrees: f64) -> f64 {
        let travel = degrees.abs() / 360.0 * PI * self.params.wheel_diameter_cm;

        let direction = |speed: f64| if speed == 0.0 { 0.0 } else { speed.signum() };

        self.move_wheels(travel * direction(left), travel * direction(right));

        // The slowest moving wheel sets the duration
        let slowest = [left.abs(), right.abs()]
            .iter()
            .cloned()
            .filter(|s| *s > 0.0)
            .fold(f64::INFINITY, f64::min);
        let duration_s = if slowest.is_finite() {
            travel / (slowest * self.params.speed_scale_cms)
        }
        else {
            0.0
        };

        self.sim_time_s += duration_s;
        self.speeds = (0.0, 0.0);

        duration_s
    }

    /// Position of the light sensor.
    pub fn sensor_position(&self) -> Vector2<f64> {
        self.position_cm
            + self.params.sensor_offset_cm
                * Vector2::new(self.heading_rad.cos(), self.heading_rad.sin())
    }

    /// The reading the light sensor would give at its current position.
    pub fn reflection(&self) -> f64 {
        self.reflection_at(self.sensor_position())
    }

    /// The reading the light sensor would give at the given point.
    pub fn reflection_at(&self, point: Vector2<f64>) -> f64 {
        let p = &self.params;
        let centre = self.track_centre();

        // Signed distance from the track centreline, positive outside the circle
        let dist_cm = (point - centre).norm() - p.track_radius_cm;

        if dist_cm.abs() > p.mat_half_width_cm {
            return p.off_mat_reflection;
        }

        let clean = if dist_cm.abs() <= p.line_width_cm && self.on_marker_stripe(point) {
            p.grey_reflection
        }
        else {
            // Distance outside the line, negative when over it
            let outside_cm = dist_cm.abs() - p.line_width_cm / 2.0;
            let white_frac = if p.edge_blur_cm > 0.0 {
                clamp((outside_cm + p.edge_blur_cm / 2.0) / p.edge_blur_cm, 0.0, 1.0)
            }
            else if outside_cm > 0.0 {
                1.0
            }
            else {
                0.0
            };

            p.black_reflection + (p.white_reflection - p.black_reflection) * white_frac
        };

        let texture = p.noise_amplitude
            * self.perlin.get([
                point.x * p.noise_scale_per_cm,
                point.y * p.noise_scale_per_cm,
            ]);

        clamp(clean + texture, REFLECTION_MIN, REFLECTION_MAX)
    }

    /// Angle travelled around the track from the start position to the given point.
    ///
    /// Units: degrees, in [0, 360)
    pub fn track_angle_deg(&self, point: Vector2<f64>) -> f64 {
        let rel = point - self.track_centre();

        rem_euclid(rel.y.atan2(rel.x) + PI / 2.0, 2.0 * PI).to_degrees()
    }

    fn track_centre(&self) -> Vector2<f64> {
        Vector2::new(0.0, self.params.track_radius_cm)
    }

    fn on_marker_stripe(&self, point: Vector2<f64>) -> bool {
        let angle_deg = self.track_angle_deg(point);

        self.params.marker_angles_deg.iter().any(|m| {
            let diff_deg = rem_euclid(angle_deg - m + 180.0, 360.0) - 180.0;
            diff_deg.abs().to_radians() * self.params.track_radius_cm
                <= self.params.marker_width_cm / 2.0
        })
    }

    /// Move the robot given the distance travelled by each wheel, integrating along the arc.
    fn move_wheels(&mut self, dist_l: f64, dist_r: f64) {
        let dist = 0.5 * (dist_l + dist_r);
        let delta_head = (dist_r - dist_l) / self.params.wheel_base_cm;

        // Case: no rotation, straight line
        if delta_head.abs() < f64::EPSILON {
            self.position_cm +=
                dist * Vector2::new(self.heading_rad.cos(), self.heading_rad.sin());
        }
        else {
            let radius = dist / delta_head;
            let end_head = self.heading_rad + delta_head;

            self.position_cm += radius
                * Vector2::new(
                    end_head.sin() - self.heading_rad.sin(),
                    self.heading_rad.cos() - end_head.cos(),
                );
            self.heading_rad = end_head;
        }
    }
}

impl SimRig {
    /// Initialise the rig from a parameter file, relative to the params
    /// directory.
    pub fn init(params_path: &str) -> Result<Self, SimError> {
        let params: Params =
            util::params::load(params_path).map_err(SimError::ParamLoadError)?;

        Self::new(params)
    }

    pub fn new(params: Params) -> Result<Self, SimError> {
        Ok(Self {
            state: Arc::new(Mutex::new(RigState {
                world: SimWorld::new(params)?,
                last_update: Instant::now(),
            })),
        })
    }

    /// Current (position, heading) of the robot.
    pub fn pose(&self) -> Result<(Vector2<f64>, f64), EqptError> {
        self.with_world(EqptError::SensorReadFailure, |w| (w.position_cm, w.heading_rad))
    }

    /// Advance the world to now then run `f` on it.
    fn with_world<T, E, F>(&self, err: E, f: F) -> Result<T, EqptError>
    where
        E: FnOnce(String) -> EqptError,
        F: FnOnce(&mut SimWorld) -> T,
    {
        let mut state = self
            .state
            .lock()
            .map_err(|_| err("the simulation state lock is poisoned".into()))?;

        let now = Instant::now();
        let dt_s = (now - state.last_update).as_secs_f64();
        state.last_update = now;
        state.world.advance(dt_s);

        Ok(f(&mut state.world))
    }
}

impl ReflectionSource for SimRig {
    fn read_reflection(&mut self) -> Result<f64, EqptError> {
        self.with_world(EqptError::SensorReadFailure, |w| {
            let r = w.reflection();
            trace!(
                "Sim: t = {:.2} s, sensor at ({:.2}, {:.2}) cm, reflection {:.2}",
                w.sim_time_s,
                w.sensor_position().x,
                w.sensor_position().y,
                r
            );
            r
        })
    }
}

impl DriveActuator for SimRig {
    fn set_speeds(&mut self, left: f64, right: f64) -> Result<(), EqptError> {
        self.with_world(EqptError::ActuatorCommandFailure, |w| w.set_speeds(left, right))
    }

    fn stop(&mut self) -> Result<(), EqptError> {
        self.with_world(EqptError::ActuatorCommandFailure, |w| w.set_speeds(0.0, 0.0))
    }

    /// The simulated rotation completes instantly.
    fn rotate_for(&mut self, left: f64, right: f64, degrees: f64) -> Result<(), EqptError> {
        let duration_s = self.with_world(EqptError::ActuatorCommandFailure, |w| {
            w.rotate_wheels(left, right, degrees)
        })?;

        trace!("Sim: rotation took {:.2} s of simulated time", duration_s);

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn world() -> SimWorld {
        let mut p = Params::default();
        p.noise_amplitude = 0.0;
        SimWorld::new(p).unwrap()
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_starts_on_edge() {
        let w = world();

        assert!(close(w.sensor_position().x, 0.0));
        assert!(close(w.sensor_position().y, -1.0));
        assert!(close(w.reflection(), 34.0));
        assert!(close(w.track_angle_deg(w.sensor_position()), 0.0));
    }

    #[test]
    fn test_track_regions() {
        let w = world();
        let r = 40.0;

        // Centre of the line at the bottom of the circle
        assert!(close(w.reflection_at(Vector2::new(0.0, 0.0)), 8.0));

        // Inside the circle, on the mat
        assert!(close(w.reflection_at(Vector2::new(0.0, 10.0)), 60.0));

        // Beyond the mat
        assert!(close(w.reflection_at(Vector2::new(0.0, -30.0)), 95.0));

        // On the first marker, 120 degrees round the track
        let a = (-90.0f64 + 120.0).to_radians();
        let marker = Vector2::new(r * a.cos(), r + r * a.sin());
        assert!(close(w.reflection_at(marker), 33.0));
    }

    #[test]
    fn test_straight_drive() {
        let mut w = world();
        let start = w.position_cm;

        w.set_speeds(10.0, 10.0);
        w.advance(2.0);

        // 10 units * 0.5 cm/s * 2 s
        assert!(close(w.position_cm.x - start.x, 10.0));
        assert!(close(w.position_cm.y, start.y));
        assert!(close(w.heading_rad, 0.0));
        assert!(close(w.sim_time_s, 2.0));
    }

    #[test]
    fn test_turning_follows_arc() {
        let mut w = world();
        w.set_pose(Vector2::zeros(), 0.0);

        // Quarter circle to the left about a point 12 cm left of the axle
        let wb = 12.0;
        let radius = 12.0;
        let omega = 0.1;
        let v_l = (radius - wb / 2.0) * omega / 0.5;
        let v_r = (radius + wb / 2.0) * omega / 0.5;

        w.set_speeds(v_l, v_r);
        w.advance(PI / 2.0 / omega);

        assert!((w.heading_rad - PI / 2.0).abs() < 1e-9);
        assert!((w.position_cm - Vector2::new(radius, radius)).norm() < 1e-9);
    }

    #[test]
    fn test_spin_in_place() {
        let mut w = world();
        let start = w.position_cm;

        let duration = w.rotate_wheels(20.0, -20.0, 720.0);

        assert!((w.position_cm - start).norm() < 1e-9);
        assert!(w.heading_rad < 0.0);
        assert_eq!(w.speeds(), (0.0, 0.0));

        // Two motor turns of a 5.6 cm wheel at 10 cm/s
        assert!(close(duration, 2.0 * PI * 5.6 / 10.0));
    }

    #[test]
    fn test_rig_clones_share_world() {
        let rig = SimRig::new(Params::default()).unwrap();
        let mut drive = rig.clone();

        drive.rotate_for(20.0, -20.0, 90.0).unwrap();

        let (_, heading) = rig.pose().unwrap();
        assert!(heading < 0.0);
    }

    #[test]
    fn test_init_missing_params() {
        assert!(matches!(
            SimRig::init("no_such_sim_params.toml"),
            Err(SimError::ParamLoadError(_))
        ));
    }
}
