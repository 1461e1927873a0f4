//! Simulation parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

use super::SimError;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters of the simulated robot and track.
///
/// The track is a circular black line printed on a white mat. The robot
/// starts with its light sensor on the outer edge of the line, at the bottom
/// of the circle, heading along the positive X axis, so it travels anticlockwise.
#[derive(Debug, Clone, Deserialize)]
pub struct Params {
    /// Radius of the centreline of the track.
    ///
    /// Units: centimeters
    pub track_radius_cm: f64,

    /// Width of the black line.
    ///
    /// Units: centimeters
    pub line_width_cm: f64,

    /// Width of the transition between line and mat as seen by the sensor.
    ///
    /// Units: centimeters
    pub edge_blur_cm: f64,

    /// Distance from the track centreline to the edge of the mat.
    ///
    /// Units: centimeters
    pub mat_half_width_cm: f64,

    /// Units: percent
    pub black_reflection: f64,

    /// Units: percent
    pub white_reflection: f64,

    /// Reflection read when the sensor is past the edge of the mat.
    ///
    /// Units: percent
    pub off_mat_reflection: f64,

    /// Reflection of the grey marker stripes.
    ///
    /// Units: percent
    pub grey_reflection: f64,

    /// Angles around the track, measured from the start position in the
    /// direction of travel, of the centre of each grey marker stripe.
    ///
    /// Units: degrees
    pub marker_angles_deg: Vec<f64>,

    /// Length of a marker stripe along the track.
    ///
    /// Units: centimeters
    pub marker_width_cm: f64,

    /// Amplitude of the mat texture noise added to every reading.
    ///
    /// Units: percent
    pub noise_amplitude: f64,

    /// Spatial frequency of the mat texture.
    ///
    /// Units: 1/centimeters
    pub noise_scale_per_cm: f64,

    /// Wheel surface speed per unit of commanded speed.
    ///
    /// Units: (centimeters/second)/speed unit
    pub speed_scale_cms: f64,

    /// Distance between the wheel contact points.
    ///
    /// Units: centimeters
    pub wheel_base_cm: f64,

    /// Units: centimeters
    pub wheel_diameter_cm: f64,

    /// Distance of the light sensor in front of the wheel axle.
    ///
    /// Units: centimeters
    pub sensor_offset_cm: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Params {
    pub fn validate(&self) -> Result<(), SimError> {
        for &(name, value) in [
            ("track_radius_cm", self.track_radius_cm),
            ("line_width_cm", self.line_width_cm),
            ("mat_half_width_cm", self.mat_half_width_cm),
            ("marker_width_cm", self.marker_width_cm),
            ("speed_scale_cms", self.speed_scale_cms),
            ("wheel_base_cm", self.wheel_base_cm),
            ("wheel_diameter_cm", self.wheel_diameter_cm),
        ]
        .iter()
        {
            if !value.is_finite() || value <= 0.0 {
                return Err(SimError::InvalidParam {
                    name,
                    reason: format!("{} must be positive", value),
                });
            }
        }

        if self.edge_blur_cm < 0.0 || self.noise_amplitude < 0.0 {
            return Err(SimError::InvalidParam {
                name: "edge_blur_cm",
                reason: "edge blur and noise amplitude must not be negative".into(),
            });
        }

        if self.mat_half_width_cm <= self.line_width_cm / 2.0
            || self.mat_half_width_cm >= self.track_radius_cm
        {
            return Err(SimError::InvalidParam {
                name: "mat_half_width_cm",
                reason: "the mat must be wider than the line and narrower than the track radius"
                    .into(),
            });
        }

        Ok(())
    }
}

impl Default for Params {
    fn default() -> Self {
        Self {
            track_radius_cm: 40.0,
            line_width_cm: 2.0,
            edge_blur_cm: 0.3,
            mat_half_width_cm: 20.0,
            black_reflection: 8.0,
            white_reflection: 60.0,
            off_mat_reflection: 95.0,
            grey_reflection: 33.0,
            marker_angles_deg: vec![120.0, 240.0],
            marker_width_cm: 4.0,
            noise_amplitude: 3.0,
            noise_scale_per_cm: 0.8,
            speed_scale_cms: 0.5,
            wheel_base_cm: 12.0,
            wheel_diameter_cm: 5.6,
            sensor_offset_cm: 6.0,
        }
    }
}
