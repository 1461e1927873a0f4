//! # Reflected light sensor interface

use super::EqptError;

/// Lowest reflected light intensity a sensor can report.
pub const REFLECTION_MIN: f64 = 0.0;

/// Highest reflected light intensity a sensor can report.
pub const REFLECTION_MAX: f64 = 100.0;

/// A downward facing light sensor reporting the reflected light intensity of the surface below it.
pub trait ReflectionSource {
    /// Take one reflected light sample.
    ///
    /// Units: percent, in [`REFLECTION_MIN`, `REFLECTION_MAX`].
    fn read_reflection(&mut self) -> Result<f64, EqptError>;
}
