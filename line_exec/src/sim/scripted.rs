//! Scripted sensor and recording drive

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::collections::VecDeque;
use std::fs;
use std::path::Path;

use log::debug;

use super::SimError;
use line_if::{
    eqpt::{DriveActuator, DriveDems, EqptError, ReflectionSource},
    tick_log::parse_log,
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A light sensor which returns a fixed sequence of samples.
///
/// Reading past the end of the script is a sensor failure.
#[derive(Debug, Clone, Default)]
pub struct ScriptedSensor {
    samples: VecDeque<f64>,
}

/// A drive which records every demand it is sent.
///
/// If `fail_after` is set the drive fails every command once that many commands have been recorded.
#[derive(Debug, Clone, Default)]
pub struct RecordingDrive {
    pub dems: Vec<DriveDems>,
    pub fail_after: Option<usize>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl ScriptedSensor {
    pub fn new(samples: Vec<f64>) -> Self {
        Self {
            samples: samples.into(),
        }
    }

    /// Load a script from a file.
    ///
    /// The file is either a tick log, in which case the reflection column is replayed, or a list of
    /// reflections with one value per line. Blank lines are ignored.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SimError> {
        let contents = fs::read_to_string(path).map_err(SimError::ReplayLoadError)?;

        let samples: Vec<f64> = if contents.contains(',') {
            parse_log(&contents)
                .map_err(SimError::ReplayLogError)?
                .iter()
                .map(|r| r.reflection)
                .collect()
        }
        else {
            let mut samples = Vec::new();
            for (i, line) in contents.lines().enumerate() {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                match line.parse::<f64>() {
                    Ok(v) if v.is_finite() => samples.push(v),
                    _ => {
                        return Err(SimError::ReplayValueError {
                            line: i + 1,
                            raw: line.to_string(),
                        })
                    }
                }
            }
            samples
        };

        debug!("Loaded a reflection script of {} samples", samples.len());

        Ok(Self::new(samples))
    }

    /// Number of samples left in the script.
    pub fn remaining(&self) -> usize {
        self.samples.len()
    }
}

impl ReflectionSource for ScriptedSensor {
    fn read_reflection(&mut self) -> Result<f64, EqptError> {
        self.samples
            .pop_front()
            .ok_or_else(|| EqptError::SensorReadFailure("the reflection script is exhausted".into()))
    }
}

impl RecordingDrive {
    /// A drive which fails every command after the first `num` succeed.
    pub fn failing_after(num: usize) -> Self {
        Self {
            dems: Vec::new(),
            fail_after: Some(num),
        }
    }

    fn record(&mut self, dems: DriveDems) -> Result<(), EqptError> {
        match self.fail_after {
            Some(n) if self.dems.len() >= n => Err(EqptError::ActuatorCommandFailure(format!(
                "injected failure on {:?}",
                dems
            ))),
            _ => {
                self.dems.push(dems);
                Ok(())
            }
        }
    }
}

impl DriveActuator for RecordingDrive {
    fn set_speeds(&mut self, left: f64, right: f64) -> Result<(), EqptError> {
        self.record(DriveDems::Speeds { left, right })
    }

    fn stop(&mut self) -> Result<(), EqptError> {
        self.record(DriveDems::Stop)
    }

    fn rotate_for(&mut self, left: f64, right: f64, degrees: f64) -> Result<(), EqptError> {
        self.record(DriveDems::Rotate {
            left,
            right,
            degrees,
        })
    }
}
