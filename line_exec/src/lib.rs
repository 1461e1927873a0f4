//! # Line follower library.
//!
//! This library allows other crates in the workspace (and the integration tests) to access items
//! defined inside the line follower executable.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Grey marker detection - debounces reflection samples into marker crossing events
pub mod marker_det;

/// Line control - proportional line following, line loss recovery and the mission state machine
pub mod line_ctrl;

/// Tick log - in-memory record of every control tick, flushed to disk at the end of the mission
pub mod tick_log;

/// Simulation - kinematic and scripted stand-ins for the light sensor and drive motors
pub mod sim;

/// Executable parameters
pub mod params;
