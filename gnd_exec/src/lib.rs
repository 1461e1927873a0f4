//! # Ground library.
//!
//! Offline processing of the logs recorded by the line follower.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Trajectory reconstruction - dead reckoning of the robot's path from the tick log
pub mod recon;
