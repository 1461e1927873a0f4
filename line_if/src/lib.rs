//! # Line follower interface crate.
//!
//! Provides the interfaces shared between the on-board executable and the
//! ground tools: the equipment traits the controller drives, and the tick log
//! record format.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Equipment interfaces (light sensor and drive motors)
pub mod eqpt;

/// Tick log records and their on-disk line format
pub mod tick_log;
