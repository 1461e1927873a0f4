//! # Grey marker detection module
//!
//! Grey markers are stripes across the track whose reflectance sits between that of the line and
//! the background. A sample is "on marker" if it falls inside the grey band of the parameters.
//!
//! Crossings are debounced: a marker is only accepted once a number of consecutive samples have
//! been on marker, which rejects single sample noise. Once accepted the detector latches until an
//! off marker sample is seen, so dwelling on a marker only ever counts it once.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

pub use params::Params;
pub use state::*;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// An accepted marker crossing.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct MarkerEvent {
    /// The number of markers accepted so far, including this one. The first
    /// marker of a mission has a count of 1.
    pub count: u32,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during MarkerDet operation.
#[derive(Debug, thiserror::Error)]
pub enum MarkerDetError {
    #[error("Parameter `{name}` is invalid: {reason}")]
    InvalidParam {
        name: &'static str,
        reason: String,
    },
}
