//! MarkerDet state

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::trace;

// Internal
use super::{MarkerDetError, MarkerEvent, Params};
use util::maths::is_within;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Grey marker detector.
#[derive(Debug, Clone)]
pub struct MarkerDet {
    params: Params,

    /// Number of markers accepted so far. Only ever incremented, by one, in
    /// `observe`.
    count: u32,

    /// Set once a crossing is accepted, cleared by the next off marker sample.
    on_marker: bool,

    /// Number of consecutive on marker samples.
    streak: u32,
}

/// Status of the detector after the last observed sample.
#[derive(Debug, Default, Copy, Clone)]
pub struct StatusReport {
    /// True if the last sample was inside the grey band.
    pub in_band: bool,

    /// Number of consecutive on marker samples.
    pub streak: u32,

    /// True if the current marker has already been counted.
    pub latched: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl MarkerDet {
    /// Create a detector from the given parameters.
    pub fn new(params: Params) -> Result<Self, MarkerDetError> {
        params.validate()?;

        Ok(Self {
            params,
            count: 0,
            on_marker: false,
            streak: 0,
        })
    }

    /// Feed one reflection sample into the detector.
    ///
    /// Returns an event the first time the on marker streak reaches the
    /// required length, and `None` otherwise.
    pub fn observe(&mut self, reflection: f64) -> Option<MarkerEvent> {
        let mut event = None;

        if is_within(reflection, self.params.grey_band()) {
            self.streak = self.streak.saturating_add(1);

            if self.streak >= self.params.streak_required && !self.on_marker {
                self.on_marker = true;
                self.count += 1;
                event = Some(MarkerEvent { count: self.count });
            }
        }
        else {
            self.streak = 0;
            self.on_marker = false;
        }

        trace!(
            "MarkerDet: reflection {:.2}, streak {}, latched {}, count {}",
            reflection, self.streak, self.on_marker, self.count
        );

        event
    }

    /// Clear the streak and latch, keeping the count.
    ///
    /// After this the marker currently under the sensor can be accepted
    /// again once a full streak has been observed.
    pub fn reset_streak(&mut self) {
        self.streak = 0;
        self.on_marker = false;
    }

    /// Number of markers accepted so far.
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Current streak and latch, for trace logging.
    pub fn report(&self) -> StatusReport {
        StatusReport {
            in_band: self.streak > 0,
            streak: self.streak,
            latched: self.on_marker,
        }
    }

    /// Parameters the detector was created with.
    pub fn params(&self) -> &Params {
        &self.params
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn det() -> MarkerDet {
        MarkerDet::new(Params::default()).unwrap()
    }

    fn feed(det: &mut MarkerDet, samples: &[f64]) -> Vec<MarkerEvent> {
        samples.iter().filter_map(|s| det.observe(*s)).collect()
    }

    #[test]
    fn test_streak_then_exit_fires_once() {
        let mut d = det();
        let events = feed(&mut d, &[32.0, 32.0, 32.0, 50.0]);

        assert_eq!(events, vec![MarkerEvent { count: 1 }]);
        assert_eq!(d.count(), 1);
    }

    #[test]
    fn test_event_fires_on_third_sample() {
        let mut d = det();

        assert_eq!(d.observe(32.0), None);
        assert_eq!(d.observe(30.0), None);
        assert_eq!(d.observe(36.0), Some(MarkerEvent { count: 1 }));
    }

    #[test]
    fn test_short_streaks_never_fire() {
        let mut d = det();
        let events = feed(
            &mut d,
            &[32.0, 50.0, 32.0, 32.0, 50.0, 28.0, 10.0, 38.0, 38.0, 70.0],
        );

        assert!(events.is_empty());
        assert_eq!(d.count(), 0);
    }

    #[test]
    fn test_dwelling_counts_once() {
        let mut d = det();
        let events = feed(&mut d, &[33.0; 20]);

        assert_eq!(events.len(), 1);
        assert_eq!(d.count(), 1);
        assert!(d.report().latched);
    }

    #[test]
    fn test_counter_never_skips() {
        let mut d = det();
        let mut samples = Vec::new();
        for _ in 0..4 {
            samples.extend_from_slice(&[32.0, 32.0, 32.0, 32.0, 60.0]);
        }
        let events = feed(&mut d, &samples);

        let counts: Vec<u32> = events.iter().map(|e| e.count).collect();
        assert_eq!(counts, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_band_edges_are_inclusive() {
        let mut d = det();
        let events = feed(&mut d, &[28.0, 38.0, 28.0]);

        assert_eq!(events.len(), 1);
    }

    #[test]
    fn test_reset_streak_allows_recount() {
        let mut d = det();
        feed(&mut d, &[32.0, 32.0, 32.0]);
        assert!(d.report().latched);

        d.reset_streak();
        assert_eq!(d.report().streak, 0);
        assert!(!d.report().latched);
        assert_eq!(d.count(), 1);

        // Still on the same marker, a full new streak is needed before it counts again
        assert_eq!(d.observe(32.0), None);
        assert_eq!(d.observe(32.0), None);
        assert_eq!(d.observe(32.0), Some(MarkerEvent { count: 2 }));
    }
}
