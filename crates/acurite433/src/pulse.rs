//! Edge-stream events and host-side edge detection

#[cfg(not(test))]
use log::trace;

#[cfg(test)]
use std::println as trace;

/// Minimum pulse duration, in microseconds
///
/// Anything shorter is receiver noise. Hosts must discard such
/// pulses before handing events to the receiver; [`EdgeDetector`]
/// and the session driver both enforce this.
pub const MIN_PULSE_US: u32 = 100;

/// One edge transition from the radio's data pin
///
/// Reports the logical level of the pulse that *just ended* and how
/// long it lasted. An event is produced once per transition and
/// consumed once.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PulseEvent {
    /// Level of the just-ended pulse: `0` or `1`
    pub level: u8,

    /// Pulse duration, in microseconds
    pub duration_us: u32,
}

/// Converts sampled pin levels into [`PulseEvent`]s
///
/// Interrupt- or poll-driven hosts read the raw pin and a monotonic
/// microsecond clock; the detector watches for level changes and
/// reports the duration of each completed pulse. Pulses shorter than
/// [`MIN_PULSE_US`] are dropped.
///
/// Superheterodyne receiver boards commonly idle high, so the data
/// pin is active-low; construct with `inverted = true` for those and
/// the detector will flip the level for you.
///
/// ```
/// use acurite433::{EdgeDetector, PulseEvent};
///
/// let mut detector = EdgeDetector::new(false);
/// assert_eq!(detector.sample(1, 0), None);        // first sample arms
/// assert_eq!(detector.sample(1, 150), None);      // no transition yet
/// assert_eq!(
///     detector.sample(0, 600),
///     Some(PulseEvent { level: 1, duration_us: 600 })
/// );
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct EdgeDetector {
    inverted: bool,
    last_level: Option<u8>,
    pulse_started_us: u64,
}

impl EdgeDetector {
    /// New detector
    ///
    /// Set `inverted` if the receiver's data pin is active-low.
    pub fn new(inverted: bool) -> Self {
        Self {
            inverted,
            last_level: None,
            pulse_started_us: 0,
        }
    }

    /// Process one pin sample
    ///
    /// `level` is the raw pin state (`0` or `1`) and `now_us` a
    /// monotonic microsecond timestamp. Returns the completed pulse
    /// when `level` differs from the previous sample, or `None` while
    /// the pulse is still in progress. Samples must be delivered in
    /// order; `now_us` must not go backwards.
    pub fn sample(&mut self, level: u8, now_us: u64) -> Option<PulseEvent> {
        let level = if self.inverted { level ^ 1 } else { level };

        let previous = match self.last_level {
            Some(previous) if previous != level => previous,
            Some(_) => return None,
            None => {
                self.last_level = Some(level);
                self.pulse_started_us = now_us;
                return None;
            }
        };

        let duration_us = now_us.saturating_sub(self.pulse_started_us).min(u32::MAX as u64) as u32;
        self.last_level = Some(level);
        self.pulse_started_us = now_us;

        if duration_us < MIN_PULSE_US {
            trace!("dropped {} µs pulse", duration_us);
            return None;
        }

        Some(PulseEvent {
            level: previous,
            duration_us,
        })
    }

    /// Forget the current pulse and re-arm on the next sample
    pub fn reset(&mut self) {
        self.last_level = None;
        self.pulse_started_us = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_sample_arms() {
        let mut det = EdgeDetector::new(false);
        assert_eq!(det.sample(0, 1000), None);
        assert_eq!(det.sample(0, 2000), None);
    }

    #[test]
    fn test_transition_reports_prior_level() {
        let mut det = EdgeDetector::new(false);
        det.sample(0, 0);
        let evt = det.sample(1, 420).expect("expected pulse");
        assert_eq!(evt.level, 0);
        assert_eq!(evt.duration_us, 420);

        let evt = det.sample(0, 620).expect("expected pulse");
        assert_eq!(evt.level, 1);
        assert_eq!(evt.duration_us, 200);
    }

    #[test]
    fn test_short_pulse_dropped() {
        let mut det = EdgeDetector::new(false);
        det.sample(0, 0);
        assert_eq!(det.sample(1, 40), None);
        // the runt still moved the pulse boundary
        let evt = det.sample(0, 340).expect("expected pulse");
        assert_eq!(evt.level, 1);
        assert_eq!(evt.duration_us, 300);
    }

    #[test]
    fn test_inverted_input() {
        let mut det = EdgeDetector::new(true);
        det.sample(1, 0); // reads as level 0
        let evt = det.sample(0, 250).expect("expected pulse");
        assert_eq!(evt.level, 0);
        assert_eq!(evt.duration_us, 250);
    }

    #[test]
    fn test_reset_rearms() {
        let mut det = EdgeDetector::new(false);
        det.sample(0, 0);
        det.reset();
        assert_eq!(det.sample(1, 5000), None);
        assert!(det.sample(0, 5400).is_some());
    }
}
