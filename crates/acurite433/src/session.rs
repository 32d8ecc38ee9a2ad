//! Blocking session driver for live edge sources

use std::time::{Duration, Instant};

#[cfg(not(test))]
use log::debug;

#[cfg(test)]
use std::println as debug;

use crate::payload::Payload;
use crate::pulse::{PulseEvent, MIN_PULSE_US};
use crate::receiver::Receiver;

/// A live source of edge transitions
///
/// Implementations wrap the GPIO pin (or whatever carries the
/// receiver's data line) and a monotonic microsecond clock. Edges
/// must be delivered in order; out-of-order or coalesced edges will
/// silently corrupt framing. [`EdgeDetector`](crate::EdgeDetector)
/// handles the level-change bookkeeping for poll-driven hosts.
pub trait EdgeSource {
    /// Next edge transition from the data pin
    ///
    /// Blocks until a transition is available, returning `None` once
    /// `deadline` passes (or the source is exhausted).
    fn next_edge(&mut self, deadline: Instant) -> Option<PulseEvent>;
}

/// Hosts a `start`/`available` façade over an [`EdgeSource`]
///
/// The session owns all decoder state. [`start()`](Session::start)
/// arms it; each [`available()`](Session::available) call then drives
/// the edge source until a payload is produced or the timeout
/// elapses. Latched measurements are read through
/// [`receiver()`](Session::receiver) between calls.
///
/// ```no_run
/// use std::time::Duration;
/// use acurite433::{EdgeSource, Receiver, Session};
///
/// # struct Gpio;
/// # impl EdgeSource for Gpio {
/// #     fn next_edge(&mut self, _: std::time::Instant) -> Option<acurite433::PulseEvent> {
/// #         None
/// #     }
/// # }
/// # let gpio = Gpio;
/// let mut session = Session::new(gpio, Receiver::default());
/// session.start();
///
/// loop {
///     match session.available(Duration::from_secs(70)) {
///         Some(payload) => println!("{}", payload),
///         None => println!("timeout"),
///     }
/// }
/// ```
#[derive(Debug)]
pub struct Session<S> {
    source: S,
    receiver: Receiver,
    started: bool,
}

impl<S: EdgeSource> Session<S> {
    /// New session; call [`start()`](Session::start) before polling
    pub fn new(source: S, receiver: Receiver) -> Self {
        Self {
            source,
            receiver,
            started: false,
        }
    }

    /// Arm the session
    ///
    /// Framing state is reset so a burst already in flight cannot be
    /// misparsed from its middle. Safe to call again at any time.
    pub fn start(&mut self) {
        self.receiver.reset();
        self.started = true;
        debug!("session started");
    }

    /// Disarm the session
    ///
    /// Latched measurements remain readable.
    pub fn stop(&mut self) {
        self.started = false;
    }

    /// Wait for the next decoded payload
    ///
    /// Drives the edge source until a block is accepted or `timeout`
    /// elapses. Returns `None` on timeout (and immediately if the
    /// session has not been started). The rest of an accepted burst
    /// is left unread; the next call picks the stream back up.
    pub fn available(&mut self, timeout: Duration) -> Option<Payload> {
        if !self.started {
            return None;
        }

        let deadline = Instant::now() + timeout;
        loop {
            let event = self.source.next_edge(deadline)?;
            if event.duration_us < MIN_PULSE_US {
                continue;
            }
            if let Some(payload) = self.receiver.input(event.duration_us, event.level) {
                return Some(payload);
            }
        }
    }

    /// The decoder and its latched measurements
    pub fn receiver(&self) -> &Receiver {
        &self.receiver
    }

    /// Tear down, returning the edge source
    pub fn into_source(self) -> S {
        self.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::DEVICE_FREEZER;

    // Edge source playing back a canned event list
    struct Playback {
        events: Vec<PulseEvent>,
        at: usize,
    }

    impl Playback {
        fn new(events: Vec<PulseEvent>) -> Self {
            Self { events, at: 0 }
        }

        fn remaining(&self) -> usize {
            self.events.len() - self.at
        }
    }

    impl EdgeSource for Playback {
        fn next_edge(&mut self, _deadline: Instant) -> Option<PulseEvent> {
            let event = *self.events.get(self.at)?;
            self.at += 1;
            Some(event)
        }
    }

    // freezer block -18.5 °C, as one full burst of three repetitions
    fn freezer_burst() -> Vec<PulseEvent> {
        const FREEZER_BLOCK: u64 = 0xC049_00_8B_BB_4F;
        let mut out = Vec::new();
        for _ in 0..3 {
            for _ in 0..4 {
                out.push(PulseEvent { level: 0, duration_us: 600 });
                out.push(PulseEvent { level: 1, duration_us: 600 });
            }
            for i in (0..48).rev() {
                if (FREEZER_BLOCK >> i) & 1 == 1 {
                    out.push(PulseEvent { level: 0, duration_us: 400 });
                    out.push(PulseEvent { level: 1, duration_us: 200 });
                } else {
                    out.push(PulseEvent { level: 0, duration_us: 200 });
                    out.push(PulseEvent { level: 1, duration_us: 400 });
                }
            }
        }
        out
    }

    #[test]
    fn test_not_started_returns_none() {
        let mut session = Session::new(Playback::new(freezer_burst()), Receiver::default());
        assert_eq!(session.available(Duration::from_secs(1)), None);
    }

    #[test]
    fn test_first_block_wins_burst() {
        let mut session = Session::new(Playback::new(freezer_burst()), Receiver::default());
        session.start();

        let payload = session
            .available(Duration::from_secs(1))
            .expect("expected decode");
        assert_eq!(payload.device, DEVICE_FREEZER);
        assert_eq!(payload.temperature, -185);

        // available() returned on the first repetition; the rest of
        // the burst is still unread
        let burst_len = freezer_burst().len();
        assert!(session.into_source().remaining() >= burst_len / 2);
    }

    #[test]
    fn test_stop_disarms() {
        let burst = freezer_burst();
        let burst_len = burst.len();
        let mut session = Session::new(Playback::new(burst), Receiver::default());
        session.start();
        session.stop();

        // disarmed: the source is not polled at all
        assert_eq!(session.available(Duration::from_secs(1)), None);
        assert_eq!(session.source.remaining(), burst_len);

        // re-arming resumes the stream
        session.start();
        assert!(session.available(Duration::from_secs(1)).is_some());
    }

    #[test]
    fn test_exhausted_source_returns_none() {
        let mut session = Session::new(Playback::new(freezer_burst()), Receiver::default());
        session.start();

        assert!(session.available(Duration::from_secs(1)).is_some());
        // next repetition decodes too
        assert!(session.available(Duration::from_secs(1)).is_some());
        assert!(session.available(Duration::from_secs(1)).is_some());
        // burst exhausted
        assert_eq!(session.available(Duration::from_secs(1)), None);
    }

    #[test]
    fn test_latched_values_readable_between_polls() {
        let mut session = Session::new(Playback::new(freezer_burst()), Receiver::default());
        session.start();
        session.available(Duration::from_secs(1)).expect("decode");

        let sensor = session.receiver().sensor(DEVICE_FREEZER).unwrap();
        assert_eq!(sensor.temperature_c(), Some(-18.5));
        assert!(!sensor.battery_low());
    }

    #[test]
    fn test_start_resets_framing() {
        let burst = freezer_burst();
        let half = burst.len() / 2;
        let mut session = Session::new(Playback::new(burst), Receiver::default());
        session.start();

        // consume half a burst without a decode by limiting the source
        let mut fed = 0;
        while fed < half {
            let event = session.source.next_edge(Instant::now()).unwrap();
            session.receiver.input(event.duration_us, event.level);
            fed += 1;
        }

        // re-arm: framing restarts, so the dangling half block plus a
        // fresh repetition still decodes cleanly
        session.start();
        assert!(session.available(Duration::from_secs(1)).is_some());
    }
}
