//! Receiver chain: per-model framing and per-device validation
//!
//! The [`Receiver`] owns one framing machine per registered sensor
//! model and fans every candidate word out to the devices bound to
//! that model. The first device to accept a candidate claims it and
//! produces a [`Payload`]; acceptance clears every framing machine so
//! no partially-framed state survives into the next block.

mod acurite523;
mod acurite609;
mod builder;

#[cfg(not(test))]
use log::debug;

#[cfg(test)]
use std::println as debug;

use thiserror::Error;

use crate::payload::{Payload, Status, MODEL_ACURITE523, MODEL_ACURITE609};
use crate::pulse::{PulseEvent, MIN_PULSE_US};

pub use self::acurite523::{Acurite523, Sensor523, SIG_FREEZER, SIG_FRIDGE};
pub use self::acurite609::{Acurite609, Sensor609};
pub use self::builder::ReceiverBuilder;

/// Why a candidate word was not accepted
///
/// Every reject is local: the candidate is discarded and framing
/// continues. Sensors repeat each block several times per burst, so
/// a reject costs nothing but one repetition.
#[derive(Clone, Copy, Debug, PartialEq, Error)]
pub enum Reject {
    /// The all-zero word carries no block
    #[error("empty candidate")]
    Empty,

    /// Candidate is not for this device
    #[error("bad signature: {0:#06x}")]
    Signature(u16),

    /// Candidate was sent on a foreign channel
    #[error("bad channel: {0}")]
    Channel(u8),

    /// Byte-sum checksum mismatch
    #[error("bad checksum: calculated {calculated:#04x}, received {received:#04x}")]
    Checksum { calculated: u8, received: u8 },

    /// A per-byte parity bit does not match its data bits
    #[error("parity bit fail")]
    Parity,

    /// Temperature decodes outside the physical range
    #[error("invalid temperature: {0:.1} °C")]
    Temperature(f32),

    /// Humidity decodes outside 1–99 %
    #[error("invalid humidity: {0:.0} %")]
    Humidity(f32),
}

/// A sensor model's framing machine
///
/// The set of supported models is closed, so dispatch is a
/// tagged-variant enum rather than an open trait hierarchy.
#[derive(Clone, Debug)]
pub enum Model {
    Acurite523(Acurite523),
    Acurite609(Acurite609),
}

impl Model {
    /// Process one edge transition; non-zero return is a candidate
    pub fn parse_rf(&mut self, duration_us: u32, level: u8) -> u64 {
        match self {
            Model::Acurite523(m) => m.parse_rf(duration_us, level),
            Model::Acurite609(m) => m.parse_rf(duration_us, level),
        }
    }

    /// Discard the in-progress block (model-specific scope)
    pub fn clear(&mut self) {
        match self {
            Model::Acurite523(m) => m.clear(),
            Model::Acurite609(m) => m.clear(),
        }
    }

    /// Reset to construction state
    pub fn reset(&mut self) {
        match self {
            Model::Acurite523(m) => m.reset(),
            Model::Acurite609(m) => m.reset(),
        }
    }

    /// Wire identifier of this model
    pub fn model_id(&self) -> u16 {
        match self {
            Model::Acurite523(_) => MODEL_ACURITE523,
            Model::Acurite609(_) => MODEL_ACURITE609,
        }
    }
}

/// A registered device with its latched measurements
#[derive(Clone, Debug)]
pub enum Sensor {
    Acurite523(Sensor523),
    Acurite609(Sensor609),
}

impl Sensor {
    /// Device identifier
    pub fn device(&self) -> u16 {
        match self {
            Sensor::Acurite523(s) => s.device(),
            Sensor::Acurite609(s) => s.device(),
        }
    }

    /// Validate a candidate word and latch its measurements
    pub fn validate_bitstream(&mut self, bitstream: u64) -> Result<(), Reject> {
        match self {
            Sensor::Acurite523(s) => s.validate_bitstream(bitstream),
            Sensor::Acurite609(s) => s.validate_bitstream(bitstream),
        }
    }

    /// Build a payload record from the latched measurements
    pub fn create_payload(&self, status: Status) -> Payload {
        match self {
            Sensor::Acurite523(s) => s.create_payload(status),
            Sensor::Acurite609(s) => s.create_payload(status),
        }
    }

    /// Temperature from the last accepted block, in °C
    pub fn temperature_c(&self) -> Option<f32> {
        match self {
            Sensor::Acurite523(s) => s.temperature_c(),
            Sensor::Acurite609(s) => s.temperature_c(),
        }
    }

    /// Humidity from the last accepted block, in percent
    ///
    /// Always `None` for models without a humidity channel.
    pub fn humidity_pct(&self) -> Option<f32> {
        match self {
            Sensor::Acurite523(_) => None,
            Sensor::Acurite609(s) => s.humidity_pct(),
        }
    }

    /// Raw 2-bit battery field from the last accepted block
    pub fn battery(&self) -> u8 {
        match self {
            Sensor::Acurite523(s) => s.battery(),
            Sensor::Acurite609(s) => s.battery(),
        }
    }

    /// True if the last accepted block flagged a low battery
    pub fn battery_low(&self) -> bool {
        self.battery() != 0
    }
}

// One model with the devices bound to it
#[derive(Clone, Debug)]
struct Binding {
    model: Model,
    sensors: Vec<Sensor>,
}

impl Binding {
    // First accepting sensor claims the candidate
    fn claim(&mut self, candidate: u64) -> Option<Payload> {
        for sensor in self.sensors.iter_mut() {
            match sensor.validate_bitstream(candidate) {
                Ok(()) => return Some(sensor.create_payload(Status::Ok)),
                Err(reject) => {
                    debug!(
                        "device {}: [{:#014x}] {}",
                        sensor.device(),
                        candidate,
                        reject
                    );
                }
            }
        }
        None
    }
}

/// A complete multi-model pulse receiver
///
/// Feed every edge transition to [`input()`](Receiver::input), or
/// bind an event iterator with
/// [`iter_payloads()`](Receiver::iter_payloads). Models are polled in
/// registration order; their classification tables are disjoint, so
/// at most one model produces a candidate per transition.
///
/// ```
/// use acurite433::{PulseEvent, Receiver};
///
/// let mut rx = Receiver::default();
///
/// // let edges be an iterator of PulseEvent from your radio
/// # let edges = std::iter::empty::<PulseEvent>();
/// for payload in rx.iter_payloads(edges) {
///     println!("{}", payload);
/// }
/// ```
#[derive(Clone, Debug)]
pub struct Receiver {
    bindings: Vec<Binding>,
}

impl Default for Receiver {
    /// Receiver for the stock three-sensor installation
    fn default() -> Self {
        ReceiverBuilder::all_devices().build()
    }
}

impl Receiver {
    pub(crate) fn with_bindings(bindings: Vec<(Model, Vec<Sensor>)>) -> Self {
        Self {
            bindings: bindings
                .into_iter()
                .map(|(model, sensors)| Binding { model, sensors })
                .collect(),
        }
    }

    /// Process one edge transition
    ///
    /// `duration_us` is the length of the just-ended pulse and
    /// `level` its logical value. The caller must discard pulses
    /// shorter than [`MIN_PULSE_US`](crate::MIN_PULSE_US). Returns a
    /// payload when a candidate block passes some device's
    /// validation; acceptance clears every framing machine, so the
    /// rest of the burst is ignored.
    pub fn input(&mut self, duration_us: u32, level: u8) -> Option<Payload> {
        let mut payload = None;

        // every model sees every event, even after an acceptance
        for binding in self.bindings.iter_mut() {
            let candidate = binding.model.parse_rf(duration_us, level);
            if candidate == 0 || payload.is_some() {
                continue;
            }
            debug!(
                "model {}: candidate [{:#014x}]",
                binding.model.model_id(),
                candidate
            );
            payload = binding.claim(candidate);
        }

        if payload.is_some() {
            self.clear();
        }
        payload
    }

    /// Decode payloads from a source of edge events
    ///
    /// Binds an iterator which consumes `input` and yields one
    /// [`Payload`] per accepted block. Pulses shorter than
    /// [`MIN_PULSE_US`](crate::MIN_PULSE_US) are discarded here, so
    /// raw event streams may be fed directly. Returns `None` when the
    /// input is exhausted.
    #[must_use = "iterators are lazy and do nothing unless consumed"]
    pub fn iter_payloads<'rx, I>(&'rx mut self, input: I) -> impl Iterator<Item = Payload> + 'rx
    where
        I: IntoIterator<Item = PulseEvent> + 'rx,
    {
        PayloadIter {
            receiver: self,
            source: input.into_iter(),
        }
    }

    /// Discard all in-progress blocks
    ///
    /// Invoked after every acceptance. Each model applies its own
    /// scope: the 00523 keeps its burst open, the 00609 starts over.
    pub fn clear(&mut self) {
        for binding in self.bindings.iter_mut() {
            binding.model.clear();
        }
    }

    /// Reset every framing machine to construction state
    ///
    /// Latched device measurements are kept; only framing state is
    /// dropped.
    pub fn reset(&mut self) {
        for binding in self.bindings.iter_mut() {
            binding.model.reset();
        }
    }

    /// Look up a registered device
    pub fn sensor(&self, device: u16) -> Option<&Sensor> {
        self.bindings
            .iter()
            .flat_map(|binding| binding.sensors.iter())
            .find(|sensor| sensor.device() == device)
    }
}

#[derive(Debug)]
struct PayloadIter<'rx, I>
where
    I: Iterator<Item = PulseEvent>,
{
    receiver: &'rx mut Receiver,
    source: I,
}

impl<'rx, I> Iterator for PayloadIter<'rx, I>
where
    I: Iterator<Item = PulseEvent>,
{
    type Item = Payload;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let event = self.source.next()?;
            if event.duration_us < MIN_PULSE_US {
                continue;
            }
            if let Some(payload) = self.receiver.input(event.duration_us, event.level) {
                return Some(payload);
            }
        }
    }
}
