//! AcuRite 00523M refrigerator/freezer sensor
//!
//! The 00523M transmits a 48-bit block three to six times per burst,
//! roughly once a minute. Each bit is sent as an OFF half followed by
//! an ON half of the matching width class; a run of four wide ON
//! pulses opens the burst, and a 20–60 ms carrier gap ends it.
//!
//! | level | duration (µs)     | meaning          |
//! |-------|-------------------|------------------|
//! | 0     | 100–300           | bit-0 OFF half   |
//! | 0     | 300–500           | bit-1 OFF half   |
//! | 0     | 500–700           | preamble OFF     |
//! | 1     | 100–300           | bit-1 ON half    |
//! | 1     | 300–500           | bit-0 ON half    |
//! | 1     | 500–700           | preamble ON      |
//! | 1     | 20 000–60 000     | end of burst     |
//!
//! Block layout, MSB first: 16-bit signature, 2-bit battery, 6 unused
//! bits, two parity-guarded 7-bit halves of the raw temperature, and
//! an 8-bit sum checksum. The signatures are fixed per unit.

#[cfg(not(test))]
use log::info;

#[cfg(test)]
use std::println as info;

use super::Reject;
use crate::payload::{Payload, Status, MODEL_ACURITE523};

/// Block length, in bits
const BIT_LENGTH: u8 = 48;

/// Contiguous wide ON pulses that open a burst
const OPENER_RUN: u8 = 4;

/// Fixed over-the-air signature of the freezer probe
pub const SIG_FREEZER: u16 = 0xC049;

/// Fixed over-the-air signature of the fridge probe
pub const SIG_FRIDGE: u16 = 0xC07C;

// Classified pulse
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Signal {
    Bit0Off,
    Bit0On,
    Bit1Off,
    Bit1On,
    BitstreamOff,
    BitstreamOn,
    ChunkEnd,
    Invalid,
}

// Classify one pulse
//
// Intervals are closed at the low end and open at the high end.
// Durations under 100 µs never reach the receiver; they still
// classify as Invalid here.
fn classify(level: u8, duration_us: u32) -> Signal {
    match level {
        0 => match duration_us {
            100..=299 => Signal::Bit0Off,
            300..=499 => Signal::Bit1Off,
            500..=699 => Signal::BitstreamOff,
            _ => Signal::Invalid,
        },
        1 => match duration_us {
            100..=299 => Signal::Bit1On,
            300..=499 => Signal::Bit0On,
            500..=699 => Signal::BitstreamOn,
            20_000..=59_999 => Signal::ChunkEnd,
            _ => Signal::Invalid,
        },
        _ => Signal::Invalid,
    }
}

/// 00523M pulse-width demodulator and framing machine
///
/// Feed every edge transition to [`parse_rf()`](Acurite523::parse_rf).
/// The machine watches for the four-pulse preamble, accumulates bit
/// halves into a 48-bit MSB-first word, and returns the word once the
/// final bit (or the burst gap after a full block) arrives. Candidate
/// words have not been validated; hand them to a
/// [`Sensor523`].
#[derive(Clone, Debug)]
pub struct Acurite523 {
    bitstream: u64,
    bitstream_size: u8,
    bitstream_open: bool,
    chunk_open: bool,
    opener_count: u8,
    last: Signal,
}

impl Default for Acurite523 {
    fn default() -> Self {
        Self::new()
    }
}

impl Acurite523 {
    /// New framing machine, idle
    pub fn new() -> Self {
        Self {
            bitstream: 0,
            bitstream_size: 0,
            bitstream_open: false,
            chunk_open: false,
            opener_count: 0,
            last: Signal::Invalid,
        }
    }

    /// Discard the in-progress block
    ///
    /// `chunk_open` survives a clear: a mid-burst clear must not lose
    /// the preamble, and the remaining repetitions of the block can
    /// still be received. Only [`parse_rf()`](Acurite523::parse_rf)
    /// closes the chunk.
    pub fn clear(&mut self) {
        self.bitstream = 0;
        self.bitstream_size = 0;
        self.bitstream_open = false;
        self.opener_count = 0;
        self.last = Signal::Invalid;
    }

    /// Reset to construction state, chunk included
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    fn open_bitstream(&mut self) {
        self.bitstream_open = true;
        self.bitstream_size = 0;
        self.bitstream = 0;
    }

    fn close_bitstream(&mut self) {
        self.bitstream_open = false;
        self.bitstream_size = 0;
        self.bitstream = 0;
    }

    fn open_chunk(&mut self) {
        self.chunk_open = true;
        self.open_bitstream();
    }

    fn close_chunk(&mut self) {
        self.chunk_open = false;
        self.close_bitstream();
    }

    /// Process one edge transition
    ///
    /// `duration_us` is the length of the just-ended pulse and `level`
    /// its logical value. Returns a candidate 48-bit word, or `0` if
    /// more input is needed. At most one candidate is produced per
    /// transition.
    pub fn parse_rf(&mut self, duration_us: u32, level: u8) -> u64 {
        let mut emitted = 0u64;
        let class = classify(level, duration_us);

        if self.last == Signal::BitstreamOff || !self.chunk_open {
            // preamble: count contiguous wide ON pulses
            if class == Signal::BitstreamOn {
                self.opener_count += 1;
            }
            if self.opener_count == OPENER_RUN {
                self.opener_count = 0;
                if !self.chunk_open {
                    self.open_chunk();
                }
            }
        } else if self.last == Signal::Bit0Off && self.chunk_open {
            if class == Signal::Bit0On && self.bitstream_size < BIT_LENGTH {
                self.bitstream_size += 1;
                if self.bitstream_size == BIT_LENGTH {
                    emitted = self.bitstream;
                    self.close_bitstream();
                }
            } else if class == Signal::Bit1On && self.bitstream_size == BIT_LENGTH {
                emitted = self.bitstream;
                self.close_bitstream();
            } else if class == Signal::ChunkEnd {
                if self.bitstream_size == BIT_LENGTH {
                    emitted = self.bitstream;
                }
                self.close_chunk();
            }
            self.opener_count = 0;
        } else if self.last == Signal::Bit1Off && self.chunk_open {
            if class == Signal::Bit1On && self.bitstream_size < BIT_LENGTH {
                self.bitstream |= 1u64 << (BIT_LENGTH - self.bitstream_size - 1);
                self.bitstream_size += 1;
                if self.bitstream_size == BIT_LENGTH {
                    emitted = self.bitstream;
                    self.close_bitstream();
                }
            }
        }

        self.last = class;
        emitted
    }
}

/// One 00523M probe with its latched measurements
///
/// The freezer and fridge probes carry fixed, empirically-discovered
/// signatures; a `Sensor523` only accepts blocks bearing its own.
/// A successful [`validate_bitstream()`](Sensor523::validate_bitstream)
/// latches the temperature and battery field until the next accepted
/// block.
#[derive(Clone, Debug)]
pub struct Sensor523 {
    device: u16,
    signature: u16,
    battery: u8,
    temperature: Option<f32>,
}

impl Sensor523 {
    /// New probe for the given device identifier
    ///
    /// [`DEVICE_FREEZER`](crate::DEVICE_FREEZER) and
    /// [`DEVICE_FRIDGE`](crate::DEVICE_FRIDGE) map to their hardcoded
    /// signatures; any other identifier gets signature `0` and will
    /// never accept a block.
    pub fn new(device: u16) -> Self {
        let signature = match device {
            crate::payload::DEVICE_FREEZER => SIG_FREEZER,
            crate::payload::DEVICE_FRIDGE => SIG_FRIDGE,
            _ => 0,
        };
        Self {
            device,
            signature,
            battery: 0,
            temperature: None,
        }
    }

    /// Device identifier
    pub fn device(&self) -> u16 {
        self.device
    }

    /// Raw 2-bit battery field from the last accepted block
    pub fn battery(&self) -> u8 {
        self.battery
    }

    /// True if the last accepted block flagged a low battery
    pub fn battery_low(&self) -> bool {
        self.battery != 0
    }

    /// Temperature from the last accepted block, in °C
    pub fn temperature_c(&self) -> Option<f32> {
        self.temperature
    }

    /// Validate a candidate block and latch its measurements
    ///
    /// Checks, in order: non-zero word, signature, checksum, the two
    /// per-byte parity bits, and the physical temperature range. On
    /// success the temperature and battery field are latched and the
    /// block is consumed.
    pub fn validate_bitstream(&mut self, bitstream: u64) -> Result<(), Reject> {
        if bitstream == 0 {
            return Err(Reject::Empty);
        }

        let signature = (bitstream >> 32) as u16;
        if signature != self.signature {
            return Err(Reject::Signature(signature));
        }

        validate_checksum(bitstream)?;

        let parity1 = ((bitstream >> 15) & 1) as u8;
        let byte1 = ((bitstream >> 8) & 0x7f) as u8;
        let parity2 = ((bitstream >> 23) & 1) as u8;
        let byte2 = ((bitstream >> 16) & 0x7f) as u8;
        if !parity_matches(parity1, byte1) || !parity_matches(parity2, byte2) {
            return Err(Reject::Parity);
        }

        let raw = (u16::from(byte2) << 7) | u16::from(byte1);
        let temperature = (f32::from(raw) - 1800.0) / 18.0;
        if !(-40.0..70.0).contains(&temperature) {
            return Err(Reject::Temperature(temperature));
        }

        self.battery = ((bitstream >> 30) & 0x03) as u8;
        self.temperature = Some(temperature);
        info!(
            "{}: {:.1} °C, battery={}",
            self.name(),
            temperature,
            self.battery
        );
        Ok(())
    }

    /// Build a payload record from the latched measurements
    pub fn create_payload(&self, status: Status) -> Payload {
        Payload {
            tag: crate::payload::PAYLOAD_TAG,
            model: MODEL_ACURITE523,
            device: self.device,
            status,
            battery: self.battery,
            temperature: self.temperature.map_or(0, |t| (t * 10.0) as i16),
            humidity: 0,
        }
    }

    fn name(&self) -> &'static str {
        match self.signature {
            SIG_FREEZER => "freezer",
            SIG_FRIDGE => "fridge",
            _ => "unknown",
        }
    }
}

// Sum of the five upper bytes must match the low byte
fn validate_checksum(bitstream: u64) -> Result<(), Reject> {
    let received = (bitstream & 0xff) as u8;
    let calculated = (((bitstream >> 8) & 0xff)
        + ((bitstream >> 16) & 0xff)
        + ((bitstream >> 24) & 0xff)
        + ((bitstream >> 32) & 0xff)
        + (bitstream >> 40)) as u8;
    if calculated != received {
        return Err(Reject::Checksum {
            calculated,
            received,
        });
    }
    Ok(())
}

// Parity bit is 1 when the 7-bit value has an odd number of ones
fn parity_matches(parity_bit: u8, value: u8) -> bool {
    (value.count_ones() % 2) as u8 == parity_bit
}
