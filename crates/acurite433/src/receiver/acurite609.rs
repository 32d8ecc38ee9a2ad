//! AcuRite 00609SBLA2 outdoor thermometer
//!
//! The 00609 keys only the ON half of each pulse; the OFF half is a
//! fixed idle. A burst carries one to six back-to-back 40-bit blocks,
//! each opened by an ~8.8 ms ON pulse and closed by a 10–20 ms gap,
//! with a 20–40 ms gap ending the burst.
//!
//! | level | duration (µs)     | meaning            |
//! |-------|-------------------|--------------------|
//! | 0     | 0–1200            | idle               |
//! | 1     | 0–300             | start of burst     |
//! | 1     | 300–1200          | bit 0              |
//! | 1     | 1200–3000         | bit 1              |
//! | 1     | 8700–9000         | start of block     |
//! | 1     | 10 000–20 000     | end of block       |
//! | 1     | 20 000–40 000     | end of burst       |
//!
//! Block layout, MSB first: 8-bit signature (randomized at every
//! power-on), 2-bit battery, 2-bit channel, 13-bit signed temperature
//! in 0.05 °C steps, 7-bit humidity percent, 8-bit sum checksum.

#[cfg(not(test))]
use log::info;

#[cfg(test)]
use std::println as info;

use super::Reject;
use crate::payload::{Payload, Status, MODEL_ACURITE609};

/// Block length, in bits
const BIT_LENGTH: u8 = 40;

/// Fixed channel the unit transmits on
const CHANNEL_ID: u8 = 2;

// Classified pulse
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Signal {
    Off,
    Bit0,
    Bit1,
    BitstreamStart,
    BitstreamEnd,
    ChunkStart,
    ChunkEnd,
    Invalid,
}

impl Signal {
    fn is_bit(self) -> bool {
        self == Signal::Bit0 || self == Signal::Bit1
    }
}

// Classify one pulse
//
// Intervals are closed at the low end and open at the high end.
fn classify(level: u8, duration_us: u32) -> Signal {
    match level {
        0 => match duration_us {
            0..=1199 => Signal::Off,
            _ => Signal::Invalid,
        },
        1 => match duration_us {
            0..=299 => Signal::ChunkStart,
            300..=1199 => Signal::Bit0,
            1200..=2999 => Signal::Bit1,
            8700..=8999 => Signal::BitstreamStart,
            10_000..=19_999 => Signal::BitstreamEnd,
            20_000..=39_999 => Signal::ChunkEnd,
            _ => Signal::Invalid,
        },
        _ => Signal::Invalid,
    }
}

/// 00609 pulse-width demodulator and framing machine
///
/// Every legitimate ON pulse is preceded by an idle, so all state
/// transitions are gated on the previous pulse classifying as OFF.
/// Returns each complete 40-bit block as a candidate word for a
/// [`Sensor609`].
#[derive(Clone, Debug)]
pub struct Acurite609 {
    bitstream: u64,
    bitstream_size: u8,
    bitstream_open: bool,
    chunk_open: bool,
    last: Signal,
}

impl Default for Acurite609 {
    fn default() -> Self {
        Self::new()
    }
}

impl Acurite609 {
    /// New framing machine, idle
    pub fn new() -> Self {
        Self {
            bitstream: 0,
            bitstream_size: 0,
            bitstream_open: false,
            chunk_open: false,
            last: Signal::Invalid,
        }
    }

    /// Discard all framing state, chunk membership included
    ///
    /// Unlike the 00523, burst membership is driven entirely by the
    /// explicit start/end pulses, so a clear starts over from idle.
    pub fn clear(&mut self) {
        self.bitstream = 0;
        self.bitstream_size = 0;
        self.bitstream_open = false;
        self.chunk_open = false;
        self.last = Signal::Invalid;
    }

    /// Reset to construction state
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
    /// Returns a candidate 40-bit word, or `0` if more input is
    /// needed. At most one candidate is produced per transition.
    pub fn parse_rf(&mut self, duration_us: u32, level: u8) -> u64 {
        let mut emitted = 0u64;
        let class = classify(level, duration_us);

        if self.last == Signal::Off && !self.chunk_open {
            if class == Signal::BitstreamStart {
                self.open_chunk();
            }
        } else if self.last == Signal::Off && self.chunk_open {
            if class == Signal::BitstreamStart && !self.bitstream_open {
                if self.bitstream_size == BIT_LENGTH {
                    emitted = self.bitstream;
                }
                self.open_bitstream();
            } else if class == Signal::BitstreamEnd && self.bitstream_open {
                if self.bitstream_size == BIT_LENGTH {
                    emitted = self.bitstream;
                }
                self.close_bitstream();
            } else if class == Signal::ChunkEnd {
                if self.bitstream_size == BIT_LENGTH {
                    emitted = self.bitstream;
                }
                self.close_chunk();
            } else if class.is_bit() && self.bitstream_open {
                if class == Signal::Bit1 && self.bitstream_size < BIT_LENGTH {
                    self.bitstream |= 1u64 << (BIT_LENGTH - self.bitstream_size - 1);
                }
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

/// The 00609 outdoor unit with its latched measurements
///
/// The unit randomizes its 8-bit signature at every power-on, so the
/// signature is learned from the first block that passes the channel
/// and checksum tests and enforced thereafter. Replace the batteries
/// and you must start a new session to re-latch.
#[derive(Clone, Debug)]
pub struct Sensor609 {
    device: u16,
    signature: u16,
    battery: u8,
    temperature: Option<f32>,
    humidity: Option<f32>,
}

impl Sensor609 {
    /// New outdoor unit for the given device identifier
    pub fn new(device: u16) -> Self {
        Self {
            device,
            signature: 0,
            battery: 0,
            temperature: None,
            humidity: None,
        }
    }

    /// Device identifier
    pub fn device(&self) -> u16 {
        self.device
    }

    /// Signature latched from the first accepted block, or `0`
    pub fn signature(&self) -> u16 {
        self.signature
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

    /// Humidity from the last accepted block, in percent
    pub fn humidity_pct(&self) -> Option<f32> {
        self.humidity
    }

    /// Validate a candidate block and latch its measurements
    ///
    /// Checks, in order: non-zero word, signature (any signature is
    /// accepted until one is latched), channel, checksum, and the
    /// physical temperature and humidity ranges. On success the
    /// signature (first time), battery, temperature, and humidity are
    /// latched.
    pub fn validate_bitstream(&mut self, bitstream: u64) -> Result<(), Reject> {
        if bitstream == 0 {
            return Err(Reject::Empty);
        }

        let signature = (bitstream >> 32) as u16;
        if self.signature != 0 && signature != self.signature {
            return Err(Reject::Signature(signature));
        }

        let channel = ((bitstream >> 28) & 0x03) as u8;
        if channel != CHANNEL_ID {
            return Err(Reject::Channel(channel));
        }

        validate_checksum(bitstream)?;

        // 13-bit two's-complement temperature in 0.05 °C steps
        let raw = ((bitstream >> 15) & 0x1fff) as u16;
        let signed = if raw & 0x1000 != 0 {
            -i32::from(0x2000 - raw)
        } else {
            i32::from(raw)
        };
        let temperature = signed as f32 / 20.0;
        let humidity = f32::from(((bitstream >> 8) & 0x7f) as u8);

        if !(-40.0..=70.0).contains(&temperature) {
            return Err(Reject::Temperature(temperature));
        }
        if !(1.0..=99.0).contains(&humidity) {
            return Err(Reject::Humidity(humidity));
        }

        if self.signature == 0 {
            self.signature = signature;
        }
        self.battery = ((bitstream >> 30) & 0x03) as u8;
        self.temperature = Some(temperature);
        self.humidity = Some(humidity);
        info!(
            "outdoor: {:.1} °C {:.0} %, battery={}",
            temperature, humidity, self.battery
        );
        Ok(())
    }

    /// Build a payload record from the latched measurements
    pub fn create_payload(&self, status: Status) -> Payload {
        Payload {
            tag: crate::payload::PAYLOAD_TAG,
            model: MODEL_ACURITE609,
            device: self.device,
            status,
            battery: self.battery,
            temperature: self.temperature.map_or(0, |t| (t * 10.0) as i16),
            humidity: self.humidity.map_or(0, |h| (h * 10.0) as i16),
        }
    }
}

// Sum of the four upper bytes must match the low byte
fn validate_checksum(bitstream: u64) -> Result<(), Reject> {
    let received = (bitstream & 0xff) as u8;
    let calculated = (((bitstream >> 8) & 0xff)
        + ((bitstream >> 16) & 0xff)
        + ((bitstream >> 24) & 0xff)
        + (bitstream >> 32)) as u8;
    if calculated != received {
        return Err(Reject::Checksum {
            calculated,
            received,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::DEVICE_OUTDOOR;

    // outdoor block: +34.7 °C, 37 %, battery low
    const OUTDOOR_BLOCK: u64 = 0xC0_A1_5B_25_E1;

    // outdoor block: -6.5 °C, 69 %, battery good
    const OUTDOOR_BLOCK_NEG: u64 = 0xC0_2F_BF_45_F3;

    // One block: start pulse plus 40 ON bits, each preceded by idle
    fn block_pulses(word: u64) -> Vec<(u8, u32)> {
        let mut out = vec![(0, 500), (1, 8800)];
        for i in (0..40).rev() {
            out.push((0, 500));
            out.push((1, if (word >> i) & 1 == 1 { 2000 } else { 500 }));
        }
        out
    }

    fn feed(machine: &mut Acurite609, pulses: &[(u8, u32)]) -> Vec<u64> {
        let mut emitted = Vec::new();
        for &(level, duration) in pulses {
            let word = machine.parse_rf(duration, level);
            if word != 0 {
                emitted.push(word);
            }
        }
        emitted
    }

    #[test]
    fn test_classify_boundaries() {
        assert_eq!(classify(0, 0), Signal::Off);
        assert_eq!(classify(0, 1199), Signal::Off);
        assert_eq!(classify(0, 1200), Signal::Invalid);
        assert_eq!(classify(1, 299), Signal::ChunkStart);
        assert_eq!(classify(1, 300), Signal::Bit0);
        assert_eq!(classify(1, 1200), Signal::Bit1);
        assert_eq!(classify(1, 3000), Signal::Invalid);
        assert_eq!(classify(1, 8700), Signal::BitstreamStart);
        assert_eq!(classify(1, 9000), Signal::Invalid);
        assert_eq!(classify(1, 10_000), Signal::BitstreamEnd);
        assert_eq!(classify(1, 20_000), Signal::ChunkEnd);
        assert_eq!(classify(1, 40_000), Signal::Invalid);
    }

    #[test]
    fn test_round_trip_block() {
        let mut machine = Acurite609::new();
        let emitted = feed(&mut machine, &block_pulses(OUTDOOR_BLOCK));
        assert_eq!(emitted, vec![OUTDOOR_BLOCK]);
        assert!(machine.chunk_open);
        assert!(!machine.bitstream_open);
    }

    #[test]
    fn test_back_to_back_blocks() {
        let mut machine = Acurite609::new();
        let mut pulses = block_pulses(OUTDOOR_BLOCK);
        for _ in 0..2 {
            pulses.extend(block_pulses(OUTDOOR_BLOCK));
        }
        pulses.push((0, 500));
        pulses.push((1, 30_000));

        let emitted = feed(&mut machine, &pulses);
        assert_eq!(emitted, vec![OUTDOOR_BLOCK; 3]);
        assert!(!machine.chunk_open);
    }

    #[test]
    fn test_bitstream_end_gap() {
        let mut machine = Acurite609::new();
        let mut pulses = block_pulses(OUTDOOR_BLOCK);
        pulses.push((0, 500));
        pulses.push((1, 15_000));

        // the word was already emitted on its final bit; the end-gap
        // pulse finds an already-closed bitstream
        let emitted = feed(&mut machine, &pulses);
        assert_eq!(emitted, vec![OUTDOOR_BLOCK]);
        assert!(machine.chunk_open);
    }

    #[test]
    fn test_partial_block_not_emitted() {
        let mut machine = Acurite609::new();
        let pulses = block_pulses(OUTDOOR_BLOCK);
        let emitted = feed(&mut machine, &pulses[..pulses.len() - 2]);
        assert!(emitted.is_empty());
        assert_eq!(machine.bitstream_size, 39);
    }

    #[test]
    fn test_without_idle_gate_nothing_frames() {
        // ON pulses only: every transition fails the OFF gate
        let mut machine = Acurite609::new();
        let mut pulses = vec![(1, 8800)];
        for i in (0..40).rev() {
            pulses.push((1, if (OUTDOOR_BLOCK >> i) & 1 == 1 { 2000 } else { 500 }));
        }
        let emitted = feed(&mut machine, &pulses);
        assert!(emitted.is_empty());
        assert!(!machine.chunk_open);
    }

    #[test]
    fn test_invalid_pulses_emit_nothing() {
        let mut machine = Acurite609::new();
        let pulses: Vec<(u8, u32)> = (0..1000)
            .map(|i| ((i % 2) as u8, 4000 + (i % 100) as u32))
            .collect();

        let emitted = feed(&mut machine, &pulses);
        assert!(emitted.is_empty());
        assert!(!machine.chunk_open);
    }

    #[test]
    fn test_bitstream_size_bounded() {
        // pseudo-random mix of bit, start, gap, and junk pulses
        let mut machine = Acurite609::new();
        let mut state = 0x0139_408Du32;
        for _ in 0..20_000 {
            state = state.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            let level = ((state >> 16) & 1) as u8;
            let duration = (state >> 18) % 12_000;
            machine.parse_rf(duration, level);
            assert!(machine.bitstream_size <= BIT_LENGTH);
        }
    }

    #[test]
    fn test_clear_resets_everything() {
        let mut machine = Acurite609::new();
        let pulses = block_pulses(OUTDOOR_BLOCK);
        feed(&mut machine, &pulses[..20]);
        assert!(machine.chunk_open);

        machine.clear();
        assert!(!machine.chunk_open);
        assert!(!machine.bitstream_open);
        assert_eq!(machine.bitstream_size, 0);

        // idempotent
        let after_one = machine.clone();
        machine.clear();
        assert_eq!(machine.bitstream, after_one.bitstream);
        assert_eq!(machine.chunk_open, after_one.chunk_open);
        assert_eq!(machine.last, after_one.last);
    }

    #[test]
    fn test_validate_outdoor() {
        let mut sensor = Sensor609::new(DEVICE_OUTDOOR);
        sensor.validate_bitstream(OUTDOOR_BLOCK).expect("accept");
        assert_eq!(sensor.signature(), 0xC0);
        assert_eq!(sensor.battery(), 2);
        assert!(sensor.battery_low());
        assert_eq!(sensor.temperature_c(), Some(34.7));
        assert_eq!(sensor.humidity_pct(), Some(37.0));

        let payload = sensor.create_payload(Status::Ok);
        assert_eq!(payload.model, MODEL_ACURITE609);
        assert_eq!(payload.device, DEVICE_OUTDOOR);
        assert_eq!(payload.temperature, 347);
        assert_eq!(payload.humidity, 370);
    }

    #[test]
    fn test_validate_negative_temperature() {
        let mut sensor = Sensor609::new(DEVICE_OUTDOOR);
        sensor
            .validate_bitstream(OUTDOOR_BLOCK_NEG)
            .expect("accept");
        assert_eq!(sensor.temperature_c(), Some(-6.5));
        assert_eq!(sensor.humidity_pct(), Some(69.0));
        assert_eq!(sensor.create_payload(Status::Ok).temperature, -65);
    }

    #[test]
    fn test_signature_latching() {
        let mut sensor = Sensor609::new(DEVICE_OUTDOOR);
        sensor.validate_bitstream(OUTDOOR_BLOCK).expect("accept");
        assert_eq!(sensor.signature(), 0xC0);

        // same unit, later block: accepted
        sensor
            .validate_bitstream(OUTDOOR_BLOCK_NEG)
            .expect("accept");

        // a different unit is rejected once latched
        assert_eq!(
            sensor.validate_bitstream(0xC1_A1_5B_25_E2),
            Err(Reject::Signature(0xC1))
        );
    }

    #[test]
    fn test_wrong_channel_rejected() {
        let mut sensor = Sensor609::new(DEVICE_OUTDOOR);
        assert_eq!(
            sensor.validate_bitstream(0xC0_0F_C2_45_D6),
            Err(Reject::Channel(0))
        );
    }

    #[test]
    fn test_bad_checksum_rejected() {
        let mut sensor = Sensor609::new(DEVICE_OUTDOOR);
        assert_eq!(
            sensor.validate_bitstream(OUTDOOR_BLOCK ^ 1),
            Err(Reject::Checksum {
                calculated: 0xE1,
                received: 0xE0,
            })
        );
        // nothing latched on a reject
        assert_eq!(sensor.signature(), 0);
        assert_eq!(sensor.temperature_c(), None);
    }

    #[test]
    fn test_humidity_range_rejected() {
        let mut sensor = Sensor609::new(DEVICE_OUTDOOR);
        assert_eq!(
            sensor.validate_bitstream(0xC0_A1_5B_00_BC),
            Err(Reject::Humidity(0.0))
        );
    }

    #[test]
    fn test_temperature_range_rejected() {
        // raw 1420 decodes to 71 °C with a plausible 50 % humidity
        let mut sensor = Sensor609::new(DEVICE_OUTDOOR);
        assert_eq!(
            sensor.validate_bitstream(0xC0_22_C6_32_DA),
            Err(Reject::Temperature(71.0))
        );
    }

    #[test]
    fn test_empty_rejected() {
        let mut sensor = Sensor609::new(DEVICE_OUTDOOR);
        assert_eq!(sensor.validate_bitstream(0), Err(Reject::Empty));
    }
}
