//! Wire-stable decoded sensor records

use std::io;

use byteorder::{LittleEndian, WriteBytesExt};

/// Leading tag of every emitted record
///
/// Hosts use the tag to discard foreign datagrams sharing
/// the transport.
pub const PAYLOAD_TAG: u32 = 0x38073162;

/// Model identifier for the AcuRite 00523M refrigerator/freezer sensor
pub const MODEL_ACURITE523: u16 = 1592;

/// Model identifier for the AcuRite 00609SBLA2 outdoor thermometer
pub const MODEL_ACURITE609: u16 = 6585;

/// Device identifier for the 00523M freezer probe
pub const DEVICE_FREEZER: u16 = 9690;

/// Device identifier for the 00523M fridge probe
pub const DEVICE_FRIDGE: u16 = 7784;

/// Device identifier for the 00609SBLA2 outdoor unit
pub const DEVICE_OUTDOOR: u16 = 8501;

/// Record status byte
///
/// [`Ok`](Status::Ok) marks a record latched from a fully-validated
/// over-the-air block. The remaining values let hosts report session
/// conditions — a read failure, an expired deadline — in the same
/// record format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Status {
    Unknown = 0,
    Ok = 1,
    ReadFail = 2,
    Timeout = 3,
    NoData = 4,
}

/// A decoded temperature/humidity record
///
/// `Payload` is the only thing this crate emits. Its serialized form
/// is fixed: 14 bytes, little-endian, no padding. The `temperature`
/// and `humidity` fields carry the measurement ×10 (so `-185` is
/// −18.5 °C); models without a humidity channel report `0`.
///
/// Serialize with [`write_to()`](Payload::write_to) or
/// [`to_bytes()`](Payload::to_bytes) and hand the bytes unmodified to
/// your transport.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Payload {
    /// Always [`PAYLOAD_TAG`]
    pub tag: u32,

    /// Sensor model ([`MODEL_ACURITE523`] or [`MODEL_ACURITE609`])
    pub model: u16,

    /// Device within the model (e.g., [`DEVICE_FREEZER`])
    pub device: u16,

    /// Record status
    pub status: Status,

    /// Raw 2-bit battery field from the air; `0b00` is good
    pub battery: u8,

    /// Temperature in tenths of a degree Celsius
    pub temperature: i16,

    /// Relative humidity in tenths of a percent; `0` when absent
    pub humidity: i16,
}

impl Payload {
    /// Serialized length, in bytes
    pub const LEN: usize = 14;

    /// Serialize into a writer
    ///
    /// Writes exactly [`Payload::LEN`] bytes in the fixed
    /// little-endian layout.
    pub fn write_to<W: io::Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_u32::<LittleEndian>(self.tag)?;
        writer.write_u16::<LittleEndian>(self.model)?;
        writer.write_u16::<LittleEndian>(self.device)?;
        writer.write_u8(self.status as u8)?;
        writer.write_u8(self.battery)?;
        writer.write_i16::<LittleEndian>(self.temperature)?;
        writer.write_i16::<LittleEndian>(self.humidity)?;
        Ok(())
    }

    /// Serialize to a fixed-size byte array
    pub fn to_bytes(&self) -> [u8; Self::LEN] {
        let mut out = [0u8; Self::LEN];
        self.write_to(&mut &mut out[..])
            .expect("fixed-size buffer write");
        out
    }

    /// Temperature in whole degrees Celsius
    pub fn temperature_c(&self) -> f32 {
        f32::from(self.temperature) / 10.0
    }

    /// Relative humidity in percent
    pub fn humidity_pct(&self) -> f32 {
        f32::from(self.humidity) / 10.0
    }

    /// True if the sensor reports a low battery
    pub fn battery_low(&self) -> bool {
        self.battery != 0
    }
}

impl std::fmt::Display for Payload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let device = match self.device {
            DEVICE_FREEZER => "freezer",
            DEVICE_FRIDGE => "fridge",
            DEVICE_OUTDOOR => "outdoor",
            _ => "unknown device",
        };
        if self.model == MODEL_ACURITE609 {
            write!(
                f,
                "{}: {:.1} °C {:.0} %, battery={}",
                device,
                self.temperature_c(),
                self.humidity_pct(),
                self.battery
            )
        } else {
            write!(
                f,
                "{}: {:.1} °C, battery={}",
                device,
                self.temperature_c(),
                self.battery
            )
        }
    }
}
