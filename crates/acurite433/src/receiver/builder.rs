//! Receiver construction

use super::{Acurite523, Acurite609, Model, Receiver, Sensor, Sensor523, Sensor609};
use crate::payload::{DEVICE_FREEZER, DEVICE_FRIDGE, DEVICE_OUTDOOR};

/// Builds a [`Receiver`]
///
/// Registers devices per model. Each registered model gets one
/// framing machine; each registered device gets its own validator and
/// latched measurements. A model with no devices is not polled.
///
/// ```
/// use acurite433::{ReceiverBuilder, DEVICE_OUTDOOR};
///
/// // outdoor unit only
/// let rx = ReceiverBuilder::new()
///     .with_acurite609(&[DEVICE_OUTDOOR])
///     .build();
/// assert!(rx.sensor(DEVICE_OUTDOOR).is_some());
/// ```
#[derive(Clone, Debug, Default)]
pub struct ReceiverBuilder {
    acurite523: Vec<u16>,
    acurite609: Vec<u16>,
}

impl ReceiverBuilder {
    /// New builder with no devices registered
    pub fn new() -> Self {
        Self {
            acurite523: Vec::new(),
            acurite609: Vec::new(),
        }
    }

    /// Register 00523M devices
    ///
    /// Use [`DEVICE_FREEZER`] and [`DEVICE_FRIDGE`]; these carry the
    /// probes' hardcoded signatures.
    pub fn with_acurite523(mut self, devices: &[u16]) -> Self {
        self.acurite523.extend_from_slice(devices);
        self
    }

    /// Register 00609SBLA2 devices
    pub fn with_acurite609(mut self, devices: &[u16]) -> Self {
        self.acurite609.extend_from_slice(devices);
        self
    }

    /// Build a receiver
    ///
    /// Once built, the receiver is immediately ready for edge events.
    pub fn build(self) -> Receiver {
        Receiver::from(&self)
    }

    /// The stock installation: freezer, fridge, and outdoor unit
    pub fn all_devices() -> Self {
        Self::new()
            .with_acurite523(&[DEVICE_FREEZER, DEVICE_FRIDGE])
            .with_acurite609(&[DEVICE_OUTDOOR])
    }
}

impl From<&ReceiverBuilder> for Receiver {
    fn from(builder: &ReceiverBuilder) -> Self {
        let mut bindings = Vec::new();

        if !builder.acurite523.is_empty() {
            let sensors = builder
                .acurite523
                .iter()
                .map(|&device| Sensor::Acurite523(Sensor523::new(device)))
                .collect();
            bindings.push((Model::Acurite523(Acurite523::new()), sensors));
        }

        if !builder.acurite609.is_empty() {
            let sensors = builder
                .acurite609
                .iter()
                .map(|&device| Sensor::Acurite609(Sensor609::new(device)))
                .collect();
            bindings.push((Model::Acurite609(Acurite609::new()), sensors));
        }

        Receiver::with_bindings(bindings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_registers_all_devices() {
        let rx = ReceiverBuilder::all_devices().build();
        assert!(rx.sensor(DEVICE_FREEZER).is_some());
        assert!(rx.sensor(DEVICE_FRIDGE).is_some());
        assert!(rx.sensor(DEVICE_OUTDOOR).is_some());
    }

    #[test]
    fn test_empty_builder_registers_nothing() {
        let rx = ReceiverBuilder::new().build();
        assert!(rx.sensor(DEVICE_FREEZER).is_none());
    }

    #[test]
    fn test_selective_registration() {
        let rx = ReceiverBuilder::new()
            .with_acurite609(&[DEVICE_OUTDOOR])
            .build();
        assert!(rx.sensor(DEVICE_OUTDOOR).is_some());
        assert!(rx.sensor(DEVICE_FRIDGE).is_none());
    }
}
