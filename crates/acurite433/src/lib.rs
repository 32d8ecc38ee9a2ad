//! # acurite433: AcuRite 433 MHz sensor decoding
//!
//! This crate decodes over-the-air transmissions from two families of
//! AcuRite consumer temperature sensors:
//!
//! * the **00523M** refrigerator/freezer unit (two probes, 48-bit
//!   blocks, per-byte parity); and
//! * the **00609SBLA2** outdoor thermometer (40-bit blocks with
//!   humidity, signature randomized at power-on).
//!
//! The input is the stream of edge transitions from a 433 MHz
//! superheterodyne receiver's data pin: one event per transition,
//! carrying the logical level that just ended and its duration in
//! microseconds. Obtaining that stream is beyond the scope of this
//! crate — any receiver board with a digital data output will do,
//! read via GPIO interrupt or a tight polling loop. The output is a
//! stream of validated, fixed-layout [`Payload`] records, emitted
//! only when a block has been framed, signature-matched,
//! parity-checked, and checksum-validated.
//!
//! ## Example
//!
//! ```
//! use acurite433::{PulseEvent, Receiver};
//!
//! let mut rx = Receiver::default();
//!
//! // let edges be an iterator of PulseEvent from your radio
//! # let edges = std::iter::empty::<PulseEvent>();
//! for payload in rx.iter_payloads(edges) {
//!     println!("{}", payload);
//!     // …or hand payload.to_bytes() to your transport
//! }
//! ```
//!
//! Hosts that block on a live pin instead of iterating use the
//! [`Session`] driver, which owns the receiver and polls an
//! [`EdgeSource`] with a deadline:
//!
//! ```no_run
//! # use std::time::Duration;
//! # use acurite433::{EdgeSource, Receiver, Session};
//! # struct Gpio;
//! # impl EdgeSource for Gpio {
//! #     fn next_edge(&mut self, _: std::time::Instant) -> Option<acurite433::PulseEvent> {
//! #         None
//! #     }
//! # }
//! # let gpio = Gpio;
//! let mut session = Session::new(gpio, Receiver::default());
//! session.start();
//! if let Some(payload) = session.available(Duration::from_secs(70)) {
//!     println!("{}", payload);
//! }
//! ```
//!
//! ## Design notes
//!
//! Decoding is a synchronous state machine: no threads, no locks, no
//! allocation on the hot path. Each model owns its own framing state;
//! each device its own latched measurements. Error recovery is
//! entirely local — a corrupted block is discarded and the burst's
//! remaining repetitions (sensors send each block three to six times)
//! provide the retry.

mod payload;
mod pulse;
mod receiver;
mod session;

pub use payload::{
    Payload, Status, DEVICE_FREEZER, DEVICE_FRIDGE, DEVICE_OUTDOOR, MODEL_ACURITE523,
    MODEL_ACURITE609, PAYLOAD_TAG,
};
pub use pulse::{EdgeDetector, PulseEvent, MIN_PULSE_US};
pub use receiver::{
    Acurite523, Acurite609, Model, Receiver, ReceiverBuilder, Reject, Sensor, Sensor523,
    Sensor609, SIG_FREEZER, SIG_FRIDGE,
};
pub use session::{EdgeSource, Session};
