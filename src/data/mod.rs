//! Data structures for multimeter readings.
//!
//! This module contains the core value types a decoded frame produces.

pub mod measurement;

pub use measurement::{si_prefix, DeviceAddress, Function, Mantissa, Measurement};
