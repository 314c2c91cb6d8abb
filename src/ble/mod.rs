//! BLE communication module.
//!
//! This module provides the Bluetooth Low Energy plumbing for discovering
//! and talking to OWON multimeters.

pub mod scanner;
pub mod transport;
pub mod uuids;

pub use scanner::{DiscoveredDevice, DiscoveryCoordinator};
pub use transport::BleTransport;
pub use uuids::*;
