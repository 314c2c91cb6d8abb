// Allow unusual byte groupings for UUIDs which have standard format
#![allow(clippy::unusual_byte_groupings)]

//! # owon-ble
//!
//! A cross-platform Rust library for reading live measurements from
//! OWON "BDM" Bluetooth Low Energy multimeters.
//!
//! The library discovers a multimeter by its advertised name, drives the
//! connection lifecycle (connect, service resolution, notification
//! subscription, streaming, reconnect), and decodes each notification
//! frame into a typed measurement with an exact decimal value, SI prefix,
//! and unit.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use owon_ble::{BleTransport, DeviceSession, DiscoveryCoordinator, Result, DEVICE_NAME};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     // Find the first advertising multimeter
//!     let coordinator = DiscoveryCoordinator::new().await?;
//!     let device = coordinator
//!         .discover(|name| name == DEVICE_NAME, Duration::from_secs(30))
//!         .await?;
//!
//!     let transport = BleTransport::new(coordinator.adapter().clone(), device.peripheral);
//!     let session = DeviceSession::new(device.address, transport, true);
//!
//!     let mut measurements = session.subscribe_measurements();
//!     tokio::spawn(async move {
//!         while let Ok(event) = measurements.recv().await {
//!             println!("{}", event.measurement);
//!         }
//!     });
//!
//!     session.run().await
//! }
//! ```
//!
//! ## Platform Notes
//!
//! ### macOS
//! Requires Bluetooth permission. Add `NSBluetoothAlwaysUsageDescription`
//! to your Info.plist for bundled apps.
//!
//! ### Linux
//! Requires BlueZ. User may need to be in the `bluetooth` group.
//!
//! ### Windows
//! Requires Windows 10 or later with Bluetooth LE support.
//!
//! ## Feature Flags
//!
//! - `serde`: Enable serialization/deserialization for data types

// Public modules
pub mod ble;
pub mod data;
pub mod error;
pub mod format;
pub mod protocol;
pub mod session;

// Re-exports for convenience
pub use error::{Error, Result};
pub use format::{MeasurementFormatter, OutputEncoding};
pub use session::{
    DeviceSession, MeasurementEvent, SessionEvent, SessionState, SessionTransport, TransportEvent,
};

// Re-export commonly used types from submodules
pub use ble::scanner::{DiscoveredDevice, DiscoveryCoordinator};
pub use ble::transport::BleTransport;
pub use ble::uuids::{DEVICE_NAME, MEASUREMENT_CHARACTERISTIC_UUID, MEASUREMENT_SERVICE_UUID};
pub use data::{DeviceAddress, Function, Mantissa, Measurement};
pub use protocol::{decode, MIN_FRAME_LEN};
