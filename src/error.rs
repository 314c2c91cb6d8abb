//! Error types for the owon-ble crate.

use thiserror::Error;

/// The main error type for this crate.
#[derive(Error, Debug)]
pub enum Error {
    /// Bluetooth-related error from the underlying BLE library.
    #[error("Bluetooth error: {0}")]
    Bluetooth(#[from] btleplug::Error),

    /// Bluetooth is not available or is disabled on this system.
    #[error("Bluetooth not available or disabled")]
    BluetoothUnavailable,

    /// No matching multimeter was discovered within the scan window.
    #[error("No multimeter found within {timeout:?}")]
    DiscoveryTimeout {
        /// How long the scan ran before giving up.
        timeout: std::time::Duration,
    },

    /// Failed to establish a connection to the multimeter.
    #[error("Connection failed: {reason}")]
    ConnectionFailed {
        /// Description of why the connection failed.
        reason: String,
    },

    /// The measurement service is absent; the device is not the expected model.
    #[error("Service not found: {uuid}")]
    ServiceNotFound {
        /// The UUID of the service that was not found.
        uuid: String,
    },

    /// The measurement characteristic is absent from the measurement service.
    #[error("Characteristic not found: {uuid}")]
    CharacteristicNotFound {
        /// The UUID of the characteristic that was not found.
        uuid: String,
    },

    /// Enabling notifications on the measurement characteristic failed.
    #[error("Subscription failed: {reason}")]
    SubscriptionFailed {
        /// Description of why the subscription failed.
        reason: String,
    },

    /// A notification frame was too short to decode.
    #[error("Malformed frame: {length} bytes (need at least {minimum})")]
    MalformedFrame {
        /// The length of the rejected frame.
        length: usize,
        /// The minimum frame length accepted by the decoder.
        minimum: usize,
    },

    /// A frame carried an order index outside the populated prefix table.
    #[error("Order index {index} outside supported range")]
    OutOfRangeOrder {
        /// The decoded order index.
        index: i8,
    },

    /// The requested output encoding has no implementation.
    #[error("Output format not supported: {format}")]
    UnsupportedFormat {
        /// The name of the requested encoding.
        format: String,
    },

    /// An internal error occurred.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for this crate.
pub type Result<T> = std::result::Result<T, Error>;
