//! BLE Service and Characteristic UUIDs.
//!
//! Contains the well-known identifiers used for OWON multimeter
//! communication. The core treats these as opaque constants.

use uuid::Uuid;

/// Advertised local name of OWON BDM-series multimeters.
pub const DEVICE_NAME: &str = "BDM";

/// Measurement service UUID.
pub const MEASUREMENT_SERVICE_UUID: Uuid = Uuid::from_u128(0x0000_fff0_0000_1000_8000_00805f9b34fb);

/// Measurement characteristic UUID (Notify) within the measurement service.
pub const MEASUREMENT_CHARACTERISTIC_UUID: Uuid =
    Uuid::from_u128(0x0000_fff4_0000_1000_8000_00805f9b34fb);

/// Check if a service UUID is the multimeter's measurement service.
pub fn is_measurement_service(uuid: &Uuid) -> bool {
    *uuid == MEASUREMENT_SERVICE_UUID
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uuid_format() {
        assert_eq!(
            MEASUREMENT_SERVICE_UUID.to_string(),
            "0000fff0-0000-1000-8000-00805f9b34fb"
        );
        assert_eq!(
            MEASUREMENT_CHARACTERISTIC_UUID.to_string(),
            "0000fff4-0000-1000-8000-00805f9b34fb"
        );
    }

    #[test]
    fn test_is_measurement_service() {
        assert!(is_measurement_service(&MEASUREMENT_SERVICE_UUID));
        assert!(!is_measurement_service(&MEASUREMENT_CHARACTERISTIC_UUID));
    }
}
