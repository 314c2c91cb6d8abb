//! Measurement data structures.
//!
//! Contains the types a decoded notification frame is turned into: the
//! active measurement mode, the exact decimal mantissa, and the combined
//! [`Measurement`] value.

use std::fmt;

use crate::error::{Error, Result};

/// The multimeter's active measurement mode.
///
/// Decoded from the 4-bit function index carried in each frame. The index
/// space is total: all 16 values map to a variant, including the slots the
/// hardware does not currently use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Function {
    /// DC voltage.
    VoltageDc,
    /// AC voltage.
    VoltageAc,
    /// DC current.
    CurrentDc,
    /// AC current.
    CurrentAc,
    /// Resistance.
    Resistance,
    /// Capacitance.
    Capacitance,
    /// Frequency.
    Frequency,
    /// Duty cycle.
    DutyCycle,
    /// Temperature in degrees Celsius.
    TemperatureCelsius,
    /// Temperature in degrees Fahrenheit.
    TemperatureFahrenheit,
    /// Diode test.
    Diode,
    /// Continuity test.
    Continuity,
    /// Reserved slot 12.
    Unknown12,
    /// Non-contact voltage detection.
    Ncv,
    /// Reserved slot 14.
    Unknown14,
    /// Reserved slot 15.
    Unknown15,
}

impl Function {
    /// Look up the function for a 4-bit index.
    ///
    /// The index is masked to 4 bits, so this is total over all inputs.
    pub fn from_index(index: u8) -> Self {
        match index & 0x0F {
            0 => Self::VoltageDc,
            1 => Self::VoltageAc,
            2 => Self::CurrentDc,
            3 => Self::CurrentAc,
            4 => Self::Resistance,
            5 => Self::Capacitance,
            6 => Self::Frequency,
            7 => Self::DutyCycle,
            8 => Self::TemperatureCelsius,
            9 => Self::TemperatureFahrenheit,
            10 => Self::Diode,
            11 => Self::Continuity,
            12 => Self::Unknown12,
            13 => Self::Ncv,
            14 => Self::Unknown14,
            _ => Self::Unknown15,
        }
    }

    /// Human-readable name, as shown on the meter's display.
    pub fn label(&self) -> &'static str {
        match self {
            Self::VoltageDc => "Voltage DC",
            Self::VoltageAc => "Voltage AC",
            Self::CurrentDc => "Current DC",
            Self::CurrentAc => "Current AC",
            Self::Resistance => "Resistance",
            Self::Capacitance => "Capacitance",
            Self::Frequency => "Frequency",
            Self::DutyCycle => "Duty Cycle",
            Self::TemperatureCelsius => "Temperature Celsius",
            Self::TemperatureFahrenheit => "Temperature Fahrenheit",
            Self::Diode => "Diode",
            Self::Continuity => "Continuity",
            Self::Unknown12 => "Unknown #12",
            Self::Ncv => "NCV",
            Self::Unknown14 => "Unknown #14",
            Self::Unknown15 => "Unknown #15",
        }
    }

    /// Unit symbol for this function.
    ///
    /// `None` for modes without a unit (diode/continuity readouts aside,
    /// the reserved slots) and is an expected state, not an error.
    pub fn unit(&self) -> Option<&'static str> {
        match self {
            Self::VoltageDc | Self::VoltageAc | Self::Diode => Some("V"),
            Self::CurrentDc | Self::CurrentAc => Some("A"),
            Self::Resistance | Self::Continuity => Some("Ohm"),
            Self::Capacitance => Some("F"),
            Self::Frequency => Some("Hz"),
            Self::DutyCycle => Some("%"),
            Self::TemperatureCelsius => Some("°C"),
            Self::TemperatureFahrenheit => Some("°F"),
            Self::Unknown12 | Self::Ncv | Self::Unknown14 | Self::Unknown15 => None,
        }
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// SI prefix for an order index, or `None` if the index is unpopulated.
///
/// Order indices −4 and +3 exist in the wire encoding but are never emitted
/// by real hardware; they must surface as a decode error, not a panic.
pub fn si_prefix(order_index: i8) -> Option<&'static str> {
    match order_index {
        0 => Some(""),
        1 => Some("k"),
        2 => Some("M"),
        -3 => Some("n"),
        -2 => Some("u"),
        -1 => Some("m"),
        _ => None,
    }
}

/// Exact decimal magnitude of a reading, before scaling by the order.
///
/// Stored as a scaled integer `digits / 10^scale` so that display never
/// round-trips through binary floating point. The hardware emits a signed
/// 15-bit magnitude and a decimal-point position of 0–7 digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Mantissa {
    digits: i32,
    scale: u8,
}

impl Mantissa {
    /// Maximum decimal-point position the frame encoding can carry.
    pub const MAX_SCALE: u8 = 7;

    /// Create a mantissa from signed digits and a decimal-point position.
    pub fn new(digits: i32, scale: u8) -> Self {
        Self {
            digits,
            scale: scale.min(Self::MAX_SCALE),
        }
    }

    /// The signed integer digits.
    pub fn digits(&self) -> i32 {
        self.digits
    }

    /// Number of digits after the decimal point.
    pub fn scale(&self) -> u8 {
        self.scale
    }

    /// Whether the reading is negative.
    pub fn is_negative(&self) -> bool {
        self.digits < 0
    }

    /// Approximate value as an f64, for numeric consumers.
    pub fn to_f64(&self) -> f64 {
        self.digits as f64 / 10f64.powi(self.scale as i32)
    }
}

impl fmt::Display for Mantissa {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.digits < 0 { "-" } else { "" };
        let magnitude = self.digits.unsigned_abs();
        if self.scale == 0 {
            write!(f, "{sign}{magnitude}")
        } else {
            let divisor = 10u32.pow(self.scale as u32);
            write!(
                f,
                "{sign}{}.{:0width$}",
                magnitude / divisor,
                magnitude % divisor,
                width = self.scale as usize
            )
        }
    }
}

/// Opaque transport-layer identifier for one multimeter (typically a MAC).
///
/// Keys a session and groups readings for downstream consumers plotting
/// multiple devices.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DeviceAddress(String);

impl DeviceAddress {
    /// Wrap a transport identifier.
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    /// The identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for DeviceAddress {
    fn from(address: &str) -> Self {
        Self(address.to_string())
    }
}

impl From<String> for DeviceAddress {
    fn from(address: String) -> Self {
        Self(address)
    }
}

impl fmt::Display for DeviceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One decoded reading from the multimeter.
///
/// Produced once per notification frame and consumed immediately by the
/// formatter; the core never retains history. `order` and `prefix` are
/// always a consistent pair and can only be set together through
/// [`Measurement::from_parts`]; the unit is derived from the function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Measurement {
    /// The active measurement mode.
    pub function: Function,
    /// Exact decimal magnitude before scaling by the order.
    pub mantissa: Mantissa,
    order: i32,
    prefix: &'static str,
}

impl Measurement {
    /// Build a measurement from its decoded parts.
    ///
    /// Derives the power-of-ten order and the SI prefix together from the
    /// signed order index. Fails with [`Error::OutOfRangeOrder`] for order
    /// indices outside the populated prefix table.
    pub fn from_parts(function: Function, mantissa: Mantissa, order_index: i8) -> Result<Self> {
        let prefix = si_prefix(order_index).ok_or(Error::OutOfRangeOrder { index: order_index })?;
        Ok(Self {
            function,
            mantissa,
            order: 3 * order_index as i32,
            prefix,
        })
    }

    /// Power-of-ten exponent applied to the mantissa.
    pub fn order(&self) -> i32 {
        self.order
    }

    /// SI prefix matching the order (`""`, `"k"`, `"M"`, `"n"`, `"u"`, `"m"`).
    pub fn prefix(&self) -> &'static str {
        self.prefix
    }

    /// Unit symbol for the active function, if it has one.
    pub fn unit(&self) -> Option<&'static str> {
        self.function.unit()
    }

    /// Physical value as an f64: `mantissa × 10^order`.
    pub fn value(&self) -> f64 {
        self.mantissa.to_f64() * 10f64.powi(self.order)
    }

    /// Physical value rendered as an exact decimal string.
    ///
    /// Shifts the mantissa digits by `order − scale` instead of going
    /// through f64, so output carries no binary rounding artifacts.
    pub fn value_string(&self) -> String {
        let exponent = self.order - self.mantissa.scale() as i32;
        let sign = if self.mantissa.is_negative() { "-" } else { "" };
        let magnitude = self.mantissa.digits().unsigned_abs() as u64;
        if exponent >= 0 {
            let shifted = magnitude * 10u64.pow(exponent as u32);
            format!("{sign}{shifted}")
        } else {
            let divisor = 10u64.pow((-exponent) as u32);
            format!(
                "{sign}{}.{:0width$}",
                magnitude / divisor,
                magnitude % divisor,
                width = (-exponent) as usize
            )
        }
    }
}

impl fmt::Display for Measurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.unit() {
            Some(unit) => write!(
                f,
                "{} {}{} ({})",
                self.mantissa, self.prefix, unit, self.function
            ),
            None => write!(f, "{} * 10^{} ({})", self.mantissa, self.order, self.function),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_function_table_total() {
        // Every 4-bit index maps to a variant without panicking.
        for index in 0u8..=15 {
            let _ = Function::from_index(index).label();
            let _ = Function::from_index(index).unit();
        }
        // High bits are masked off.
        assert_eq!(Function::from_index(16), Function::VoltageDc);
        assert_eq!(Function::from_index(0xFF), Function::Unknown15);
    }

    #[test]
    fn test_function_labels_and_units() {
        let expected: [(&str, Option<&str>); 16] = [
            ("Voltage DC", Some("V")),
            ("Voltage AC", Some("V")),
            ("Current DC", Some("A")),
            ("Current AC", Some("A")),
            ("Resistance", Some("Ohm")),
            ("Capacitance", Some("F")),
            ("Frequency", Some("Hz")),
            ("Duty Cycle", Some("%")),
            ("Temperature Celsius", Some("°C")),
            ("Temperature Fahrenheit", Some("°F")),
            ("Diode", Some("V")),
            ("Continuity", Some("Ohm")),
            ("Unknown #12", None),
            ("NCV", None),
            ("Unknown #14", None),
            ("Unknown #15", None),
        ];
        for (index, (label, unit)) in expected.iter().enumerate() {
            let function = Function::from_index(index as u8);
            assert_eq!(function.label(), *label);
            assert_eq!(function.unit(), *unit);
        }
    }

    #[test]
    fn test_si_prefix_table() {
        assert_eq!(si_prefix(0), Some(""));
        assert_eq!(si_prefix(1), Some("k"));
        assert_eq!(si_prefix(2), Some("M"));
        assert_eq!(si_prefix(-1), Some("m"));
        assert_eq!(si_prefix(-2), Some("u"));
        assert_eq!(si_prefix(-3), Some("n"));
        assert_eq!(si_prefix(-4), None);
        assert_eq!(si_prefix(3), None);
    }

    #[test]
    fn test_mantissa_display() {
        assert_eq!(Mantissa::new(1, 2).to_string(), "0.01");
        assert_eq!(Mantissa::new(-15, 1).to_string(), "-1.5");
        assert_eq!(Mantissa::new(12345, 0).to_string(), "12345");
        assert_eq!(Mantissa::new(5, 3).to_string(), "0.005");
        assert_eq!(Mantissa::new(0, 2).to_string(), "0.00");
    }

    #[test]
    fn test_mantissa_to_f64() {
        assert!((Mantissa::new(1, 2).to_f64() - 0.01).abs() < 1e-12);
        assert!((Mantissa::new(-1234, 3).to_f64() + 1.234).abs() < 1e-12);
    }

    #[test]
    fn test_measurement_order_prefix_pair() {
        let mantissa = Mantissa::new(1234, 3);
        let cases = [(0, 0, ""), (1, 3, "k"), (2, 6, "M"), (-1, -3, "m"), (-2, -6, "u"), (-3, -9, "n")];
        for (index, order, prefix) in cases {
            let m = Measurement::from_parts(Function::VoltageDc, mantissa, index).unwrap();
            assert_eq!(m.order(), order);
            assert_eq!(m.prefix(), prefix);
        }
    }

    #[test]
    fn test_measurement_rejects_unpopulated_order() {
        let mantissa = Mantissa::new(1, 0);
        for index in [-4, 3] {
            let err = Measurement::from_parts(Function::VoltageDc, mantissa, index).unwrap_err();
            assert!(matches!(err, Error::OutOfRangeOrder { index: i } if i == index));
        }
    }

    #[test]
    fn test_value_string_exact() {
        let m = Measurement::from_parts(Function::VoltageDc, Mantissa::new(1, 2), 0).unwrap();
        assert_eq!(m.value_string(), "0.01");

        // 1.234 kOhm = 1234 Ohm
        let m = Measurement::from_parts(Function::Resistance, Mantissa::new(1234, 3), 1).unwrap();
        assert_eq!(m.value_string(), "1234");

        // 123.4 mV = 0.1234 V
        let m = Measurement::from_parts(Function::VoltageDc, Mantissa::new(1234, 1), -1).unwrap();
        assert_eq!(m.value_string(), "0.1234");

        // -56.7 uA = -0.0000567 A
        let m = Measurement::from_parts(Function::CurrentDc, Mantissa::new(-567, 1), -2).unwrap();
        assert_eq!(m.value_string(), "-0.0000567");
    }

    #[test]
    fn test_measurement_display() {
        let m = Measurement::from_parts(Function::VoltageDc, Mantissa::new(1, 2), 0).unwrap();
        assert_eq!(m.to_string(), "0.01 V (Voltage DC)");

        let m = Measurement::from_parts(Function::Resistance, Mantissa::new(1234, 3), 1).unwrap();
        assert_eq!(m.to_string(), "1.234 kOhm (Resistance)");

        let m = Measurement::from_parts(Function::Ncv, Mantissa::new(5, 0), 0).unwrap();
        assert_eq!(m.to_string(), "5 * 10^0 (NCV)");
    }

    #[test]
    fn test_device_address() {
        let address = DeviceAddress::from("AA:BB:CC:DD:EE:FF");
        assert_eq!(address.as_str(), "AA:BB:CC:DD:EE:FF");
        assert_eq!(address.to_string(), "AA:BB:CC:DD:EE:FF");
    }
}
