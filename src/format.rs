//! Output formatting for measurement records.
//!
//! One encoding is chosen at configuration time and applied uniformly to
//! the whole stream. Unimplemented encodings fail when the formatter is
//! built, never at first emission.

use chrono::{DateTime, Utc};

use crate::data::{DeviceAddress, Measurement};
use crate::error::{Error, Result};

/// Output encoding for the measurement stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputEncoding {
    /// Legible space-separated output.
    #[default]
    Default,
    /// Semicolon-separated values, suitable for piping to a plotter.
    Csv,
    /// JSON records. Not implemented yet.
    Json,
}

/// Formats measurement records in a fixed encoding.
#[derive(Debug, Clone, Copy)]
pub struct MeasurementFormatter {
    encoding: OutputEncoding,
}

impl MeasurementFormatter {
    /// Build a formatter for an encoding.
    ///
    /// Fails with [`Error::UnsupportedFormat`] for encodings that have no
    /// implementation, so misconfiguration surfaces before any transport
    /// activity starts.
    pub fn new(encoding: OutputEncoding) -> Result<Self> {
        match encoding {
            OutputEncoding::Default | OutputEncoding::Csv => Ok(Self { encoding }),
            OutputEncoding::Json => Err(Error::UnsupportedFormat {
                format: "json".to_string(),
            }),
        }
    }

    /// The encoding this formatter applies.
    pub fn encoding(&self) -> OutputEncoding {
        self.encoding
    }

    /// Format one measurement record.
    pub fn format(
        &self,
        address: &DeviceAddress,
        timestamp: DateTime<Utc>,
        measurement: &Measurement,
    ) -> String {
        match self.encoding {
            OutputEncoding::Csv => format!(
                "{};{:?};{};{};{}",
                address,
                epoch_seconds(timestamp),
                measurement.function,
                measurement.value_string(),
                measurement.unit().unwrap_or("")
            ),
            OutputEncoding::Default => format!(
                "{} {} {} {} {}",
                address,
                timestamp,
                measurement.function,
                measurement.value_string(),
                measurement.unit().unwrap_or("")
            ),
            // Rejected in new()
            OutputEncoding::Json => unreachable!("json formatter is not implemented"),
        }
    }
}

/// Unix timestamp as fractional seconds.
fn epoch_seconds(timestamp: DateTime<Utc>) -> f64 {
    timestamp.timestamp() as f64 + timestamp.timestamp_subsec_nanos() as f64 / 1e9
}
