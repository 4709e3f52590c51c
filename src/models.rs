use std::fmt;

use time::OffsetDateTime;

use crate::utils::format_timestamp;

/// A physical quantity sampled by the station
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Quantity {
    BarometerTemperature,
    Pressure,
    Altitude,
    HygrometerTemperature,
    Humidity,
    Illuminance,
    CpuTemperature,
    CpuUsage,
    MemoryUsage,
}

impl Quantity {
    pub const ALL: [Quantity; 9] = [
        Quantity::BarometerTemperature,
        Quantity::Pressure,
        Quantity::Altitude,
        Quantity::HygrometerTemperature,
        Quantity::Humidity,
        Quantity::Illuminance,
        Quantity::CpuTemperature,
        Quantity::CpuUsage,
        Quantity::MemoryUsage,
    ];

    /// Column name in the log header
    pub fn column(self) -> &'static str {
        match self {
            Quantity::BarometerTemperature => "BMP_Temperature_C",
            Quantity::Pressure => "BMP_Pressure_hPa",
            Quantity::Altitude => "BMP_Altitude_m",
            Quantity::HygrometerTemperature => "DHT_Temperature_C",
            Quantity::Humidity => "DHT_Humidity_percent",
            Quantity::Illuminance => "BH1750_Light_lx",
            Quantity::CpuTemperature => "CPU_Temperature_C",
            Quantity::CpuUsage => "CPU_Usage_percent",
            Quantity::MemoryUsage => "Memory_Usage_percent",
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            Quantity::BarometerTemperature
            | Quantity::HygrometerTemperature
            | Quantity::CpuTemperature => "°C",
            Quantity::Pressure => "hPa",
            Quantity::Altitude => "m",
            Quantity::Humidity | Quantity::CpuUsage | Quantity::MemoryUsage => "%",
            Quantity::Illuminance => "lx",
        }
    }

    pub fn group(self) -> SensorGroup {
        match self {
            Quantity::CpuTemperature | Quantity::CpuUsage | Quantity::MemoryUsage => {
                SensorGroup::System
            }
            _ => SensorGroup::Weather,
        }
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Quantity::BarometerTemperature => "barometer temperature",
            Quantity::Pressure => "pressure",
            Quantity::Altitude => "altitude",
            Quantity::HygrometerTemperature => "hygrometer temperature",
            Quantity::Humidity => "humidity",
            Quantity::Illuminance => "illuminance",
            Quantity::CpuTemperature => "CPU temperature",
            Quantity::CpuUsage => "CPU usage",
            Quantity::MemoryUsage => "memory usage",
        };
        f.write_str(name)
    }
}

/// The two record groups, each backed by its own log file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorGroup {
    Weather,
    System,
}

impl SensorGroup {
    pub fn quantities(self) -> &'static [Quantity] {
        match self {
            SensorGroup::Weather => &[
                Quantity::BarometerTemperature,
                Quantity::Pressure,
                Quantity::Altitude,
                Quantity::HygrometerTemperature,
                Quantity::Humidity,
                Quantity::Illuminance,
            ],
            SensorGroup::System => &[
                Quantity::CpuTemperature,
                Quantity::CpuUsage,
                Quantity::MemoryUsage,
            ],
        }
    }

    /// Fixed header row: timestamp followed by the group's columns in order
    pub fn header(self) -> Vec<&'static str> {
        std::iter::once("Timestamp")
            .chain(self.quantities().iter().map(|q| q.column()))
            .collect()
    }
}

impl fmt::Display for SensorGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SensorGroup::Weather => f.write_str("weather"),
            SensorGroup::System => f.write_str("system"),
        }
    }
}

/// One value of a quantity, or an explicit marker that none could be obtained
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Reading {
    Available(f64),
    Unavailable,
}

impl Reading {
    /// Non-finite values never enter a window as numbers.
    pub fn from_value(value: f64) -> Self {
        if value.is_finite() {
            Reading::Available(value)
        } else {
            Reading::Unavailable
        }
    }

    pub fn value(self) -> Option<f64> {
        match self {
            Reading::Available(v) => Some(v),
            Reading::Unavailable => None,
        }
    }
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reading::Available(v) => fmt::Display::fmt(v, f),
            Reading::Unavailable => f.write_str("nan"),
        }
    }
}

/// One timestamped, median-reduced row for a sensor group
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateRecord {
    pub group: SensorGroup,
    pub timestamp: OffsetDateTime,
    /// Aligned with `group.quantities()`
    pub values: Vec<Reading>,
    /// Number of read rounds the window went through
    pub samples: usize,
}

impl AggregateRecord {
    pub fn get(&self, quantity: Quantity) -> Reading {
        self.group
            .quantities()
            .iter()
            .position(|q| *q == quantity)
            .and_then(|i| self.values.get(i).copied())
            .unwrap_or(Reading::Unavailable)
    }

    /// Row fields in header order
    pub fn row(&self) -> Vec<String> {
        std::iter::once(format_timestamp(&self.timestamp))
            .chain(self.values.iter().map(|r| r.to_string()))
            .collect()
    }
}

/// Result of offering one artifact to the remote archive
#[derive(Debug, Clone, PartialEq)]
pub enum TransferOutcome {
    /// Copy acknowledged; the local copy may be deleted
    Confirmed { attempts: u32 },
    /// Gave up early on a local fault; the next cycle tries again
    Failed { attempts: u32, reason: String },
    /// Every attempt failed
    Exhausted { attempts: u32, last_error: String },
}

impl TransferOutcome {
    pub fn is_confirmed(&self) -> bool {
        matches!(self, TransferOutcome::Confirmed { .. })
    }
}

impl fmt::Display for TransferOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransferOutcome::Confirmed { attempts } => {
                write!(f, "confirmed after {} attempt(s)", attempts)
            }
            TransferOutcome::Failed { attempts, reason } => {
                write!(f, "failed after {} attempt(s): {}", attempts, reason)
            }
            TransferOutcome::Exhausted {
                attempts,
                last_error,
            } => write!(f, "exhausted after {} attempts: {}", attempts, last_error),
        }
    }
}
