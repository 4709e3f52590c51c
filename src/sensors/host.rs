/// Host health readouts: processor temperature, load and memory use
use std::path::PathBuf;

use sysinfo::System;

use crate::config::SensorSettings;
use crate::error::SensorError;
use crate::models::Quantity;

use super::iio::read_attribute;
use super::SensorSuite;

pub struct HostMetrics {
    system: System,
    thermal_zone: PathBuf,
}

impl HostMetrics {
    pub fn new(settings: &SensorSettings) -> Self {
        let mut system = System::new();
        // CPU usage is a delta between refreshes; prime it so the first
        // reading is not a spurious 0%.
        system.refresh_cpu();
        system.refresh_memory();
        Self {
            system,
            thermal_zone: settings.cpu_thermal_zone.clone(),
        }
    }
}

impl SensorSuite for HostMetrics {
    fn read(&mut self, quantity: Quantity) -> Result<f64, SensorError> {
        match quantity {
            // millidegrees Celsius
            Quantity::CpuTemperature => Ok(read_attribute(&self.thermal_zone)? / 1000.0),
            Quantity::CpuUsage => {
                self.system.refresh_cpu();
                Ok(self.system.global_cpu_info().cpu_usage() as f64)
            }
            Quantity::MemoryUsage => {
                self.system.refresh_memory();
                let total = self.system.total_memory();
                if total == 0 {
                    return Err(SensorError::NotConfigured(quantity));
                }
                Ok(self.system.used_memory() as f64 / total as f64 * 100.0)
            }
            _ => Err(SensorError::NotConfigured(quantity)),
        }
    }
}
