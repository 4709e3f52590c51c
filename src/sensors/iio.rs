/// Weather sensors exposed by the kernel's Industrial I/O drivers
///
/// The barometer (bmp085/bmp180), hygrometer (dht11) and light sensor
/// (bh1750) drivers publish their channels as sysfs attributes. Each device
/// directory is configured up front; an unconfigured device makes its
/// quantities unavailable rather than failing the station.
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::SensorSettings;
use crate::error::SensorError;
use crate::models::Quantity;

use super::SensorSuite;

pub struct IioWeatherSensors {
    barometer: Option<PathBuf>,
    hygrometer: Option<PathBuf>,
    light: Option<PathBuf>,
    sea_level_pressure_pa: f64,
}

impl IioWeatherSensors {
    pub fn new(settings: &SensorSettings) -> Self {
        Self {
            barometer: settings.barometer.clone(),
            hygrometer: settings.hygrometer.clone(),
            light: settings.light.clone(),
            sea_level_pressure_pa: settings.sea_level_pressure_pa,
        }
    }

    fn device(&self, quantity: Quantity) -> Result<&Path, SensorError> {
        let device = match quantity {
            Quantity::BarometerTemperature | Quantity::Pressure | Quantity::Altitude => {
                self.barometer.as_deref()
            }
            Quantity::HygrometerTemperature | Quantity::Humidity => self.hygrometer.as_deref(),
            Quantity::Illuminance => self.light.as_deref(),
            _ => None,
        };
        device.ok_or(SensorError::NotConfigured(quantity))
    }

    /// Station pressure in pascal; the driver reports kilopascal
    fn pressure_pa(&self, device: &Path) -> Result<f64, SensorError> {
        Ok(read_attribute(&device.join("in_pressure_input"))? * 1000.0)
    }
}

impl SensorSuite for IioWeatherSensors {
    fn read(&mut self, quantity: Quantity) -> Result<f64, SensorError> {
        let device = self.device(quantity)?;
        match quantity {
            Quantity::BarometerTemperature | Quantity::HygrometerTemperature => {
                // millidegrees Celsius
                Ok(read_attribute(&device.join("in_temp_input"))? / 1000.0)
            }
            Quantity::Pressure => Ok(self.pressure_pa(device)? / 100.0),
            Quantity::Altitude => Ok(altitude_m(
                self.pressure_pa(device)?,
                self.sea_level_pressure_pa,
            )),
            // milli-percent relative humidity
            Quantity::Humidity => {
                Ok(read_attribute(&device.join("in_humidityrelative_input"))? / 1000.0)
            }
            Quantity::Illuminance => {
                let raw = read_attribute(&device.join("in_illuminance_raw"))?;
                let scale_path = device.join("in_illuminance_scale");
                let scale = if scale_path.exists() {
                    read_attribute(&scale_path)?
                } else {
                    1.0
                };
                Ok(raw * scale)
            }
            _ => Err(SensorError::NotConfigured(quantity)),
        }
    }
}

/// International barometric formula
pub fn altitude_m(pressure_pa: f64, sea_level_pa: f64) -> f64 {
    44_330.0 * (1.0 - (pressure_pa / sea_level_pa).powf(1.0 / 5.255))
}

/// Read one numeric sysfs attribute
pub(crate) fn read_attribute(path: &Path) -> Result<f64, SensorError> {
    let text = fs::read_to_string(path).map_err(|source| SensorError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    text.trim().parse::<f64>().map_err(|_| SensorError::Parse {
        path: path.to_path_buf(),
        value: text.trim().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StationConfig;
    use tempfile::TempDir;

    fn device(files: &[(&str, &str)]) -> TempDir {
        let dir = TempDir::new().expect("Failed to create temp directory");
        for (name, value) in files {
            fs::write(dir.path().join(name), value).unwrap();
        }
        dir
    }

    fn sensors(
        barometer: Option<&TempDir>,
        hygrometer: Option<&TempDir>,
        light: Option<&TempDir>,
    ) -> IioWeatherSensors {
        let mut settings = StationConfig::default().sensors;
        settings.barometer = barometer.map(|d| d.path().to_path_buf());
        settings.hygrometer = hygrometer.map(|d| d.path().to_path_buf());
        settings.light = light.map(|d| d.path().to_path_buf());
        IioWeatherSensors::new(&settings)
    }

    #[test]
    fn barometer_channels_are_scaled() {
        let baro = device(&[("in_temp_input", "21500\n"), ("in_pressure_input", "101.325\n")]);
        let mut suite = sensors(Some(&baro), None, None);

        assert_eq!(suite.read(Quantity::BarometerTemperature).unwrap(), 21.5);
        assert!((suite.read(Quantity::Pressure).unwrap() - 1013.25).abs() < 1e-9);
        assert!(suite.read(Quantity::Altitude).unwrap().abs() < 1e-6);
    }

    #[test]
    fn hygrometer_and_light_channels() {
        let hygro = device(&[
            ("in_temp_input", "19000"),
            ("in_humidityrelative_input", "55250"),
        ]);
        let light = device(&[("in_illuminance_raw", "200"), ("in_illuminance_scale", "0.5")]);
        let mut suite = sensors(None, Some(&hygro), Some(&light));

        assert_eq!(suite.read(Quantity::HygrometerTemperature).unwrap(), 19.0);
        assert_eq!(suite.read(Quantity::Humidity).unwrap(), 55.25);
        assert_eq!(suite.read(Quantity::Illuminance).unwrap(), 100.0);
    }

    #[test]
    fn unconfigured_and_broken_devices_fail_the_read() {
        let hygro = device(&[("in_temp_input", "garbage")]);
        let mut suite = sensors(None, Some(&hygro), None);

        assert!(matches!(
            suite.read(Quantity::Pressure),
            Err(SensorError::NotConfigured(Quantity::Pressure))
        ));
        assert!(matches!(
            suite.read(Quantity::HygrometerTemperature),
            Err(SensorError::Parse { .. })
        ));
        assert!(matches!(
            suite.read(Quantity::Humidity),
            Err(SensorError::Io { .. })
        ));
    }

    #[test]
    fn altitude_decreases_with_pressure() {
        let low = altitude_m(101_325.0, 101_325.0);
        let high = altitude_m(90_000.0, 101_325.0);
        assert!(low.abs() < 1e-9);
        assert!(high > 900.0 && high < 1100.0);
    }
}
