pub mod host;
pub mod iio;

use crate::error::SensorError;
use crate::models::{Quantity, SensorGroup};

pub use host::HostMetrics;
pub use iio::IioWeatherSensors;

/// Source of raw readings, one quantity at a time
///
/// A read either yields a value or fails; callers decide what a failure
/// means for the record being built.
pub trait SensorSuite {
    fn read(&mut self, quantity: Quantity) -> Result<f64, SensorError>;
}

/// The station's weather sensors and host metrics behind one suite
pub struct StationSensors {
    weather: IioWeatherSensors,
    host: HostMetrics,
}

impl StationSensors {
    pub fn new(weather: IioWeatherSensors, host: HostMetrics) -> Self {
        Self { weather, host }
    }
}

impl SensorSuite for StationSensors {
    fn read(&mut self, quantity: Quantity) -> Result<f64, SensorError> {
        match quantity.group() {
            SensorGroup::Weather => self.weather.read(quantity),
            SensorGroup::System => self.host.read(quantity),
        }
    }
}
