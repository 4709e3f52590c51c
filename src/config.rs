use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use log::info;

use crate::error::ConfigError;
use crate::utils::parse_seconds;

/// Where aggregated records and captured images live locally
#[derive(Debug, Clone)]
pub struct StorageSettings {
    pub weather_log: PathBuf,
    pub system_log: PathBuf,
    pub image_dir: PathBuf,
}

/// Remote archive and copy-primitive settings
#[derive(Debug, Clone)]
pub struct TransferSettings {
    /// `user@host` of the archive
    pub remote_host: String,
    pub remote_base: String,
    pub program: String,
    pub bandwidth_limit_kbit: u32,
    pub connect_timeout: Duration,
    /// Hard ceiling on one copy attempt, including the data transfer
    pub attempt_timeout: Duration,
    pub max_retries: u32,
    pub backoff: Duration,
    /// At most this many of the newest images are offered per cycle
    pub max_image_files: usize,
}

#[derive(Debug, Clone)]
pub struct SamplingSettings {
    pub window_duration: Duration,
    pub sample_interval: Duration,
}

#[derive(Debug, Clone)]
pub struct ScheduleSettings {
    pub transfer_interval: Duration,
    pub retention_interval: Duration,
    /// Pause after a transient loop error
    pub error_pause: Duration,
}

/// Sysfs locations of the sensor drivers
#[derive(Debug, Clone)]
pub struct SensorSettings {
    pub barometer: Option<PathBuf>,
    pub hygrometer: Option<PathBuf>,
    pub light: Option<PathBuf>,
    pub sea_level_pressure_pa: f64,
    pub cpu_thermal_zone: PathBuf,
}

#[derive(Debug, Clone)]
pub struct CaptureSettings {
    pub program: String,
    /// Time the camera gets to settle exposure before the still is taken
    pub warmup: Duration,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct StationConfig {
    pub storage: StorageSettings,
    pub transfer: TransferSettings,
    pub sampling: SamplingSettings,
    pub schedule: ScheduleSettings,
    pub sensors: SensorSettings,
    pub capture: CaptureSettings,
}

impl Default for StationConfig {
    fn default() -> Self {
        StationConfig {
            storage: StorageSettings {
                weather_log: PathBuf::from("weather_data.csv"),
                system_log: PathBuf::from("system_usage.csv"),
                image_dir: PathBuf::from("images"),
            },
            transfer: TransferSettings {
                remote_host: String::new(),
                remote_base: "/media/bigdata/weather_station".to_string(),
                program: "scp".to_string(),
                bandwidth_limit_kbit: 500,
                connect_timeout: Duration::from_secs(10),
                attempt_timeout: Duration::from_secs(120),
                max_retries: 3,
                backoff: Duration::from_secs(5),
                max_image_files: 100,
            },
            sampling: SamplingSettings {
                window_duration: Duration::from_secs(5),
                sample_interval: Duration::from_millis(100),
            },
            schedule: ScheduleSettings {
                transfer_interval: Duration::from_secs(300),
                retention_interval: Duration::from_secs(600),
                error_pause: Duration::from_secs(2),
            },
            sensors: SensorSettings {
                barometer: None,
                hygrometer: None,
                light: None,
                sea_level_pressure_pa: 101_325.0,
                cpu_thermal_zone: PathBuf::from("/sys/class/thermal/thermal_zone0/temp"),
            },
            capture: CaptureSettings {
                program: "rpicam-still".to_string(),
                warmup: Duration::from_millis(2000),
                timeout: Duration::from_secs(30),
            },
        }
    }
}

impl StationConfig {
    /// Build the configuration from the environment (and `.env`, if present)
    /// on top of the defaults.
    pub fn new() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = StationConfig::default();
        let env = Env { lookup: &lookup };

        let storage = &mut config.storage;
        env.path("STATION_WEATHER_LOG", &mut storage.weather_log);
        env.path("STATION_SYSTEM_LOG", &mut storage.system_log);
        env.path("STATION_IMAGE_DIR", &mut storage.image_dir);

        let transfer = &mut config.transfer;
        transfer.remote_host = env
            .string("STATION_REMOTE_HOST")
            .filter(|h| !h.trim().is_empty())
            .ok_or(ConfigError::Missing("STATION_REMOTE_HOST"))?;
        if let Some(base) = env.string("STATION_REMOTE_BASE") {
            transfer.remote_base = base;
        }
        if let Some(program) = env.string("SCP_PROGRAM") {
            transfer.program = program;
        }
        env.parse("SCP_BANDWIDTH_LIMIT_KBIT", &mut transfer.bandwidth_limit_kbit)?;
        env.seconds("SCP_CONNECT_TIMEOUT_SECS", &mut transfer.connect_timeout)?;
        env.seconds("SCP_ATTEMPT_TIMEOUT_SECS", &mut transfer.attempt_timeout)?;
        env.parse("TRANSFER_MAX_RETRIES", &mut transfer.max_retries)?;
        env.seconds("TRANSFER_BACKOFF_SECS", &mut transfer.backoff)?;
        env.parse("MAX_IMAGE_FILES", &mut transfer.max_image_files)?;
        if transfer.max_retries == 0 {
            return Err(ConfigError::Invalid {
                key: "TRANSFER_MAX_RETRIES",
                value: "0".to_string(),
                reason: "at least one attempt is required".to_string(),
            });
        }

        let sampling = &mut config.sampling;
        env.seconds("MEDIAN_SAMPLE_DURATION_SECS", &mut sampling.window_duration)?;
        env.seconds("MEDIAN_SAMPLE_INTERVAL_SECS", &mut sampling.sample_interval)?;

        let schedule = &mut config.schedule;
        env.seconds("TRANSFER_INTERVAL_SECS", &mut schedule.transfer_interval)?;
        env.seconds("RETENTION_INTERVAL_SECS", &mut schedule.retention_interval)?;
        env.seconds("ERROR_PAUSE_SECS", &mut schedule.error_pause)?;

        let sensors = &mut config.sensors;
        sensors.barometer = env.string("BAROMETER_IIO_DEVICE").map(PathBuf::from);
        sensors.hygrometer = env.string("HYGROMETER_IIO_DEVICE").map(PathBuf::from);
        sensors.light = env.string("LIGHT_IIO_DEVICE").map(PathBuf::from);
        env.parse("SEA_LEVEL_PRESSURE_PA", &mut sensors.sea_level_pressure_pa)?;
        env.path("CPU_THERMAL_ZONE", &mut sensors.cpu_thermal_zone);

        let capture = &mut config.capture;
        if let Some(program) = env.string("CAPTURE_PROGRAM") {
            capture.program = program;
        }
        let mut warmup_ms = capture.warmup.as_millis() as u64;
        env.parse("CAPTURE_WARMUP_MS", &mut warmup_ms)?;
        capture.warmup = Duration::from_millis(warmup_ms);
        env.seconds("CAPTURE_TIMEOUT_SECS", &mut capture.timeout)?;

        info!(
            "Archive {}:{}, transfer every {:?}, retention every {:?}",
            config.transfer.remote_host,
            config.transfer.remote_base,
            config.schedule.transfer_interval,
            config.schedule.retention_interval
        );

        Ok(config)
    }
}

struct Env<'a, F> {
    lookup: &'a F,
}

impl<F> Env<'_, F>
where
    F: Fn(&str) -> Option<String>,
{
    fn string(&self, key: &str) -> Option<String> {
        (self.lookup)(key)
    }

    fn path(&self, key: &str, slot: &mut PathBuf) {
        if let Some(value) = self.string(key) {
            *slot = PathBuf::from(value);
        }
    }

    fn parse<T>(&self, key: &'static str, slot: &mut T) -> Result<(), ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        if let Some(value) = self.string(key) {
            *slot = value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
                key,
                value: value.clone(),
                reason: e.to_string(),
            })?;
        }
        Ok(())
    }

    fn seconds(&self, key: &'static str, slot: &mut Duration) -> Result<(), ConfigError> {
        if let Some(value) = self.string(key) {
            *slot = parse_seconds(&value).map_err(|reason| ConfigError::Invalid {
                key,
                value: value.clone(),
                reason,
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_follow_station_policy() {
        let config = StationConfig::from_lookup(lookup(&[(
            "STATION_REMOTE_HOST",
            "archive@example.net",
        )]))
        .unwrap();

        assert_eq!(config.transfer.max_retries, 3);
        assert_eq!(config.transfer.backoff, Duration::from_secs(5));
        assert_eq!(config.transfer.max_image_files, 100);
        assert_eq!(config.transfer.bandwidth_limit_kbit, 500);
        assert_eq!(config.transfer.connect_timeout, Duration::from_secs(10));
        assert_eq!(config.schedule.transfer_interval, Duration::from_secs(300));
        assert_eq!(config.schedule.retention_interval, Duration::from_secs(600));
        assert_eq!(config.sampling.window_duration, Duration::from_secs(5));
        assert_eq!(config.sampling.sample_interval, Duration::from_millis(100));
    }

    #[test]
    fn remote_host_is_required() {
        let err = StationConfig::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("STATION_REMOTE_HOST")));
    }

    #[test]
    fn overrides_are_applied() {
        let config = StationConfig::from_lookup(lookup(&[
            ("STATION_REMOTE_HOST", "pi@archive"),
            ("STATION_WEATHER_LOG", "/data/w.csv"),
            ("TRANSFER_MAX_RETRIES", "5"),
            ("MEDIAN_SAMPLE_INTERVAL_SECS", "0.25"),
            ("RETENTION_INTERVAL_SECS", "3600"),
            ("BAROMETER_IIO_DEVICE", "/sys/bus/iio/devices/iio:device0"),
            ("CAPTURE_WARMUP_MS", "500"),
        ]))
        .unwrap();

        assert_eq!(config.storage.weather_log, PathBuf::from("/data/w.csv"));
        assert_eq!(config.transfer.max_retries, 5);
        assert_eq!(config.sampling.sample_interval, Duration::from_millis(250));
        assert_eq!(config.schedule.retention_interval, Duration::from_secs(3600));
        assert!(config.sensors.barometer.is_some());
        assert!(config.sensors.hygrometer.is_none());
        assert_eq!(config.capture.warmup, Duration::from_millis(500));
    }

    #[test]
    fn unparsable_values_are_rejected() {
        let err = StationConfig::from_lookup(lookup(&[
            ("STATION_REMOTE_HOST", "pi@archive"),
            ("MAX_IMAGE_FILES", "lots"),
        ]))
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                key: "MAX_IMAGE_FILES",
                ..
            }
        ));

        let err = StationConfig::from_lookup(lookup(&[
            ("STATION_REMOTE_HOST", "pi@archive"),
            ("TRANSFER_MAX_RETRIES", "0"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }
}
