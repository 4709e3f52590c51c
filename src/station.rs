/// The station: every collaborator the control loop drives, and the passes
/// it runs over them
use log::{log, Level};
use time::OffsetDateTime;

use crate::camera::Camera;
use crate::config::{SamplingSettings, StationConfig};
use crate::error::StationError;
use crate::models::{AggregateRecord, SensorGroup};
use crate::retention::RetentionPolicy;
use crate::sampling::SampleSet;
use crate::sensors::SensorSuite;
use crate::storage::{ImageBacklog, LogSinks};
use crate::transfer::remote::ArchiveLayout;
use crate::transfer::{RemoteCopy, RetryPolicy, TransferAgent};
use crate::utils::format_timestamp;

pub struct Station<S, C, R> {
    pub(crate) sensors: S,
    pub(crate) logs: LogSinks,
    pub(crate) camera: C,
    pub(crate) backlog: ImageBacklog,
    pub(crate) agent: TransferAgent<R>,
    pub(crate) retention: RetentionPolicy,
    pub(crate) layout: ArchiveLayout,
    sampling: SamplingSettings,
}

impl<S, C, R> Station<S, C, R>
where
    S: SensorSuite,
    C: Camera,
    R: RemoteCopy,
{
    /// Open the logs and image directory and assemble the station
    pub fn new(
        config: &StationConfig,
        sensors: S,
        camera: C,
        copier: R,
    ) -> Result<Self, StationError> {
        let transfer = &config.transfer;
        Ok(Self {
            sensors,
            logs: LogSinks::open(&config.storage)?,
            camera,
            backlog: ImageBacklog::open(&config.storage.image_dir)?,
            agent: TransferAgent::new(
                copier,
                RetryPolicy::new(transfer.max_retries, transfer.backoff),
            ),
            retention: RetentionPolicy::new(transfer.max_image_files),
            layout: ArchiveLayout::new(transfer),
            sampling: config.sampling.clone(),
        })
    }

    /// One read per quantity, written as a window of one
    pub fn sample_once(&mut self) -> Result<(), StationError> {
        let set = SampleSet::collect_once(&mut self.sensors);
        self.persist(&set, Level::Debug)
    }

    /// Collect over the configured window, then write the medians
    pub async fn sample_window(&mut self) -> Result<(), StationError> {
        let set = SampleSet::collect(
            &mut self.sensors,
            self.sampling.window_duration,
            self.sampling.sample_interval,
        )
        .await;
        self.persist(&set, Level::Info)
    }

    /// Retention pass: both logs back to header-only
    pub fn truncate_logs(&self) -> Result<(), StationError> {
        self.retention.truncate_logs(&self.logs)
    }

    fn persist(&self, set: &SampleSet, level: Level) -> Result<(), StationError> {
        let timestamp = OffsetDateTime::now_utc();
        let weather = set.aggregate(SensorGroup::Weather, timestamp);
        let system = set.aggregate(SensorGroup::System, timestamp);

        self.logs.append(&weather)?;
        self.logs.append(&system)?;

        log_summary(level, &weather, &system);
        Ok(())
    }
}

fn log_summary(level: Level, weather: &AggregateRecord, system: &AggregateRecord) {
    if !log::log_enabled!(level) {
        return;
    }
    log!(level, "Data logged at {}", format_timestamp(&weather.timestamp));
    for record in [weather, system] {
        for quantity in record.group.quantities() {
            log!(
                level,
                "  {}: {:.2} {}",
                quantity,
                record.get(*quantity),
                quantity.unit()
            );
        }
    }
    log!(level, "  Samples made: {}", weather.samples);
}
