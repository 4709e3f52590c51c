/// Append-only CSV logs of aggregate records
///
/// Each log has exactly one header row, written when the file is created
/// and rewritten verbatim when the log is truncated. Records are encoded to
/// a complete line in memory and handed to the file in a single write, so an
/// interrupted process never leaves half a row ahead of the next append.
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use log::info;

use crate::config::StorageSettings;
use crate::error::StationError;
use crate::models::{AggregateRecord, SensorGroup};

#[derive(Debug, Clone)]
pub struct CsvLog {
    path: PathBuf,
    group: SensorGroup,
}

impl CsvLog {
    /// Open the log, creating it with its header if absent
    pub fn open(path: impl Into<PathBuf>, group: SensorGroup) -> Result<Self, StationError> {
        let log = Self {
            path: path.into(),
            group,
        };
        if let Some(parent) = log.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        // Appending nothing still creates the file and its header.
        log.open_for_append()?;
        Ok(log)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record as one line
    pub fn append(&self, record: &AggregateRecord) -> Result<(), StationError> {
        debug_assert_eq!(record.group, self.group);
        let line = encode_line(record.row())?;
        let mut file = self.open_for_append()?;
        write_durably(&mut file, &line)?;
        Ok(())
    }

    /// Drop every record, leaving only the header
    pub fn truncate(&self) -> Result<(), StationError> {
        let mut file = File::create(&self.path)?;
        write_durably(&mut file, &self.header_line()?)?;
        info!("Truncated {} log {}", self.group, self.path.display());
        Ok(())
    }

    fn header_line(&self) -> Result<Vec<u8>, StationError> {
        encode_line(self.group.header())
    }

    fn open_for_append(&self) -> Result<File, StationError> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        if file.metadata()?.len() == 0 {
            write_durably(&mut file, &self.header_line()?)?;
        }
        Ok(file)
    }
}

/// The weather and system logs, written together by every sampling pass
#[derive(Debug, Clone)]
pub struct LogSinks {
    pub weather: CsvLog,
    pub system: CsvLog,
}

impl LogSinks {
    pub fn open(settings: &StorageSettings) -> Result<Self, StationError> {
        Ok(Self {
            weather: CsvLog::open(&settings.weather_log, SensorGroup::Weather)?,
            system: CsvLog::open(&settings.system_log, SensorGroup::System)?,
        })
    }

    pub fn for_group(&self, group: SensorGroup) -> &CsvLog {
        match group {
            SensorGroup::Weather => &self.weather,
            SensorGroup::System => &self.system,
        }
    }

    pub fn append(&self, record: &AggregateRecord) -> Result<(), StationError> {
        self.for_group(record.group).append(record)
    }
}

fn encode_line<I, T>(fields: I) -> Result<Vec<u8>, StationError>
where
    I: IntoIterator<Item = T>,
    T: AsRef<[u8]>,
{
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    writer.write_record(fields)?;
    writer
        .into_inner()
        .map_err(|e| StationError::Io(io::Error::new(e.error().kind(), e.to_string())))
}

fn write_durably(file: &mut File, line: &[u8]) -> io::Result<()> {
    file.write_all(line)?;
    file.flush()?;
    file.sync_data()
}
