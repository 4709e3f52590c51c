/// Retention: bounding local storage
///
/// Logs are truncated back to their header on a timer of their own. The
/// truncation does not wait for a confirmed transfer: records appended after
/// the last successful offload and before the truncation are lost locally.
/// With the default intervals (transfer 300s, retention 600s) that window is
/// whatever accumulated since the most recent confirmed log copy.
///
/// Images are never deleted here; the backlog is only capped, so that one
/// cycle offers at most the newest `max_images` to the archive.
use std::path::PathBuf;

use log::{info, warn};

use crate::error::StationError;
use crate::storage::LogSinks;

#[derive(Debug, Clone, Copy)]
pub struct RetentionPolicy {
    max_images: usize,
}

impl RetentionPolicy {
    pub fn new(max_images: usize) -> Self {
        Self { max_images }
    }

    /// Truncate both logs to header-only, regardless of transfer state
    pub fn truncate_logs(&self, logs: &LogSinks) -> Result<(), StationError> {
        warn!("Truncating local logs; records not yet offloaded are discarded");
        logs.weather.truncate()?;
        logs.system.truncate()?;
        info!("Local data cleared to save space");
        Ok(())
    }

    /// The newest `max_images` of an oldest-first listing, still oldest first
    ///
    /// Older images stay on disk untouched; they are neither offered nor
    /// deleted this cycle.
    pub fn transfer_candidates(&self, mut images: Vec<PathBuf>) -> Vec<PathBuf> {
        if images.len() > self.max_images {
            let skipped = images.len() - self.max_images;
            warn!(
                "Image backlog holds {} images; skipping the {} oldest this cycle",
                images.len(),
                skipped
            );
            images.drain(..skipped);
        }
        images
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StorageSettings;
    use crate::models::{AggregateRecord, Reading, SensorGroup};
    use std::fs;
    use tempfile::TempDir;
    use time::OffsetDateTime;

    fn images(n: usize) -> Vec<PathBuf> {
        (0..n)
            .map(|i| PathBuf::from(format!("20240101_{:06}.jpg", i)))
            .collect()
    }

    #[test]
    fn candidates_are_the_most_recent_k() {
        let policy = RetentionPolicy::new(3);
        let selected = policy.transfer_candidates(images(5));
        assert_eq!(selected, images(5)[2..].to_vec());
    }

    #[test]
    fn small_backlog_is_offered_whole() {
        let policy = RetentionPolicy::new(100);
        assert_eq!(policy.transfer_candidates(images(4)), images(4));
        assert!(policy.transfer_candidates(Vec::new()).is_empty());
    }

    #[test]
    fn truncation_leaves_only_headers() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let settings = StorageSettings {
            weather_log: dir.path().join("weather_data.csv"),
            system_log: dir.path().join("system_usage.csv"),
            image_dir: dir.path().join("images"),
        };
        let logs = LogSinks::open(&settings).unwrap();
        let weather_header = fs::read(&settings.weather_log).unwrap();
        let system_header = fs::read(&settings.system_log).unwrap();

        for group in [SensorGroup::Weather, SensorGroup::System] {
            logs.append(&AggregateRecord {
                group,
                timestamp: OffsetDateTime::now_utc(),
                values: vec![Reading::Available(1.0); group.quantities().len()],
                samples: 1,
            })
            .unwrap();
        }

        RetentionPolicy::new(100).truncate_logs(&logs).unwrap();

        assert_eq!(fs::read(&settings.weather_log).unwrap(), weather_header);
        assert_eq!(fs::read(&settings.system_log).unwrap(), system_header);
    }
}
