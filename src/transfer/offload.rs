/// Offload cycle: capture an image, then push images and logs to the archive
use std::path::Path;

use log::{error, info, warn};
use time::OffsetDateTime;

use crate::camera::Camera;
use crate::error::StationError;
use crate::models::TransferOutcome;
use crate::sensors::SensorSuite;
use crate::station::Station;

use super::remote::{RemoteCopy, RemoteTarget};

/// What one offload cycle achieved
#[derive(Debug, Clone, PartialEq)]
pub struct OffloadReport {
    /// Set when this cycle's capture failed; the existing backlog and both
    /// logs were still offered
    pub capture_error: Option<String>,
    pub images_confirmed: usize,
    pub images_left: usize,
    pub images_skipped: usize,
    pub weather_log: TransferOutcome,
    pub system_log: TransferOutcome,
}

impl<S, C, R> Station<S, C, R>
where
    S: SensorSuite,
    C: Camera,
    R: RemoteCopy,
{
    /// Capture one image, then transfer the newest images and both logs.
    ///
    /// Each artifact is tracked on its own; only confirmed images are
    /// deleted. Logs are never deleted here, retention owns their size.
    /// A failed capture is reported, not propagated: the backlog and the logs
    /// go out regardless.
    /// A single-shot sample is taken before the capture, after it, and after
    /// every image so the logs keep moving during a long transfer phase.
    pub async fn offload(&mut self) -> Result<OffloadReport, StationError> {
        self.sample_once()?;
        let image = self.backlog.path_for(&OffsetDateTime::now_utc());
        let capture_error = match self.camera.capture(&image).await {
            Ok(()) => {
                info!("Saved image: {}", image.display());
                None
            }
            Err(e) => {
                error!("Image capture failed: {}; offloading the existing backlog", e);
                Some(e.to_string())
            }
        };
        self.sample_once()?;

        info!("Transferring data to the server...");
        let backlog = self
            .backlog
            .list_oldest_first()
            .map_err(StationError::Backlog)?;
        let total = backlog.len();
        let candidates = self.retention.transfer_candidates(backlog);
        let images_skipped = total - candidates.len();

        if candidates.is_empty() {
            warn!("No images found for transfer in {}", self.backlog.dir().display());
        }
        let mut images_confirmed = 0;
        let mut images_left = 0;
        for path in &candidates {
            let outcome = self.agent.transfer(path, &self.layout.images).await;
            if outcome.is_confirmed() {
                match self.backlog.remove(path) {
                    Ok(()) => images_confirmed += 1,
                    Err(e) => {
                        error!("Could not remove {}: {}", path.display(), e);
                        images_left += 1;
                    }
                }
            } else {
                images_left += 1;
            }
            self.sample_once()?;
        }

        let report = OffloadReport {
            capture_error,
            images_confirmed,
            images_left,
            images_skipped,
            weather_log: self
                .transfer_log(self.logs.weather.path(), &self.layout.weather_log)
                .await,
            system_log: self
                .transfer_log(self.logs.system.path(), &self.layout.system_log)
                .await,
        };

        info!(
            "Transfer phase complete: {} images confirmed, {} left for retry, {} skipped",
            report.images_confirmed, report.images_left, report.images_skipped
        );
        Ok(report)
    }

    async fn transfer_log(&self, path: &Path, target: &RemoteTarget) -> TransferOutcome {
        let outcome = self.agent.transfer(path, target).await;
        if !outcome.is_confirmed() {
            error!(
                "Transfer of {} {}; kept for the next cycle",
                path.display(),
                outcome
            );
        }
        outcome
    }
}
