/// The control loop
///
/// One cooperative loop drives every activity. Each iteration takes a
/// single-shot sample, fires whichever timers are due, then runs two
/// windowed sample passes. Nothing runs in parallel; a long transfer simply
/// delays the rest of the iteration.
use std::time::Duration;

use log::{error, info, warn};
use tokio::sync::watch;
use tokio::time::{sleep, Instant};

use crate::camera::Camera;
use crate::config::ScheduleSettings;
use crate::error::StationError;
use crate::sensors::SensorSuite;
use crate::station::Station;
use crate::transfer::RemoteCopy;

/// An elapsed-time trigger: due once `period` has passed since it last fired
///
/// An overrun does not queue extra firings; the next check after a slow
/// action fires once and restarts the period from that check.
#[derive(Debug, Clone, Copy)]
pub struct Timer {
    period: Duration,
    last_fired: Instant,
}

impl Timer {
    pub fn new(period: Duration, now: Instant) -> Self {
        Self {
            period,
            last_fired: now,
        }
    }

    pub fn is_due(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.last_fired) >= self.period
    }

    pub fn fire(&mut self, now: Instant) {
        self.last_fired = now;
    }
}

/// Counters describing what the loop has done
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LoopStats {
    pub iterations: u64,
    pub offloads: u64,
    pub images_offloaded: u64,
    pub log_transfer_failures: u64,
    pub capture_failures: u64,
    pub retentions: u64,
    pub transient_errors: u64,
}

pub struct Scheduler<S, C, R> {
    station: Station<S, C, R>,
    transfer_timer: Timer,
    retention_timer: Timer,
    error_pause: Duration,
    stats: LoopStats,
}

impl<S, C, R> Scheduler<S, C, R>
where
    S: SensorSuite,
    C: Camera,
    R: RemoteCopy,
{
    /// Both timers start now: the first offload and the first retention pass
    /// happen one full period after start-up.
    pub fn new(station: Station<S, C, R>, settings: &ScheduleSettings) -> Self {
        let now = Instant::now();
        Self {
            station,
            transfer_timer: Timer::new(settings.transfer_interval, now),
            retention_timer: Timer::new(settings.retention_interval, now),
            error_pause: settings.error_pause,
            stats: LoopStats::default(),
        }
    }

    /// Run until `shutdown` carries `true` or an unrecoverable error occurs.
    ///
    /// The shutdown flag is checked between iterations; an iteration in
    /// progress always completes.
    pub async fn run(
        &mut self,
        shutdown: watch::Receiver<bool>,
    ) -> Result<LoopStats, StationError> {
        info!("Weather station initialized, harvesting data");
        loop {
            if *shutdown.borrow() {
                info!(
                    "Stopping after {} iterations: {} offloads, {} images offloaded, \
                     {} failed log transfers, {} failed captures, {} retention passes, \
                     {} transient errors",
                    self.stats.iterations,
                    self.stats.offloads,
                    self.stats.images_offloaded,
                    self.stats.log_transfer_failures,
                    self.stats.capture_failures,
                    self.stats.retentions,
                    self.stats.transient_errors
                );
                return Ok(self.stats);
            }

            match self.run_iteration().await {
                Ok(()) => {}
                Err(e) if e.is_transient() => {
                    self.stats.transient_errors += 1;
                    warn!("Transient error: {}; pausing {:?}", e, self.error_pause);
                    sleep(self.error_pause).await;
                }
                Err(e) => {
                    error!("Unexpected error, stopping: {}", e);
                    return Err(e);
                }
            }
        }
    }

    /// One pass of the loop body
    ///
    /// A transient offload failure leaves the transfer timer due but does not
    /// hold back retention or the windowed passes; it is returned once the
    /// rest of the iteration has run.
    pub async fn run_iteration(&mut self) -> Result<(), StationError> {
        self.stats.iterations += 1;
        self.station.sample_once()?;

        let now = Instant::now();
        let mut deferred = None;
        if self.transfer_timer.is_due(now) {
            match self.station.offload().await {
                Ok(report) => {
                    self.transfer_timer.fire(now);
                    self.stats.offloads += 1;
                    self.stats.images_offloaded += report.images_confirmed as u64;
                    if report.capture_error.is_some() {
                        self.stats.capture_failures += 1;
                    }
                    for outcome in [&report.weather_log, &report.system_log] {
                        if !outcome.is_confirmed() {
                            self.stats.log_transfer_failures += 1;
                        }
                    }
                }
                Err(e) if e.is_transient() => deferred = Some(e),
                Err(e) => return Err(e),
            }
        }

        if self.retention_timer.is_due(now) {
            self.station.truncate_logs()?;
            self.retention_timer.fire(now);
            self.stats.retentions += 1;
        }

        self.station.sample_window().await?;
        self.station.sample_window().await?;
        deferred.map_or(Ok(()), Err)
    }
}
