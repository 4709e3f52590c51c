/// Sample windows: raw readings gathered over a pass, reduced to records
use std::collections::HashMap;
use std::time::Duration;

use log::{debug, warn};
use time::OffsetDateTime;
use tokio::time::{sleep, Instant};

use crate::models::{AggregateRecord, Quantity, Reading, SensorGroup};
use crate::sensors::SensorSuite;

use super::median;

/// Raw readings for every quantity collected during one pass
///
/// Collecting never touches the logs; turning a set into records is a
/// separate step so aggregation can be checked without file I/O.
#[derive(Debug, Default)]
pub struct SampleSet {
    windows: HashMap<Quantity, Vec<Reading>>,
    rounds: usize,
}

impl SampleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Single-shot pass: exactly one read per quantity
    pub fn collect_once<S: SensorSuite>(sensors: &mut S) -> Self {
        let mut set = Self::new();
        set.read_round(sensors);
        set
    }

    /// Read every quantity at `interval` until `duration` of wall-clock time
    /// has elapsed.
    ///
    /// The window is bounded by time, not by count: a slow sensor stretches
    /// the cadence but never the window. If no round completes, every field
    /// aggregates to unavailable.
    pub async fn collect<S: SensorSuite>(
        sensors: &mut S,
        duration: Duration,
        interval: Duration,
    ) -> Self {
        let mut set = Self::new();
        let end = Instant::now() + duration;
        while Instant::now() < end {
            set.read_round(sensors);
            sleep(interval).await;
        }

        let gaps = set.unavailable_counts();
        if !gaps.is_empty() {
            let summary: Vec<String> = gaps
                .iter()
                .map(|(quantity, missing)| format!("{} {}/{}", quantity, missing, set.rounds))
                .collect();
            warn!("Unavailable readings this window: {}", summary.join(", "));
        }
        set
    }

    /// Read each quantity once; a failed read is recorded as unavailable.
    pub fn read_round<S: SensorSuite>(&mut self, sensors: &mut S) {
        for quantity in Quantity::ALL {
            let reading = match sensors.read(quantity) {
                Ok(value) => Reading::from_value(value),
                Err(e) => {
                    debug!("{} unavailable: {}", quantity, e);
                    Reading::Unavailable
                }
            };
            self.windows.entry(quantity).or_default().push(reading);
        }
        self.rounds += 1;
    }

    /// Quantities with at least one unavailable reading, and how many
    pub fn unavailable_counts(&self) -> Vec<(Quantity, usize)> {
        Quantity::ALL
            .into_iter()
            .map(|q| {
                let missing = self
                    .window(q)
                    .iter()
                    .filter(|r| **r == Reading::Unavailable)
                    .count();
                (q, missing)
            })
            .filter(|(_, missing)| *missing > 0)
            .collect()
    }

    pub fn window(&self, quantity: Quantity) -> &[Reading] {
        self.windows
            .get(&quantity)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Reduce the group's windows to one record via the median policy
    pub fn aggregate(&self, group: SensorGroup, timestamp: OffsetDateTime) -> AggregateRecord {
        AggregateRecord {
            group,
            timestamp,
            values: group
                .quantities()
                .iter()
                .map(|q| median(self.window(*q)))
                .collect(),
            samples: self.rounds,
        }
    }
}
