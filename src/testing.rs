//! Collaborator fakes shared by the unit tests
use std::collections::{HashMap, HashSet, VecDeque};
use std::fs;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use crate::camera::Camera;
use crate::config::StationConfig;
use crate::error::{CaptureError, SensorError, TransferError};
use crate::models::Quantity;
use crate::sensors::SensorSuite;
use crate::station::Station;
use crate::transfer::remote::{RemoteCopy, RemoteTarget};

/// Sensors returning a constant, with optional scripted sequences and
/// quantities that always fail
pub struct FakeSensors {
    constant: f64,
    scripts: HashMap<Quantity, VecDeque<Option<f64>>>,
    failing: HashSet<Quantity>,
    reads: usize,
}

impl FakeSensors {
    pub fn constant(value: f64) -> Self {
        Self {
            constant: value,
            scripts: HashMap::new(),
            failing: HashSet::new(),
            reads: 0,
        }
    }

    /// Serve `values` in order before falling back to the constant;
    /// `None` is a failed read.
    pub fn script(mut self, quantity: Quantity, values: &[Option<f64>]) -> Self {
        self.scripts
            .insert(quantity, values.iter().copied().collect());
        self
    }

    pub fn failing(mut self, quantity: Quantity) -> Self {
        self.failing.insert(quantity);
        self
    }

    pub fn reads(&self) -> usize {
        self.reads
    }
}

impl SensorSuite for FakeSensors {
    fn read(&mut self, quantity: Quantity) -> Result<f64, SensorError> {
        self.reads += 1;
        let scripted = self.scripts.get_mut(&quantity).and_then(VecDeque::pop_front);
        match scripted {
            Some(Some(value)) => Ok(value),
            Some(None) => Err(SensorError::NotConfigured(quantity)),
            None if self.failing.contains(&quantity) => Err(SensorError::NotConfigured(quantity)),
            None => Ok(self.constant),
        }
    }
}

/// Camera that writes a placeholder file
#[derive(Default)]
pub struct FakeCamera {
    fail_next: bool,
    broken: bool,
    pub captures: usize,
}

impl FakeCamera {
    /// Every capture fails
    pub fn broken() -> Self {
        Self {
            broken: true,
            ..Self::default()
        }
    }

    pub fn fail_next(&mut self) {
        self.fail_next = true;
    }
}

impl Camera for FakeCamera {
    async fn capture(&mut self, output: &Path) -> Result<(), CaptureError> {
        if std::mem::take(&mut self.fail_next) || self.broken {
            return Err(CaptureError::Failed {
                code: Some(1),
                stderr: "no camera".to_string(),
            });
        }
        fs::write(output, b"jpeg").map_err(|source| CaptureError::Spawn {
            program: "fake".to_string(),
            source,
        })?;
        self.captures += 1;
        Ok(())
    }
}

enum Script {
    FailFirst(u32),
    AlwaysFail,
    MissingArtifacts,
    FailMatching(String),
}

/// Copy primitive with a scripted failure pattern that records each call
pub struct ScriptedCopy {
    script: Script,
    calls: Mutex<Vec<(String, String)>>,
}

impl ScriptedCopy {
    fn new(script: Script) -> Self {
        Self {
            script,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn succeeding() -> Self {
        Self::new(Script::FailFirst(0))
    }

    pub fn failing_first(k: u32) -> Self {
        Self::new(Script::FailFirst(k))
    }

    pub fn always_failing() -> Self {
        Self::new(Script::AlwaysFail)
    }

    pub fn missing_artifacts() -> Self {
        Self::new(Script::MissingArtifacts)
    }

    /// Fail every copy whose local path ends with `suffix`
    pub fn failing_matching(suffix: &str) -> Self {
        Self::new(Script::FailMatching(suffix.to_string()))
    }

    pub fn calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// `(local, remote)` of every attempt, in order
    pub fn copied(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

impl RemoteCopy for ScriptedCopy {
    async fn copy(&self, local: &Path, remote: &RemoteTarget) -> Result<(), TransferError> {
        let local_name = local.display().to_string();
        let attempt = {
            let mut calls = self.calls.lock().unwrap();
            calls.push((local_name.clone(), remote.to_string()));
            calls.len() as u32
        };
        let refused = || TransferError::Failed {
            code: Some(255),
            stderr: "Connection refused".to_string(),
        };
        match &self.script {
            Script::FailFirst(k) if attempt <= *k => Err(refused()),
            Script::FailFirst(_) => Ok(()),
            Script::AlwaysFail => Err(refused()),
            Script::MissingArtifacts => Err(TransferError::MissingArtifact(local.to_path_buf())),
            Script::FailMatching(suffix) if local_name.ends_with(suffix.as_str()) => Err(refused()),
            Script::FailMatching(_) => Ok(()),
        }
    }
}

/// Defaults with every local path under `root` and a one-second window
pub fn test_config(root: &Path) -> StationConfig {
    let mut config = StationConfig::default();
    config.storage.weather_log = root.join("weather_data.csv");
    config.storage.system_log = root.join("system_usage.csv");
    config.storage.image_dir = root.join("images");
    config.transfer.remote_host = "pi@archive".to_string();
    config.transfer.remote_base = "/srv/station".to_string();
    config.sampling.window_duration = Duration::from_secs(1);
    config.sampling.sample_interval = Duration::from_millis(100);
    config
}

pub fn test_station(
    root: &Path,
    sensors: FakeSensors,
) -> Station<FakeSensors, FakeCamera, ScriptedCopy> {
    Station::new(
        &test_config(root),
        sensors,
        FakeCamera::default(),
        ScriptedCopy::succeeding(),
    )
    .expect("Failed to assemble test station")
}
