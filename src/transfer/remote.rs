/// The remote copy primitive
use std::fmt;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use log::debug;
use tokio::process::Command;
use tokio::time::timeout;

use crate::config::TransferSettings;
use crate::error::TransferError;

/// A destination on the remote archive, `host:path`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteTarget {
    pub host: String,
    pub path: String,
}

impl RemoteTarget {
    pub fn new(host: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            path: path.into(),
        }
    }
}

impl fmt::Display for RemoteTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.path)
    }
}

/// Archive destinations for each kind of artifact
#[derive(Debug, Clone)]
pub struct ArchiveLayout {
    pub images: RemoteTarget,
    pub weather_log: RemoteTarget,
    pub system_log: RemoteTarget,
}

impl ArchiveLayout {
    pub fn new(settings: &TransferSettings) -> Self {
        let base = settings.remote_base.trim_end_matches('/');
        let host = settings.remote_host.as_str();
        Self {
            images: RemoteTarget::new(host, format!("{}/images/", base)),
            weather_log: RemoteTarget::new(host, format!("{}/weather_data.csv", base)),
            system_log: RemoteTarget::new(host, format!("{}/system_usage.csv", base)),
        }
    }
}

/// One attempt at copying a local file to the archive
pub trait RemoteCopy {
    async fn copy(&self, local: &Path, remote: &RemoteTarget) -> Result<(), TransferError>;
}

/// `scp` with a bandwidth cap, a connect timeout and an overall attempt
/// timeout; the child is killed if the attempt times out.
pub struct ScpCopy {
    program: String,
    bandwidth_limit_kbit: u32,
    connect_timeout: Duration,
    attempt_timeout: Duration,
}

impl ScpCopy {
    pub fn new(settings: &TransferSettings) -> Self {
        Self {
            program: settings.program.clone(),
            bandwidth_limit_kbit: settings.bandwidth_limit_kbit,
            connect_timeout: settings.connect_timeout,
            attempt_timeout: settings.attempt_timeout,
        }
    }

    fn args(&self, local: &Path, remote: &RemoteTarget) -> Vec<String> {
        vec![
            "-q".to_string(),
            "-l".to_string(),
            self.bandwidth_limit_kbit.to_string(),
            "-o".to_string(),
            format!("ConnectTimeout={}", self.connect_timeout.as_secs().max(1)),
            "-o".to_string(),
            "BatchMode=yes".to_string(),
            local.display().to_string(),
            remote.to_string(),
        ]
    }
}

impl RemoteCopy for ScpCopy {
    async fn copy(&self, local: &Path, remote: &RemoteTarget) -> Result<(), TransferError> {
        if !local.is_file() {
            return Err(TransferError::MissingArtifact(local.to_path_buf()));
        }

        let args = self.args(local, remote);
        debug!("Running {} {:?}", self.program, args);
        let mut command = Command::new(&self.program);
        command
            .args(&args)
            .stdin(Stdio::null())
            .kill_on_drop(true);

        let output = timeout(self.attempt_timeout, command.output())
            .await
            .map_err(|_| TransferError::TimedOut(self.attempt_timeout))?
            .map_err(|source| TransferError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if output.status.success() {
            Ok(())
        } else {
            Err(TransferError::Failed {
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })
        }
    }
}
