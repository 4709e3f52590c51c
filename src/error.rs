/// Error types for the station daemon
use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::models::Quantity;

/// Errors raised while loading configuration from the environment
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{0} environment variable not set")]
    Missing(&'static str),

    #[error("invalid value {value:?} for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// A single sensor read failing
#[derive(Error, Debug)]
pub enum SensorError {
    #[error("{0} is not configured")]
    NotConfigured(Quantity),

    #[error("read from {path} failed: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("unparsable value {value:?} in {path}")]
    Parse { path: PathBuf, value: String },
}

#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("could not start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("capture exited with {code:?}: {stderr}")]
    Failed { code: Option<i32>, stderr: String },

    #[error("capture timed out after {0:?}")]
    TimedOut(Duration),

    #[error("capture reported success but {0} was not written")]
    MissingOutput(PathBuf),
}

/// One remote copy attempt failing
#[derive(Error, Debug)]
pub enum TransferError {
    #[error("local artifact {0} does not exist")]
    MissingArtifact(PathBuf),

    #[error("could not start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("copy exited with {code:?}: {stderr}")]
    Failed { code: Option<i32>, stderr: String },

    #[error("copy attempt timed out after {0:?}")]
    TimedOut(Duration),
}

impl TransferError {
    /// Remote-side failures and spawn hiccups (fork pressure, memory) are
    /// worth another attempt; a missing artifact or program is not.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Failed { .. } | Self::TimedOut(_) => true,
            Self::Spawn { source, .. } => source.kind() != io::ErrorKind::NotFound,
            Self::MissingArtifact(_) => false,
        }
    }
}

/// Errors that reach the control loop
#[derive(Error, Debug)]
pub enum StationError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Log encoding error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Image backlog unreadable: {0}")]
    Backlog(#[source] io::Error),
}

impl StationError {
    /// Failures the loop recovers from after a short pause.
    /// Anything else terminates the loop.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Backlog(_))
    }
}
