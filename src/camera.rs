/// Still-image capture
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use log::debug;
use tokio::process::Command;
use tokio::time::timeout;

use crate::config::CaptureSettings;
use crate::error::CaptureError;

/// Captures one image to the given path
///
/// Exposure and white-balance settling happen inside the implementation;
/// the caller only learns whether a file was written.
pub trait Camera {
    async fn capture(&mut self, output: &Path) -> Result<(), CaptureError>;
}

/// Camera driven by an external still-capture program (`rpicam-still`)
pub struct CommandCamera {
    program: String,
    warmup: Duration,
    timeout: Duration,
}

impl CommandCamera {
    pub fn new(settings: &CaptureSettings) -> Self {
        Self {
            program: settings.program.clone(),
            warmup: settings.warmup,
            timeout: settings.timeout,
        }
    }

    fn args(&self, output: &Path) -> Vec<String> {
        vec![
            "--nopreview".to_string(),
            "--timeout".to_string(),
            self.warmup.as_millis().to_string(),
            "--output".to_string(),
            output.display().to_string(),
        ]
    }
}

impl Camera for CommandCamera {
    async fn capture(&mut self, output: &Path) -> Result<(), CaptureError> {
        let mut command = Command::new(&self.program);
        command
            .args(self.args(output))
            .stdin(Stdio::null())
            .kill_on_drop(true);
        debug!("Running {} {:?}", self.program, self.args(output));

        let result = timeout(self.timeout, command.output())
            .await
            .map_err(|_| CaptureError::TimedOut(self.timeout))?
            .map_err(|source| CaptureError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !result.status.success() {
            return Err(CaptureError::Failed {
                code: result.status.code(),
                stderr: String::from_utf8_lossy(&result.stderr).trim().to_string(),
            });
        }
        if !output.is_file() {
            return Err(CaptureError::MissingOutput(output.to_path_buf()));
        }
        Ok(())
    }
}
