//! `systemctl` backend

use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::{InitSystem, JobHandle, JobMode, JobResult};
use crate::error::{Error, Result};
use crate::process::run_command;

/// Drives systemd through `systemctl`.
///
/// `systemctl start` blocks until its job finishes and reports a failed job
/// through its exit status, so the start job is represented by the running
/// `systemctl` process.
#[derive(Debug, Clone)]
pub struct Systemctl {
    program: PathBuf,
}

impl Default for Systemctl {
    fn default() -> Self {
        Self::new()
    }
}

impl Systemctl {
    pub fn new() -> Self {
        Self::with_program("systemctl")
    }

    /// Use a different `systemctl` binary
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

#[async_trait::async_trait]
impl InitSystem for Systemctl {
    async fn reload(&self, cancel: &CancellationToken) -> Result<()> {
        run_command(&self.program, &["daemon-reload"], cancel).await?;
        Ok(())
    }

    async fn start_unit(
        &self,
        unit: &str,
        mode: JobMode,
        _cancel: &CancellationToken,
    ) -> Result<JobHandle> {
        let job_mode = format!("--job-mode={}", mode.as_str());
        debug!("Running 'systemctl start {} {}'", job_mode, unit);

        let child = Command::new(&self.program)
            .args(["start", job_mode.as_str(), unit])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::InitSystem(format!("failed to start unit '{}': {}", unit, e)))?;

        Ok(JobHandle::with_process(unit, child))
    }

    async fn wait_job(&self, job: JobHandle, cancel: &CancellationToken) -> Result<JobResult> {
        let unit = job.unit().to_string();
        let child = job.into_process().ok_or_else(|| {
            Error::InitSystem(format!("start job for '{}' was not queued by systemctl", unit))
        })?;

        let output = tokio::select! {
            result = child.wait_with_output() => result.map_err(|e| {
                Error::InitSystem(format!("failed to wait for start job of '{}': {}", unit, e))
            })?,
            _ = cancel.cancelled() => {
                warn!("Abandoned start job for {}", unit);
                return Err(Error::Cancelled);
            }
        };

        if output.status.success() {
            return Ok(JobResult::Done);
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        debug!("systemctl start {} failed: {}", unit, stderr.trim());
        Ok(classify_failure(&stderr))
    }
}

/// Map the message of a failed `systemctl start` to the job result
fn classify_failure(stderr: &str) -> JobResult {
    let msg = stderr.to_lowercase();
    if msg.contains("canceled") || msg.contains("cancelled") {
        JobResult::Canceled
    } else if msg.contains("timed out") || msg.contains("timeout") {
        JobResult::Timeout
    } else if msg.contains("dependency") {
        JobResult::Dependency
    } else {
        JobResult::Failed
    }
}
