//! Systemd Module
//!
//! The init system is used through three operations only: reload the unit
//! configuration, start a unit, and wait for the start job's result.

mod systemctl;
mod unit;

pub use systemctl::Systemctl;
pub use unit::ShutdownUnit;

use std::fmt;
use tokio::process::Child;
use tokio_util::sync::CancellationToken;

/// How a start job treats already queued jobs for the same unit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobMode {
    Replace,
}

impl JobMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobMode::Replace => "replace",
        }
    }
}

/// Final result of a systemd job
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobResult {
    Done,
    Canceled,
    Timeout,
    Failed,
    Dependency,
    Skipped,
    Other(String),
}

impl JobResult {
    pub fn parse(s: &str) -> Self {
        match s {
            "done" => JobResult::Done,
            "canceled" => JobResult::Canceled,
            "timeout" => JobResult::Timeout,
            "failed" => JobResult::Failed,
            "dependency" => JobResult::Dependency,
            "skipped" => JobResult::Skipped,
            other => JobResult::Other(other.to_string()),
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(self, JobResult::Done)
    }
}

impl fmt::Display for JobResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JobResult::Done => "done",
            JobResult::Canceled => "canceled",
            JobResult::Timeout => "timeout",
            JobResult::Failed => "failed",
            JobResult::Dependency => "dependency",
            JobResult::Skipped => "skipped",
            JobResult::Other(s) => s.as_str(),
        };
        f.write_str(s)
    }
}

/// A queued start job
pub struct JobHandle {
    unit: String,
    process: Option<Child>,
}

impl JobHandle {
    /// Handle without a backing process, for init systems that track jobs themselves
    pub fn new(unit: impl Into<String>) -> Self {
        Self {
            unit: unit.into(),
            process: None,
        }
    }

    pub(crate) fn with_process(unit: impl Into<String>, process: Child) -> Self {
        Self {
            unit: unit.into(),
            process: Some(process),
        }
    }

    pub fn unit(&self) -> &str {
        &self.unit
    }

    pub(crate) fn into_process(self) -> Option<Child> {
        self.process
    }
}

impl fmt::Debug for JobHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobHandle")
            .field("unit", &self.unit)
            .field("pid", &self.process.as_ref().and_then(|p| p.id()))
            .finish()
    }
}

/// Capability over the init system's control interface
#[async_trait::async_trait]
pub trait InitSystem: Send + Sync {
    /// Reload all unit files
    async fn reload(&self, cancel: &CancellationToken) -> crate::Result<()>;

    /// Queue a start job for `unit`
    async fn start_unit(
        &self,
        unit: &str,
        mode: JobMode,
        cancel: &CancellationToken,
    ) -> crate::Result<JobHandle>;

    /// Wait for a queued job to finish. Cancellation abandons the wait.
    async fn wait_job(
        &self,
        job: JobHandle,
        cancel: &CancellationToken,
    ) -> crate::Result<JobResult>;
}
