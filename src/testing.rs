//! In-memory stand-ins for the external tools, shared by the unit tests.

use std::collections::{BTreeSet, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::drbd::DrbdSetup;
use crate::error::{Error, Result};
use crate::systemd::{InitSystem, JobHandle, JobMode, JobResult};

/// Fake `drbdsetup` with scripted resources and per-resource failures
#[derive(Default)]
pub(crate) struct FakeDrbdSetup {
    resources: Vec<String>,
    list_error: Option<String>,
    failing: HashSet<String>,
    hanging: HashSet<String>,
    list_calls: AtomicUsize,
    demoted: Mutex<Vec<String>>,
}

impl FakeDrbdSetup {
    pub fn with_resources(names: &[&str]) -> Self {
        Self {
            resources: names.iter().map(|n| n.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn failing_listing(reason: &str) -> Self {
        Self {
            list_error: Some(reason.to_string()),
            ..Self::default()
        }
    }

    pub fn fail_on(mut self, name: &str) -> Self {
        self.failing.insert(name.to_string());
        self
    }

    /// The transition for `name` blocks until cancelled
    pub fn hang_on(mut self, name: &str) -> Self {
        self.hanging.insert(name.to_string());
        self
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    /// Every force-secondary invocation, in call order
    pub fn demote_calls(&self) -> Vec<String> {
        self.demoted.lock().unwrap().clone()
    }

    pub fn demoted_set(&self) -> BTreeSet<String> {
        self.demote_calls().into_iter().collect()
    }
}

#[async_trait::async_trait]
impl DrbdSetup for FakeDrbdSetup {
    async fn list_resources(&self, _cancel: &CancellationToken) -> Result<Vec<String>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        match &self.list_error {
            Some(reason) => Err(Error::Command {
                command: "drbdsetup status --json".to_string(),
                reason: reason.clone(),
            }),
            None => Ok(self.resources.clone()),
        }
    }

    async fn force_secondary(&self, name: &str, cancel: &CancellationToken) -> Result<()> {
        self.demoted.lock().unwrap().push(name.to_string());

        if self.hanging.contains(name) {
            cancel.cancelled().await;
            return Err(Error::Cancelled);
        }

        if self.failing.contains(name) {
            return Err(Error::Command {
                command: format!("drbdsetup secondary --force {}", name),
                reason: "exit status: 11".to_string(),
            });
        }

        Ok(())
    }
}

/// Fake init system recording every call
pub(crate) struct FakeInitSystem {
    result: JobResult,
    hang: bool,
    fail_reload: bool,
    calls: Mutex<Vec<String>>,
    active: Mutex<BTreeSet<String>>,
}

impl Default for FakeInitSystem {
    fn default() -> Self {
        Self {
            result: JobResult::Done,
            hang: false,
            fail_reload: false,
            calls: Mutex::new(Vec::new()),
            active: Mutex::new(BTreeSet::new()),
        }
    }
}

impl FakeInitSystem {
    pub fn with_result(result: JobResult) -> Self {
        Self {
            result,
            ..Self::default()
        }
    }

    /// Start jobs never finish
    pub fn hanging() -> Self {
        Self {
            hang: true,
            ..Self::default()
        }
    }

    pub fn failing_reload() -> Self {
        Self {
            fail_reload: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn is_active(&self, unit: &str) -> bool {
        self.active.lock().unwrap().contains(unit)
    }
}

#[async_trait::async_trait]
impl InitSystem for FakeInitSystem {
    async fn reload(&self, _cancel: &CancellationToken) -> Result<()> {
        self.calls.lock().unwrap().push("reload".to_string());
        if self.fail_reload {
            return Err(Error::InitSystem("bus unavailable".to_string()));
        }
        Ok(())
    }

    async fn start_unit(
        &self,
        unit: &str,
        mode: JobMode,
        _cancel: &CancellationToken,
    ) -> Result<JobHandle> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("start {} {}", unit, mode.as_str()));
        Ok(JobHandle::new(unit))
    }

    async fn wait_job(&self, job: JobHandle, cancel: &CancellationToken) -> Result<JobResult> {
        if self.hang {
            cancel.cancelled().await;
            return Err(Error::Cancelled);
        }

        if self.result.is_done() {
            self.active.lock().unwrap().insert(job.unit().to_string());
        }
        Ok(self.result.clone())
    }
}
