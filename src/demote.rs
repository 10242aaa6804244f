//! Concurrent Demotion
//!
//! Every resource gets its own task issuing `drbdsetup secondary --force`.
//! A failing resource never stops the others: all tasks are awaited before
//! the combined outcome is reported.

use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::drbd::DrbdSetup;
use crate::error::{Error, Result};

/// Result of demoting one resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DemotionOutcome {
    pub resource: String,
    /// `None` when the resource is now secondary
    pub failure: Option<String>,
}

impl DemotionOutcome {
    pub fn demoted(resource: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            failure: None,
        }
    }

    pub fn failed(resource: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            failure: Some(detail.into()),
        }
    }

    pub fn is_demoted(&self) -> bool {
        self.failure.is_none()
    }
}

/// Force every resource in `names` to secondary, concurrently.
///
/// Succeeds only if every resource was demoted. Otherwise returns
/// `Error::Demotion` listing each failed resource.
pub async fn demote_all(
    drbd: Arc<dyn DrbdSetup>,
    names: Vec<String>,
    cancel: &CancellationToken,
) -> Result<()> {
    let outcomes = run_all(drbd, names, cancel).await;

    let mut failures: Vec<DemotionOutcome> =
        outcomes.into_iter().filter(|o| !o.is_demoted()).collect();
    if failures.is_empty() {
        return Ok(());
    }

    failures.sort_by(|a, b| a.resource.cmp(&b.resource));
    Err(Error::Demotion { failures })
}

/// Spawn one task per resource and wait for all of them
async fn run_all(
    drbd: Arc<dyn DrbdSetup>,
    names: Vec<String>,
    cancel: &CancellationToken,
) -> Vec<DemotionOutcome> {
    let tasks: Vec<(String, JoinHandle<DemotionOutcome>)> = names
        .into_iter()
        .map(|name| {
            let drbd = Arc::clone(&drbd);
            let cancel = cancel.clone();
            let task_name = name.clone();
            let handle = tokio::spawn(async move {
                demote_one(drbd.as_ref(), task_name, &cancel).await
            });
            (name, handle)
        })
        .collect();

    let mut outcomes = Vec::with_capacity(tasks.len());
    for (name, handle) in tasks {
        let outcome = match handle.await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("Demotion task for {} did not complete: {}", name, e);
                DemotionOutcome::failed(name, format!("task failed: {}", e))
            }
        };
        outcomes.push(outcome);
    }

    outcomes
}

async fn demote_one(
    drbd: &dyn DrbdSetup,
    name: String,
    cancel: &CancellationToken,
) -> DemotionOutcome {
    match drbd.force_secondary(&name, cancel).await {
        Ok(()) => {
            info!("Resource {} is now secondary", name);
            DemotionOutcome::demoted(name)
        }
        Err(e) => {
            error!("Failed to demote resource {}: {}", name, e);
            DemotionOutcome::failed(name, e.to_string())
        }
    }
}
