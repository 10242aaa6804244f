//! `drbdsetup` command backend

use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::status::parse_status;
use super::DrbdSetup;
use crate::error::Result;
use crate::process::run_command;

/// Runs the real `drbdsetup` binary
#[derive(Debug, Clone)]
pub struct DrbdSetupCommand {
    path: PathBuf,
}

impl DrbdSetupCommand {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait::async_trait]
impl DrbdSetup for DrbdSetupCommand {
    async fn list_resources(&self, cancel: &CancellationToken) -> Result<Vec<String>> {
        info!("Running 'drbdsetup status --json' to get current resources");
        let out = run_command(&self.path, &["status", "--json"], cancel).await?;

        let entries = parse_status(&out)?;
        for entry in &entries {
            debug!(
                "Found resource {} (role: {})",
                entry.name,
                entry.role.as_deref().unwrap_or("unknown")
            );
        }

        Ok(entries.into_iter().map(|e| e.name).collect())
    }

    async fn force_secondary(&self, name: &str, cancel: &CancellationToken) -> Result<()> {
        info!("Running 'drbdsetup secondary --force {}'", name);
        run_command(&self.path, &["secondary", "--force", name], cancel).await?;
        Ok(())
    }
}
