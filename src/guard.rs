//! Shutdown-time execution
//!
//! Discovers all DRBD resources and forces each of them to secondary.
//! Discovery fails closed: if the resource list cannot be read no resource
//! is touched. Once discovery succeeds, every resource is attempted.

use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::GuardConfig;
use crate::demote::demote_all;
use crate::drbd::{DrbdSetup, DrbdSetupCommand};
use crate::error::Result;

/// Entry point run by the service's stop action
pub struct ShutdownGuard {
    drbd: Arc<dyn DrbdSetup>,
}

impl ShutdownGuard {
    pub fn new(drbd: Arc<dyn DrbdSetup>) -> Self {
        Self { drbd }
    }

    /// Guard driving the `drbdsetup` binary named by the configuration
    pub fn from_config(config: &GuardConfig) -> Result<Self> {
        let drbdsetup = config.drbdsetup()?;
        Ok(Self::new(Arc::new(DrbdSetupCommand::new(drbdsetup))))
    }

    /// Demote every resource currently known to DRBD
    pub async fn execute(&self, cancel: &CancellationToken) -> Result<()> {
        let names = self.drbd.list_resources(cancel).await?;
        if names.is_empty() {
            info!("No DRBD resources found");
            return Ok(());
        }

        info!("Forcing {} resource(s) to secondary", names.len());
        demote_all(Arc::clone(&self.drbd), names, cancel).await?;

        info!("All resources demoted");
        Ok(())
    }
}
