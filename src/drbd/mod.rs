//! DRBD Module
//!
//! Access to the replicated resources through `drbdsetup`.

mod setup;
mod status;

pub use setup::DrbdSetupCommand;
pub use status::{parse_status, StatusEntry};

use tokio_util::sync::CancellationToken;

/// Capability over the external status/role-transition tool
#[async_trait::async_trait]
pub trait DrbdSetup: Send + Sync {
    /// Names of all currently configured resources, in tool order
    async fn list_resources(&self, cancel: &CancellationToken) -> crate::Result<Vec<String>>;

    /// Switch a resource to secondary, ignoring quorum and replication health
    async fn force_secondary(&self, name: &str, cancel: &CancellationToken) -> crate::Result<()>;
}
