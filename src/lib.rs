//! DRBD Shutdown Guard
//!
//! Keeps DRBD resources with suspended IO from hanging system shutdown.
//!
//! # Architecture
//!
//! The `install` command places copies of `drbdsetup` and this binary in a
//! runtime directory and registers a oneshot systemd unit whose stop action
//! runs `execute`. The unit is ordered so that it stops after the container
//! workload and before filesystems are unmounted.
//!
//! At shutdown, `execute` lists every DRBD resource and forces all of them to
//! secondary concurrently, so that suspended IO fails instead of blocking the
//! unmount.

pub mod atomic;
pub mod config;
pub mod demote;
pub mod drbd;
pub mod error;
pub mod guard;
pub mod install;
pub mod process;
pub mod systemd;

#[cfg(test)]
pub(crate) mod testing;

pub use config::GuardConfig;
pub use error::{Error, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::GuardConfig;
    pub use crate::drbd::{DrbdSetup, DrbdSetupCommand};
    pub use crate::error::{Error, Result};
    pub use crate::guard::ShutdownGuard;
    pub use crate::install::{InstallStep, Installer};
    pub use crate::systemd::{InitSystem, JobMode, JobResult, Systemctl};
}
