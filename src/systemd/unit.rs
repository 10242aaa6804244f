//! Generated shutdown service unit

use std::fmt;
use std::path::PathBuf;

use crate::config::{GuardConfig, DRBDSETUP_ENV};

/// Oneshot service whose stop action demotes every DRBD resource.
///
/// The service is started at install time and stays active
/// (`RemainAfterExit`), so systemd runs `ExecStop` during shutdown. It is
/// stopped after the workload service (`Before=`) and before filesystems are
/// unmounted (`Conflicts=` on the unmount target).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShutdownUnit {
    pub before: String,
    pub conflicts: String,
    pub drbdsetup: PathBuf,
    pub executable: PathBuf,
}

impl ShutdownUnit {
    /// Unit referencing the installed copies of both binaries
    pub fn from_config(config: &GuardConfig) -> Self {
        Self {
            before: config.before_unit.clone(),
            conflicts: config.conflicts_unit.clone(),
            drbdsetup: config.installed_drbdsetup(),
            executable: config.installed_binary(),
        }
    }

    /// Unit file content
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ShutdownUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[Unit]
Description=Ensure that DRBD devices with suspended IO are resumed (with potential IO errors) during shutdown.
# Ensure the stop action only runs after normal container shut down
Before={before}
# Ensure we get stopped during shutdown
Conflicts={conflicts}

[Service]
Type=oneshot
RemainAfterExit=yes
Environment={env}={drbdsetup}
ExecStop={executable} execute
",
            before = self.before,
            conflicts = self.conflicts,
            env = DRBDSETUP_ENV,
            drbdsetup = self.drbdsetup.display(),
            executable = self.executable.display(),
        )
    }
}
