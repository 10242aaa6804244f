//! Shutdown Guard Configuration
//!
//! Filesystem layout and unit names used by both the installer and the
//! shutdown-time executor. Every field has a default, so a configuration
//! file is only needed for non-standard layouts.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Environment variable carrying the path of the `drbdsetup` binary
pub const DRBDSETUP_ENV: &str = "DRBDSETUP_LOCATION";

/// Main shutdown guard configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GuardConfig {
    /// Directory holding the installed copies of both binaries
    pub runtime_dir: PathBuf,

    /// Directory the generated unit is written to
    pub unit_dir: PathBuf,

    /// Name of the generated service unit
    pub service_name: String,

    /// File name of the installed copy of this binary
    pub binary_name: String,

    /// File name of the installed copy of `drbdsetup`
    pub drbdsetup_name: String,

    /// Path of the `drbdsetup` binary to copy and invoke
    pub drbdsetup_path: Option<PathBuf>,

    /// Workload service that must be stopped before the guard runs
    pub before_unit: String,

    /// Unmount stage the guard conflicts with
    pub conflicts_unit: String,

    /// SELinux label applied to the runtime directory (none disables relabeling)
    pub selinux_label: Option<String>,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            runtime_dir: PathBuf::from("/run/drbd-shutdown-guard"),
            unit_dir: PathBuf::from("/run/systemd/system"),
            service_name: "drbd-shutdown-guard.service".to_string(),
            binary_name: "drbd-shutdown-guard".to_string(),
            drbdsetup_name: "drbdsetup".to_string(),
            drbdsetup_path: None,
            before_unit: "kubelet.service".to_string(),
            conflicts_unit: "umount.target".to_string(),
            selinux_label: Some("system_u:object_r:bin_t:s0".to_string()),
        }
    }
}

impl GuardConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;
        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string
    pub fn from_str(content: &str) -> Result<Self> {
        let config: GuardConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load the configuration used by the CLI: an optional file, then the environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var_os(key));
        Ok(config)
    }

    /// Override settings from the environment
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<std::ffi::OsString>,
    {
        if let Some(path) = lookup(DRBDSETUP_ENV).filter(|v| !v.is_empty()) {
            self.drbdsetup_path = Some(PathBuf::from(path));
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("service_name", &self.service_name),
            ("binary_name", &self.binary_name),
            ("drbdsetup_name", &self.drbdsetup_name),
        ] {
            if value.is_empty() || value.contains('/') {
                return Err(Error::Config(format!(
                    "{} must be a plain file name, got '{}'",
                    field, value
                )));
            }
        }

        if !self.service_name.ends_with(".service") {
            return Err(Error::Config(format!(
                "service_name must end in '.service', got '{}'",
                self.service_name
            )));
        }

        Ok(())
    }

    /// Path of the `drbdsetup` binary, required by both commands
    pub fn drbdsetup(&self) -> Result<&Path> {
        self.drbdsetup_path
            .as_deref()
            .ok_or_else(|| Error::Config(format!("{} is not set", DRBDSETUP_ENV)))
    }

    /// Location of the installed `drbdsetup` copy
    pub fn installed_drbdsetup(&self) -> PathBuf {
        self.runtime_dir.join(&self.drbdsetup_name)
    }

    /// Location of the installed copy of this binary
    pub fn installed_binary(&self) -> PathBuf {
        self.runtime_dir.join(&self.binary_name)
    }

    /// Location of the generated unit file
    pub fn unit_path(&self) -> PathBuf {
        self.unit_dir.join(&self.service_name)
    }
}
