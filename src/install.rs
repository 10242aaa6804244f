//! Service Installation
//!
//! Copies `drbdsetup` and this binary into the runtime directory, writes the
//! shutdown unit and starts it. Running the installer again replaces every
//! artifact with identical content.

use std::fmt;
use std::fs::DirBuilder;
use std::os::unix::fs::DirBuilderExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::atomic::{atomic_create_file, copy_binary};
use crate::config::GuardConfig;
use crate::error::{Error, Result};
use crate::process::run_command;
use crate::systemd::{InitSystem, JobMode, ShutdownUnit};

const DIR_MODE: u32 = 0o755;
const BINARY_MODE: u32 = 0o755;
const UNIT_MODE: u32 = 0o644;

/// Installation steps, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallStep {
    CreateRuntimeDir,
    CopyDrbdsetup,
    CopySelf,
    CreateUnitDir,
    WriteUnit,
    Reload,
    StartUnit,
}

impl fmt::Display for InstallStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            InstallStep::CreateRuntimeDir => "create service directory",
            InstallStep::CopyDrbdsetup => "copy drbdsetup",
            InstallStep::CopySelf => "copy service binary",
            InstallStep::CreateUnitDir => "create systemd unit directory",
            InstallStep::WriteUnit => "write service unit",
            InstallStep::Reload => "reload systemd",
            InstallStep::StartUnit => "start service unit",
        };
        f.write_str(s)
    }
}

fn at(step: InstallStep) -> impl FnOnce(Error) -> Error {
    move |e| Error::Install {
        step,
        source: Box::new(e),
    }
}

/// Installs and starts the shutdown guard service
pub struct Installer {
    config: GuardConfig,
    init: Arc<dyn InitSystem>,
    self_binary: Option<PathBuf>,
}

impl Installer {
    pub fn new(config: GuardConfig, init: Arc<dyn InitSystem>) -> Self {
        Self {
            config,
            init,
            self_binary: None,
        }
    }

    /// Install this file instead of the running executable
    pub fn with_self_binary(mut self, path: impl Into<PathBuf>) -> Self {
        self.self_binary = Some(path.into());
        self
    }

    /// Run every installation step in order, stopping at the first failure.
    ///
    /// Artifacts written by earlier steps are left in place on failure.
    pub async fn install(&self, cancel: &CancellationToken) -> Result<()> {
        let config = &self.config;
        let drbdsetup = config.drbdsetup()?;

        if !nix::unistd::Uid::effective().is_root() {
            warn!("Not running as root, installation will likely fail");
        }

        info!("Creating service directory '{}'", config.runtime_dir.display());
        create_dir(&config.runtime_dir).map_err(at(InstallStep::CreateRuntimeDir))?;

        info!("Copying drbdsetup to service directory");
        atomic_create_file(
            &config.installed_drbdsetup(),
            BINARY_MODE,
            copy_binary(drbdsetup),
        )
        .map_err(at(InstallStep::CopyDrbdsetup))?;

        info!("Copying {} to service directory", config.binary_name);
        let self_binary = match &self.self_binary {
            Some(p) => p.clone(),
            None => std::env::current_exe()
                .map_err(|e| at(InstallStep::CopySelf)(e.into()))?,
        };
        atomic_create_file(
            &config.installed_binary(),
            BINARY_MODE,
            copy_binary(&self_binary),
        )
        .map_err(at(InstallStep::CopySelf))?;

        self.relabel(cancel).await;

        info!(
            "Creating systemd unit {} in {}",
            config.service_name,
            config.unit_dir.display()
        );
        create_dir(&config.unit_dir).map_err(at(InstallStep::CreateUnitDir))?;

        let unit = ShutdownUnit::from_config(config).render();
        atomic_create_file(&config.unit_path(), UNIT_MODE, |f| {
            use std::io::Write;
            f.write_all(unit.as_bytes())?;
            Ok(())
        })
        .map_err(at(InstallStep::WriteUnit))?;

        info!("Reloading systemd");
        self.init
            .reload(cancel)
            .await
            .map_err(at(InstallStep::Reload))?;

        info!("Starting systemd unit {}", config.service_name);
        self.start_unit(cancel)
            .await
            .map_err(at(InstallStep::StartUnit))?;

        info!("Install successful");
        Ok(())
    }

    /// Best-effort SELinux relabel of the runtime directory
    async fn relabel(&self, cancel: &CancellationToken) {
        let Some(label) = &self.config.selinux_label else {
            return;
        };

        info!("Optionally: relabel service directory for SELinux");
        let dir = self.config.runtime_dir.to_string_lossy();
        let args = ["--recursive", label.as_str(), dir.as_ref()];
        if let Err(e) = run_command("chcon", &args, cancel).await {
            warn!("Ignoring error when setting SELinux label: {}", e);
        }
    }

    async fn start_unit(&self, cancel: &CancellationToken) -> Result<()> {
        let unit = &self.config.service_name;
        let job = self.init.start_unit(unit, JobMode::Replace, cancel).await?;

        let result = self.init.wait_job(job, cancel).await?;
        if !result.is_done() {
            return Err(Error::JobFailed {
                unit: unit.clone(),
                result,
            });
        }

        Ok(())
    }
}

fn create_dir(path: &Path) -> Result<()> {
    DirBuilder::new()
        .recursive(true)
        .mode(DIR_MODE)
        .create(path)?;
    Ok(())
}
