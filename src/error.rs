//! Shutdown Guard Error Types

use std::path::PathBuf;
use thiserror::Error;

use crate::demote::DemotionOutcome;
use crate::install::InstallStep;
use crate::systemd::JobResult;

/// Result type alias for shutdown guard operations
pub type Result<T> = std::result::Result<T, Error>;

/// Stage of an atomic file replacement that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteStage {
    CreateTemp,
    SetPermissions,
    Close,
    Rename,
}

impl std::fmt::Display for WriteStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            WriteStage::CreateTemp => "create temporary file",
            WriteStage::SetPermissions => "update temporary file permissions",
            WriteStage::Close => "close temporary file",
            WriteStage::Rename => "move temporary file to final location",
        };
        f.write_str(s)
    }
}

/// Shutdown guard error types
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(#[from] toml::de::Error),

    // File errors
    #[error("Failed to {stage} for '{}': {source}", .path.display())]
    AtomicWrite {
        path: PathBuf,
        stage: WriteStage,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to copy '{}': {source}", .path.display())]
    CopySource {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // External tool errors
    #[error("Failed to run '{command}': {reason}")]
    Command { command: String, reason: String },

    #[error("Failed to parse output of 'drbdsetup status --json': {source}")]
    StatusParse {
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to demote {}", describe_failures(.failures))]
    Demotion { failures: Vec<DemotionOutcome> },

    // Init system errors
    #[error("Init system error: {0}")]
    InitSystem(String),

    #[error("Start job for '{unit}' finished with result '{result}'")]
    JobFailed { unit: String, result: JobResult },

    #[error("Install step '{step}' failed: {source}")]
    Install {
        step: InstallStep,
        #[source]
        source: Box<Error>,
    },

    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Operation cancelled")]
    Cancelled,
}

impl Error {
    /// Check if this error was caused by the cancellation signal
    pub fn is_cancelled(&self) -> bool {
        match self {
            Error::Cancelled => true,
            Error::Install { source, .. } => source.is_cancelled(),
            _ => false,
        }
    }

    /// Names of the resources that failed to demote, if this is a demotion failure
    pub fn failed_resources(&self) -> Vec<&str> {
        match self {
            Error::Demotion { failures } => failures.iter().map(|f| f.resource.as_str()).collect(),
            _ => Vec::new(),
        }
    }
}

fn describe_failures(failures: &[DemotionOutcome]) -> String {
    failures
        .iter()
        .map(|f| match &f.failure {
            Some(detail) => format!("'{}' ({})", f.resource, detail),
            None => format!("'{}'", f.resource),
        })
        .collect::<Vec<_>>()
        .join(", ")
}
