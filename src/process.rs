//! External Command Execution
//!
//! Every external tool (drbdsetup, systemctl, chcon) runs through here so
//! that all of them honour the process-wide cancellation token.

use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Run `program` with `args` to completion and return its stdout.
///
/// A non-zero exit status is an error carrying the tool's stderr. When
/// `cancel` fires first the child is killed and `Error::Cancelled` returned.
pub async fn run_command(
    program: impl AsRef<Path>,
    args: &[&str],
    cancel: &CancellationToken,
) -> Result<Vec<u8>> {
    let program = program.as_ref();
    let cmdline = describe(program, args);
    debug!("Running '{}'", cmdline);

    let child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| Error::Command {
            command: cmdline.clone(),
            reason: e.to_string(),
        })?;

    let output = tokio::select! {
        result = child.wait_with_output() => result.map_err(|e| Error::Command {
            command: cmdline.clone(),
            reason: e.to_string(),
        })?,
        _ = cancel.cancelled() => {
            warn!("Cancelled '{}'", cmdline);
            return Err(Error::Cancelled);
        }
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let stderr = stderr.trim();
        let reason = if stderr.is_empty() {
            output.status.to_string()
        } else {
            format!("{}: {}", output.status, stderr)
        };
        return Err(Error::Command {
            command: cmdline,
            reason,
        });
    }

    Ok(output.stdout)
}

/// Human readable command line, using only the program's file name
fn describe(program: &Path, args: &[&str]) -> String {
    let name = program
        .file_name()
        .map(|n| n.to_string_lossy())
        .unwrap_or_else(|| program.to_string_lossy());

    std::iter::once(name.as_ref())
        .chain(args.iter().copied())
        .collect::<Vec<_>>()
        .join(" ")
}
