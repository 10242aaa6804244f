//! Atomic File Replacement
//!
//! Files are materialized in a temporary file next to their destination and
//! renamed into place, so readers see either the old or the new content.

use std::fs::{File, Permissions};
use std::io;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result, WriteStage};

/// Create or replace `path` with the content produced by `write`.
///
/// The temporary file lives in the destination directory so the final rename
/// stays on one filesystem. `mode` is applied before any content is written.
/// If `write` fails the temporary file is removed and the destination is left
/// untouched.
pub fn atomic_create_file<F>(path: &Path, mode: u32, write: F) -> Result<()>
where
    F: FnOnce(&mut File) -> Result<()>,
{
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let prefix = path.file_name().ok_or_else(|| {
        stage_error(path, WriteStage::CreateTemp, io::ErrorKind::InvalidInput.into())
    })?;

    let mut tmp = tempfile::Builder::new()
        .prefix(prefix)
        .tempfile_in(dir)
        .map_err(|e| stage_error(path, WriteStage::CreateTemp, e))?;

    tmp.as_file()
        .set_permissions(Permissions::from_mode(mode))
        .map_err(|e| stage_error(path, WriteStage::SetPermissions, e))?;

    // Dropping `tmp` on error removes the temporary file
    write(tmp.as_file_mut())?;

    tmp.as_file()
        .sync_all()
        .map_err(|e| stage_error(path, WriteStage::Close, e))?;

    tmp.into_temp_path()
        .persist(path)
        .map_err(|e| stage_error(path, WriteStage::Rename, e.error))?;

    Ok(())
}

/// Content producer copying the bytes of the file at `src`
pub fn copy_binary(src: &Path) -> impl FnOnce(&mut File) -> Result<()> + '_ {
    move |dst| {
        let mut source = File::open(src).map_err(|e| Error::CopySource {
            path: src.to_path_buf(),
            source: e,
        })?;

        io::copy(&mut source, dst).map_err(|e| Error::CopySource {
            path: src.to_path_buf(),
            source: e,
        })?;

        Ok(())
    }
}

fn stage_error(path: &Path, stage: WriteStage, source: io::Error) -> Error {
    Error::AtomicWrite {
        path: PathBuf::from(path),
        stage,
        source,
    }
}
