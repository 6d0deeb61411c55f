//! Target replacement.
//!
//! Two strategies, selected by [`ReplaceMode`]:
//!
//! - `Overwrite` — truncate and rewrite the target in place. A crash mid-write
//!   can leave a partial file.
//! - `Atomic` — write `<target>.pollkeys.tmp`, then rename it over the target
//!   (atomic on POSIX when both live on the same filesystem). On failure the
//!   `.tmp` file is removed and the original is left intact.
//!
//! In both cases the configured mode is applied explicitly after the write,
//! so an existing target also ends up with the configured bits.

use std::ffi::OsString;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use pollkeys_core::{FileMode, ReplaceMode};

use crate::error::{write_err, SyncError};

/// Replaces the content of a target file.
pub trait Overwrite {
    fn overwrite(&self, target: &Path, contents: &[u8], mode: FileMode) -> Result<(), SyncError>;
}

/// Filesystem-backed [`Overwrite`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiskWriter {
    replace: ReplaceMode,
}

impl DiskWriter {
    pub fn new(replace: ReplaceMode) -> Self {
        Self { replace }
    }
}

impl Overwrite for DiskWriter {
    fn overwrite(&self, target: &Path, contents: &[u8], mode: FileMode) -> Result<(), SyncError> {
        match self.replace {
            ReplaceMode::Overwrite => overwrite_in_place(target, contents, mode),
            ReplaceMode::Atomic => replace_via_tmp(target, contents, mode, &tmp_path_for(target)),
        }
    }
}

/// `<target>.pollkeys.tmp`
pub fn tmp_path_for(target: &Path) -> PathBuf {
    let mut name: OsString = target.as_os_str().to_owned();
    name.push(".pollkeys.tmp");
    PathBuf::from(name)
}

fn overwrite_in_place(path: &Path, contents: &[u8], mode: FileMode) -> Result<(), SyncError> {
    ensure_parent(path)?;
    let mut file = open_for_write(path, mode).map_err(|e| write_err(path, e))?;
    file.write_all(contents).map_err(|e| write_err(path, e))?;

    // The content is already in place; a chmod refusal (e.g. a file owned by
    // someone else) is reported but does not fail the cycle.
    if let Err(e) = apply_mode(&file, mode) {
        tracing::warn!("could not set mode {} on {}: {}", mode, path.display(), e);
    }
    Ok(())
}

fn replace_via_tmp(
    path: &Path,
    contents: &[u8],
    mode: FileMode,
    tmp: &Path,
) -> Result<(), SyncError> {
    ensure_parent(path)?;

    let staged = open_for_write(tmp, mode).and_then(|mut file| {
        file.write_all(contents)?;
        apply_mode(&file, mode)?;
        file.sync_all()
    });
    if let Err(e) = staged {
        let _ = std::fs::remove_file(tmp);
        return Err(write_err(tmp, e));
    }

    if let Err(e) = std::fs::rename(tmp, path) {
        let _ = std::fs::remove_file(tmp);
        return Err(write_err(path, e));
    }
    Ok(())
}

fn ensure_parent(path: &Path) -> Result<(), SyncError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| write_err(parent, e))?;
    }
    Ok(())
}

#[cfg(unix)]
fn open_for_write(path: &Path, mode: FileMode) -> std::io::Result<File> {
    use std::os::unix::fs::OpenOptionsExt;

    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(mode.bits())
        .open(path)
}

#[cfg(not(unix))]
fn open_for_write(path: &Path, _mode: FileMode) -> std::io::Result<File> {
    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
}

#[cfg(unix)]
fn apply_mode(file: &File, mode: FileMode) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    file.set_permissions(std::fs::Permissions::from_mode(mode.bits()))
}

#[cfg(not(unix))]
fn apply_mode(_file: &File, _mode: FileMode) -> std::io::Result<()> {
    Ok(())
}
