use anyhow::{anyhow, Context, Result};
use benchcfg_core::BACKUP_TIMESTAMP_FORMAT;
use chrono::{DateTime, TimeZone};
use std::ffi::OsString;
use std::fmt::Display;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::fs_utils::{copy_dir_restricted, create_dir_with_mode, remove_path_if_exists};

fn sibling_with_suffix(target: &Path, suffix: &str) -> PathBuf {
    // components() drops trailing separators, so `cfg/` and `cfg` agree.
    let mut name = OsString::from(target.components().as_path().as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

/// `<target>.bak-<YYYYMMDD-HHMMSS>`.
pub fn backup_path_for<Tz>(target: &Path, at: &DateTime<Tz>) -> PathBuf
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let stamp = at.format(BACKUP_TIMESTAMP_FORMAT);
    sibling_with_suffix(target, &format!(".bak-{stamp}"))
}

pub fn staging_path_for(target: &Path) -> PathBuf {
    sibling_with_suffix(target, &format!(".staging-{}", std::process::id()))
}

/// Renames an existing target to `backup`. Returns `None` when there was
/// nothing to back up. Never overwrites an earlier backup.
pub fn backup_existing(target: &Path, backup: &Path) -> Result<Option<PathBuf>> {
    match fs::symlink_metadata(target) {
        Ok(_) => {}
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(err) => {
            return Err(err).with_context(|| {
                format!("backup cfg dir: failed to stat {}", target.display())
            });
        }
    }

    if fs::symlink_metadata(backup).is_ok() {
        return Err(anyhow!(
            "backup cfg dir: backup path already exists: {}",
            backup.display()
        ));
    }

    fs::rename(target, backup).with_context(|| {
        format!(
            "backup cfg dir: failed to rename {} to {}",
            target.display(),
            backup.display()
        )
    })?;
    Ok(Some(backup.to_path_buf()))
}

/// Installs a copy of `bundle` at `target`.
///
/// The bundle is first copied to a staging sibling of `target`, so a failed
/// copy leaves `target` alone. The old target is then removed and the staging
/// directory renamed into place; the window between those two steps is the
/// only point where `target` is missing.
pub fn replace_target(
    bundle: &Path,
    target: &Path,
    dir_mode: u32,
    file_mode: u32,
) -> Result<usize> {
    if let Some(parent) = target.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        create_dir_with_mode(parent, dir_mode)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }

    replace_target_with_hooks(bundle, target, dir_mode, file_mode, |staging, target| {
        remove_path_if_exists(target)
            .with_context(|| format!("remove old cfg: {}", target.display()))?;
        move_dir_or_copy(staging, target, dir_mode, file_mode)
    })
}

/// `install` swaps the staged copy into `target`. The staging directory is
/// removed whenever it fails.
pub(crate) fn replace_target_with_hooks<Install>(
    bundle: &Path,
    target: &Path,
    dir_mode: u32,
    file_mode: u32,
    install: Install,
) -> Result<usize>
where
    Install: FnOnce(&Path, &Path) -> Result<()>,
{
    let staging = staging_path_for(target);
    remove_path_if_exists(&staging)
        .with_context(|| format!("failed to clear stale staging dir {}", staging.display()))?;

    let copied = match copy_dir_restricted(bundle, &staging, dir_mode, file_mode) {
        Ok(copied) => copied,
        Err(err) => {
            discard_staging(&staging);
            return Err(err).context("copy cfg");
        }
    };

    if let Err(err) = install(&staging, target) {
        discard_staging(&staging);
        return Err(err);
    }

    Ok(copied)
}

fn discard_staging(staging: &Path) {
    if let Err(err) = remove_path_if_exists(staging) {
        tracing::warn!(
            path = %staging.display(),
            error = %err,
            "failed to remove staging dir"
        );
    }
}

fn move_dir_or_copy(src: &Path, dst: &Path, dir_mode: u32, file_mode: u32) -> Result<()> {
    match fs::rename(src, dst) {
        Ok(()) => Ok(()),
        Err(err) => {
            tracing::debug!(
                src = %src.display(),
                dst = %dst.display(),
                error = %err,
                "rename failed, falling back to copy"
            );
            copy_dir_restricted(src, dst, dir_mode, file_mode).context("copy cfg")?;
            // dst is already installed here; a leftover staging dir is not fatal.
            discard_staging(src);
            Ok(())
        }
    }
}
