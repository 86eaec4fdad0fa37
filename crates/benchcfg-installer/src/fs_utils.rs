use anyhow::{Context, Result};
use std::collections::VecDeque;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use crate::safe_path::SafeRelativePath;

/// `create_dir_all`, with `mode` applied to every directory it creates.
pub(crate) fn create_dir_with_mode(path: &Path, mode: u32) -> io::Result<()> {
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(mode);
    }
    #[cfg(not(unix))]
    let _ = mode;
    builder.create(path)
}

pub(crate) fn set_mode(path: &Path, mode: u32) -> io::Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(mode))?;
    }
    #[cfg(not(unix))]
    let _ = (path, mode);
    Ok(())
}

/// Creates or truncates `path` and pins its mode, even if it already existed.
pub(crate) fn create_file_with_mode(path: &Path, mode: u32) -> io::Result<File> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(mode);
    }
    let file = options.open(path)?;
    set_mode(path, mode)?;
    Ok(file)
}

/// Removes a file, symlink or directory tree; missing paths are fine.
pub(crate) fn remove_path_if_exists(path: &Path) -> io::Result<()> {
    let metadata = match fs::symlink_metadata(path) {
        Ok(metadata) => metadata,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(err) => return Err(err),
    };
    if metadata.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    }
}

/// Copies the tree under `source_root` into `destination_root`, writing every
/// directory with `dir_mode` and every file with `file_mode`. Symlinks and
/// special files are skipped. Returns the number of files copied.
pub fn copy_dir_restricted(
    source_root: &Path,
    destination_root: &Path,
    dir_mode: u32,
    file_mode: u32,
) -> Result<usize> {
    if !source_root.is_dir() {
        anyhow::bail!("source is not a directory: {}", source_root.display());
    }

    create_dir_with_mode(destination_root, dir_mode)
        .with_context(|| format!("failed creating directory {}", destination_root.display()))?;
    set_mode(destination_root, dir_mode)
        .with_context(|| format!("failed to set mode on {}", destination_root.display()))?;

    let mut copied = 0_usize;
    let mut queue: VecDeque<(PathBuf, PathBuf)> = VecDeque::new();
    queue.push_back((source_root.to_path_buf(), destination_root.to_path_buf()));

    while let Some((from_dir, to_dir)) = queue.pop_front() {
        for entry in fs::read_dir(&from_dir)
            .with_context(|| format!("failed reading source directory {}", from_dir.display()))?
        {
            let entry = entry
                .with_context(|| format!("failed reading entry in {}", from_dir.display()))?;
            let from_path = entry.path();
            let name = PathBuf::from(entry.file_name());
            let to_path = SafeRelativePath::parse(&name)
                .context("unsafe target path")?
                .resolve(&to_dir);
            let file_type = entry
                .file_type()
                .with_context(|| format!("failed to stat {}", from_path.display()))?;

            if file_type.is_dir() {
                create_dir_with_mode(&to_path, dir_mode)
                    .with_context(|| format!("failed creating directory {}", to_path.display()))?;
                set_mode(&to_path, dir_mode)
                    .with_context(|| format!("failed to set mode on {}", to_path.display()))?;
                queue.push_back((from_path, to_path));
            } else if file_type.is_file() {
                let mut reader = File::open(&from_path)
                    .with_context(|| format!("failed to open {}", from_path.display()))?;
                let mut writer = create_file_with_mode(&to_path, file_mode)
                    .with_context(|| format!("failed to create {}", to_path.display()))?;
                io::copy(&mut reader, &mut writer).with_context(|| {
                    format!(
                        "failed copying file from {} to {}",
                        from_path.display(),
                        to_path.display()
                    )
                })?;
                copied += 1;
            } else {
                tracing::debug!(path = %from_path.display(), "skipping non-regular file");
            }
        }
    }

    Ok(copied)
}
