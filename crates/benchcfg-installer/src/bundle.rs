use anyhow::{anyhow, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Returns the single directory at the top of an extracted tarball.
///
/// Top-level files are ignored; zero or several directories is an error.
pub fn find_top_level_dir(root: &Path) -> Result<PathBuf> {
    let mut dirs = Vec::new();
    for entry in fs::read_dir(root).with_context(|| format!("failed to read {}", root.display()))? {
        let entry = entry.with_context(|| format!("failed reading entry in {}", root.display()))?;
        let file_type = entry
            .file_type()
            .with_context(|| format!("failed to stat {}", entry.path().display()))?;
        if file_type.is_dir() {
            dirs.push(entry.path());
        }
    }
    dirs.sort();

    match dirs.len() {
        0 => Err(anyhow!("no directory found in {}", root.display())),
        1 => Ok(dirs.remove(0)),
        count => Err(anyhow!(
            "expected one top-level directory in {}, found {count}",
            root.display()
        )),
    }
}

pub fn locate_bundle(extract_root: &Path, subdir: &str) -> Result<PathBuf> {
    let top = find_top_level_dir(extract_root).context("locate top-level dir")?;
    let bundle = top.join(subdir);
    match fs::symlink_metadata(&bundle) {
        Ok(metadata) if metadata.is_dir() => Ok(bundle),
        _ => Err(anyhow!("{subdir} not found in tarball at {}", bundle.display())),
    }
}
