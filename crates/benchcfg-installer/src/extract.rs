use anyhow::{Context, Result};
use benchcfg_core::{DIR_MODE_CEILING, FILE_MODE_CEILING, MAX_ENTRY_BYTES};
use flate2::read::GzDecoder;
use std::fs::{self, File};
use std::io::{self, BufReader, Read};
use std::path::Path;

use crate::fs_utils::{create_dir_with_mode, create_file_with_mode, set_mode};
use crate::safe_path::SafeRelativePath;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("file too large: {entry} ({observed} bytes > {limit} bytes)")]
pub struct EntryTooLarge {
    pub entry: String,
    /// Declared size, or `limit + 1` when the stream ran past the limit.
    pub observed: u64,
    pub limit: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractLimits {
    pub max_entry_bytes: u64,
    pub dir_mode_ceiling: u32,
    pub file_mode_ceiling: u32,
}

impl Default for ExtractLimits {
    fn default() -> Self {
        Self {
            max_entry_bytes: MAX_ENTRY_BYTES,
            dir_mode_ceiling: DIR_MODE_CEILING,
            file_mode_ceiling: FILE_MODE_CEILING,
        }
    }
}

impl ExtractLimits {
    /// Owner keeps rwx so the tree can still be walked and cleaned up.
    pub fn dir_mode(&self, declared: u32) -> u32 {
        (declared | 0o700) & self.dir_mode_ceiling
    }

    /// Owner keeps read access so the file can be copied into place.
    pub fn file_mode(&self, declared: u32) -> u32 {
        (declared | 0o400) & self.file_mode_ceiling
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractSummary {
    pub directories: usize,
    pub files: usize,
    pub skipped: usize,
    pub bytes: u64,
}

/// Unpacks a `.tar.gz` under `dest` one entry at a time.
///
/// Only directories and regular files are materialized; links, devices and
/// metadata records are counted as skipped. The first unsafe or malformed
/// entry aborts extraction, leaving whatever was written before it in place.
pub fn extract_tar_gz(
    archive: &Path,
    dest: &Path,
    limits: &ExtractLimits,
) -> Result<ExtractSummary> {
    let file =
        File::open(archive).with_context(|| format!("failed to open {}", archive.display()))?;
    let mut tarball = tar::Archive::new(GzDecoder::new(BufReader::new(file)));

    create_dir_with_mode(dest, limits.dir_mode_ceiling)
        .with_context(|| format!("failed to create {}", dest.display()))?;

    let mut summary = ExtractSummary::default();
    for entry in tarball
        .entries()
        .with_context(|| format!("failed to read tar entries from {}", archive.display()))?
    {
        let mut entry = entry.context("malformed tar entry")?;
        let raw_path = entry
            .path()
            .context("failed to read tar entry path")?
            .into_owned();
        let safe = SafeRelativePath::parse(&raw_path).context("unsafe tar entry")?;
        let entry_type = entry.header().entry_type();
        let declared_mode = entry
            .header()
            .mode()
            .with_context(|| format!("invalid mode for tar entry {}", raw_path.display()))?;

        if entry_type.is_dir() {
            if safe.is_root() {
                continue;
            }
            let target = safe.resolve(dest);
            let mode = limits.dir_mode(declared_mode);
            create_dir_with_mode(&target, mode)
                .with_context(|| format!("failed to create {}", target.display()))?;
            set_mode(&target, mode)
                .with_context(|| format!("failed to set mode on {}", target.display()))?;
            summary.directories += 1;
        } else if entry_type.is_file() {
            if safe.is_root() {
                return Err(anyhow::anyhow!(
                    "tar entry {} resolves to the extraction root",
                    raw_path.display()
                ));
            }
            let target = safe.resolve(dest);
            let written =
                write_file_entry(&mut entry, &raw_path, &target, declared_mode, limits)?;
            summary.files += 1;
            summary.bytes += written;
        } else {
            tracing::debug!(
                entry = %raw_path.display(),
                entry_type = ?entry_type,
                "skipping unsupported tar entry type"
            );
            summary.skipped += 1;
        }
    }

    Ok(summary)
}

fn write_file_entry<R: Read>(
    entry: &mut tar::Entry<'_, R>,
    raw_path: &Path,
    target: &Path,
    declared_mode: u32,
    limits: &ExtractLimits,
) -> Result<u64> {
    let declared_size = entry.size();
    if declared_size > limits.max_entry_bytes {
        return Err(EntryTooLarge {
            entry: raw_path.display().to_string(),
            observed: declared_size,
            limit: limits.max_entry_bytes,
        }
        .into());
    }

    if let Some(parent) = target.parent() {
        create_dir_with_mode(parent, limits.dir_mode_ceiling)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }

    let mut file = create_file_with_mode(target, limits.file_mode(declared_mode))
        .with_context(|| format!("failed to create {}", target.display()))?;
    let written = io::copy(&mut entry.by_ref().take(limits.max_entry_bytes), &mut file)
        .with_context(|| format!("failed to extract {}", raw_path.display()))?;

    let mut probe = [0_u8; 1];
    let overflow = entry
        .read(&mut probe)
        .with_context(|| format!("failed to extract {}", raw_path.display()))?;
    if overflow > 0 {
        drop(file);
        let _ = fs::remove_file(target);
        return Err(EntryTooLarge {
            entry: raw_path.display().to_string(),
            observed: limits.max_entry_bytes + 1,
            limit: limits.max_entry_bytes,
        }
        .into());
    }

    Ok(written)
}
