use anyhow::{Context, Result};
use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::fs_utils::create_dir_with_mode;

const ARTIFACT_FILE: &str = "src.tar.gz";
const EXTRACT_DIR: &str = "extract";

/// Process-exclusive temp directory for one update; removed on drop.
#[derive(Debug)]
pub struct ScratchArea {
    root: TempDir,
}

impl ScratchArea {
    pub fn create(prefix: &str) -> Result<Self> {
        let root = tempfile::Builder::new()
            .prefix(prefix)
            .tempdir()
            .context("create temp dir")?;
        Ok(Self { root })
    }

    pub fn path(&self) -> &Path {
        self.root.path()
    }

    pub fn artifact_path(&self) -> PathBuf {
        self.root.path().join(ARTIFACT_FILE)
    }

    pub fn extract_dir(&self) -> PathBuf {
        self.root.path().join(EXTRACT_DIR)
    }

    pub fn create_extract_dir(&self, mode: u32) -> Result<PathBuf> {
        let dir = self.extract_dir();
        create_dir_with_mode(&dir, mode)
            .with_context(|| format!("mkdir extract: {}", dir.display()))?;
        Ok(dir)
    }

    pub fn close(self) -> io::Result<()> {
        self.root.close()
    }
}
