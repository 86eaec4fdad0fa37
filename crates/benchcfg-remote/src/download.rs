use anyhow::{anyhow, Context, Result};
use benchcfg_core::OperationContext;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::{Component, Path};

use crate::RemoteClient;

const CHUNK_BYTES: usize = 64 * 1024;

/// The destination must be a plain file name directly under an existing directory.
pub fn validate_download_destination(dest: &Path) -> Result<()> {
    if dest
        .components()
        .any(|component| matches!(component, Component::ParentDir))
    {
        return Err(anyhow!(
            "invalid destination path: {} contains a parent-directory segment",
            dest.display()
        ));
    }
    let Some(parent) = dest.parent().filter(|parent| !parent.as_os_str().is_empty()) else {
        return Err(anyhow!(
            "invalid destination path: {} has no parent directory",
            dest.display()
        ));
    };
    match dest.file_name() {
        Some(name) if Path::new(name).components().count() == 1 => {}
        _ => {
            return Err(anyhow!(
                "invalid destination path: {} has no file name",
                dest.display()
            ));
        }
    }
    if !parent.is_dir() {
        return Err(anyhow!(
            "invalid destination path: parent {} is not a directory",
            parent.display()
        ));
    }
    Ok(())
}

fn create_owner_only(dest: &Path) -> io::Result<File> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    options.open(dest)
}

impl RemoteClient {
    pub fn download(&self, ctx: &OperationContext, url: &str, dest: &Path) -> Result<u64> {
        self.download_with_progress(ctx, url, dest, |_downloaded, _total| {})
    }

    /// Streams `url` into `dest`, calling `progress(downloaded, total)` per chunk.
    ///
    /// A partially written file is removed on failure.
    pub fn download_with_progress<F>(
        &self,
        ctx: &OperationContext,
        url: &str,
        dest: &Path,
        mut progress: F,
    ) -> Result<u64>
    where
        F: FnMut(u64, Option<u64>),
    {
        validate_download_destination(dest)?;

        let mut response = self.get(ctx, url, "download artifact")?;
        let total = response.content_length();

        let mut file = create_owner_only(dest)
            .with_context(|| format!("failed to create {}", dest.display()))?;

        let copied = (|| -> Result<u64> {
            let mut buffer = vec![0_u8; CHUNK_BYTES];
            let mut downloaded = 0_u64;
            loop {
                ctx.check("download artifact")?;
                let read = match response.read(&mut buffer) {
                    Ok(0) => break,
                    Ok(read) => read,
                    Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                    Err(err) => {
                        return Err(err).with_context(|| format!("failed reading body of {url}"))
                    }
                };
                file.write_all(&buffer[..read])
                    .with_context(|| format!("failed writing {}", dest.display()))?;
                downloaded += read as u64;
                progress(downloaded, total);
            }
            file.flush()
                .with_context(|| format!("failed to flush {}", dest.display()))?;
            Ok(downloaded)
        })();

        match copied {
            Ok(downloaded) => {
                tracing::info!(
                    url,
                    bytes = downloaded,
                    path = %dest.display(),
                    "downloaded artifact"
                );
                Ok(downloaded)
            }
            Err(err) => {
                drop(file);
                let _ = fs::remove_file(dest);
                Err(err)
            }
        }
    }
}
