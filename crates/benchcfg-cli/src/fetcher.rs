use std::path::Path;

use anyhow::Result;
use benchcfg_core::{OperationContext, Reference};
use benchcfg_installer::BundleFetcher;
use benchcfg_remote::RemoteClient;

use crate::render::{DownloadProgress, OutputStyle};

/// Wraps the remote client so downloads drive a terminal progress bar.
pub(crate) struct ProgressFetcher {
    client: RemoteClient,
    style: OutputStyle,
}

impl ProgressFetcher {
    pub(crate) fn new(client: RemoteClient, style: OutputStyle) -> Self {
        Self { client, style }
    }
}

impl BundleFetcher for ProgressFetcher {
    fn resolve_reference(
        &self,
        ctx: &OperationContext,
        source: &str,
        reference: &Reference,
    ) -> Result<String> {
        self.client.resolve_reference(ctx, source, reference)
    }

    fn download(&self, ctx: &OperationContext, url: &str, dest: &Path) -> Result<u64> {
        let mut progress = DownloadProgress::start(self.style);
        let result = self
            .client
            .download_with_progress(ctx, url, dest, |downloaded, total| {
                progress.set(downloaded, total)
            });
        match result {
            Ok(bytes) => {
                progress.finish_success();
                Ok(bytes)
            }
            Err(err) => {
                progress.finish_abandon();
                Err(err)
            }
        }
    }
}
