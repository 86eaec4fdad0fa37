use anyhow::{Context, Result};
use benchcfg_core::{
    artifact_url, Credential, OperationContext, Reference, UpdateRequest, BUNDLE_SUBDIR,
};
use benchcfg_remote::RemoteClient;
use benchcfg_security::verify_sha256_file;
use std::path::{Path, PathBuf};

use crate::bundle::locate_bundle;
use crate::extract::{extract_tar_gz, ExtractLimits, ExtractSummary};
use crate::replace::{backup_existing, backup_path_for, replace_target};
use crate::scratch::ScratchArea;

const SCRATCH_PREFIX: &str = "benchcfg-update-";

/// Network half of an update: turning a reference into a concrete one and
/// fetching the tarball for it.
pub trait BundleFetcher {
    fn resolve_reference(
        &self,
        ctx: &OperationContext,
        source: &str,
        reference: &Reference,
    ) -> Result<String>;

    fn download(&self, ctx: &OperationContext, url: &str, dest: &Path) -> Result<u64>;
}

impl BundleFetcher for RemoteClient {
    fn resolve_reference(
        &self,
        ctx: &OperationContext,
        source: &str,
        reference: &Reference,
    ) -> Result<String> {
        RemoteClient::resolve_reference(self, ctx, source, reference)
    }

    fn download(&self, ctx: &OperationContext, url: &str, dest: &Path) -> Result<u64> {
        RemoteClient::download(self, ctx, url, dest)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateOutcome {
    pub reference: String,
    pub artifact_url: String,
    pub artifact_bytes: u64,
    pub verified: bool,
    pub extracted: ExtractSummary,
    pub backup_path: Option<PathBuf>,
    pub files_installed: usize,
}

pub fn update_config_bundle(
    ctx: &OperationContext,
    request: &UpdateRequest,
    credential: &Credential,
) -> Result<UpdateOutcome> {
    request.validate()?;
    let client = RemoteClient::new(credential.clone())?;
    update_config_bundle_with_fetcher(ctx, request, &client)
}

/// Replaces `request.target_dir()` with the `cfg/` tree of the tarball at
/// `request.source()/<ref>`.
///
/// The scratch area is removed on every return path. The live target is only
/// touched after the tarball has been downloaded, verified, extracted and the
/// bundle located.
pub fn update_config_bundle_with_fetcher<F>(
    ctx: &OperationContext,
    request: &UpdateRequest,
    fetcher: &F,
) -> Result<UpdateOutcome>
where
    F: BundleFetcher + ?Sized,
{
    let reference = request.validate()?;
    let concrete = fetcher.resolve_reference(ctx, request.source(), &reference)?;
    let url = artifact_url(request.source(), &concrete);
    tracing::info!(
        source = request.source(),
        reference = %concrete,
        "updating configuration bundle"
    );

    let scratch = ScratchArea::create(SCRATCH_PREFIX)?;
    let scratch_root = scratch.path().to_path_buf();
    let result = update_in_scratch(ctx, request, fetcher, &scratch, concrete, url);

    if let Err(err) = scratch.close() {
        tracing::warn!(
            path = %scratch_root.display(),
            error = %err,
            "failed to remove scratch directory"
        );
    }
    result
}

fn update_in_scratch<F>(
    ctx: &OperationContext,
    request: &UpdateRequest,
    fetcher: &F,
    scratch: &ScratchArea,
    reference: String,
    url: String,
) -> Result<UpdateOutcome>
where
    F: BundleFetcher + ?Sized,
{
    let limits = ExtractLimits::default();

    let artifact = scratch.artifact_path();
    let artifact_bytes = fetcher
        .download(ctx, &url, &artifact)
        .context("download tarball")?;

    let verified = match request.expected_sha256() {
        Some(expected) => {
            verify_sha256_file(&artifact, expected).context("checksum verification failed")?;
            tracing::info!(path = %artifact.display(), "checksum verified");
            true
        }
        None => false,
    };

    let extract_dir = scratch.create_extract_dir(limits.dir_mode_ceiling)?;
    let extracted =
        extract_tar_gz(&artifact, &extract_dir, &limits).context("extract tarball")?;
    tracing::info!(
        directories = extracted.directories,
        files = extracted.files,
        skipped = extracted.skipped,
        bytes = extracted.bytes,
        "extracted tarball"
    );

    let bundle = locate_bundle(&extract_dir, BUNDLE_SUBDIR)?;

    let target = request.target_dir();
    let backup_path = if request.backup_enabled() {
        let backup = backup_path_for(target, &chrono::Local::now());
        let moved = backup_existing(target, &backup)?;
        if let Some(path) = &moved {
            tracing::info!(backup = %path.display(), "backed up existing cfg dir");
        }
        moved
    } else {
        None
    };

    let files_installed = replace_target(
        &bundle,
        target,
        limits.dir_mode_ceiling,
        limits.file_mode_ceiling,
    )?;
    tracing::info!(target = %target.display(), files = files_installed, "configuration updated");

    Ok(UpdateOutcome {
        reference,
        artifact_url: url,
        artifact_bytes,
        verified,
        extracted,
        backup_path,
        files_installed,
    })
}
