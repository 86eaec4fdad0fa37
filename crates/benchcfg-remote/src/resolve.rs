use anyhow::{anyhow, Context, Result};
use benchcfg_core::{OperationContext, Reference};
use reqwest::Url;
use serde::Deserialize;

use crate::RemoteClient;

const REPOS_MARKER: &str = "/repos/";

/// `owner/repo` pair embedded in a tarball source such as
/// `https://api.github.com/repos/{owner}/{repo}/tarball`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoCoordinates {
    pub owner: String,
    pub repo: String,
}

impl RepoCoordinates {
    pub fn parse_source(source: &str) -> Result<Self> {
        let Some(index) = source.find(REPOS_MARKER) else {
            return Err(anyhow!("cannot parse owner/repo from source {source:?}"));
        };
        let mut segments = source[index + REPOS_MARKER.len()..].splitn(3, '/');
        let owner = segments.next().unwrap_or_default();
        let repo = segments.next().unwrap_or_default();
        if owner.is_empty() || repo.is_empty() {
            return Err(anyhow!("cannot parse owner/repo from source {source:?}"));
        }
        Ok(Self {
            owner: owner.to_string(),
            repo: repo.to_string(),
        })
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct LatestRelease {
    pub tag_name: String,
}

pub fn latest_release_url(api_base: &str, coords: &RepoCoordinates) -> String {
    format!(
        "{}/repos/{}/{}/releases/latest",
        api_base.trim_end_matches('/'),
        coords.owner,
        coords.repo
    )
}

fn api_base_from_source(source: &str) -> Result<String> {
    let url = Url::parse(source).with_context(|| format!("invalid source URL {source:?}"))?;
    if !url.has_host() {
        return Err(anyhow!("source URL {source:?} has no host"));
    }
    Ok(url.origin().ascii_serialization())
}

impl RemoteClient {
    /// Returns a concrete ref, querying release metadata only for `latest`.
    pub fn resolve_reference(
        &self,
        ctx: &OperationContext,
        source: &str,
        reference: &Reference,
    ) -> Result<String> {
        match reference {
            Reference::Concrete(value) => Ok(value.clone()),
            Reference::Latest => self
                .resolve_latest(ctx, source)
                .context("resolve latest release"),
        }
    }

    pub fn resolve_latest(&self, ctx: &OperationContext, source: &str) -> Result<String> {
        let coords = RepoCoordinates::parse_source(source)?;
        let api_base = match self.api_base() {
            Some(base) => base.to_string(),
            None => api_base_from_source(source)?,
        };
        let url = latest_release_url(&api_base, &coords);

        let body = self
            .get(ctx, &url, "resolve latest release")?
            .text()
            .with_context(|| format!("failed to read release metadata from {url}"))?;
        let release: LatestRelease = serde_json::from_str(&body)
            .with_context(|| format!("tag_name not found in latest release response from {url}"))?;

        let tag = release.tag_name.trim();
        if tag.is_empty() {
            return Err(anyhow!("empty latest tag in response from {url}"));
        }
        tracing::info!(owner = %coords.owner, repo = %coords.repo, tag, "resolved latest release");
        Ok(tag.to_string())
    }
}
