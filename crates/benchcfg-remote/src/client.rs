use anyhow::{anyhow, Context, Result};
use benchcfg_core::{Credential, OperationContext, GITHUB_ACCEPT};
use reqwest::blocking::{Client, Response};
use reqwest::header::{ACCEPT, AUTHORIZATION};

const USER_AGENT: &str = concat!("benchcfg/", env!("CARGO_PKG_VERSION"));

/// Blocking HTTP client for release metadata and tarball downloads.
#[derive(Debug, Clone)]
pub struct RemoteClient {
    http: Client,
    credential: Credential,
    api_base: Option<String>,
}

impl RemoteClient {
    pub fn new(credential: Credential) -> Result<Self> {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            http,
            credential,
            api_base: None,
        })
    }

    /// Overrides the release metadata host, which otherwise follows the source URL.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = Some(api_base.into());
        self
    }

    pub(crate) fn api_base(&self) -> Option<&str> {
        self.api_base.as_deref()
    }

    pub(crate) fn get(&self, ctx: &OperationContext, url: &str, stage: &str) -> Result<Response> {
        ctx.check(stage)?;

        let mut request = self.http.get(url).header(ACCEPT, GITHUB_ACCEPT);
        if let Some(value) = self.credential.authorization_header() {
            request = request.header(AUTHORIZATION, value);
        }
        if let Some(left) = ctx.remaining() {
            request = request.timeout(left);
        }

        tracing::debug!(
            url,
            stage,
            authenticated = self.credential.token().is_some(),
            "sending request"
        );
        let response = request
            .send()
            .with_context(|| format!("{stage}: request to {url} failed"))?;

        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!("{stage}: unexpected status {status} from {url}"));
        }
        Ok(response)
    }
}
