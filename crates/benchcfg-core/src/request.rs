use std::fmt;
use std::path::{Component, Path, PathBuf};

pub const LATEST_REF: &str = "latest";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RequestError {
    #[error("invalid update request: {field} must not be empty")]
    MissingField { field: &'static str },
    #[error("invalid update request: target directory {path} must end in a directory name")]
    InvalidTarget { path: String },
}

/// A version reference: the symbolic `latest` or a concrete tag/branch/commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reference {
    Latest,
    Concrete(String),
}

impl Reference {
    pub fn parse(input: &str) -> Result<Self, RequestError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(RequestError::MissingField { field: "ref" });
        }
        if trimmed.eq_ignore_ascii_case(LATEST_REF) {
            return Ok(Self::Latest);
        }
        Ok(Self::Concrete(trimmed.to_string()))
    }

    pub fn is_latest(&self) -> bool {
        matches!(self, Self::Latest)
    }

    pub fn as_concrete(&self) -> Option<&str> {
        match self {
            Self::Latest => None,
            Self::Concrete(value) => Some(value),
        }
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Latest => f.write_str(LATEST_REF),
            Self::Concrete(value) => f.write_str(value),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateRequest {
    source: String,
    reference: String,
    target_dir: PathBuf,
    backup_enabled: bool,
    expected_sha256: Option<String>,
}

impl UpdateRequest {
    pub fn new(
        source: impl Into<String>,
        reference: impl Into<String>,
        target_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            source: source.into(),
            reference: reference.into(),
            target_dir: target_dir.into(),
            backup_enabled: false,
            expected_sha256: None,
        }
    }

    pub fn with_backup(mut self, enabled: bool) -> Self {
        self.backup_enabled = enabled;
        self
    }

    /// Blank digests are treated as absent so verification stays opt-in.
    pub fn with_expected_sha256(mut self, expected: Option<String>) -> Self {
        self.expected_sha256 = expected.filter(|value| !value.trim().is_empty());
        self
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn reference_str(&self) -> &str {
        &self.reference
    }

    pub fn target_dir(&self) -> &Path {
        &self.target_dir
    }

    pub fn backup_enabled(&self) -> bool {
        self.backup_enabled
    }

    pub fn expected_sha256(&self) -> Option<&str> {
        self.expected_sha256.as_deref()
    }

    /// Checks required fields and parses the reference. Performs no I/O.
    pub fn validate(&self) -> Result<Reference, RequestError> {
        if self.source.trim().is_empty() {
            return Err(RequestError::MissingField { field: "source" });
        }
        if self.reference.trim().is_empty() {
            return Err(RequestError::MissingField { field: "ref" });
        }
        if self.target_dir.as_os_str().is_empty() {
            return Err(RequestError::MissingField {
                field: "target directory",
            });
        }
        // Backup and staging paths are siblings of the target, so `.`, `..`
        // and `/` have nothing to attach to.
        if !matches!(self.target_dir.components().next_back(), Some(Component::Normal(_))) {
            return Err(RequestError::InvalidTarget {
                path: self.target_dir.display().to_string(),
            });
        }
        Reference::parse(&self.reference)
    }
}

pub fn artifact_url(source: &str, concrete_ref: &str) -> String {
    format!(
        "{}/{}",
        source.trim_end_matches('/'),
        concrete_ref.trim_start_matches('/')
    )
}
