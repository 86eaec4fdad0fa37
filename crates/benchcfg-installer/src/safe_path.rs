use std::path::{Component, Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("path traversal detected: {entry}")]
pub struct ContainmentViolation {
    pub entry: String,
}

/// A relative path that stays inside whatever root it is joined onto.
///
/// Built only by [`SafeRelativePath::parse`], which resolves `.` and `..`
/// lexically and rejects anything that would climb above the root, as well
/// as absolute and drive-prefixed names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SafeRelativePath(PathBuf);

impl SafeRelativePath {
    pub fn parse(untrusted: &Path) -> Result<Self, ContainmentViolation> {
        let violation = || ContainmentViolation {
            entry: untrusted.display().to_string(),
        };

        let mut resolved: Vec<&std::ffi::OsStr> = Vec::new();
        for component in untrusted.components() {
            match component {
                Component::Normal(segment) => resolved.push(segment),
                Component::CurDir => {}
                Component::ParentDir => {
                    if resolved.pop().is_none() {
                        return Err(violation());
                    }
                }
                Component::RootDir | Component::Prefix(_) => return Err(violation()),
            }
        }

        Ok(Self(resolved.into_iter().collect()))
    }

    /// True when the name resolved to the root itself (e.g. `./`).
    pub fn is_root(&self) -> bool {
        self.0.as_os_str().is_empty()
    }

    pub fn as_path(&self) -> &Path {
        &self.0
    }

    pub fn resolve(&self, root: &Path) -> PathBuf {
        root.join(&self.0)
    }
}
