/// Upstream tarball endpoint; the ref is appended as the last path segment.
pub const DEFAULT_SOURCE: &str = "https://api.github.com/repos/khulnasoft-lab/kube-bench/tarball";

/// Media type sent to both the release metadata and tarball endpoints.
pub const GITHUB_ACCEPT: &str = "application/vnd.github+json";

/// Directory under the archive's top-level folder that holds the bundle.
pub const BUNDLE_SUBDIR: &str = "cfg";

/// Per-entry cap on bytes written during extraction.
pub const MAX_ENTRY_BYTES: u64 = 100 * 1024 * 1024;

pub const DIR_MODE_CEILING: u32 = 0o750;
pub const FILE_MODE_CEILING: u32 = 0o600;

/// `chrono` format for backup directory suffixes, e.g. `20250131-235959`.
pub const BACKUP_TIMESTAMP_FORMAT: &str = "%Y%m%d-%H%M%S";
