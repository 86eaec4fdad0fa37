mod bundle;
mod extract;
mod fs_utils;
mod replace;
mod safe_path;
mod scratch;
mod update;

pub use bundle::{find_top_level_dir, locate_bundle};
pub use extract::{extract_tar_gz, EntryTooLarge, ExtractLimits, ExtractSummary};
pub use fs_utils::copy_dir_restricted;
pub use replace::{backup_existing, backup_path_for, replace_target, staging_path_for};
pub use safe_path::{ContainmentViolation, SafeRelativePath};
pub use scratch::ScratchArea;
pub use update::{
    update_config_bundle, update_config_bundle_with_fetcher, BundleFetcher, UpdateOutcome,
};
