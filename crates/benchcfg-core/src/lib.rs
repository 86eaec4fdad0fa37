mod context;
mod credential;
mod limits;
mod request;

pub use context::{Cancelled, OperationContext};
pub use credential::{Credential, TOKEN_ENV_VAR};
pub use limits::{
    BACKUP_TIMESTAMP_FORMAT, BUNDLE_SUBDIR, DEFAULT_SOURCE, DIR_MODE_CEILING, FILE_MODE_CEILING,
    GITHUB_ACCEPT, MAX_ENTRY_BYTES,
};
pub use request::{artifact_url, Reference, RequestError, UpdateRequest, LATEST_REF};
