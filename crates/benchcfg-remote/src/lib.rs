mod client;
mod download;
mod resolve;

pub use client::RemoteClient;
pub use download::validate_download_destination;
pub use resolve::{latest_release_url, LatestRelease, RepoCoordinates};
