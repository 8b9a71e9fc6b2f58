//! Error taxonomy for release resolution and installation.
//!
//! Only [`SetupError::ReleaseNotFound`], [`SetupError::NoMatchingAsset`] and the
//! transport variants are expected to end an install. Cache and cleanup failures
//! are logged by the installers and never reach the caller.

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T, E = SetupError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum SetupError {
    /// The requested release (or the latest release) does not exist.
    #[error("{}", not_found_message(.owner, .repo, .tag))]
    ReleaseNotFound {
        owner: String,
        repo: String,
        tag: Option<String>,
    },

    /// The release has no asset for this platform, architecture and build variant.
    #[error("No matching URL detected for {tool} {version} on {os}-{arch}")]
    NoMatchingAsset {
        tool: String,
        version: String,
        os: String,
        arch: String,
    },

    #[error("Request to {url} failed with status {status}")]
    RequestFailed {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error("Failed to extract {}: {message}", .archive.display())]
    Extract { archive: PathBuf, message: String },

    #[error("Could not find {name} in extracted archive at {}", .dir.display())]
    MissingPayload { name: String, dir: PathBuf },

    #[error("Invalid tool cache key: {0}")]
    InvalidCacheKey(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl SetupError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, SetupError::ReleaseNotFound { .. })
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, SetupError::RequestFailed { .. } | SetupError::Http(_))
    }
}

fn not_found_message(owner: &str, repo: &str, tag: &Option<String>) -> String {
    match tag {
        Some(tag) => format!("Release tag '{}' not found in {}/{}", tag, owner, repo),
        None => format!("No releases found for {}/{}", owner, repo),
    }
}
