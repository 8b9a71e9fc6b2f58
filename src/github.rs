//! GitHub release lookup.
//!
//! [`GitHubClient`] talks to the REST API; [`ReleaseLookup`] decides which
//! release to ask for and hands the result to a tool-specific
//! [`ReleaseTransformer`].

use crate::config::{LATEST, USER_AGENT};
use crate::error::{Result, SetupError};
use crate::types::GitHubRelease;
use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use std::sync::Arc;

/// Transport for release metadata.
#[async_trait]
pub trait ReleaseSource: Send + Sync {
    async fn latest_release(&self, owner: &str, repo: &str) -> Result<GitHubRelease>;
    async fn release_by_tag(&self, owner: &str, repo: &str, tag: &str) -> Result<GitHubRelease>;
}

#[derive(Debug, Clone)]
pub struct GitHubClient {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl GitHubClient {
    pub fn with_base_url(base_url: impl Into<String>, token: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.trim().is_empty()),
        }
    }

    /// Build the API URL for a release; `None` selects the latest one.
    ///
    /// Path segments are percent-encoded, so a tag can never escape its segment.
    pub fn release_url(&self, owner: &str, repo: &str, tag: Option<&str>) -> Result<Url> {
        let invalid = || SetupError::Config(format!("Invalid GitHub API URL: {}", self.base_url));
        let mut url = Url::parse(&self.base_url).map_err(|_| invalid())?;
        {
            let mut segments = url.path_segments_mut().map_err(|_| invalid())?;
            segments
                .pop_if_empty()
                .extend(["repos", owner, repo, "releases"]);
            match tag {
                Some(tag) => segments.extend(["tags", tag]),
                None => segments.push("latest"),
            };
        }
        Ok(url)
    }

    async fn fetch(&self, owner: &str, repo: &str, tag: Option<&str>) -> Result<GitHubRelease> {
        let url = self.release_url(owner, repo, tag)?;
        tracing::debug!("Fetching GitHub release info from: {}", url);

        let mut request = self
            .client
            .get(url.clone())
            .header("Accept", "application/vnd.github+json")
            .header("User-Agent", USER_AGENT);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
            tracing::debug!("Using GitHub token");
        }

        let response = request.send().await?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(SetupError::ReleaseNotFound {
                owner: owner.to_string(),
                repo: repo.to_string(),
                tag: tag.map(str::to_string),
            });
        }
        if !status.is_success() {
            return Err(SetupError::RequestFailed {
                url: url.to_string(),
                status,
            });
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl ReleaseSource for GitHubClient {
    async fn latest_release(&self, owner: &str, repo: &str) -> Result<GitHubRelease> {
        self.fetch(owner, repo, None).await
    }

    async fn release_by_tag(&self, owner: &str, repo: &str, tag: &str) -> Result<GitHubRelease> {
        self.fetch(owner, repo, Some(tag)).await
    }
}

/// A release shaped for one tool.
pub trait ToolRelease {
    /// Release tag without the leading `v`.
    fn tag_name(&self) -> &str;
}

/// Maps raw release metadata to a tool-specific release.
pub trait ReleaseTransformer {
    type Release: ToolRelease;

    fn map(&self, release: GitHubRelease) -> Self::Release;
}

/// Strip one leading `v` from a release tag.
pub fn normalize_tag(tag: &str) -> &str {
    tag.strip_prefix('v').unwrap_or(tag)
}

#[derive(Clone)]
pub struct ReleaseLookup {
    source: Arc<dyn ReleaseSource>,
}

impl ReleaseLookup {
    pub fn new(source: Arc<dyn ReleaseSource>) -> Self {
        Self { source }
    }

    /// Fetch a release and map it with `transformer`.
    ///
    /// An absent, empty or `"latest"` version selects the latest release; any
    /// other value must match a tag exactly.
    pub async fn get_release<T: ReleaseTransformer>(
        &self,
        owner: &str,
        repo: &str,
        version: Option<&str>,
        transformer: &T,
    ) -> Result<T::Release> {
        let release = match version.filter(|v| !v.is_empty() && *v != LATEST) {
            Some(tag) => {
                tracing::debug!("Looking up {}/{} release {}", owner, repo, tag);
                self.source.release_by_tag(owner, repo, tag).await?
            }
            None => {
                tracing::debug!("Looking up latest {}/{} release", owner, repo);
                self.source.latest_release(owner, repo).await?
            }
        };
        tracing::info!("Resolved {}/{} release {}", owner, repo, release.tag_name);

        Ok(transformer.map(release))
    }
}
