use serde::{Deserialize, Serialize};

/// Release payload as returned by the GitHub REST API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GitHubRelease {
    pub tag_name: String,
    #[serde(default)]
    pub assets: Vec<GitHubAsset>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GitHubAsset {
    pub name: String,
    pub browser_download_url: String,
}

#[cfg(test)]
impl GitHubAsset {
    pub fn new(name: impl Into<String>, browser_download_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            browser_download_url: browser_download_url.into(),
        }
    }
}

/// Owner and repository of a tool published on GitHub Releases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolRepo {
    pub owner: &'static str,
    pub repo: &'static str,
}
