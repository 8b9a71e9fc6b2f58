//! Dart Sass release assets and installer.
//!
//! Archives are named like `dart-sass-1.81.0-linux-x64.tar.gz` and unpack to a
//! `dart-sass/` directory holding the `sass` launcher and its Dart runtime, so
//! the whole directory is installed rather than a single file.

use super::{install_release, InstallPlan, Payload, ToolHost};
use crate::config::{DART_SASS, DART_SASS_TOOL_NAME};
use crate::error::Result;
use crate::github::{normalize_tag, ReleaseLookup, ReleaseTransformer, ToolRelease};
use crate::platform::{Os, Platform};
use crate::types::{GitHubAsset, GitHubRelease};
use regex::Regex;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::OnceLock;

const ASSET_KEY_PATTERN: &str = r"^dart-sass-\d+\.\d+\.\d+-";

fn asset_key_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(ASSET_KEY_PATTERN).expect("dart-sass asset pattern is valid"))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DartSassRelease {
    tag_name: String,
    assets: HashMap<String, String>,
}

impl DartSassRelease {
    pub fn new(tag_name: impl Into<String>, assets: &[GitHubAsset]) -> Self {
        let assets = assets
            .iter()
            .map(|asset| {
                (
                    asset_key_regex().replace(&asset.name, "").into_owned(),
                    asset.browser_download_url.clone(),
                )
            })
            .collect();

        Self {
            tag_name: tag_name.into(),
            assets,
        }
    }

    /// Lookup key for a platform, e.g. `macos-arm64.tar.gz`.
    pub fn asset_key(platform: &Platform) -> String {
        let os = match &platform.os {
            Os::Linux => "linux",
            Os::MacOs => "macos",
            Os::Windows => "windows",
            Os::Other(os) => os.as_str(),
        };
        format!(
            "{}-{}{}",
            os,
            platform.arch.as_str(),
            platform.archive_extension()
        )
    }

    pub fn asset_url(&self, platform: &Platform) -> Option<&str> {
        self.assets
            .get(&Self::asset_key(platform))
            .map(String::as_str)
    }
}

impl ToolRelease for DartSassRelease {
    fn tag_name(&self) -> &str {
        &self.tag_name
    }
}

pub struct DartSassReleaseTransformer;

impl ReleaseTransformer for DartSassReleaseTransformer {
    type Release = DartSassRelease;

    fn map(&self, release: GitHubRelease) -> DartSassRelease {
        DartSassRelease::new(normalize_tag(&release.tag_name), &release.assets)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DartSassInstallCommand {
    pub version: Option<String>,
}

pub struct DartSassInstaller {
    lookup: ReleaseLookup,
    platform: Platform,
    host: ToolHost,
}

impl DartSassInstaller {
    pub fn new(lookup: ReleaseLookup, platform: Platform, host: ToolHost) -> Self {
        Self {
            lookup,
            platform,
            host,
        }
    }

    pub async fn install(&self, cmd: &DartSassInstallCommand) -> Result<PathBuf> {
        let release = self
            .lookup
            .get_release(
                DART_SASS.owner,
                DART_SASS.repo,
                cmd.version.as_deref(),
                &DartSassReleaseTransformer,
            )
            .await?;

        tracing::debug!("Operating System: {}", self.platform.os);
        tracing::debug!("Processor Architecture: {}", self.platform.arch);

        let plan = InstallPlan {
            tool_name: DART_SASS_TOOL_NAME,
            version: release.tag_name(),
            url: release.asset_url(&self.platform),
            payload: Payload::Directory(DART_SASS_TOOL_NAME.to_string()),
        };
        install_release(&self.platform, &self.host, plan).await
    }
}
