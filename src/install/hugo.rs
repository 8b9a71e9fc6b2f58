//! Hugo release assets and installer.
//!
//! Hugo publishes one archive per platform and build, e.g.
//! `hugo_0.139.0_linux-amd64.tar.gz`, `hugo_extended_0.139.0_darwin-universal.tar.gz`
//! or `hugo_extended_withdeploy_0.139.0_windows-amd64.zip`.

use super::{install_release, InstallPlan, Payload, ToolHost};
use crate::config::{HUGO, HUGO_CMD_NAME};
use crate::error::Result;
use crate::github::{normalize_tag, ReleaseLookup, ReleaseTransformer, ToolRelease};
use crate::platform::{Arch, Os, Platform};
use crate::types::{GitHubAsset, GitHubRelease};
use regex::Regex;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::OnceLock;

/// Strips the tool and version prefix, leaving `<os>-<arch><ext>`. Only the
/// infixes of known editions are stripped so unknown builds cannot shadow them.
const ASSET_KEY_PATTERN: &str = r"^hugo_(?:extended_withdeploy_|extended_)?\d+\.\d+\.\d+_";

fn asset_key_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(ASSET_KEY_PATTERN).expect("hugo asset pattern is valid"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HugoEdition {
    Standard,
    Extended,
    ExtendedWithDeploy,
}

/// Asset name markers, most specific first: `extended_withdeploy` contains `extended`.
const EDITION_MARKERS: [(&str, HugoEdition); 2] = [
    ("extended_withdeploy", HugoEdition::ExtendedWithDeploy),
    ("extended", HugoEdition::Extended),
];

impl HugoEdition {
    /// With-deploy implies extended and wins over a plain extended flag.
    pub fn from_flags(extended: bool, with_deploy: bool) -> Self {
        match (extended, with_deploy) {
            (_, true) => HugoEdition::ExtendedWithDeploy,
            (true, false) => HugoEdition::Extended,
            (false, false) => HugoEdition::Standard,
        }
    }

    pub fn classify(asset_name: &str) -> Self {
        EDITION_MARKERS
            .iter()
            .find(|(marker, _)| asset_name.contains(marker))
            .map(|(_, edition)| *edition)
            .unwrap_or(HugoEdition::Standard)
    }

    /// Tool cache name; each edition is cached separately.
    pub fn tool_name(self) -> &'static str {
        match self {
            HugoEdition::Standard => "hugo",
            HugoEdition::Extended => "hugo-extended",
            HugoEdition::ExtendedWithDeploy => "hugo-extended-withdeploy",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HugoRelease {
    tag_name: String,
    assets: HashMap<HugoEdition, HashMap<String, String>>,
}

impl HugoRelease {
    pub fn new(tag_name: impl Into<String>, assets: &[GitHubAsset]) -> Self {
        let mut indices: HashMap<HugoEdition, HashMap<String, String>> = HashMap::new();
        for asset in assets {
            let key = asset_key_regex().replace(&asset.name, "").into_owned();
            indices
                .entry(HugoEdition::classify(&asset.name))
                .or_default()
                .insert(key, asset.browser_download_url.clone());
        }

        Self {
            tag_name: tag_name.into(),
            assets: indices,
        }
    }

    /// Lookup key for a platform, e.g. `linux-amd64.tar.gz`.
    pub fn asset_key(platform: &Platform) -> String {
        let os = match &platform.os {
            Os::Linux => "linux",
            Os::MacOs => "darwin",
            Os::Windows => "windows",
            Os::Other(os) => os.as_str(),
        };
        // macOS builds are universal binaries
        let arch = match (&platform.os, &platform.arch) {
            (Os::MacOs, _) => "universal",
            (_, Arch::X64) => "amd64",
            (_, Arch::Arm64) => "arm64",
            (_, Arch::Arm) => "arm",
            (_, Arch::Ia32) => "386",
            (_, Arch::Other(arch)) => arch.as_str(),
        };
        format!("{}-{}{}", os, arch, platform.archive_extension())
    }

    pub fn asset_url(&self, platform: &Platform, edition: HugoEdition) -> Option<&str> {
        self.assets
            .get(&edition)?
            .get(&Self::asset_key(platform))
            .map(String::as_str)
    }
}

impl ToolRelease for HugoRelease {
    fn tag_name(&self) -> &str {
        &self.tag_name
    }
}

pub struct HugoReleaseTransformer;

impl ReleaseTransformer for HugoReleaseTransformer {
    type Release = HugoRelease;

    fn map(&self, release: GitHubRelease) -> HugoRelease {
        HugoRelease::new(normalize_tag(&release.tag_name), &release.assets)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HugoInstallCommand {
    /// Release tag; empty or `None` means latest.
    pub version: Option<String>,
    pub extended: bool,
    pub with_deploy: bool,
}

pub struct HugoInstaller {
    lookup: ReleaseLookup,
    platform: Platform,
    host: ToolHost,
}

impl HugoInstaller {
    pub fn new(lookup: ReleaseLookup, platform: Platform, host: ToolHost) -> Self {
        Self {
            lookup,
            platform,
            host,
        }
    }

    pub async fn install(&self, cmd: &HugoInstallCommand) -> Result<PathBuf> {
        let release = self
            .lookup
            .get_release(
                HUGO.owner,
                HUGO.repo,
                cmd.version.as_deref(),
                &HugoReleaseTransformer,
            )
            .await?;

        let edition = HugoEdition::from_flags(cmd.extended, cmd.with_deploy);
        tracing::debug!("Hugo edition: {:?}", edition);
        tracing::debug!("Operating System: {}", self.platform.os);
        tracing::debug!("Processor Architecture: {}", self.platform.arch);

        let plan = InstallPlan {
            tool_name: edition.tool_name(),
            version: release.tag_name(),
            url: release.asset_url(&self.platform, edition),
            payload: Payload::File(self.platform.binary_name(HUGO_CMD_NAME)),
        };
        install_release(&self.platform, &self.host, plan).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ToolCache;
    use crate::error::SetupError;
    use crate::install::fakes::Harness;

    fn asset(name: &str) -> GitHubAsset {
        GitHubAsset::new(name, format!("https://example.invalid/{}", name))
    }

    fn url(name: &str) -> String {
        format!("https://example.invalid/{}", name)
    }

    fn github_release() -> GitHubRelease {
        GitHubRelease {
            tag_name: "v0.139.0".to_string(),
            assets: vec![
                asset("hugo_0.139.0_checksums.txt"),
                asset("hugo_0.139.0_linux-amd64.tar.gz"),
                asset("hugo_0.139.0_linux-arm64.tar.gz"),
                asset("hugo_0.139.0_darwin-universal.tar.gz"),
                asset("hugo_0.139.0_windows-amd64.zip"),
                asset("hugo_extended_0.139.0_linux-amd64.tar.gz"),
                asset("hugo_extended_0.139.0_darwin-universal.tar.gz"),
                asset("hugo_extended_withdeploy_0.139.0_linux-amd64.tar.gz"),
            ],
        }
    }

    fn release() -> HugoRelease {
        HugoReleaseTransformer.map(github_release())
    }

    fn platform(os: Os, arch: Arch) -> Platform {
        Platform::new(os, arch, HashMap::new())
    }

    #[test]
    fn test_from_flags_precedence() {
        assert_eq!(HugoEdition::from_flags(false, false), HugoEdition::Standard);
        assert_eq!(HugoEdition::from_flags(true, false), HugoEdition::Extended);
        assert_eq!(
            HugoEdition::from_flags(true, true),
            HugoEdition::ExtendedWithDeploy
        );
        assert_eq!(
            HugoEdition::from_flags(false, true),
            HugoEdition::ExtendedWithDeploy
        );
    }

    #[test]
    fn test_classify_prefers_most_specific_marker() {
        assert_eq!(
            HugoEdition::classify("hugo_extended_withdeploy_0.139.0_linux-amd64.tar.gz"),
            HugoEdition::ExtendedWithDeploy
        );
        assert_eq!(
            HugoEdition::classify("hugo_extended_0.139.0_linux-amd64.tar.gz"),
            HugoEdition::Extended
        );
        assert_eq!(
            HugoEdition::classify("hugo_0.139.0_linux-amd64.tar.gz"),
            HugoEdition::Standard
        );
        // Matching is case-sensitive
        assert_eq!(
            HugoEdition::classify("hugo_EXTENDED_0.139.0_linux-amd64.tar.gz"),
            HugoEdition::Standard
        );
    }

    #[test]
    fn test_tag_is_normalized() {
        assert_eq!(release().tag_name(), "0.139.0");

        let unprefixed = HugoReleaseTransformer.map(GitHubRelease {
            tag_name: "0.139.0".to_string(),
            assets: vec![],
        });
        assert_eq!(unprefixed.tag_name(), "0.139.0");
    }

    #[test]
    fn test_asset_url_per_edition() {
        let release = release();
        let linux = platform(Os::Linux, Arch::X64);

        assert_eq!(
            release.asset_url(&linux, HugoEdition::Standard),
            Some(url("hugo_0.139.0_linux-amd64.tar.gz").as_str())
        );
        assert_eq!(
            release.asset_url(&linux, HugoEdition::Extended),
            Some(url("hugo_extended_0.139.0_linux-amd64.tar.gz").as_str())
        );
        assert_eq!(
            release.asset_url(&linux, HugoEdition::ExtendedWithDeploy),
            Some(url("hugo_extended_withdeploy_0.139.0_linux-amd64.tar.gz").as_str())
        );
    }

    #[test]
    fn test_withdeploy_asset_is_not_in_extended_index() {
        let release = HugoRelease::new(
            "0.139.0",
            &[asset("hugo_extended_withdeploy_0.139.0_linux-amd64.tar.gz")],
        );
        let linux = platform(Os::Linux, Arch::X64);

        assert!(release.asset_url(&linux, HugoEdition::ExtendedWithDeploy).is_some());
        assert_eq!(release.asset_url(&linux, HugoEdition::Extended), None);
        assert_eq!(release.asset_url(&linux, HugoEdition::Standard), None);
    }

    #[test]
    fn test_asset_url_platform_keys() {
        let release = release();

        // darwin ignores the architecture
        for arch in [Arch::X64, Arch::Arm64] {
            assert_eq!(
                release.asset_url(&platform(Os::MacOs, arch), HugoEdition::Extended),
                Some(url("hugo_extended_0.139.0_darwin-universal.tar.gz").as_str())
            );
        }
        assert_eq!(
            release.asset_url(&platform(Os::Windows, Arch::X64), HugoEdition::Standard),
            Some(url("hugo_0.139.0_windows-amd64.zip").as_str())
        );
        assert_eq!(
            release.asset_url(&platform(Os::Linux, Arch::Arm64), HugoEdition::Standard),
            Some(url("hugo_0.139.0_linux-arm64.tar.gz").as_str())
        );
    }

    #[test]
    fn test_asset_url_absent_combination() {
        let release = release();
        assert_eq!(
            release.asset_url(&platform(Os::Windows, Arch::X64), HugoEdition::Extended),
            None
        );
        assert_eq!(
            release.asset_url(&platform(Os::Linux, Arch::Ia32), HugoEdition::Standard),
            None
        );
    }

    fn installer(h: &Harness) -> HugoInstaller {
        HugoInstaller::new(h.lookup.clone(), h.platform.clone(), h.host.clone())
    }

    const HUGO_ARCHIVE: &[(&str, &[u8])] = &[("hugo", b"hugo-binary"), ("LICENSE", b"Apache")];

    #[tokio::test]
    async fn test_install_downloads_and_caches() {
        let h = Harness::new(Os::Linux, github_release(), HUGO_ARCHIVE, false, false);
        let cmd = HugoInstallCommand {
            extended: true,
            ..Default::default()
        };

        let dir = installer(&h).install(&cmd).await.unwrap();

        assert_eq!(dir, h.path("cache/hugo-extended/0.139.0/x64"));
        assert_eq!(std::fs::read(dir.join("hugo")).unwrap(), b"hugo-binary");
        assert_eq!(
            h.fetcher.calls(),
            vec![
                format!("download:{}", url("hugo_extended_0.139.0_linux-amd64.tar.gz")),
                "tar.gz".to_string(),
            ]
        );
        assert_eq!(h.search_path.added(), vec![dir]);
        assert_eq!(h.leftover_scratch(), 0);
    }

    #[tokio::test]
    async fn test_install_cache_hit_skips_download() {
        let h = Harness::new(Os::Linux, github_release(), HUGO_ARCHIVE, false, false);
        let binary = h.path("prebuilt-hugo");
        std::fs::write(&binary, b"cached").unwrap();
        let cached = h
            .cache
            .cache_file(&binary, "hugo", "hugo", "0.139.0", "x64")
            .await
            .unwrap();

        let dir = installer(&h)
            .install(&HugoInstallCommand::default())
            .await
            .unwrap();

        assert_eq!(dir, cached);
        assert_eq!(h.fetcher.downloads(), 0);
        assert_eq!(h.search_path.added(), vec![cached]);
    }

    #[tokio::test]
    async fn test_install_without_matching_asset_fails() {
        let h = Harness::new(Os::Windows, github_release(), HUGO_ARCHIVE, false, false);
        let cmd = HugoInstallCommand {
            extended: true,
            ..Default::default()
        };

        let err = installer(&h).install(&cmd).await.unwrap_err();

        assert!(matches!(err, SetupError::NoMatchingAsset { .. }));
        assert!(!err.is_not_found());
        assert_eq!(h.fetcher.downloads(), 0);
        assert!(h.search_path.added().is_empty());
    }

    #[tokio::test]
    async fn test_install_unknown_tag_is_not_found() {
        let h = Harness::new(Os::Linux, github_release(), HUGO_ARCHIVE, false, false);
        let cmd = HugoInstallCommand {
            version: Some("v0.1.0".to_string()),
            ..Default::default()
        };

        let err = installer(&h).install(&cmd).await.unwrap_err();

        assert!(err.is_not_found());
        assert_eq!(h.fetcher.downloads(), 0);
    }

    #[tokio::test]
    async fn test_install_survives_cache_failures() {
        let h = Harness::new(Os::Linux, github_release(), HUGO_ARCHIVE, true, true);

        let dir = installer(&h)
            .install(&HugoInstallCommand::default())
            .await
            .unwrap();

        let bin_dir = h.path("home/actions_hugo/bin");
        assert_eq!(dir, bin_dir);
        assert_eq!(std::fs::read(bin_dir.join("hugo")).unwrap(), b"hugo-binary");
        assert_eq!(h.fetcher.downloads(), 1);
        assert_eq!(h.search_path.added(), vec![bin_dir]);
        assert_eq!(h.leftover_scratch(), 0);
    }

    #[tokio::test]
    async fn test_install_windows_uses_zip_and_exe() {
        let h = Harness::new(
            Os::Windows,
            github_release(),
            &[("hugo.exe", b"MZ")],
            false,
            false,
        );

        let dir = installer(&h)
            .install(&HugoInstallCommand::default())
            .await
            .unwrap();

        assert!(dir.join("hugo.exe").is_file());
        assert_eq!(
            h.fetcher.calls(),
            vec![
                format!("download:{}", url("hugo_0.139.0_windows-amd64.zip")),
                "zip".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_install_missing_binary_in_archive() {
        let h = Harness::new(Os::Linux, github_release(), &[("README.md", b"")], false, false);

        let err = installer(&h)
            .install(&HugoInstallCommand::default())
            .await
            .unwrap_err();

        assert!(matches!(err, SetupError::MissingPayload { .. }));
        assert_eq!(h.leftover_scratch(), 0);
    }
}
