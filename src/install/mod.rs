//! Installation orchestration
//!
//! Each tool installer resolves a release and an asset URL, then hands an
//! [`InstallPlan`] to [`install_release`], which:
//! - serves the tool from the version-keyed cache when possible
//! - otherwise downloads and extracts the asset into a unique scratch directory
//! - caches the payload (or moves it to the fallback bin directory)
//! - registers the result on the search path

pub mod dart_sass;
pub mod hugo;

pub use dart_sass::{DartSassInstallCommand, DartSassInstaller};
pub use hugo::{HugoEdition, HugoInstallCommand, HugoInstaller};

use crate::cache::{DirToolCache, ToolCache};
use crate::config::Settings;
use crate::download::{find_entry, make_dir_all, move_path, Fetcher, HttpFetcher};
use crate::error::{Result, SetupError};
use crate::platform::Platform;
use crate::search_path::{ActionsPath, SearchPath};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// The hosting environment an installer drives.
#[derive(Clone)]
pub struct ToolHost {
    pub fetcher: Arc<dyn Fetcher>,
    pub cache: Arc<dyn ToolCache>,
    pub search_path: Arc<dyn SearchPath>,
    /// Root for scratch directories; `<work dir>/_temp` when unset.
    pub temp_root: Option<PathBuf>,
}

impl ToolHost {
    pub fn from_settings(settings: &Settings, show_progress: bool) -> Self {
        Self {
            fetcher: Arc::new(HttpFetcher::new(show_progress)),
            cache: Arc::new(DirToolCache::new(&settings.tool_cache_dir)),
            search_path: Arc::new(ActionsPath::new(settings.github_path.clone())),
            temp_root: settings.temp_dir.clone(),
        }
    }
}

/// What to pick out of an extracted archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Payload {
    /// A single executable, cached on its own.
    File(String),
    /// A directory holding the executable and its runtime.
    Directory(String),
}

impl Payload {
    fn name(&self) -> &str {
        match self {
            Payload::File(name) | Payload::Directory(name) => name,
        }
    }

    fn is_dir(&self) -> bool {
        matches!(self, Payload::Directory(_))
    }
}

#[derive(Debug)]
pub(crate) struct InstallPlan<'a> {
    /// Cache name; must be unique per tool and build variant.
    pub tool_name: &'a str,
    pub version: &'a str,
    pub url: Option<&'a str>,
    pub payload: Payload,
}

/// Install a resolved release and return the directory added to the search path.
pub(crate) async fn install_release(
    platform: &Platform,
    host: &ToolHost,
    plan: InstallPlan<'_>,
) -> Result<PathBuf> {
    let arch = platform.arch.as_str();

    match host.cache.find(plan.tool_name, plan.version, arch).await {
        Ok(Some(cached)) => {
            tracing::info!(
                "Using cached {} {} from {}",
                plan.tool_name,
                plan.version,
                cached.display()
            );
            host.search_path.add_path(&cached)?;
            return Ok(cached);
        }
        Ok(None) => tracing::debug!(
            "{} {} ({}) not found in tool cache",
            plan.tool_name,
            plan.version,
            arch
        ),
        Err(e) => tracing::warn!(
            "Tool cache lookup for {} {} failed: {}",
            plan.tool_name,
            plan.version,
            e
        ),
    }

    let url = plan.url.ok_or_else(|| SetupError::NoMatchingAsset {
        tool: plan.tool_name.to_string(),
        version: plan.version.to_string(),
        os: platform.os.to_string(),
        arch: arch.to_string(),
    })?;

    let temp_root = match &host.temp_root {
        Some(root) => {
            make_dir_all(root).await?;
            root.clone()
        }
        None => {
            let work_dir = platform.create_work_dir().await?;
            platform.create_temp_dir(&work_dir).await?
        }
    };
    let scratch = tempfile::Builder::new()
        .prefix(&format!("{}-", plan.tool_name))
        .tempdir_in(&temp_root)?;
    tracing::debug!("Scratch directory: {}", scratch.path().display());

    let result = download_and_place(platform, host, &plan, url, scratch.path()).await;

    let scratch_path = scratch.path().to_path_buf();
    if let Err(e) = scratch.close() {
        tracing::warn!("Failed to clean up {}: {}", scratch_path.display(), e);
    }

    result
}

async fn download_and_place(
    platform: &Platform,
    host: &ToolHost,
    plan: &InstallPlan<'_>,
    url: &str,
    scratch: &Path,
) -> Result<PathBuf> {
    let archive = scratch.join(format!("{}{}", plan.tool_name, platform.archive_extension()));
    host.fetcher.download(url, &archive).await?;

    tracing::debug!("Extract archive: {}", archive.display());
    let extract_dir = scratch.join("extracted");
    let extracted = if platform.is_windows() {
        host.fetcher.extract_zip(&archive, &extract_dir).await?
    } else {
        host.fetcher.extract_tar_gz(&archive, &extract_dir).await?
    };

    let payload = &plan.payload;
    let payload_path = find_entry(&extracted, payload.name(), payload.is_dir()).ok_or_else(|| {
        SetupError::MissingPayload {
            name: payload.name().to_string(),
            dir: extracted.clone(),
        }
    })?;

    let arch = platform.arch.as_str();
    let cached = match payload {
        Payload::File(name) => {
            host.cache
                .cache_file(&payload_path, name, plan.tool_name, plan.version, arch)
                .await
        }
        Payload::Directory(_) => {
            host.cache
                .cache_dir(&payload_path, plan.tool_name, plan.version, arch)
                .await
        }
    };

    match cached {
        Ok(dir) => {
            host.search_path.add_path(&dir)?;
            tracing::info!("Installed {} {} to {}", plan.tool_name, plan.version, dir.display());
            Ok(dir)
        }
        Err(e) => {
            tracing::warn!(
                "Failed to cache {} {}: {}. Falling back to the bin directory",
                plan.tool_name,
                plan.version,
                e
            );
            let work_dir = platform.create_work_dir().await?;
            let bin_dir = platform
                .ensure_bin_dir(&work_dir, host.search_path.as_ref())
                .await?;
            let dest = bin_dir.join(payload.name());
            tracing::debug!("Move {} to {}", payload_path.display(), dest.display());
            move_path(&payload_path, &dest).await?;

            let installed = match payload {
                Payload::File(_) => bin_dir,
                Payload::Directory(_) => {
                    host.search_path.add_path(&dest)?;
                    dest
                }
            };
            tracing::info!(
                "Installed {} {} to {}",
                plan.tool_name,
                plan.version,
                installed.display()
            );
            Ok(installed)
        }
    }
}
