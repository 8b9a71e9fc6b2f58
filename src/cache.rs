//! Version-keyed tool cache.
//!
//! Entries are keyed by (tool name, version, architecture) so that independent
//! tools and versions never share a directory.

use crate::download::{copy_path, make_dir_all, remove_all};
use crate::error::{Result, SetupError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[async_trait]
pub trait ToolCache: Send + Sync {
    /// Directory of a complete cache entry, or `None` on a miss.
    async fn find(&self, tool: &str, version: &str, arch: &str) -> Result<Option<PathBuf>>;

    /// Copy the contents of `src` into the cache and return the cached directory.
    async fn cache_dir(&self, src: &Path, tool: &str, version: &str, arch: &str)
        -> Result<PathBuf>;

    /// Copy a single file into the cache as `file_name` and return the cached directory.
    async fn cache_file(
        &self,
        src: &Path,
        file_name: &str,
        tool: &str,
        version: &str,
        arch: &str,
    ) -> Result<PathBuf>;
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
struct CacheMarker {
    tool: String,
    version: String,
    arch: String,
    cached_at: DateTime<Utc>,
}

/// Tool cache laid out as `<root>/<tool>/<version>/<arch>/`, with an
/// `<arch>.complete` marker written once the entry is fully populated.
#[derive(Debug, Clone)]
pub struct DirToolCache {
    root: PathBuf,
}

impl DirToolCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn entry_dir(&self, tool: &str, version: &str, arch: &str) -> Result<PathBuf> {
        for (label, value) in [("tool", tool), ("version", version), ("arch", arch)] {
            if value.trim().is_empty() {
                return Err(SetupError::InvalidCacheKey(format!("{} must not be empty", label)));
            }
        }
        Ok(self
            .root
            .join(tool)
            .join(version.replace('/', "__"))
            .join(arch))
    }

    fn marker_path(entry_dir: &Path) -> PathBuf {
        let mut name = entry_dir.as_os_str().to_owned();
        name.push(".complete");
        PathBuf::from(name)
    }

    async fn prepare_entry(&self, tool: &str, version: &str, arch: &str) -> Result<PathBuf> {
        let entry_dir = self.entry_dir(tool, version, arch)?;
        let marker = Self::marker_path(&entry_dir);
        if tokio::fs::metadata(&marker).await.is_ok() {
            remove_all(&marker).await?;
        }
        if tokio::fs::metadata(&entry_dir).await.is_ok() {
            remove_all(&entry_dir).await?;
        }
        make_dir_all(&entry_dir).await?;
        Ok(entry_dir)
    }

    async fn complete_entry(
        &self,
        entry_dir: &Path,
        tool: &str,
        version: &str,
        arch: &str,
    ) -> Result<()> {
        let marker = CacheMarker {
            tool: tool.to_string(),
            version: version.to_string(),
            arch: arch.to_string(),
            cached_at: Utc::now(),
        };
        let content = serde_json::to_vec_pretty(&marker)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        tokio::fs::write(Self::marker_path(entry_dir), content).await?;
        tracing::debug!("Cached {} {} ({}) at {}", tool, version, arch, entry_dir.display());
        Ok(())
    }
}

#[async_trait]
impl ToolCache for DirToolCache {
    async fn find(&self, tool: &str, version: &str, arch: &str) -> Result<Option<PathBuf>> {
        let entry_dir = self.entry_dir(tool, version, arch)?;
        let complete = tokio::fs::metadata(Self::marker_path(&entry_dir)).await.is_ok();
        let present = tokio::fs::metadata(&entry_dir)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false);

        if complete && present {
            tracing::debug!("Found {} {} ({}) in tool cache", tool, version, arch);
            Ok(Some(entry_dir))
        } else {
            Ok(None)
        }
    }

    async fn cache_dir(
        &self,
        src: &Path,
        tool: &str,
        version: &str,
        arch: &str,
    ) -> Result<PathBuf> {
        let entry_dir = self.prepare_entry(tool, version, arch).await?;
        copy_path(src, &entry_dir).await?;
        self.complete_entry(&entry_dir, tool, version, arch).await?;
        Ok(entry_dir)
    }

    async fn cache_file(
        &self,
        src: &Path,
        file_name: &str,
        tool: &str,
        version: &str,
        arch: &str,
    ) -> Result<PathBuf> {
        let entry_dir = self.prepare_entry(tool, version, arch).await?;
        // fs::copy keeps the executable bit
        tokio::fs::copy(src, entry_dir.join(file_name)).await?;
        self.complete_entry(&entry_dir, tool, version, arch).await?;
        Ok(entry_dir)
    }
}
