use crate::config::{BIN_DIR_NAME, TEMP_DIR_NAME, WORK_DIR_NAME};
use crate::download::make_dir_all;
use crate::error::Result;
use crate::search_path::SearchPath;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Os {
    Linux,
    MacOs,
    Windows,
    Other(String),
}

impl Os {
    /// Accepts both Rust (`macos`) and Node (`darwin`, `win32`) spellings.
    pub fn parse(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "linux" => Os::Linux,
            "macos" | "darwin" => Os::MacOs,
            "windows" | "win32" => Os::Windows,
            other => Os::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Os::Linux => "linux",
            Os::MacOs => "macos",
            Os::Windows => "windows",
            Os::Other(value) => value,
        }
    }
}

impl fmt::Display for Os {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Arch {
    X64,
    Arm64,
    Arm,
    Ia32,
    Other(String),
}

impl Arch {
    pub fn parse(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "x86_64" | "amd64" | "x64" => Arch::X64,
            "aarch64" | "arm64" => Arch::Arm64,
            "arm" | "armv7" => Arch::Arm,
            "x86" | "i686" | "386" | "ia32" => Arch::Ia32,
            other => Arch::Other(other.to_string()),
        }
    }

    /// Identifier used in tool cache keys.
    pub fn as_str(&self) -> &str {
        match self {
            Arch::X64 => "x64",
            Arch::Arm64 => "arm64",
            Arch::Arm => "arm",
            Arch::Ia32 => "ia32",
            Arch::Other(value) => value,
        }
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The environment a tool is installed into: OS, CPU architecture and environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Platform {
    pub os: Os,
    pub arch: Arch,
    env: HashMap<String, String>,
}

impl Platform {
    pub fn new(os: Os, arch: Arch, env: HashMap<String, String>) -> Self {
        Self { os, arch, env }
    }

    pub fn current() -> Self {
        Self::new(
            Os::parse(std::env::consts::OS),
            Arch::parse(std::env::consts::ARCH),
            std::env::vars().collect(),
        )
    }

    pub fn is_windows(&self) -> bool {
        self.os == Os::Windows
    }

    pub fn archive_extension(&self) -> &'static str {
        if self.is_windows() {
            ".zip"
        } else {
            ".tar.gz"
        }
    }

    pub fn binary_name(&self, base: &str) -> String {
        if self.is_windows() {
            format!("{}.exe", base)
        } else {
            base.to_string()
        }
    }

    pub fn home_dir(&self) -> PathBuf {
        let (key, fallback) = if self.is_windows() {
            ("USERPROFILE", "C:\\")
        } else {
            ("HOME", "/root")
        };

        let home = self
            .env
            .get(key)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(fallback));
        tracing::debug!("Home directory: {}", home.display());
        home
    }

    pub async fn create_work_dir(&self) -> Result<PathBuf> {
        let work_dir = self.home_dir().join(WORK_DIR_NAME);
        make_dir_all(&work_dir).await?;
        tracing::debug!("Work directory: {}", work_dir.display());
        Ok(work_dir)
    }

    pub async fn create_temp_dir(&self, work_dir: &Path) -> Result<PathBuf> {
        let temp_dir = work_dir.join(TEMP_DIR_NAME);
        make_dir_all(&temp_dir).await?;
        tracing::debug!("Temp directory: {}", temp_dir.display());
        Ok(temp_dir)
    }

    /// Create `<work_dir>/bin` and put it on the search path.
    pub async fn ensure_bin_dir(
        &self,
        work_dir: &Path,
        search_path: &dyn SearchPath,
    ) -> Result<PathBuf> {
        let bin_dir = work_dir.join(BIN_DIR_NAME);
        make_dir_all(&bin_dir).await?;
        search_path.add_path(&bin_dir)?;
        tracing::debug!("Bin directory: {}", bin_dir.display());
        Ok(bin_dir)
    }
}
