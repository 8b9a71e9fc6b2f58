use crate::error::{Result, SetupError};
use crate::types::ToolRepo;
use std::collections::HashMap;
use std::path::PathBuf;

pub const APP_NAME: &str = "setup-hugo";
pub const USER_AGENT: &str = concat!("setup-hugo/", env!("CARGO_PKG_VERSION"));
pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";

/// Version string that selects the most recent published release.
pub const LATEST: &str = "latest";

pub const WORK_DIR_NAME: &str = "actions_hugo";
pub const TEMP_DIR_NAME: &str = "_temp";
pub const BIN_DIR_NAME: &str = "bin";
pub const TOOL_CACHE_DIR_NAME: &str = "tool-cache";

pub const HUGO: ToolRepo = ToolRepo {
    owner: "gohugoio",
    repo: "hugo",
};
pub const HUGO_CMD_NAME: &str = "hugo";

pub const DART_SASS: ToolRepo = ToolRepo {
    owner: "sass",
    repo: "dart-sass",
};
pub const DART_SASS_TOOL_NAME: &str = "dart-sass";

/// Installer settings resolved from the hosting environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// REST API root; GitHub Enterprise runners point `GITHUB_API_URL` elsewhere.
    pub api_url: String,
    /// Root of the version-keyed tool cache.
    pub tool_cache_dir: PathBuf,
    /// Root for per-install scratch directories. `None` means the platform work dir.
    pub temp_dir: Option<PathBuf>,
    /// File that GitHub Actions reads search path additions from.
    pub github_path: Option<PathBuf>,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        Self::from_vars(&std::env::vars().collect())
    }

    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self> {
        let var = |key: &str| {
            vars.get(key)
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
        };

        let tool_cache_dir = match var("SETUP_HUGO_CACHE_DIR").or_else(|| var("RUNNER_TOOL_CACHE")) {
            Some(dir) => dir,
            None => dirs::data_dir()
                .ok_or_else(|| SetupError::Config("Could not determine data directory".to_string()))?
                .join(APP_NAME)
                .join(TOOL_CACHE_DIR_NAME),
        };
        tracing::debug!("Tool cache directory: {}", tool_cache_dir.display());

        let api_url = vars
            .get("GITHUB_API_URL")
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .unwrap_or(DEFAULT_GITHUB_API_URL)
            .to_string();

        Ok(Settings {
            api_url,
            tool_cache_dir,
            temp_dir: var("RUNNER_TEMP"),
            github_path: var("GITHUB_PATH"),
        })
    }
}
