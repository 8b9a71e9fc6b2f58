//! Registration of directories on the executable search path.

use crate::error::{Result, SetupError};
use std::ffi::OsString;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub trait SearchPath: Send + Sync {
    /// Make `dir` discoverable by subsequently spawned processes.
    fn add_path(&self, dir: &Path) -> Result<()>;

    /// Directories registered so far, oldest first.
    fn added(&self) -> Vec<PathBuf>;
}

/// Search path as seen by a GitHub Actions runner.
///
/// Directories are appended to the `$GITHUB_PATH` file, which later workflow
/// steps pick up. This process's environment is left alone; child processes
/// get their `PATH` from [`search_path_var`].
#[derive(Debug, Default)]
pub struct ActionsPath {
    github_path: Option<PathBuf>,
    added: Mutex<Vec<PathBuf>>,
}

impl ActionsPath {
    pub fn new(github_path: Option<PathBuf>) -> Self {
        Self {
            github_path,
            added: Mutex::default(),
        }
    }
}

impl SearchPath for ActionsPath {
    fn add_path(&self, dir: &Path) -> Result<()> {
        if let Some(file) = &self.github_path {
            let mut out = OpenOptions::new().create(true).append(true).open(file)?;
            writeln!(out, "{}", dir.display())?;
            tracing::debug!("Appended {} to {}", dir.display(), file.display());
        }

        self.added
            .lock()
            .map_err(|_| SetupError::Config("Search path registry is poisoned".to_string()))?
            .push(dir.to_path_buf());

        tracing::info!("Added {} to the search path", dir.display());
        Ok(())
    }

    fn added(&self) -> Vec<PathBuf> {
        self.added
            .lock()
            .map(|added| added.clone())
            .unwrap_or_default()
    }
}

/// `PATH` value with `added` in front of `current`, most recent addition first.
pub fn search_path_var(added: &[PathBuf], current: Option<OsString>) -> Result<OsString> {
    let mut paths: Vec<PathBuf> = Vec::new();
    for dir in added.iter().rev() {
        if !paths.contains(dir) {
            paths.push(dir.clone());
        }
    }
    if let Some(current) = current {
        for dir in std::env::split_paths(&current) {
            if !paths.contains(&dir) {
                paths.push(dir);
            }
        }
    }
    std::env::join_paths(paths).map_err(|e| SetupError::Config(format!("Cannot build PATH: {}", e)))
}

/// Search path that only remembers what was added.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct RecordingPath {
    added: Mutex<Vec<PathBuf>>,
}

#[cfg(test)]
impl RecordingPath {
    pub fn added(&self) -> Vec<PathBuf> {
        self.added.lock().unwrap().clone()
    }
}

#[cfg(test)]
impl SearchPath for RecordingPath {
    fn add_path(&self, dir: &Path) -> Result<()> {
        self.added.lock().unwrap().push(dir.to_path_buf());
        Ok(())
    }

    fn added(&self) -> Vec<PathBuf> {
        self.added.lock().unwrap().clone()
    }
}
