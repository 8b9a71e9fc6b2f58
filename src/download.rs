use crate::config::USER_AGENT;
use crate::error::{Result, SetupError};
use async_trait::async_trait;
use flate2::read::GzDecoder;
use futures_util::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tar::Archive;
use tokio::io::AsyncWriteExt;
use walkdir::WalkDir;

/// Downloads release archives and unpacks them.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn download(&self, url: &str, dest: &Path) -> Result<PathBuf>;
    async fn extract_zip(&self, archive: &Path, dest: &Path) -> Result<PathBuf>;
    async fn extract_tar_gz(&self, archive: &Path, dest: &Path) -> Result<PathBuf>;
}

#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    show_progress: bool,
}

impl HttpFetcher {
    pub fn new(show_progress: bool) -> Self {
        Self {
            client: reqwest::Client::new(),
            show_progress,
        }
    }

    fn progress_bar(&self, total_size: u64, file_name: &str) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(total_size);
        if let Ok(style) = ProgressStyle::default_bar().template(
            "{msg} {spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})",
        ) {
            pb.set_style(style.progress_chars("#>-"));
        }
        pb.set_message(format!("Downloading {}", file_name));
        pb
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn download(&self, url: &str, dest: &Path) -> Result<PathBuf> {
        tracing::info!("Downloading {}", url);

        let response = self
            .client
            .get(url)
            .header("User-Agent", USER_AGENT)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(SetupError::RequestFailed {
                url: url.to_string(),
                status: response.status(),
            });
        }

        if let Some(parent) = dest.parent() {
            make_dir_all(parent).await?;
        }

        let file_name = dest
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let pb = self.progress_bar(response.content_length().unwrap_or(0), &file_name);

        let mut file = tokio::fs::File::create(dest).await?;
        let mut downloaded = 0u64;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            downloaded += chunk.len() as u64;
            pb.set_position(downloaded);
        }
        file.flush().await?;

        pb.finish_and_clear();
        tracing::debug!("Downloaded {} bytes to {}", downloaded, dest.display());
        Ok(dest.to_path_buf())
    }

    async fn extract_zip(&self, archive: &Path, dest: &Path) -> Result<PathBuf> {
        let (archive, dest) = (archive.to_path_buf(), dest.to_path_buf());
        tokio::task::spawn_blocking(move || -> Result<PathBuf> {
            extract_zip(&archive, &dest).map_err(|e| extract_error(&archive, e))?;
            Ok(dest)
        })
        .await?
    }

    async fn extract_tar_gz(&self, archive: &Path, dest: &Path) -> Result<PathBuf> {
        let (archive, dest) = (archive.to_path_buf(), dest.to_path_buf());
        tokio::task::spawn_blocking(move || -> Result<PathBuf> {
            extract_tar_gz(&archive, &dest).map_err(|e| extract_error(&archive, e))?;
            Ok(dest)
        })
        .await?
    }
}

fn extract_error(archive: &Path, err: impl std::fmt::Display) -> SetupError {
    SetupError::Extract {
        archive: archive.to_path_buf(),
        message: err.to_string(),
    }
}

fn extract_zip(archive_path: &Path, extract_dir: &Path) -> anyhow::Result<()> {
    tracing::debug!("Extracting zip archive {}", archive_path.display());
    fs::create_dir_all(extract_dir)?;

    let file = fs::File::open(archive_path)?;
    let mut archive = zip::ZipArchive::new(file)?;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        let outpath = match entry.enclosed_name() {
            Some(name) => extract_dir.join(name),
            None => {
                tracing::warn!("Skipping malicious path in zip: {}", entry.name());
                continue;
            }
        };

        if entry.is_dir() {
            fs::create_dir_all(&outpath)?;
            continue;
        }
        if let Some(parent) = outpath.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut outfile = fs::File::create(&outpath)?;
        io::copy(&mut entry, &mut outfile)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Some(mode) = entry.unix_mode() {
                fs::set_permissions(&outpath, fs::Permissions::from_mode(mode))?;
            }
        }
    }

    Ok(())
}

fn extract_tar_gz(archive_path: &Path, extract_dir: &Path) -> anyhow::Result<()> {
    tracing::debug!("Extracting tar.gz archive {}", archive_path.display());
    fs::create_dir_all(extract_dir)?;

    let file = fs::File::open(archive_path)?;
    let mut archive = Archive::new(GzDecoder::new(file));
    archive.unpack(extract_dir)?;

    Ok(())
}

/// Find `name` below `root`, preferring the shallowest match.
pub fn find_entry(root: &Path, name: &str, want_dir: bool) -> Option<PathBuf> {
    WalkDir::new(root)
        .min_depth(1)
        .max_depth(4)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name() == name && e.file_type().is_dir() == want_dir)
        .min_by_key(|e| e.depth())
        .map(|e| e.into_path())
}

/// Create a directory and its parents. An existing directory is not an error.
pub async fn make_dir_all(path: &Path) -> Result<()> {
    tokio::fs::create_dir_all(path).await?;
    Ok(())
}

pub async fn remove_all(path: &Path) -> Result<()> {
    if tokio::fs::metadata(path).await?.is_dir() {
        tokio::fs::remove_dir_all(path).await?;
    } else {
        tokio::fs::remove_file(path).await?;
    }
    Ok(())
}

/// Move a file or directory to `dest`, replacing whatever is there.
pub async fn move_path(src: &Path, dest: &Path) -> Result<()> {
    if tokio::fs::metadata(dest).await.is_ok() {
        remove_all(dest).await?;
    }
    if let Some(parent) = dest.parent() {
        make_dir_all(parent).await?;
    }

    match tokio::fs::rename(src, dest).await {
        Ok(()) => Ok(()),
        Err(e) => {
            // rename fails across filesystems, e.g. from a tmpfs scratch dir
            tracing::debug!("Rename failed ({}), copying instead", e);
            copy_path(src, dest).await?;
            remove_all(src).await
        }
    }
}

/// Copy a file or a whole directory tree to `dest`.
pub async fn copy_path(src: &Path, dest: &Path) -> Result<()> {
    let (src, dest) = (src.to_path_buf(), dest.to_path_buf());
    tokio::task::spawn_blocking(move || copy_path_blocking(&src, &dest)).await?
}

fn copy_path_blocking(src: &Path, dest: &Path) -> Result<()> {
    if src.is_file() {
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(src, dest)?;
        return Ok(());
    }

    for entry in WalkDir::new(src) {
        let entry = entry.map_err(io::Error::from)?;
        let relative = entry
            .path()
            .strip_prefix(src)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        let target = dest.join(relative);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}
