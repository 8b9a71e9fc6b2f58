use std::path::PathBuf;
use std::process::{Command, Output};
use tempfile::TempDir;

/// Runner-like environment rooted in a temp directory.
#[allow(dead_code)]
pub struct TestContext {
    pub temp_dir: TempDir,
    pub tool_cache: PathBuf,
    pub runner_temp: PathBuf,
    pub github_path: PathBuf,
    pub bin_path: PathBuf,
}

#[allow(dead_code)]
impl TestContext {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let tool_cache = temp_dir.path().join("toolcache");
        let runner_temp = temp_dir.path().join("runner_temp");
        let github_path = temp_dir.path().join("github_path");

        let bin_path = PathBuf::from(env!("CARGO_BIN_EXE_setup-hugo"));

        Self {
            temp_dir,
            tool_cache,
            runner_temp,
            github_path,
            bin_path,
        }
    }

    pub fn home(&self) -> PathBuf {
        self.temp_dir.path().join("home")
    }

    pub fn cmd(&self) -> Command {
        let mut cmd = Command::new(&self.bin_path);
        for key in [
            "INPUT_GITHUB-TOKEN",
            "INPUT_HUGO-VERSION",
            "INPUT_EXTENDED",
            "INPUT_WITH-DEPLOY",
            "INPUT_DART-SASS",
            "INPUT_DART-SASS-VERSION",
            "GITHUB_TOKEN",
            "GITHUB_ACTIONS",
            "GITHUB_API_URL",
            "SETUP_HUGO_CACHE_DIR",
            "RUST_LOG",
            "RUNNER_DEBUG",
        ] {
            cmd.env_remove(key);
        }
        cmd.env("HOME", self.home());
        cmd.env("USERPROFILE", self.home());
        cmd.env("RUNNER_TOOL_CACHE", &self.tool_cache);
        cmd.env("RUNNER_TEMP", &self.runner_temp);
        cmd.env("GITHUB_PATH", &self.github_path);
        cmd
    }

    /// Lines written to the `GITHUB_PATH` file so far.
    pub fn added_paths(&self) -> Vec<PathBuf> {
        std::fs::read_to_string(&self.github_path)
            .unwrap_or_default()
            .lines()
            .map(PathBuf::from)
            .collect()
    }

    /// Scratch directories left under `RUNNER_TEMP`.
    pub fn leftover_scratch(&self) -> usize {
        std::fs::read_dir(&self.runner_temp)
            .map(|entries| entries.count())
            .unwrap_or(0)
    }
}

#[allow(dead_code)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub status: std::process::ExitStatus,
}

impl From<Output> for CommandOutput {
    fn from(output: Output) -> Self {
        Self {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            status: output.status,
        }
    }
}

#[allow(dead_code)]
impl CommandOutput {
    pub fn assert_success(&self) -> &Self {
        if !self.status.success() {
            panic!(
                "Command failed with status {:?}\nstdout: {}\nstderr: {}",
                self.status.code(),
                self.stdout,
                self.stderr
            );
        }
        self
    }

    pub fn assert_failure(&self) -> &Self {
        if self.status.success() {
            panic!(
                "Command unexpectedly succeeded\nstdout: {}\nstderr: {}",
                self.stdout, self.stderr
            );
        }
        self
    }

    pub fn assert_stdout_contains(&self, text: &str) -> &Self {
        assert!(
            self.stdout.contains(text),
            "Stdout did not contain '{}'\nActual stdout: {}",
            text,
            self.stdout
        );
        self
    }

    pub fn assert_stderr_contains(&self, text: &str) -> &Self {
        assert!(
            self.stderr.contains(text),
            "Stderr did not contain '{}'\nActual stderr: {}",
            text,
            self.stderr
        );
        self
    }
}

/// Build a gzipped tarball holding `entries` (path, contents, mode).
#[allow(dead_code)]
pub fn tar_gz(entries: &[(&str, &[u8], u32)]) -> Vec<u8> {
    let encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
    let mut builder = tar::Builder::new(encoder);
    for (path, data, mode) in entries {
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(*mode);
        header.set_cksum();
        builder
            .append_data(&mut header, path, *data)
            .expect("Failed to append tar entry");
    }
    builder
        .into_inner()
        .and_then(|encoder| encoder.finish())
        .expect("Failed to finish archive")
}

/// Cache directory name for the host architecture.
#[allow(dead_code)]
pub fn host_arch() -> &'static str {
    match std::env::consts::ARCH {
        "x86_64" => "x64",
        "aarch64" => "arm64",
        "arm" => "arm",
        "x86" => "ia32",
        other => other,
    }
}

/// Suffix of the Hugo asset published for the host, if there is one.
#[allow(dead_code)]
pub fn hugo_host_suffix() -> Option<String> {
    let os = match std::env::consts::OS {
        "linux" => "linux",
        "macos" => return Some("darwin-universal.tar.gz".to_string()),
        _ => return None,
    };
    let arch = match std::env::consts::ARCH {
        "x86_64" => "amd64",
        "aarch64" => "arm64",
        "arm" => "arm",
        "x86" => "386",
        _ => return None,
    };
    Some(format!("{}-{}.tar.gz", os, arch))
}
