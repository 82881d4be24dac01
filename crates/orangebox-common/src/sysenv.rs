//! Host OS access seam.
//!
//! The provisioning pipeline mutates exactly one shared resource: the host's
//! network configuration (files plus live interface state). Everything that
//! touches it goes through [`SystemEnvironment`], so planning and rendering
//! stay pure and the whole pipeline can run against a mock host in tests.

use async_trait::async_trait;
use std::io;
use std::path::Path;

use crate::error::{SetupError, SetupResult};
use crate::shell::{self, ExecResult};

/// Capability trait for everything the provisioner needs from the host.
#[async_trait]
pub trait SystemEnvironment: Send + Sync {
    /// Reads a file to a string. Missing files are an error.
    async fn read_file(&self, path: &Path) -> SetupResult<String>;

    /// Reads a file to a string, returning `None` when it does not exist.
    async fn read_file_if_exists(&self, path: &Path) -> SetupResult<Option<String>>;

    /// Writes a file, replacing any existing content.
    async fn write_file(&self, path: &Path, contents: &str) -> SetupResult<()>;

    /// Lists the entry names of a directory, sorted lexicographically.
    async fn list_dir(&self, path: &Path) -> SetupResult<Vec<String>>;

    /// Runs a shell command. A non-zero exit code is reported in the result,
    /// not as an error.
    async fn run(&self, command: &str) -> SetupResult<ExecResult>;

    /// The host's hostname.
    fn hostname(&self) -> SetupResult<String>;

    /// Whether the current process has root privileges.
    fn is_root(&self) -> bool;

    /// Runs a shell command and fails on a non-zero exit code.
    async fn run_checked(&self, command: &str) -> SetupResult<String> {
        let result = self.run(command).await?;
        if result.success() {
            Ok(result.stdout)
        } else {
            Err(SetupError::ShellCommandFailed {
                command: command.to_string(),
                exit_code: result.exit_code,
                output: result.combined_output(),
            })
        }
    }
}

/// The real host.
#[derive(Debug, Default, Clone, Copy)]
pub struct RealSystem;

impl RealSystem {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SystemEnvironment for RealSystem {
    async fn read_file(&self, path: &Path) -> SetupResult<String> {
        tokio::fs::read_to_string(path)
            .await
            .map_err(|e| SetupError::io(path.display().to_string(), e))
    }

    async fn read_file_if_exists(&self, path: &Path) -> SetupResult<Option<String>> {
        match tokio::fs::read_to_string(path).await {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(SetupError::io(path.display().to_string(), e)),
        }
    }

    async fn write_file(&self, path: &Path, contents: &str) -> SetupResult<()> {
        tokio::fs::write(path, contents)
            .await
            .map_err(|e| SetupError::io(path.display().to_string(), e))
    }

    async fn list_dir(&self, path: &Path) -> SetupResult<Vec<String>> {
        let mut entries = tokio::fs::read_dir(path)
            .await
            .map_err(|e| SetupError::io(path.display().to_string(), e))?;

        let mut names = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| SetupError::io(path.display().to_string(), e))?
        {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        names.sort();
        Ok(names)
    }

    async fn run(&self, command: &str) -> SetupResult<ExecResult> {
        shell::exec(command).await
    }

    fn hostname(&self) -> SetupResult<String> {
        let name = hostname::get().map_err(|e| SetupError::io("hostname".to_string(), e))?;
        Ok(name.to_string_lossy().into_owned())
    }

    fn is_root(&self) -> bool {
        nix::unistd::geteuid().is_root()
    }
}
