//! Mock host environment.
//!
//! [`MockSystem`] implements `SystemEnvironment` over an in-memory
//! filesystem and a captured command log, so the full provisioning pipeline
//! can run in tests without root privileges or real interfaces.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use orangebox_common::error::{SetupError, SetupResult};
use orangebox_common::shell::ExecResult;
use orangebox_common::sysenv::SystemEnvironment;

/// Scripted response for commands matching a substring.
#[derive(Debug, Clone)]
struct CommandRule {
    needle: String,
    /// How many more matching invocations this rule consumes.
    /// `None` means the rule never expires.
    remaining: Option<usize>,
    exit_code: i32,
    stdout: String,
}

#[derive(Debug, Default)]
struct Inner {
    files: BTreeMap<PathBuf, String>,
    dirs: BTreeMap<PathBuf, Vec<String>>,
    commands: Vec<String>,
    rules: Vec<CommandRule>,
}

/// An in-memory host. Commands succeed with empty output unless a rule
/// scripted via [`MockSystem::fail_commands_matching`] or
/// [`MockSystem::respond`] says otherwise.
#[derive(Debug)]
pub struct MockSystem {
    inner: Mutex<Inner>,
    hostname: String,
    root: bool,
}

impl Default for MockSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl MockSystem {
    /// Creates an empty mock host, running as root.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            hostname: "orangebox".to_string(),
            root: true,
        }
    }

    /// Sets the hostname reported by the mock.
    pub fn with_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = hostname.into();
        self
    }

    /// Drops root privileges on the mock.
    pub fn without_root(mut self) -> Self {
        self.root = false;
        self
    }

    /// Seeds a file.
    pub fn add_file(&self, path: impl Into<PathBuf>, contents: impl Into<String>) {
        self.inner
            .lock()
            .unwrap()
            .files
            .insert(path.into(), contents.into());
    }

    /// Seeds a directory listing (kept sorted, as the real host lists them).
    pub fn add_dir<I, S>(&self, path: impl Into<PathBuf>, entries: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut names: Vec<String> = entries.into_iter().map(Into::into).collect();
        names.sort();
        self.inner.lock().unwrap().dirs.insert(path.into(), names);
    }

    /// Makes the next `times` commands containing `needle` exit with code 1.
    pub fn fail_commands_matching(&self, needle: impl Into<String>, times: usize) {
        self.inner.lock().unwrap().rules.push(CommandRule {
            needle: needle.into(),
            remaining: Some(times),
            exit_code: 1,
            stdout: String::new(),
        });
    }

    /// Scripts a persistent response for commands containing `needle`.
    pub fn respond(&self, needle: impl Into<String>, exit_code: i32, stdout: impl Into<String>) {
        self.inner.lock().unwrap().rules.push(CommandRule {
            needle: needle.into(),
            remaining: None,
            exit_code,
            stdout: stdout.into(),
        });
    }

    /// All commands executed so far, in order.
    pub fn commands(&self) -> Vec<String> {
        self.inner.lock().unwrap().commands.clone()
    }

    /// How many executed commands contain `needle`.
    pub fn command_count_matching(&self, needle: &str) -> usize {
        self.inner
            .lock()
            .unwrap()
            .commands
            .iter()
            .filter(|c| c.contains(needle))
            .count()
    }

    /// Current contents of a written file, if any.
    pub fn file(&self, path: impl AsRef<Path>) -> Option<String> {
        self.inner
            .lock()
            .unwrap()
            .files
            .get(path.as_ref())
            .cloned()
    }

    fn not_found(path: &Path) -> SetupError {
        SetupError::io(
            path.display().to_string(),
            io::Error::new(io::ErrorKind::NotFound, "no such file or directory"),
        )
    }
}

#[async_trait]
impl SystemEnvironment for MockSystem {
    async fn read_file(&self, path: &Path) -> SetupResult<String> {
        self.inner
            .lock()
            .unwrap()
            .files
            .get(path)
            .cloned()
            .ok_or_else(|| Self::not_found(path))
    }

    async fn read_file_if_exists(&self, path: &Path) -> SetupResult<Option<String>> {
        Ok(self.inner.lock().unwrap().files.get(path).cloned())
    }

    async fn write_file(&self, path: &Path, contents: &str) -> SetupResult<()> {
        self.inner
            .lock()
            .unwrap()
            .files
            .insert(path.to_path_buf(), contents.to_string());
        Ok(())
    }

    async fn list_dir(&self, path: &Path) -> SetupResult<Vec<String>> {
        self.inner
            .lock()
            .unwrap()
            .dirs
            .get(path)
            .cloned()
            .ok_or_else(|| Self::not_found(path))
    }

    async fn run(&self, command: &str) -> SetupResult<ExecResult> {
        let mut inner = self.inner.lock().unwrap();
        inner.commands.push(command.to_string());
        tracing::debug!(command = %command, "Mock exec");

        for rule in inner.rules.iter_mut() {
            if !command.contains(&rule.needle) {
                continue;
            }
            match rule.remaining {
                Some(0) => continue,
                Some(ref mut n) => *n -= 1,
                None => {}
            }
            return Ok(ExecResult {
                exit_code: rule.exit_code,
                stdout: rule.stdout.clone(),
                stderr: String::new(),
            });
        }

        Ok(ExecResult {
            exit_code: 0,
            stdout: String::new(),
            stderr: String::new(),
        })
    }

    fn hostname(&self) -> SetupResult<String> {
        Ok(self.hostname.clone())
    }

    fn is_root(&self) -> bool {
        self.root
    }
}
