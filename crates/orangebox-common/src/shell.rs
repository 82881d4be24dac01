//! Shell command execution for provisioning steps.
//!
//! All host mutation goes through commands built from the constants below and
//! executed with [`exec`]. Arguments that come from discovery or operator
//! input must pass through [`shellquote`] so interface names can never break
//! out of the command.

use once_cell::sync::Lazy;
use regex::Regex;
use std::process::Stdio;
use tokio::process::Command;

use crate::error::{SetupError, SetupResult};

/// Path to the `ip` command for address and link operations.
pub const IP_CMD: &str = "/sbin/ip";

/// Path to the `ifup` command for bringing interfaces up from the
/// interface-definitions file.
pub const IFUP_CMD: &str = "/sbin/ifup";

/// Path to the `ifdown` command for tearing interfaces down.
pub const IFDOWN_CMD: &str = "/sbin/ifdown";

/// Path to `systemctl` for service control.
pub const SYSTEMCTL_CMD: &str = "/usr/bin/systemctl";

/// Path to the `ping` command used by the reachability probes.
pub const PING_CMD: &str = "/bin/ping";

/// Path to `dpkg` for installing staged bootstrap packages.
pub const DPKG_CMD: &str = "/usr/bin/dpkg";

/// Path to `sysctl` for reloading kernel parameters.
pub const SYSCTL_CMD: &str = "/sbin/sysctl";

/// Regex for characters that need escaping in shell double-quotes.
/// Matches: $, `, ", \, and newline
static SHELL_ESCAPE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"([$`"\\\n])"#).expect("Invalid regex pattern"));

/// Quotes a string for safe use in shell commands.
///
/// Wraps the string in double quotes and escapes the characters that keep
/// special meaning inside them (`$`, `` ` ``, `"`, `\`, newline).
pub fn shellquote(s: &str) -> String {
    let escaped = SHELL_ESCAPE_RE.replace_all(s, r"\$1");
    format!("\"{}\"", escaped)
}

/// Result of a shell command execution.
#[derive(Debug, Clone)]
pub struct ExecResult {
    /// The exit code of the command (0 = success).
    pub exit_code: i32,
    /// The trimmed stdout output.
    pub stdout: String,
    /// The trimmed stderr output.
    pub stderr: String,
}

impl ExecResult {
    /// Returns true if the command succeeded (exit code 0).
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Returns the combined output (stdout + stderr) for error messages.
    pub fn combined_output(&self) -> String {
        if self.stderr.is_empty() {
            self.stdout.clone()
        } else if self.stdout.is_empty() {
            self.stderr.clone()
        } else {
            format!("{}\n{}", self.stdout, self.stderr)
        }
    }
}

/// Executes a shell command asynchronously via `/bin/sh -c`.
///
/// A non-zero exit code is not an error at this layer; callers decide
/// per-step whether a failure is fatal. Only a failure to spawn the
/// command at all is reported as [`SetupError::ShellExec`].
pub async fn exec(cmd: &str) -> SetupResult<ExecResult> {
    tracing::debug!(command = %cmd, "Executing shell command");

    let output = Command::new("/bin/sh")
        .arg("-c")
        .arg(cmd)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|e| SetupError::ShellExec {
            command: cmd.to_string(),
            source: e,
        })?;

    let exit_code = output.status.code().unwrap_or(-1);
    let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();

    let result = ExecResult {
        exit_code,
        stdout,
        stderr,
    };

    if result.success() {
        tracing::trace!(command = %cmd, "Command succeeded");
    } else {
        tracing::warn!(
            command = %cmd,
            exit_code = exit_code,
            stderr = %result.stderr,
            "Command failed"
        );
    }

    Ok(result)
}

/// Executes a shell command and fails on a non-zero exit code.
///
/// Returns the stdout output on success, [`SetupError::ShellCommandFailed`]
/// otherwise.
pub async fn exec_checked(cmd: &str) -> SetupResult<String> {
    let result = exec(cmd).await?;
    if result.success() {
        Ok(result.stdout)
    } else {
        Err(SetupError::ShellCommandFailed {
            command: cmd.to_string(),
            exit_code: result.exit_code,
            output: result.combined_output(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shellquote_simple() {
        assert_eq!(shellquote("simple"), "\"simple\"");
        assert_eq!(shellquote("enp3s0"), "\"enp3s0\"");
        assert_eq!(shellquote("172.27.28.1"), "\"172.27.28.1\"");
    }

    #[test]
    fn test_shellquote_special_chars() {
        assert_eq!(shellquote("$HOME"), "\"\\$HOME\"");
        assert_eq!(shellquote("`whoami`"), "\"\\`whoami\\`\"");
        assert_eq!(shellquote("say \"hello\""), "\"say \\\"hello\\\"\"");
        assert_eq!(shellquote("path\\to"), "\"path\\\\to\"");
        assert_eq!(shellquote("line1\nline2"), "\"line1\\\nline2\"");
    }

    #[test]
    fn test_shellquote_empty() {
        assert_eq!(shellquote(""), "\"\"");
    }

    #[test]
    fn test_exec_result_combined() {
        let result = ExecResult {
            exit_code: 0,
            stdout: "stdout".to_string(),
            stderr: "stderr".to_string(),
        };
        assert_eq!(result.combined_output(), "stdout\nstderr");

        let result = ExecResult {
            exit_code: 1,
            stdout: String::new(),
            stderr: "error message".to_string(),
        };
        assert!(!result.success());
        assert_eq!(result.combined_output(), "error message");
    }

    #[tokio::test]
    async fn test_exec_echo() {
        let result = exec("echo hello").await.unwrap();
        assert!(result.success());
        assert_eq!(result.stdout, "hello");
    }

    #[tokio::test]
    async fn test_exec_failure() {
        let result = exec("exit 42").await.unwrap();
        assert!(!result.success());
        assert_eq!(result.exit_code, 42);
    }

    #[tokio::test]
    async fn test_exec_checked_failure() {
        let result = exec_checked("exit 1").await;
        match result {
            Err(SetupError::ShellCommandFailed { exit_code, .. }) => {
                assert_eq!(exit_code, 1);
            }
            other => panic!("Expected ShellCommandFailed, got {:?}", other.err()),
        }
    }
}
