//! Error types for Orange Box provisioning.
//!
//! Every failure in the provisioning pipeline is fatal: errors propagate to
//! `main`, which maps them to a process exit code via [`SetupError::exit_code`]
//! and prints the operator hint from [`SetupError::remediation`] when one
//! exists. Recovery is re-running the whole tool, not catching anything here.

use std::io;
use thiserror::Error;

/// Exit code for generic fatal errors (bad identifier, unreachable network).
pub const EXIT_FAILURE: u8 = 1;

/// Exit code when name resolution cannot be verified.
pub const EXIT_DNS_FAILURE: u8 = 2;

/// Exit code when the tool is not running with root privileges.
pub const EXIT_NO_PRIVILEGE: u8 = 77;

/// Result type alias for provisioning operations.
pub type SetupResult<T> = Result<T, SetupError>;

/// Errors that can occur while provisioning a rack.
#[derive(Debug, Error)]
pub enum SetupError {
    /// Failed to spawn a shell command.
    #[error("failed to execute shell command '{command}': {source}")]
    ShellExec {
        /// The command that failed to execute.
        command: String,
        /// The underlying IO error.
        #[source]
        source: io::Error,
    },

    /// Shell command returned a non-zero exit code.
    #[error("shell command failed: '{command}' (exit code {exit_code}): {output}")]
    ShellCommandFailed {
        /// The command that failed.
        command: String,
        /// The exit code.
        exit_code: i32,
        /// Combined stdout/stderr output.
        output: String,
    },

    /// Not running with root privileges.
    #[error("root privileges are required")]
    Privilege,

    /// The rack identifier cannot produce a valid network topology.
    #[error("invalid rack identifier: {message}")]
    InvalidTopology {
        /// What was wrong with the identifier or interface set.
        message: String,
    },

    /// The external reachability probe never answered.
    #[error("network unreachable: no reply from {probe}")]
    NetworkUnreachable {
        /// The probe target address.
        probe: String,
    },

    /// The DNS resolution probe never answered.
    #[error("DNS unreachable: no reply from {probe}")]
    DnsUnreachable {
        /// The probe hostname.
        probe: String,
    },

    /// A host configuration file had unusable content.
    #[error("invalid configuration in {path}: {message}")]
    Config {
        /// The file (or pseudo-source) that was being read.
        path: String,
        /// Error message.
        message: String,
    },

    /// Reading or writing a host file failed.
    #[error("IO error on {path}: {source}")]
    Io {
        /// The path being accessed.
        path: String,
        /// The underlying IO error.
        #[source]
        source: io::Error,
    },
}

impl SetupError {
    /// Creates an invalid topology error.
    pub fn invalid_topology(message: impl Into<String>) -> Self {
        Self::InvalidTopology {
            message: message.into(),
        }
    }

    /// Creates a configuration error.
    pub fn config(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Config {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates an IO error for a path.
    pub fn io(path: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// The process exit code this error terminates with.
    pub fn exit_code(&self) -> u8 {
        match self {
            SetupError::Privilege => EXIT_NO_PRIVILEGE,
            SetupError::DnsUnreachable { .. } => EXIT_DNS_FAILURE,
            _ => EXIT_FAILURE,
        }
    }

    /// A human-readable hint telling the operator how to recover.
    pub fn remediation(&self) -> Option<&'static str> {
        match self {
            SetupError::Privilege => Some("Re-run the tool as root (sudo)."),
            SetupError::InvalidTopology { .. } => Some(
                "Set a rack number of at least 4 (and at most 252) via \
                 --rack-number, /etc/orange-box.conf, or a hostname ending \
                 in the number.",
            ),
            SetupError::NetworkUnreachable { .. } => {
                Some("Waited too long for the network to come up. Please fix the network.")
            }
            SetupError::DnsUnreachable { .. } => {
                Some("Waited too long for DNS to come up. Please fix the DNS.")
            }
            _ => None,
        }
    }
}
