//! Common infrastructure for Orange Box provisioning tools.
//!
//! This crate provides the shared plumbing for the one-shot provisioning
//! binaries:
//!
//! - [`shell`]: safe shell command execution with proper quoting
//! - [`sysenv`]: the [`SystemEnvironment`] capability trait over the host OS
//! - [`error`]: the fatal error taxonomy with process exit-code mapping
//!
//! # Architecture
//!
//! Provisioning tools follow this pattern:
//!
//! 1. Read identity from host configuration (config file, hostname)
//! 2. Derive the desired network topology (pure)
//! 3. Execute shell commands and write files to configure the host
//! 4. Verify the result and terminate with a specific exit code
//!
//! Stage 3 is the only impure part and is routed through
//! [`SystemEnvironment`] so the rest stays testable without real hardware.

pub mod error;
pub mod shell;
pub mod sysenv;

// Re-export commonly used items at crate root
pub use error::{
    SetupError, SetupResult, EXIT_DNS_FAILURE, EXIT_FAILURE, EXIT_NO_PRIVILEGE,
};
pub use shell::ExecResult;
pub use sysenv::{RealSystem, SystemEnvironment};
