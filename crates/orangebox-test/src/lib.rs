//! Test infrastructure for Orange Box provisioning tools.
//!
//! Provides:
//! - [`MockSystem`]: an in-memory `SystemEnvironment` with a captured
//!   command log and scripted command results
//! - fixtures for common host shapes (three-NIC rack, hostname-only host)

pub mod fixtures;
pub mod mock;

pub use fixtures::{three_nic_host, unconfigured_host, SYS_CLASS_NET, TEST_NICS};
pub use mock::MockSystem;
