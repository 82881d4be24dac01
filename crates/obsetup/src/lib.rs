//! Orange Box network provisioner
//!
//! One-shot setup of a rack controller's networking:
//! - derives the rack's address plan from its operator-assigned number
//! - maps the three physical NICs to their uplink/bridge roles
//! - writes the interface-definitions file and bounces the interfaces
//! - verifies external reachability and DNS before declaring success
//!
//! All host access goes through `orangebox_common::SystemEnvironment`, so
//! the whole pipeline runs against a mock host in tests.

pub mod apply;
pub mod commands;
pub mod conf;
pub mod discovery;
pub mod pipeline;
pub mod render;
pub mod topology;
pub mod types;

pub use apply::InterfaceApplier;
pub use pipeline::{provision, SetupOptions};
pub use types::{ApplyState, InterfaceSet, RackNumber, TopologyPlan};
