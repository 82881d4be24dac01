//! Provisioner type definitions

use serde::Serialize;
use std::fmt;
use std::net::Ipv4Addr;

use orangebox_common::{SetupError, SetupResult};

/// Smallest usable rack number.
pub const MIN_RACK_NUMBER: u16 = 4;

/// Largest usable rack number; `number + 3` must still be a valid third
/// octet of the 172.27.0.0/16 rack address space.
pub const MAX_RACK_NUMBER: u16 = 252;

/// Name of the bridge carrying the primary internal segment.
pub const BRIDGE0: &str = "br0";

/// Name of the bridge carrying the secondary internal segment.
pub const BRIDGE1: &str = "br1";

/// Operator-assigned identifier distinguishing one rack from others sharing
/// the same infrastructure. Read once at startup and never mutated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct RackNumber(u16);

impl RackNumber {
    /// Validates a candidate rack number.
    ///
    /// Accepts any value in `4..=252`. Racks are conventionally numbered in
    /// steps of four, but misaligned numbers have shipped and are accepted
    /// for compatibility; they are logged as a warning instead of rejected.
    pub fn new(candidate: u16) -> SetupResult<Self> {
        if candidate < MIN_RACK_NUMBER {
            return Err(SetupError::invalid_topology(format!(
                "rack number {candidate} is below the minimum of {MIN_RACK_NUMBER}"
            )));
        }
        if candidate > MAX_RACK_NUMBER {
            return Err(SetupError::invalid_topology(format!(
                "rack number {candidate} exceeds {MAX_RACK_NUMBER}; the derived \
                 subnets would leave the 172.27.0.0/16 space"
            )));
        }

        let number = Self(candidate);
        if !number.is_aligned() {
            tracing::warn!(
                rack_number = candidate,
                "rack number is not divisible by 4; adjacent racks may overlap"
            );
        }
        Ok(number)
    }

    /// The raw identifier.
    pub fn get(self) -> u16 {
        self.0
    }

    /// Whether the number follows the divisible-by-4 numbering convention.
    pub fn is_aligned(self) -> bool {
        self.0 % 4 == 0
    }
}

impl fmt::Display for RackNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// The three physical NICs of a rack controller, mapped to their roles.
///
/// Discovery order determines the roles: the first NIC is the external
/// uplink (left unconfigured), and the remaining two are swapped, so the
/// third discovered NIC backs `br0` and the second backs `br1`. The swap is
/// fixed wiring of the rack hardware, not configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InterfaceSet {
    /// External uplink port; declared but left manual and down.
    pub external: String,
    /// NIC bridged by `br0` (primary internal segment).
    pub internal1: String,
    /// NIC bridged by `br1` (secondary internal segment).
    pub internal2: String,
}

impl InterfaceSet {
    /// The NIC names in the order discovery found them.
    pub fn discovered_order(&self) -> [&str; 3] {
        [
            self.external.as_str(),
            self.internal2.as_str(),
            self.internal1.as_str(),
        ]
    }

    /// Every interface the applier tears down: raw NICs, then bridges.
    pub fn teardown_order(&self) -> [&str; 5] {
        [
            self.external.as_str(),
            self.internal2.as_str(),
            self.internal1.as_str(),
            BRIDGE0,
            BRIDGE1,
        ]
    }

    /// Every interface the applier brings up, in bring-up order. The
    /// external uplink stays down.
    pub fn bringup_order(&self) -> [&str; 4] {
        [
            self.internal1.as_str(),
            self.internal2.as_str(),
            BRIDGE0,
            BRIDGE1,
        ]
    }
}

/// The four addresses derived from a rack number, all members of
/// consecutive /23 subnets inside 172.27.0.0/16.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TopologyPlan {
    /// Address of `br0`, the primary internal segment.
    pub internal1: Ipv4Addr,
    /// Gateway of the primary segment.
    pub gateway1: Ipv4Addr,
    /// Address of `br1`, the secondary internal segment.
    pub internal2: Ipv4Addr,
    /// Gateway (router) of the secondary segment.
    pub gateway2: Ipv4Addr,
}

impl TopologyPlan {
    /// Prefix length of every derived subnet.
    pub const PREFIX_LEN: u8 = 23;

    /// Netmask spelling of [`Self::PREFIX_LEN`] for the interface file.
    pub const NETMASK: &'static str = "255.255.254.0";

    /// The rack's default gateway.
    pub fn gateway(&self) -> Ipv4Addr {
        self.gateway1
    }
}

/// Stages of interface application, in order. `Failed` is terminal; so is
/// `Verified`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyState {
    /// Nothing touched yet.
    Unconfigured,
    /// Old addresses flushed, interim address assigned.
    Flushed,
    /// Interface-definitions file written.
    Rendered,
    /// All interfaces brought down.
    TornDown,
    /// Interfaces and bridges brought up.
    Applied,
    /// External reachability and DNS confirmed.
    Verified,
    /// A fatal step failed; the run terminates.
    Failed,
}

impl ApplyState {
    /// The stage name for logging.
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplyState::Unconfigured => "unconfigured",
            ApplyState::Flushed => "flushed",
            ApplyState::Rendered => "rendered",
            ApplyState::TornDown => "torn-down",
            ApplyState::Applied => "applied",
            ApplyState::Verified => "verified",
            ApplyState::Failed => "failed",
        }
    }

    /// Whether the state machine stops here.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ApplyState::Verified | ApplyState::Failed)
    }
}
